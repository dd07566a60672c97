//! Initial candidate edges.
//!
//! Neighbor-restricted builders only seed grid-adjacent pairs. This is an
//! approximation that is only sound for dense rectangular grids; holes are
//! rejected earlier, when the grid is collected.

/// Which item pairs get an initial merge candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Neighborhood {
    /// Right, down, down-right and down-left neighbors of each cell.
    Adjacent,
    /// Every unordered pair.
    AllPairs,
}

impl Neighborhood {
    /// Row-major item pairs `(i, j)` with `i < j` for a `width` x `height` grid.
    pub fn pairs(self, width: usize, height: usize) -> Vec<(usize, usize)> {
        match self {
            Neighborhood::Adjacent => adjacent_pairs(width, height),
            Neighborhood::AllPairs => {
                let n = width * height;
                let mut out = Vec::with_capacity(n * n.saturating_sub(1) / 2);
                for i in 0..n {
                    for j in (i + 1)..n {
                        out.push((i, j));
                    }
                }
                out
            }
        }
    }
}

fn adjacent_pairs(width: usize, height: usize) -> Vec<(usize, usize)> {
    let idx = |row: usize, col: usize| row * width + col;
    let mut out = Vec::with_capacity(4 * width * height);
    for row in 0..height {
        for col in 0..width {
            let here = idx(row, col);
            if col + 1 < width {
                out.push((here, idx(row, col + 1)));
            }
            if row + 1 < height {
                out.push((here, idx(row + 1, col)));
                if col + 1 < width {
                    out.push((here, idx(row + 1, col + 1)));
                }
                if col > 0 {
                    out.push((here, idx(row + 1, col - 1)));
                }
            }
        }
    }
    out
}
