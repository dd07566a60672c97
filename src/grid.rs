//! The item grid: a rectangular lattice of prototype vectors.
//!
//! The lattice is owned by the caller (usually a trained map). Builders only
//! read it through [`ItemGrid`], and take a validated row-major snapshot
//! ([`GridItems`]) before they start merging.

use crate::error::{Error, Result};

/// Read access to a rectangular lattice of weight vectors.
pub trait ItemGrid {
    /// Number of columns.
    fn width(&self) -> usize;

    /// Number of rows.
    fn height(&self) -> usize;

    /// Weight vector of the cell, or `None` for a hole.
    fn weight_vector(&self, row: usize, col: usize) -> Option<&[f64]>;

    /// Number of input samples mapped onto the cell.
    ///
    /// Only used for labeling; the clustering math ignores it.
    fn mapped_input_count(&self, _row: usize, _col: usize) -> usize {
        0
    }
}

/// Position of a cell in the lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridPos {
    /// Row index.
    pub row: usize,
    /// Column index.
    pub col: usize,
}

impl GridPos {
    /// Create a position.
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// Axis-aligned bounding box in grid coordinates (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridBounds {
    /// Smallest row.
    pub min_row: usize,
    /// Largest row.
    pub max_row: usize,
    /// Smallest column.
    pub min_col: usize,
    /// Largest column.
    pub max_col: usize,
}

impl GridBounds {
    /// The box covering a single cell.
    pub fn point(pos: GridPos) -> Self {
        Self {
            min_row: pos.row,
            max_row: pos.row,
            min_col: pos.col,
            max_col: pos.col,
        }
    }

    /// Smallest box covering both.
    pub fn union(self, other: Self) -> Self {
        Self {
            min_row: self.min_row.min(other.min_row),
            max_row: self.max_row.max(other.max_row),
            min_col: self.min_col.min(other.min_col),
            max_col: self.max_col.max(other.max_col),
        }
    }

    /// Whether the cell lies inside the box.
    pub fn contains(&self, pos: GridPos) -> bool {
        (self.min_row..=self.max_row).contains(&pos.row)
            && (self.min_col..=self.max_col).contains(&pos.col)
    }
}

/// Dense owned lattice, row-major.
#[derive(Debug, Clone)]
pub struct WeightGrid {
    width: usize,
    height: usize,
    cells: Vec<Option<Vec<f64>>>,
    mapped: Vec<usize>,
}

impl WeightGrid {
    /// Build a `width` x `height` grid, calling `f(row, col)` for each cell.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Vec<f64>) -> Self {
        let mut cells = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                cells.push(Some(f(row, col)));
            }
        }
        Self {
            width,
            height,
            cells,
            mapped: vec![0; width * height],
        }
    }

    /// Build from nested rows (`rows[row][col]` is the cell's vector).
    ///
    /// Rows must all have the same length.
    pub fn from_rows(rows: Vec<Vec<Vec<f64>>>) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return Err(Error::InvalidParameter {
                name: "rows",
                message: "all rows must have the same number of cells",
            });
        }
        let cells: Vec<_> = rows.into_iter().flatten().map(Some).collect();
        Ok(Self {
            width,
            height,
            mapped: vec![0; cells.len()],
            cells,
        })
    }

    /// Punch a hole in the grid.
    pub fn clear_cell(&mut self, row: usize, col: usize) {
        if let Some(i) = self.index(row, col) {
            self.cells[i] = None;
        }
    }

    /// Record how many inputs were mapped onto a cell.
    pub fn set_mapped_input_count(&mut self, row: usize, col: usize, count: usize) {
        if let Some(i) = self.index(row, col) {
            self.mapped[i] = count;
        }
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.height && col < self.width).then(|| row * self.width + col)
    }
}

impl ItemGrid for WeightGrid {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn weight_vector(&self, row: usize, col: usize) -> Option<&[f64]> {
        self.index(row, col)
            .and_then(|i| self.cells[i].as_deref())
    }

    fn mapped_input_count(&self, row: usize, col: usize) -> usize {
        self.index(row, col).map_or(0, |i| self.mapped[i])
    }
}

/// One cell of the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    /// Where the cell sits in the lattice.
    pub pos: GridPos,
    /// Its weight vector.
    pub vector: Vec<f64>,
    /// Inputs mapped onto the cell.
    pub mapped_inputs: usize,
}

/// Validated, row-major snapshot of an [`ItemGrid`].
///
/// Item `i` sits at `(i / width, i % width)`.
#[derive(Debug, Clone)]
pub struct GridItems {
    width: usize,
    height: usize,
    dim: usize,
    items: Vec<Item>,
}

impl GridItems {
    /// Snapshot `grid`.
    ///
    /// Rejects empty grids, holes, and vectors of unequal dimension.
    pub fn collect<G: ItemGrid + ?Sized>(grid: &G) -> Result<Self> {
        let (width, height) = (grid.width(), grid.height());
        if width == 0 || height == 0 {
            return Err(Error::EmptyInput);
        }

        let mut items = Vec::with_capacity(width * height);
        let mut dim = None;
        for row in 0..height {
            for col in 0..width {
                let vector = grid
                    .weight_vector(row, col)
                    .ok_or(Error::MissingCell { row, col })?;
                let expected = *dim.get_or_insert(vector.len());
                if vector.len() != expected {
                    return Err(Error::DimensionMismatch {
                        expected,
                        found: vector.len(),
                    });
                }
                items.push(Item {
                    pos: GridPos { row, col },
                    vector: vector.to_vec(),
                    mapped_inputs: grid.mapped_input_count(row, col),
                });
            }
        }

        Ok(Self {
            width,
            height,
            dim: dim.unwrap_or(0),
            items,
        })
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false for a collected grid.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Columns of the source grid.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Rows of the source grid.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Shared vector dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// All items, row-major.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Weight vector of item `i`.
    pub fn vector(&self, i: usize) -> &[f64] {
        &self.items[i].vector
    }

    /// Row-major index of a cell.
    pub fn index_of(&self, pos: GridPos) -> Option<usize> {
        (pos.row < self.height && pos.col < self.width).then(|| pos.row * self.width + pos.col)
    }
}
