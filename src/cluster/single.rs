//! Single linkage over grid-adjacent cells.
//!
//! Only the four forward neighbor edges of each cell are seeded, so the
//! result is Kruskal's minimum spanning tree of the 8-neighborhood graph, not
//! of the complete graph. A pair of clusters that touches only through
//! non-adjacent cells is never joined directly.
//!
//! After a merge `(A, B) -> C` every edge touching `A` or `B` is relabeled to
//! `C`. Duplicate edges to the same neighbor are left in the queue: the
//! cheapest one pops first and carries the single-link distance, the rest turn
//! into self-loops once that neighbor is absorbed and are dropped.

use super::agglomerate::Agglomeration;
use super::seed::Neighborhood;
use super::traits::LinkageBuilder;
use crate::distance::Distance;
use crate::error::Result;
use crate::grid::ItemGrid;
use crate::hierarchy::Dendrogram;
use crate::progress::Progress;

/// Neighbor-restricted single linkage (minimum pairwise distance).
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleLinkage;

impl SingleLinkage {
    /// Create the builder.
    pub fn new() -> Self {
        Self
    }
}

impl LinkageBuilder for SingleLinkage {
    fn build<G, D>(&self, grid: &G, distance: &D, progress: &dyn Progress) -> Result<Dendrogram>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        let mut run = Agglomeration::start(self.name(), grid, distance, progress)?;
        run.seed(Neighborhood::Adjacent, |run, a, b| run.centroid_distance(a, b))?;

        while let Some(candidate) = run.queue.pop_min() {
            run.checkpoint()?;
            let (a, b) = candidate.endpoints();
            let merged = run.merge(candidate);
            let moved = run.queue.relabel(&[a, b], merged);
            run.queue.extend(moved);
        }

        run.finish()
    }

    fn name(&self) -> &'static str {
        "single-linkage"
    }
}
