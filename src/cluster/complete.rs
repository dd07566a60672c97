//! Complete linkage over all item pairs.
//!
//! Every pair is seeded with its raw distance. After a merge `(A, B) -> C` the
//! candidates `(A, X)` and `(B, X)` both become `(C, X)` and must collapse to
//! one entry. True complete linkage keeps the larger of the two
//! ([`CollisionPolicy::Max`]). [`CollisionPolicy::LastWriteWins`] instead keeps
//! whichever entry the relabeling pass visited last, which reproduces the
//! behavior of viewers that resolve the collision through a map keyed by pair.

use super::agglomerate::{dedup_pairs, Agglomeration};
use super::seed::Neighborhood;
use super::traits::LinkageBuilder;
use crate::distance::Distance;
use crate::error::Result;
use crate::grid::ItemGrid;
use crate::hierarchy::Dendrogram;
use crate::progress::Progress;

/// How colliding candidates for the same pair are resolved after a merge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CollisionPolicy {
    /// Keep the maximum distance (complete linkage proper).
    #[default]
    Max,
    /// Keep the entry visited last in queue storage order.
    ///
    /// Deterministic, but the kept distance may be either of the colliding
    /// ones, so merge costs may fall below the true complete-link distance.
    LastWriteWins,
}

/// All-pairs complete linkage (maximum pairwise distance).
#[derive(Debug, Clone, Copy, Default)]
pub struct CompleteLinkage {
    policy: CollisionPolicy,
}

impl CompleteLinkage {
    /// Complete linkage with [`CollisionPolicy::Max`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the collision policy.
    pub fn with_policy(mut self, policy: CollisionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The configured collision policy.
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }
}

impl LinkageBuilder for CompleteLinkage {
    fn build<G, D>(&self, grid: &G, distance: &D, progress: &dyn Progress) -> Result<Dendrogram>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        let mut run = Agglomeration::start(self.name(), grid, distance, progress)?;
        log::debug!("{}: collision policy {:?}", self.name(), self.policy);
        run.seed(Neighborhood::AllPairs, |run, a, b| run.centroid_distance(a, b))?;

        while let Some(candidate) = run.queue.pop_min() {
            run.checkpoint()?;
            let (a, b) = candidate.endpoints();
            let merged = run.merge(candidate);
            let moved = run.queue.relabel(&[a, b], merged);
            let resolved = match self.policy {
                CollisionPolicy::Max => {
                    dedup_pairs(moved, |cur, new| if new.cost() > cur.cost() { new } else { cur })
                }
                CollisionPolicy::LastWriteWins => dedup_pairs(moved, |_, new| new),
            };
            run.queue.extend(resolved);
        }

        run.finish()
    }

    fn name(&self) -> &'static str {
        "complete-linkage"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::Euclidean;
    use crate::grid::{GridItems, WeightGrid};
    use crate::hierarchy::HealthCheck;
    use crate::progress::NoProgress;
    use proptest::prelude::*;

    fn grid_from(values: &[f64]) -> WeightGrid {
        WeightGrid::from_fn(3, 3, |r, c| vec![values[r * 3 + c], (r * c) as f64])
    }

    /// (min, max) distance over cross pairs of each merge, in merge order.
    fn cross_pair_ranges(grid: &WeightGrid, d: &Dendrogram) -> Vec<(f64, f64, f64)> {
        let items = GridItems::collect(grid).unwrap();
        d.merges()
            .map(|node| {
                let (l, r) = node.children().unwrap();
                let mut lo = f64::INFINITY;
                let mut hi = f64::NEG_INFINITY;
                for i in d.subtree(l).items() {
                    for j in d.subtree(r).items() {
                        let dist = Euclidean.distance(items.vector(i), items.vector(j)).unwrap();
                        lo = lo.min(dist);
                        hi = hi.max(dist);
                    }
                }
                (node.merge_cost().unwrap(), lo, hi)
            })
            .collect()
    }

    #[test]
    fn two_by_two_joins_pairs_at_their_diameter() {
        let grid = WeightGrid::from_rows(vec![
            vec![vec![0.0, 0.0], vec![10.0, 0.0]],
            vec![vec![0.0, 1.0], vec![10.0, 1.0]],
        ])
        .unwrap();
        let d = CompleteLinkage::new().build(&grid, &Euclidean, &NoProgress).unwrap();
        let costs: Vec<f64> = d.merge_costs().into_iter().flatten().collect();
        assert_eq!(&costs[..2], &[1.0, 1.0]);
        assert!((costs[2] - 101f64.sqrt()).abs() < 1e-12);
        assert_eq!(d.labels_at(2).unwrap(), vec![0, 1, 0, 1]);
    }

    #[test]
    fn max_policy_matches_brute_force_on_fixed_grid() {
        let grid = grid_from(&[3.0, 9.0, 1.0, 4.0, 8.0, 2.0, 7.0, 6.0, 5.0]);
        let d = CompleteLinkage::new().build(&grid, &Euclidean, &NoProgress).unwrap();
        for (cost, _, hi) in cross_pair_ranges(&grid, &d) {
            assert!((cost - hi).abs() < 1e-12, "{cost} vs {hi}");
        }
    }

    #[test]
    fn last_write_wins_is_deterministic() {
        let grid = grid_from(&[3.0, 9.0, 1.0, 4.0, 8.0, 2.0, 7.0, 6.0, 5.0]);
        let builder = CompleteLinkage::new().with_policy(CollisionPolicy::LastWriteWins);
        let a = builder.build(&grid, &Euclidean, &NoProgress).unwrap();
        let b = builder.build(&grid, &Euclidean, &NoProgress).unwrap();
        assert_eq!(a.merge_costs(), b.merge_costs());
        for level in 1..=9 {
            assert_eq!(a.labels_at(level).unwrap(), b.labels_at(level).unwrap());
        }
    }

    proptest! {
        #[test]
        fn max_policy_equals_max_over_cross_pairs(
            values in proptest::collection::vec(-50.0f64..50.0, 9),
        ) {
            let grid = grid_from(&values);
            let d = CompleteLinkage::new().build(&grid, &Euclidean, &NoProgress).unwrap();
            prop_assert!(d.health_check().is_healthy());
            for (cost, _, hi) in cross_pair_ranges(&grid, &d) {
                prop_assert!((cost - hi).abs() < 1e-12);
            }
        }

        #[test]
        fn last_write_wins_costs_are_real_cross_distances(
            values in proptest::collection::vec(-50.0f64..50.0, 9),
        ) {
            let grid = grid_from(&values);
            let d = CompleteLinkage::new()
                .with_policy(CollisionPolicy::LastWriteWins)
                .build(&grid, &Euclidean, &NoProgress)
                .unwrap();
            prop_assert!(d.health_check().is_healthy());
            for (cost, lo, hi) in cross_pair_ranges(&grid, &d) {
                prop_assert!(cost >= lo - 1e-12 && cost <= hi + 1e-12);
            }
        }
    }
}
