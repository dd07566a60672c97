#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::collections::BTreeSet;

    use proptest::prelude::*;
    use rand::prelude::*;
    use rand::Rng;

    use crate::cluster::{
        Clustering, CollisionPolicy, CompleteLinkage, Convergence, InitType, KMeans,
        LinkageBuilder, SingleLinkage, WardLinkage, WardMode,
    };
    use crate::hierarchy::HealthCheck;
    use crate::{
        CancelFlag, Dendrogram, Error, Euclidean, NoProgress, Progress, Result, WeightGrid,
    };

    /// Cancels once `after` progress reports have arrived.
    struct CancelAfter {
        after: usize,
        reports: Cell<usize>,
    }

    impl CancelAfter {
        fn new(after: usize) -> Self {
            Self {
                after,
                reports: Cell::new(0),
            }
        }
    }

    impl Progress for CancelAfter {
        fn report(&self, _done: usize, _total: usize) {
            self.reports.set(self.reports.get() + 1);
        }

        fn is_cancelled(&self) -> bool {
            self.reports.get() >= self.after
        }
    }

    /// `[0,0] [10,0]` over `[0,1] [10,1]`.
    fn two_pairs() -> WeightGrid {
        WeightGrid::from_rows(vec![
            vec![vec![0.0, 0.0], vec![10.0, 0.0]],
            vec![vec![0.0, 1.0], vec![10.0, 1.0]],
        ])
        .unwrap()
    }

    fn random_grid(width: usize, height: usize, seed: u64) -> WeightGrid {
        let mut rng = StdRng::seed_from_u64(seed);
        WeightGrid::from_fn(width, height, |_, _| {
            vec![rng.random_range(0.0..5.0), rng.random_range(0.0..5.0)]
        })
    }

    type Build = fn(&WeightGrid, &dyn Progress) -> Result<Dendrogram>;

    fn single(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        SingleLinkage::new().build(g, &Euclidean, p)
    }

    fn complete_max(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        CompleteLinkage::new().build(g, &Euclidean, p)
    }

    fn complete_last_write(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        CompleteLinkage::new()
            .with_policy(CollisionPolicy::LastWriteWins)
            .build(g, &Euclidean, p)
    }

    fn ward_neighbors(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        WardLinkage::neighbors().build(g, &Euclidean, p)
    }

    fn ward_eager(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        WardLinkage::all_pairs(WardMode::Eager).build(g, &Euclidean, p)
    }

    fn ward_lazy(g: &WeightGrid, p: &dyn Progress) -> Result<Dendrogram> {
        WardLinkage::all_pairs(WardMode::Lazy).build(g, &Euclidean, p)
    }

    fn builders() -> Vec<(&'static str, Build)> {
        vec![
            ("single", single as Build),
            ("complete/max", complete_max as Build),
            ("complete/last-write", complete_last_write as Build),
            ("ward/neighbors", ward_neighbors as Build),
            ("ward/eager", ward_eager as Build),
            ("ward/lazy", ward_lazy as Build),
        ]
    }

    fn build_all(
        grid: &WeightGrid,
        progress: &dyn Progress,
    ) -> Vec<(&'static str, Result<Dendrogram>)> {
        builders()
            .into_iter()
            .map(|(name, build)| (name, build(grid, progress)))
            .collect()
    }

    fn sorted_groups(d: &Dendrogram, level: usize) -> Result<BTreeSet<Vec<usize>>> {
        Ok(d.cut(level)?
            .iter()
            .map(|g| {
                let mut items: Vec<usize> = g.items().collect();
                items.sort_unstable();
                items
            })
            .collect())
    }

    #[test]
    fn two_pairs_merge_before_joining() -> Result<()> {
        let grid = two_pairs();
        let pairs: BTreeSet<Vec<usize>> = [vec![0, 2], vec![1, 3]].into_iter().collect();

        let single = SingleLinkage::new().build(&grid, &Euclidean, &NoProgress)?;
        assert_eq!(single.merge_costs(), vec![Some(1.0), Some(1.0), Some(10.0)]);
        assert_eq!(sorted_groups(&single, 2)?, pairs);

        for (name, d) in build_all(&grid, &NoProgress) {
            let d = d?;
            assert_eq!(sorted_groups(&d, 2)?, pairs, "{name}");
        }

        let partition = KMeans::new(2)
            .with_init(InitType::LinearVector)
            .fit(&grid, &Euclidean, &NoProgress)?;
        let from_kmeans = partition.to_dendrogram()?;
        assert_eq!(sorted_groups(&from_kmeans, 2)?, pairs);
        Ok(())
    }

    #[test]
    fn every_builder_yields_a_full_binary_tree() -> Result<()> {
        let grid = random_grid(4, 3, 17);
        for (name, d) in build_all(&grid, &NoProgress) {
            let d = d?;
            assert_eq!(d.n_items(), 12, "{name}");
            assert_eq!(d.n_merges(), 11, "{name}");
            assert_eq!(d.arena().iter().filter(|n| n.is_leaf()).count(), 12, "{name}");
            assert_eq!(d.root().len(), 12, "{name}");
            let report = d.health_check();
            assert!(report.is_healthy(), "{name}: {report}");
        }
        Ok(())
    }

    #[test]
    fn cancellation_after_first_merge_aborts_every_builder() {
        let grid = two_pairs();
        for (name, build) in builders() {
            let progress = CancelAfter::new(1);
            assert_eq!(build(&grid, &progress).unwrap_err(), Error::ClusteringAborted, "{name}");
            assert_eq!(progress.reports.get(), 1, "{name}");
        }

        let err = KMeans::new(2)
            .with_init(InitType::LinearVector)
            .fit(&grid, &Euclidean, &CancelAfter::new(1))
            .unwrap_err();
        assert!(err.is_aborted());
    }

    #[test]
    fn cancel_flag_stops_before_any_merge() {
        let flag = CancelFlag::new();
        flag.cancel();
        let err = SingleLinkage::new()
            .build(&two_pairs(), &Euclidean, &flag)
            .unwrap_err();
        assert_eq!(err, Error::ClusteringAborted);
    }

    #[test]
    fn holes_in_the_grid_are_rejected() {
        let mut grid = random_grid(3, 3, 1);
        grid.clear_cell(1, 2);
        for (name, d) in build_all(&grid, &NoProgress) {
            let err = d.unwrap_err();
            assert_eq!(err, Error::MissingCell { row: 1, col: 2 }, "{name}");
            assert!(err.is_input_error());
        }
        assert!(KMeans::new(2)
            .fit(&grid, &Euclidean, &NoProgress)
            .unwrap_err()
            .is_input_error());
    }

    #[test]
    fn mixed_dimensions_are_rejected() {
        let grid = WeightGrid::from_fn(2, 2, |r, c| vec![0.0; if r == 1 && c == 1 { 3 } else { 2 }]);
        for (name, d) in build_all(&grid, &NoProgress) {
            assert!(
                matches!(d, Err(Error::DimensionMismatch { expected: 2, found: 3 })),
                "{name}"
            );
        }
        assert!(matches!(
            KMeans::new(2).fit_predict(&grid, &Euclidean),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn single_cell_grid() -> Result<()> {
        let grid = WeightGrid::from_fn(1, 1, |_, _| vec![3.0]);
        for (name, d) in build_all(&grid, &NoProgress) {
            let d = d?;
            assert_eq!(d.n_merges(), 0, "{name}");
            assert_eq!(d.labels_at(1)?, vec![0], "{name}");
        }
        let partition = KMeans::new(1).fit(&grid, &Euclidean, &NoProgress)?;
        assert_eq!(partition.assignments(), &[0]);
        Ok(())
    }

    #[test]
    fn kmeans_and_ward_agree_on_separated_blobs() -> Result<()> {
        let grid = WeightGrid::from_fn(6, 2, |r, c| {
            let x = if c < 3 { 0.0 } else { 20.0 };
            vec![x + 0.1 * c as f64, 0.1 * r as f64]
        });
        let ward = WardLinkage::neighbors().build(&grid, &Euclidean, &NoProgress)?;
        let kmeans = KMeans::new(2)
            .with_init(InitType::LinearItem)
            .with_convergence(Convergence::Quiescent)
            .fit(&grid, &Euclidean, &NoProgress)?;
        assert_eq!(sorted_groups(&ward, 2)?, sorted_groups(&kmeans.to_dendrogram()?, 2)?);
        Ok(())
    }

    proptest! {
        #[test]
        fn every_cut_partitions_all_items(
            width in 1usize..5,
            height in 1usize..4,
            seed in 0u64..10_000,
        ) {
            let grid = random_grid(width, height, seed);
            let n = width * height;
            for (name, d) in build_all(&grid, &NoProgress) {
                let d = d.unwrap();
                prop_assert_eq!(d.n_merges(), n - 1);
                for level in 1..=n {
                    let groups = d.cut(level).unwrap();
                    prop_assert_eq!(groups.len(), level, "{} at {}", name, level);
                    let mut seen: Vec<usize> = groups.iter().flat_map(|g| g.items()).collect();
                    seen.sort_unstable();
                    prop_assert_eq!(seen, (0..n).collect::<Vec<_>>());
                }
            }
        }
    }
}
