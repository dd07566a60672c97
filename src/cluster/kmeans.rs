//! K-means clustering of grid cells.
//!
//! Partitions the cells into k clusters by minimizing **within-cluster sum of
//! squares** (SSE):
//!
//! ```text
//! SSE = Σₖ Σᵢ∈Cₖ d(xᵢ, μₖ)²
//! ```
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids (see [`InitType`])
//! 2. **Assign**: each cell goes to the nearest centroid; ties go to the
//!    lowest cluster index
//! 3. **Re-seed**: an empty cluster takes the worst-fitting cell of the
//!    cluster with the largest SSE as its new centroid
//! 4. **Update**: each non-empty centroid becomes the mean of its members
//! 5. Repeat until the [`Convergence`] rule fires or the step budget runs out
//!
//! With a Euclidean distance every step leaves the SSE unchanged or lower.
//! Clusters that are still empty when training stops are dropped, so the
//! result may hold fewer than k clusters.
//!
//! Runs are reproducible: every random choice is drawn from a generator seeded
//! with [`KMeans::with_seed`].

use std::collections::HashSet;

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;

use super::partition::{FlatCluster, FlatPartition};
use super::traits::Clustering;
use crate::distance::Distance;
use crate::error::{Error, Result};
use crate::grid::{GridItems, ItemGrid};
use crate::progress::{NoProgress, Progress};

/// Consecutive reassignment-free steps required by [`Convergence::Quiescent`].
pub const QUIESCENT_WINDOW: usize = 5;

/// How the initial centroids are chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InitType {
    /// Synthetic centroids drawn uniformly inside each feature's observed range.
    RandomVector,
    /// Distinct cells drawn at random.
    #[default]
    RandomItem,
    /// Centroids evenly spaced on the line from the per-feature minimum to the
    /// per-feature maximum.
    LinearVector,
    /// Like [`InitType::LinearVector`], each point snapped to its nearest
    /// not-yet-used cell.
    LinearItem,
    /// Cells shuffled and split into k contiguous groups of equal size;
    /// centroids are the group means.
    RandomPartition,
}

/// When training stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Convergence {
    /// Stop as soon as a step reassigns as many cells as the step before.
    #[default]
    CountUnchanged,
    /// Stop after [`QUIESCENT_WINDOW`] consecutive steps without any
    /// reassignment.
    Quiescent,
}

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct KMeans {
    /// Number of clusters.
    k: usize,
    /// Centroid initialization.
    init: InitType,
    /// Random seed.
    seed: u64,
    /// Step budget.
    max_steps: usize,
    /// Stopping rule.
    convergence: Convergence,
}

impl KMeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            init: InitType::default(),
            seed: 0,
            max_steps: 100,
            convergence: Convergence::default(),
        }
    }

    /// Set the initialization strategy.
    pub fn with_init(mut self, init: InitType) -> Self {
        self.init = init;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the maximum number of training steps.
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the stopping rule.
    pub fn with_convergence(mut self, convergence: Convergence) -> Self {
        self.convergence = convergence;
        self
    }

    /// Train on the grid and return the flat partition.
    pub fn fit<G, D>(&self, grid: &G, distance: &D, progress: &dyn Progress) -> Result<FlatPartition>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        let items = GridItems::collect(grid)?;
        let n = items.len();
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }
        if self.max_steps == 0 {
            return Err(Error::InvalidParameter {
                name: "max_steps",
                message: "must be at least 1",
            });
        }

        let data = feature_matrix(&items)?;
        let mut rng = StdRng::seed_from_u64(self.seed);
        log::debug!(
            "kmeans: k={} over {n} items (dim {}), init {:?}, seed {}",
            self.k,
            items.dim(),
            self.init,
            self.seed
        );

        let mut centroids = self.init_centroids(&data, distance, &mut rng)?;
        let mut assignment: Vec<Option<usize>> = vec![None; n];
        let mut members: Vec<Vec<usize>> = vec![Vec::new(); self.k];
        let mut sse_history = Vec::new();
        let mut previous_changes = None;
        let mut quiet_steps = 0;
        let mut converged = false;
        let mut steps = 0;

        while steps < self.max_steps {
            if progress.is_cancelled() {
                log::debug!("kmeans: aborted after {steps} steps");
                return Err(Error::ClusteringAborted);
            }
            steps += 1;

            let changes = assign(&data, &centroids, distance, &mut assignment)?;
            members = group_members(&assignment, self.k);
            reseed_empty(&data, &mut centroids, &members, distance)?;
            update_centroids(&data, &mut centroids, &members);

            let sse = cluster_sse(&data, &centroids, &members, distance)?
                .iter()
                .sum::<f64>();
            sse_history.push(sse);
            progress.report(steps, self.max_steps);
            log::trace!("kmeans: step {steps}, {changes} reassigned, sse {sse:.6}");

            let stop = match self.convergence {
                Convergence::CountUnchanged => previous_changes == Some(changes),
                Convergence::Quiescent => {
                    quiet_steps = if changes == 0 { quiet_steps + 1 } else { 0 };
                    quiet_steps >= QUIESCENT_WINDOW
                }
            };
            previous_changes = Some(changes);
            if stop {
                converged = true;
                break;
            }
        }

        if converged {
            log::info!("kmeans: converged after {steps} steps");
        } else {
            log::info!("kmeans: step budget of {} exhausted", self.max_steps);
        }

        let sse = cluster_sse(&data, &centroids, &members, distance)?;
        let mut remap = vec![usize::MAX; self.k];
        let mut clusters = Vec::with_capacity(self.k);
        for (c, m) in members.into_iter().enumerate() {
            if m.is_empty() {
                continue;
            }
            remap[c] = clusters.len();
            clusters.push(FlatCluster {
                centroid: centroids.row(c).to_vec(),
                members: m,
                sse: sse[c],
            });
        }
        if clusters.len() < self.k {
            log::warn!(
                "kmeans: dropped {} empty clusters",
                self.k - clusters.len()
            );
        }
        let assignments = assignment
            .into_iter()
            .map(|a| a.map_or(0, |c| remap[c]))
            .collect();

        Ok(FlatPartition {
            items,
            clusters,
            assignments,
            sse_history,
            steps,
            converged,
        })
    }

    fn init_centroids<D: Distance + ?Sized>(
        &self,
        data: &Array2<f64>,
        distance: &D,
        rng: &mut StdRng,
    ) -> Result<Array2<f64>> {
        let (n, d) = data.dim();
        let k = self.k;
        let mut centroids = Array2::zeros((k, d));
        let mins = data.fold_axis(Axis(0), f64::INFINITY, |&a, &b| a.min(b));
        let maxs = data.fold_axis(Axis(0), f64::NEG_INFINITY, |&a, &b| a.max(b));

        match self.init {
            InitType::RandomVector => {
                for mut row in centroids.rows_mut() {
                    for (j, v) in row.iter_mut().enumerate() {
                        // Blend instead of `min + t * (max - min)`: the span
                        // can overflow for finite extremes.
                        let t: f64 = rng.random();
                        *v = mins[j] * (1.0 - t) + maxs[j] * t;
                    }
                }
            }
            InitType::RandomItem => {
                let picks = rand::seq::index::sample(rng, n, k);
                for (c, i) in picks.iter().enumerate() {
                    centroids.row_mut(c).assign(&data.row(i));
                }
            }
            InitType::LinearVector => {
                for c in 0..k {
                    centroids
                        .row_mut(c)
                        .assign(&interpolate(&mins, &maxs, c, k));
                }
            }
            InitType::LinearItem => {
                let mut used = vec![false; n];
                for c in 0..k {
                    let target = interpolate(&mins, &maxs, c, k);
                    let target = as_slice(target.view())?;
                    let mut best: Option<(usize, f64)> = None;
                    for i in (0..n).filter(|&i| !used[i]) {
                        let dist = distance.distance(as_slice(data.row(i))?, target)?;
                        if best.map_or(true, |(_, b)| dist < b) {
                            best = Some((i, dist));
                        }
                    }
                    // k <= n, so an unused item always remains.
                    if let Some((i, _)) = best {
                        used[i] = true;
                        centroids.row_mut(c).assign(&data.row(i));
                    }
                }
            }
            InitType::RandomPartition => {
                let mut order: Vec<usize> = (0..n).collect();
                order.shuffle(rng);
                let (base, extra) = (n / k, n % k);
                let mut start = 0;
                for c in 0..k {
                    let len = base + usize::from(c < extra);
                    let group = &order[start..start + len];
                    start += len;
                    if let Some(mean) = data.select(Axis(0), group).mean_axis(Axis(0)) {
                        centroids.row_mut(c).assign(&mean);
                    }
                }
            }
        }
        Ok(centroids)
    }
}

impl Clustering for KMeans {
    fn fit_predict<G, D>(&self, grid: &G, distance: &D) -> Result<Vec<usize>>
    where
        G: ItemGrid + ?Sized,
        D: Distance + ?Sized,
    {
        Ok(self.fit(grid, distance, &NoProgress)?.assignments)
    }

    fn n_clusters(&self) -> usize {
        self.k
    }
}

fn feature_matrix(items: &GridItems) -> Result<Array2<f64>> {
    let flat: Vec<f64> = items
        .items()
        .iter()
        .flat_map(|item| item.vector.iter().copied())
        .collect();
    Array2::from_shape_vec((items.len(), items.dim()), flat).map_err(|_| Error::InvalidParameter {
        name: "grid",
        message: "item vectors do not form an items x dim matrix",
    })
}

fn as_slice(row: ndarray::ArrayView1<'_, f64>) -> Result<&[f64]> {
    row.to_slice().ok_or(Error::InvalidParameter {
        name: "centroids",
        message: "rows must be contiguous",
    })
}

/// Point `c` of `k` evenly spaced points from `mins` to `maxs`.
fn interpolate(mins: &Array1<f64>, maxs: &Array1<f64>, c: usize, k: usize) -> Array1<f64> {
    let t = if k == 1 {
        0.5
    } else {
        c as f64 / (k - 1) as f64
    };
    mins + &((maxs - mins) * t)
}

/// Nearest-centroid assignment. Returns how many items changed cluster.
fn assign<D: Distance + ?Sized>(
    data: &Array2<f64>,
    centroids: &Array2<f64>,
    distance: &D,
    assignment: &mut [Option<usize>],
) -> Result<usize> {
    let mut changes = 0;
    for (i, slot) in assignment.iter_mut().enumerate() {
        let point = as_slice(data.row(i))?;
        let mut best = 0;
        let mut best_dist = f64::INFINITY;
        for (c, centroid) in centroids.rows().into_iter().enumerate() {
            let dist = distance.distance(point, as_slice(centroid)?)?;
            if dist < best_dist {
                best_dist = dist;
                best = c;
            }
        }
        if *slot != Some(best) {
            changes += 1;
            *slot = Some(best);
        }
    }
    Ok(changes)
}

fn group_members(assignment: &[Option<usize>], k: usize) -> Vec<Vec<usize>> {
    let mut members = vec![Vec::new(); k];
    for (i, a) in assignment.iter().enumerate() {
        if let Some(c) = a {
            members[*c].push(i);
        }
    }
    members
}

/// Squared distance from item `i` to centroid `c`.
fn squared_error<D: Distance + ?Sized>(
    data: &Array2<f64>,
    centroids: &Array2<f64>,
    distance: &D,
    i: usize,
    c: usize,
) -> Result<f64> {
    let d = distance.distance(as_slice(data.row(i))?, as_slice(centroids.row(c))?)?;
    Ok(d * d)
}

fn cluster_sse<D: Distance + ?Sized>(
    data: &Array2<f64>,
    centroids: &Array2<f64>,
    members: &[Vec<usize>],
    distance: &D,
) -> Result<Vec<f64>> {
    members
        .iter()
        .enumerate()
        .map(|(c, m)| {
            m.iter()
                .map(|&i| squared_error(data, centroids, distance, i, c))
                .sum()
        })
        .collect()
}

/// Give every empty cluster the worst-fitting member of the cluster with the
/// largest SSE. An item is handed out at most once per step; if the worst
/// cluster has nothing left to give, the empty centroid stays put.
fn reseed_empty<D: Distance + ?Sized>(
    data: &Array2<f64>,
    centroids: &mut Array2<f64>,
    members: &[Vec<usize>],
    distance: &D,
) -> Result<()> {
    let empty: Vec<usize> = (0..members.len()).filter(|&c| members[c].is_empty()).collect();
    if empty.is_empty() {
        return Ok(());
    }

    let sse = cluster_sse(data, centroids, members, distance)?;
    let mut worst: Option<usize> = None;
    for (c, &s) in sse.iter().enumerate() {
        if !members[c].is_empty() && worst.map_or(true, |w| s > sse[w]) {
            worst = Some(c);
        }
    }
    let Some(worst) = worst else {
        return Ok(());
    };

    let mut errors = Vec::with_capacity(members[worst].len());
    for &i in &members[worst] {
        errors.push((i, squared_error(data, centroids, distance, i, worst)?));
    }

    let mut stolen = HashSet::new();
    for c in empty {
        let outlier = errors
            .iter()
            .filter(|(i, _)| !stolen.contains(i))
            .fold(None, |best: Option<(usize, f64)>, &(i, e)| match best {
                Some((_, b)) if e <= b => best,
                _ => Some((i, e)),
            });
        if let Some((i, _)) = outlier {
            log::trace!("kmeans: cluster {c} empty, re-seeded from item {i}");
            stolen.insert(i);
            centroids.row_mut(c).assign(&data.row(i));
        }
    }
    Ok(())
}

fn update_centroids(data: &Array2<f64>, centroids: &mut Array2<f64>, members: &[Vec<usize>]) {
    for (c, m) in members.iter().enumerate() {
        if let Some(mean) = data.select(Axis(0), m).mean_axis(Axis(0)) {
            centroids.row_mut(c).assign(&mean);
        }
    }
}
