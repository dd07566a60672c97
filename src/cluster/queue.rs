//! Merge candidates and the priority queue that orders them.
//!
//! Candidates are totally ordered by cost, then by the creation ids of their
//! endpoints (smaller id first). Equal-cost merges therefore always resolve
//! the same way, independent of memory layout or hashing.

use core::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use crate::hierarchy::NodeId;

/// A pending merge of two clusters at a given cost.
///
/// Endpoints are stored normalized (`lo <= hi`).
#[derive(Debug, Clone, Copy)]
pub struct MergeCandidate {
    lo: NodeId,
    hi: NodeId,
    cost: f64,
}

impl MergeCandidate {
    /// Candidate joining `a` and `b` at `cost`.
    pub fn new(a: NodeId, b: NodeId, cost: f64) -> Self {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        Self { lo, hi, cost }
    }

    /// Both endpoints, smaller id first.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.lo, self.hi)
    }

    /// Linkage cost.
    pub fn cost(&self) -> f64 {
        self.cost
    }

    /// Both endpoints are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.lo == self.hi
    }

    /// Whether either endpoint is `id`.
    pub fn touches(&self, id: NodeId) -> bool {
        self.lo == id || self.hi == id
    }

    /// Same endpoints, new cost.
    pub fn with_cost(self, cost: f64) -> Self {
        Self { cost, ..self }
    }

    /// Replace any endpoint found in `from` with `to`.
    fn relabel(&mut self, from: &[NodeId], to: NodeId) {
        let map = |id: NodeId| if from.contains(&id) { to } else { id };
        *self = Self::new(map(self.lo), map(self.hi), self.cost);
    }
}

impl PartialEq for MergeCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for MergeCandidate {}

impl PartialOrd for MergeCandidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MergeCandidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.lo.cmp(&other.lo))
            .then(self.hi.cmp(&other.hi))
    }
}

/// Min-priority queue of merge candidates.
///
/// Backed by a binary heap. Relabeling drains the heap storage, rewrites the
/// touched entries in storage order and rebuilds the heap in linear time.
#[derive(Debug, Clone, Default)]
pub struct MergeQueue {
    heap: BinaryHeap<Reverse<MergeCandidate>>,
}

impl MergeQueue {
    /// An empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty queue with room for `capacity` candidates.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Add a candidate.
    pub fn push(&mut self, candidate: MergeCandidate) {
        self.heap.push(Reverse(candidate));
    }

    /// Remove and return the cheapest candidate.
    pub fn pop_min(&mut self) -> Option<MergeCandidate> {
        self.heap.pop().map(|Reverse(c)| c)
    }

    /// Cheapest candidate without removing it.
    pub fn peek_min(&self) -> Option<&MergeCandidate> {
        self.heap.peek().map(|Reverse(c)| c)
    }

    /// Remove every entry equal to `candidate`. Returns whether any was found.
    pub fn remove(&mut self, candidate: &MergeCandidate) -> bool {
        let before = self.heap.len();
        self.heap.retain(|Reverse(c)| c != candidate);
        self.heap.len() != before
    }

    /// Pull out every candidate touching a node in `merged`, rename those
    /// endpoints to `into` and return the survivors.
    ///
    /// Candidates that become self-loops are dropped. The returned entries are
    /// in heap storage order and are no longer queued; the caller decides
    /// whether to push them back as-is, deduplicate or re-cost them.
    pub fn relabel(&mut self, merged: &[NodeId], into: NodeId) -> Vec<MergeCandidate> {
        let entries = core::mem::take(&mut self.heap).into_vec();
        let mut kept = Vec::with_capacity(entries.len());
        let mut moved = Vec::new();
        for Reverse(mut c) in entries {
            if merged.iter().any(|&id| c.touches(id)) {
                c.relabel(merged, into);
                if !c.is_self_loop() {
                    moved.push(c);
                }
            } else {
                kept.push(Reverse(c));
            }
        }
        self.heap = BinaryHeap::from(kept);
        moved
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// No candidates left.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl Extend<MergeCandidate> for MergeQueue {
    fn extend<I: IntoIterator<Item = MergeCandidate>>(&mut self, iter: I) {
        self.heap.extend(iter.into_iter().map(Reverse));
    }
}

impl FromIterator<MergeCandidate> for MergeQueue {
    fn from_iter<I: IntoIterator<Item = MergeCandidate>>(iter: I) -> Self {
        Self {
            heap: iter.into_iter().map(Reverse).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{GridItems, WeightGrid};
    use crate::hierarchy::NodeArena;

    fn ids(n: usize) -> Vec<NodeId> {
        let grid = WeightGrid::from_fn(n, 1, |_, _| vec![0.0]);
        let arena = NodeArena::from_items(&GridItems::collect(&grid).unwrap());
        (0..n).map(|i| arena.leaf_id(i)).collect()
    }

    #[test]
    fn endpoints_are_normalized() {
        let id = ids(2);
        let c = MergeCandidate::new(id[1], id[0], 1.0);
        assert_eq!(c.endpoints(), (id[0], id[1]));
        assert_eq!(c, MergeCandidate::new(id[0], id[1], 1.0));
    }

    #[test]
    fn pops_in_cost_order() {
        let id = ids(4);
        let mut q: MergeQueue = [
            MergeCandidate::new(id[0], id[1], 3.0),
            MergeCandidate::new(id[1], id[2], 1.0),
            MergeCandidate::new(id[2], id[3], 2.0),
        ]
        .into_iter()
        .collect();
        let costs: Vec<f64> = core::iter::from_fn(|| q.pop_min()).map(|c| c.cost()).collect();
        assert_eq!(costs, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn ties_break_on_creation_order() {
        let id = ids(4);
        let mut q = MergeQueue::new();
        q.push(MergeCandidate::new(id[3], id[2], 1.0));
        q.push(MergeCandidate::new(id[1], id[3], 1.0));
        q.push(MergeCandidate::new(id[0], id[3], 1.0));
        q.push(MergeCandidate::new(id[1], id[2], 1.0));
        let order: Vec<_> = core::iter::from_fn(|| q.pop_min())
            .map(|c| c.endpoints())
            .collect();
        assert_eq!(
            order,
            vec![(id[0], id[3]), (id[1], id[2]), (id[1], id[3]), (id[2], id[3])]
        );
    }

    #[test]
    fn equality_needs_same_cost() {
        let id = ids(2);
        assert_ne!(
            MergeCandidate::new(id[0], id[1], 1.0),
            MergeCandidate::new(id[0], id[1], 2.0)
        );
    }

    #[test]
    fn remove_drops_matching_entry() {
        let id = ids(3);
        let a = MergeCandidate::new(id[0], id[1], 1.0);
        let b = MergeCandidate::new(id[1], id[2], 2.0);
        let mut q: MergeQueue = [a, b].into_iter().collect();
        assert!(q.remove(&a));
        assert!(!q.remove(&a));
        assert_eq!(q.pop_min(), Some(b));
        assert!(q.is_empty());
    }

    #[test]
    fn relabel_moves_and_drops_self_loops() {
        let id = ids(5);
        // Pretend id[4] is the union of id[0] and id[1].
        let mut q: MergeQueue = [
            MergeCandidate::new(id[0], id[1], 1.0),
            MergeCandidate::new(id[0], id[2], 2.0),
            MergeCandidate::new(id[1], id[2], 3.0),
            MergeCandidate::new(id[2], id[3], 4.0),
        ]
        .into_iter()
        .collect();
        let mut moved = q.relabel(&[id[0], id[1]], id[4]);
        moved.sort();
        assert_eq!(
            moved,
            vec![
                MergeCandidate::new(id[2], id[4], 2.0),
                MergeCandidate::new(id[2], id[4], 3.0),
            ]
        );
        assert_eq!(q.len(), 1);
        assert_eq!(q.peek_min().map(|c| c.cost()), Some(4.0));
    }
}
