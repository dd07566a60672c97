//! Dendrogram over a completed merge forest.
//!
//! A dendrogram is built once by a linkage builder (or by the k-means
//! adapter) and then queried read-only. `cut(L)` walks down from the root and
//! keeps every node whose level is at least `L`, which yields exactly the `L`
//! roots that existed after the first `n_items - L` merges.

use crate::error::{Error, Result};
use crate::grid::{GridBounds, GridPos};
use crate::hierarchy::node::{ClusterNode, NodeArena, NodeId, NodeKind};

/// Complete merge tree over `n_items` grid cells.
#[derive(Debug, Clone)]
pub struct Dendrogram {
    arena: NodeArena,
    root: NodeId,
}

impl Dendrogram {
    /// Wrap a fully merged arena.
    ///
    /// Fails with [`Error::DisconnectedGraph`] unless exactly one root is left.
    pub fn from_arena(arena: NodeArena) -> Result<Self> {
        if arena.is_empty() {
            return Err(Error::EmptyInput);
        }
        let roots: Vec<NodeId> = arena.roots().take(2).collect();
        let root = match roots[..] {
            [root] => root,
            _ => return Err(Error::DisconnectedGraph),
        };
        Ok(Self { arena, root })
    }

    /// Number of grid cells.
    pub fn n_items(&self) -> usize {
        self.arena.n_items()
    }

    /// Number of internal nodes (always `n_items - 1`).
    pub fn n_merges(&self) -> usize {
        self.arena.n_merges()
    }

    /// The whole tree.
    pub fn root(&self) -> ClusterSubtree<'_> {
        self.subtree(self.root)
    }

    /// View of any node.
    pub fn subtree(&self, id: NodeId) -> ClusterSubtree<'_> {
        ClusterSubtree {
            dendrogram: self,
            id,
        }
    }

    /// Underlying arena, for historical queries.
    pub fn arena(&self) -> &NodeArena {
        &self.arena
    }

    /// Internal nodes in merge order.
    pub fn merges(&self) -> impl Iterator<Item = &ClusterNode> {
        self.arena.iter().skip(self.arena.n_items())
    }

    /// Cost of every merge, in merge order.
    pub fn merge_costs(&self) -> Vec<Option<f64>> {
        self.merges().map(ClusterNode::merge_cost).collect()
    }

    /// The clustering into exactly `level` groups.
    ///
    /// Subtrees come back left to right. Their leaf sets partition all items.
    pub fn cut(&self, level: usize) -> Result<Vec<ClusterSubtree<'_>>> {
        let n = self.n_items();
        if level == 0 || level > n {
            return Err(Error::InvalidCutLevel { level, n_items: n });
        }

        let mut out = Vec::with_capacity(level);
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.arena.get(id);
            match node.kind() {
                _ if node.level() > level - 1 => out.push(self.subtree(id)),
                NodeKind::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
                // Leaves carry level n >= level, so the guard above takes them.
                NodeKind::Leaf { .. } => out.push(self.subtree(id)),
            }
        }
        debug_assert_eq!(out.len(), level);
        Ok(out)
    }

    /// Per-item group labels for `cut(level)`, in row-major item order.
    pub fn labels_at(&self, level: usize) -> Result<Vec<usize>> {
        let mut labels = vec![0; self.n_items()];
        for (group, subtree) in self.cut(level)?.iter().enumerate() {
            for item in subtree.items() {
                labels[item] = group;
            }
        }
        Ok(labels)
    }
}

/// Borrowed view of one subtree of a [`Dendrogram`].
#[derive(Debug, Clone, Copy)]
pub struct ClusterSubtree<'a> {
    dendrogram: &'a Dendrogram,
    id: NodeId,
}

impl<'a> ClusterSubtree<'a> {
    /// Id of the subtree's root node.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// The subtree's root node.
    pub fn node(&self) -> &'a ClusterNode {
        self.dendrogram.arena.get(self.id)
    }

    /// Number of grid cells in the subtree.
    pub fn len(&self) -> usize {
        self.node().size()
    }

    /// Never true; every subtree holds at least one leaf.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Leaf nodes, left to right.
    pub fn leaves(&self) -> impl Iterator<Item = &'a ClusterNode> {
        self.dendrogram.arena.leaves(self.id)
    }

    /// Row-major item indices of the leaves.
    pub fn items(&self) -> impl Iterator<Item = usize> + 'a {
        self.dendrogram.arena.leaves(self.id).filter_map(|n| match n.kind() {
            NodeKind::Leaf { item, .. } => Some(*item),
            NodeKind::Internal { .. } => None,
        })
    }

    /// Grid positions of the leaves.
    pub fn positions(&self) -> impl Iterator<Item = GridPos> + 'a {
        self.dendrogram.arena.leaves(self.id).filter_map(|n| match n.kind() {
            NodeKind::Leaf { pos, .. } => Some(*pos),
            NodeKind::Internal { .. } => None,
        })
    }

    /// Mean weight vector.
    pub fn centroid(&self) -> &'a [f64] {
        self.node().centroid()
    }

    /// Bounding box in grid coordinates.
    pub fn bounds(&self) -> GridBounds {
        self.node().bounds()
    }

    /// Linkage cost of the subtree's root join. `None` for leaves and for
    /// joins without distance meaning.
    pub fn merge_cost(&self) -> Option<f64> {
        self.node().merge_cost()
    }

    /// Sum of the grid's mapped-input counts over the leaves.
    pub fn mapped_input_count(&self) -> usize {
        self.node().mapped_inputs()
    }

    /// The two subtrees joined at this node.
    pub fn children(&self) -> Option<(ClusterSubtree<'a>, ClusterSubtree<'a>)> {
        self.node()
            .children()
            .map(|(l, r)| (self.dendrogram.subtree(l), self.dendrogram.subtree(r)))
    }
}
