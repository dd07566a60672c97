//! Cluster nodes and the arena that owns them.
//!
//! Every node a builder creates lives in one [`NodeArena`] and is addressed
//! by its [`NodeId`], which is also its creation sequence number. Leaves get
//! ids `0..n_items` in row-major order, each merge appends one internal node.
//! A merged node keeps a parent pointer to the node that absorbed it, so the
//! arena doubles as a union-find forest (without path compression).

use core::fmt;

use crate::grid::{GridBounds, GridItems, GridPos};

/// Index of a node in its arena. Ordered by creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Position in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Leaf or internal.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A single grid cell.
    Leaf {
        /// Row-major item index.
        item: usize,
        /// Cell position.
        pos: GridPos,
    },
    /// Union of two earlier roots.
    Internal {
        /// First child.
        left: NodeId,
        /// Second child.
        right: NodeId,
        /// Linkage cost of the join. `None` when the join carries no
        /// distance meaning (see [`FlatPartition::to_dendrogram`](crate::cluster::FlatPartition::to_dendrogram)).
        merge_cost: Option<f64>,
    },
}

/// A node of the merge forest.
#[derive(Debug, Clone)]
pub struct ClusterNode {
    id: NodeId,
    kind: NodeKind,
    level: usize,
    size: usize,
    centroid: Vec<f64>,
    bounds: GridBounds,
    mapped_inputs: usize,
    parent: Option<NodeId>,
}

impl ClusterNode {
    /// Creation sequence id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Leaf or internal payload.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Number of clusters left after this node was created.
    ///
    /// Leaves carry the item count. Not a distance.
    pub fn level(&self) -> usize {
        self.level
    }

    /// Number of leaves below (and including) this node.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Mean weight vector of the leaves below.
    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    /// Bounding box of the leaves in grid coordinates.
    pub fn bounds(&self) -> GridBounds {
        self.bounds
    }

    /// Sum of the mapped-input counts of the leaves below.
    pub fn mapped_inputs(&self) -> usize {
        self.mapped_inputs
    }

    /// The node this one was merged into, if any.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// True for single-cell nodes.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }

    /// Children of an internal node.
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Internal { left, right, .. } => Some((left, right)),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Linkage cost of an internal node, when meaningful.
    pub fn merge_cost(&self) -> Option<f64> {
        match self.kind {
            NodeKind::Internal { merge_cost, .. } => merge_cost,
            NodeKind::Leaf { .. } => None,
        }
    }
}

impl fmt::Display for ClusterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            NodeKind::Leaf { pos, .. } => write!(f, "Leaf{}({}, {})", self.id, pos.row, pos.col),
            NodeKind::Internal {
                left,
                right,
                merge_cost,
            } => {
                write!(f, "Node{} L{} [{left} + {right}]", self.id, self.level)?;
                if let Some(cost) = merge_cost {
                    write!(f, " @ {cost:.4}")?;
                }
                Ok(())
            }
        }
    }
}

/// Owns every node created during one builder run.
#[derive(Debug, Clone)]
pub struct NodeArena {
    nodes: Vec<ClusterNode>,
    n_items: usize,
}

impl NodeArena {
    /// One leaf per item, ids in row-major order.
    pub fn from_items(items: &GridItems) -> Self {
        let n = items.len();
        let mut nodes = Vec::with_capacity(2 * n.max(1) - 1);
        for (i, item) in items.items().iter().enumerate() {
            nodes.push(ClusterNode {
                id: NodeId(i),
                kind: NodeKind::Leaf {
                    item: i,
                    pos: item.pos,
                },
                level: n,
                size: 1,
                centroid: item.vector.clone(),
                bounds: GridBounds::point(item.pos),
                mapped_inputs: item.mapped_inputs,
                parent: None,
            });
        }
        Self { nodes, n_items: n }
    }

    /// Join two current roots into a new node and return its id.
    ///
    /// Both inputs stop being roots. The new node's level is the number of
    /// clusters left after the join.
    pub fn merge(&mut self, a: NodeId, b: NodeId, merge_cost: Option<f64>) -> NodeId {
        debug_assert!(a != b, "cannot merge {a} with itself");
        debug_assert!(self.is_root(a) && self.is_root(b), "{a} or {b} already merged");

        let id = NodeId(self.nodes.len());
        let (na, nb) = (&self.nodes[a.0], &self.nodes[b.0]);
        let size = na.size + nb.size;
        let (wa, wb) = (na.size as f64, nb.size as f64);
        let centroid = na
            .centroid
            .iter()
            .zip(&nb.centroid)
            .map(|(x, y)| (wa * x + wb * y) / (wa + wb))
            .collect();
        let node = ClusterNode {
            id,
            kind: NodeKind::Internal {
                left: a,
                right: b,
                merge_cost,
            },
            level: self.n_items - (self.n_merges() + 1),
            size,
            centroid,
            bounds: na.bounds.union(nb.bounds),
            mapped_inputs: na.mapped_inputs + nb.mapped_inputs,
            parent: None,
        };
        self.nodes[a.0].parent = Some(id);
        self.nodes[b.0].parent = Some(id);
        self.nodes.push(node);
        id
    }

    /// Follow parent pointers up to the current root containing `id`.
    pub fn find_root(&self, mut id: NodeId) -> NodeId {
        while let Some(parent) = self.nodes[id.0].parent {
            id = parent;
        }
        id
    }

    /// Whether `id` has not been merged yet.
    pub fn is_root(&self, id: NodeId) -> bool {
        self.nodes[id.0].parent.is_none()
    }

    /// Ids of all current roots, ascending.
    pub fn roots(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().filter(|n| n.parent.is_none()).map(|n| n.id)
    }

    /// Id of the leaf for row-major item `i`.
    pub fn leaf_id(&self, item: usize) -> NodeId {
        debug_assert!(item < self.n_items);
        NodeId(item)
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> &ClusterNode {
        &self.nodes[id.0]
    }

    /// All nodes in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &ClusterNode> {
        self.nodes.iter()
    }

    /// Leaves below `id`, left to right.
    pub fn leaves(&self, id: NodeId) -> Leaves<'_> {
        Leaves {
            arena: self,
            stack: vec![id],
        }
    }

    /// Total nodes created.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True only for an arena over an empty grid.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges performed so far.
    pub fn n_merges(&self) -> usize {
        self.nodes.len() - self.n_items
    }
}

impl core::ops::Index<NodeId> for NodeArena {
    type Output = ClusterNode;

    fn index(&self, id: NodeId) -> &ClusterNode {
        self.get(id)
    }
}

/// Depth-first iterator over the leaves below a node.
#[derive(Debug, Clone)]
pub struct Leaves<'a> {
    arena: &'a NodeArena,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = &'a ClusterNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.stack.pop() {
            let node = self.arena.get(id);
            match node.kind {
                NodeKind::Leaf { .. } => return Some(node),
                NodeKind::Internal { left, right, .. } => {
                    self.stack.push(right);
                    self.stack.push(left);
                }
            }
        }
        None
    }
}
