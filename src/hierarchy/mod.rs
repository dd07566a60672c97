//! Merge trees produced by the grid clustering builders.
//!
//! # Structure
//!
//! Every builder run owns a [`NodeArena`]. Leaves are created first, one per
//! grid cell, and each merge appends an internal node that owns its two
//! children by id:
//!
//! ```text
//!            6  level 1
//!           / \
//!          4   5  level 3, level 2
//!         / \ / \
//!        0  1 2  3  leaves (level 4)
//! ```
//!
//! A node's `level` is the number of clusters that remained right after it
//! was created, so the clustering into `L` groups is the set of nodes with
//! `level >= L` whose parent has `level < L`. [`Dendrogram::cut`] finds them
//! by walking down from the root.
//!
//! Node ids double as creation sequence numbers. Builders use them as the
//! deterministic tie-break between equal-cost merge candidates.

mod dendrogram;
mod node;
mod validate;

pub use dendrogram::{ClusterSubtree, Dendrogram};
pub use node::{ClusterNode, Leaves, NodeArena, NodeId, NodeKind};
pub use validate::{
    validate_dendrogram, HealthCheck, Severity, ValidationIssue, ValidationReport,
};
