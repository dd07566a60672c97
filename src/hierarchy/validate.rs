//! Structural validation of dendrograms.
//!
//! Checks the invariants every builder must uphold:
//! - exactly `n` leaves and `n - 1` internal nodes under a single root
//! - every leaf reachable from the root exactly once (disjoint leaf sets)
//! - parent pointers agree with child lists
//! - levels strictly decrease from child to parent
//! - sizes add up, merge costs are finite and non-negative
//!
//! # Example
//!
//! ```rust
//! use somcluster::cluster::{LinkageBuilder, SingleLinkage};
//! use somcluster::hierarchy::HealthCheck;
//! use somcluster::{Euclidean, NoProgress, WeightGrid};
//!
//! let grid = WeightGrid::from_fn(3, 3, |r, c| vec![r as f64, c as f64]);
//! let dendrogram = SingleLinkage::new().build(&grid, &Euclidean, &NoProgress).unwrap();
//! let report = dendrogram.health_check();
//! assert!(report.is_healthy(), "{report}");
//! ```

use std::collections::HashSet;
use std::fmt;

use super::{Dendrogram, NodeId, NodeKind};

/// How bad a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Legal but worth a look, e.g. a cost inversion.
    Warning,
    /// A structural defect; cuts on this tree are not trustworthy.
    Error,
    /// The tree is not a single binary tree over all items.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        })
    }
}

/// One finding of a health check.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    /// How bad the finding is.
    pub severity: Severity,
    /// Human-readable description.
    pub message: String,
    /// Node the finding is about, if it concerns one.
    pub node: Option<NodeId>,
}

impl ValidationIssue {
    /// Create an issue not tied to a node.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            node: None,
        }
    }

    /// Attach the node the issue is about.
    pub fn with_node(self, node: NodeId) -> Self {
        Self {
            node: Some(node),
            ..self
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{}: {} at {node}", self.severity, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Findings of [`validate_dendrogram`].
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// All findings, in discovery order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a finding.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    fn flag(&mut self, severity: Severity, node: NodeId, message: impl Into<String>) {
        self.add(ValidationIssue::new(severity, message).with_node(node));
    }

    /// Warnings only (or nothing at all).
    pub fn is_healthy(&self) -> bool {
        self.max_severity().map_or(true, |s| s == Severity::Warning)
    }

    /// Worst severity found, if any.
    pub fn max_severity(&self) -> Option<Severity> {
        self.issues.iter().map(|i| i.severity).max()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.issues.is_empty() {
            return f.write_str("no issues");
        }
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Types that can check their own structure.
pub trait HealthCheck {
    /// Run all structural checks.
    fn health_check(&self) -> ValidationReport;
}

impl HealthCheck for Dendrogram {
    fn health_check(&self) -> ValidationReport {
        validate_dendrogram(self)
    }
}

/// Check every structural invariant of `dendrogram`.
pub fn validate_dendrogram(dendrogram: &Dendrogram) -> ValidationReport {
    let mut report = ValidationReport::new();
    let arena = dendrogram.arena();
    let n = dendrogram.n_items();

    let leaves = arena.iter().filter(|node| node.is_leaf()).count();
    if leaves != n {
        report.add(ValidationIssue::new(
            Severity::Critical,
            format!("expected {n} leaves, found {leaves}"),
        ));
    }
    let internal = arena.len() - leaves;
    if internal + 1 != n {
        report.add(ValidationIssue::new(
            Severity::Critical,
            format!("expected {} internal nodes, found {internal}", n.saturating_sub(1)),
        ));
    }
    let roots = arena.roots().count();
    if roots != 1 {
        report.add(ValidationIssue::new(
            Severity::Critical,
            format!("expected a single root, found {roots}"),
        ));
    }

    // Walk from the root; a leaf seen twice means two parents share it.
    let mut seen = HashSet::new();
    let mut stack = vec![dendrogram.root().id()];
    while let Some(id) = stack.pop() {
        if !seen.insert(id) {
            report.flag(Severity::Critical, id, "node reachable twice");
            continue;
        }
        let node = arena.get(id);
        let NodeKind::Internal {
            left,
            right,
            merge_cost,
        } = *node.kind()
        else {
            continue;
        };

        for child in [left, right] {
            let c = arena.get(child);
            if c.parent() != Some(id) {
                report.flag(Severity::Error, child, "child does not point back to its parent");
            }
            if c.level() <= node.level() {
                report.flag(Severity::Error, id, "level does not decrease toward the root");
            }
            if let (Some(own), Some(below)) = (merge_cost, c.merge_cost()) {
                if own < below {
                    report.flag(
                        Severity::Warning,
                        id,
                        format!("cost inversion: {own} joins a child merged at {below}"),
                    );
                }
            }
        }
        if arena.get(left).size() + arena.get(right).size() != node.size() {
            report.flag(Severity::Error, id, "size is not the sum of the child sizes");
        }
        if let Some(cost) = merge_cost {
            if !cost.is_finite() || cost < 0.0 {
                report.flag(Severity::Error, id, format!("invalid merge cost {cost}"));
            }
        }
        stack.push(right);
        stack.push(left);
    }

    let orphans = arena.len() - seen.len();
    if orphans > 0 {
        report.add(ValidationIssue::new(
            Severity::Error,
            format!("{orphans} nodes not reachable from the root"),
        ));
    }

    report
}
