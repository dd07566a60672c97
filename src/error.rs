use core::fmt;

/// Result alias for `somcluster`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the clustering builders and dendrogram queries.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The grid holds no items.
    EmptyInput,

    /// Two vectors of different length were compared.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// A grid cell has no weight vector. Grid builders only accept dense
    /// rectangular grids.
    MissingCell {
        /// Row of the hole.
        row: usize,
        /// Column of the hole.
        col: usize,
    },

    /// Invalid number of clusters requested (zero, or more than the items).
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// A dendrogram was asked for a cut outside `1..=n_items`.
    InvalidCutLevel {
        /// Requested level.
        level: usize,
        /// Number of items in the dendrogram.
        n_items: usize,
    },

    /// The progress port requested cancellation.
    ClusteringAborted,

    /// The candidate graph did not connect every item into one tree.
    DisconnectedGraph,

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: &'static str,
    },
}

impl Error {
    /// True for the cooperative cancellation outcome.
    ///
    /// Cancellation is a normal early exit, not a defect.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::ClusteringAborted)
    }

    /// True for errors caused by the caller's input rather than the run.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Error::EmptyInput
                | Error::DimensionMismatch { .. }
                | Error::MissingCell { .. }
                | Error::InvalidClusterCount { .. }
                | Error::InvalidCutLevel { .. }
                | Error::InvalidParameter { .. }
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::MissingCell { row, col } => {
                write!(f, "grid cell ({row}, {col}) has no weight vector")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidCutLevel { level, n_items } => {
                write!(f, "cut level {level} outside 1..={n_items}")
            }
            Error::ClusteringAborted => write!(f, "clustering aborted"),
            Error::DisconnectedGraph => write!(f, "candidate graph is disconnected"),
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
        }
    }
}

impl std::error::Error for Error {}
