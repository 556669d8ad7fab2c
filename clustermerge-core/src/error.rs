//! Error types for clustermerge-core.

use thiserror::Error;

/// Result type alias for clustermerge operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for clustermerge operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A cell points at a cluster index that does not exist in its event.
    #[error("event {event_id}: cell {cell} references missing cluster {cluster_id}")]
    DanglingCellReference {
        event_id: i32,
        cell: usize,
        cluster_id: i32,
    },

    /// Two clusters in the same event share one index.
    #[error("event {event_id}: duplicate cluster index {index}")]
    DuplicateClusterIndex { event_id: i32, index: i32 },

    /// Columns that must be parallel have different lengths.
    #[error("event {event_id}: column {column} has {actual} entries, expected {expected}")]
    ColumnLengthMismatch {
        event_id: i32,
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A field holds a value outside its domain.
    #[error("event {event_id}: invalid {field} value {value}")]
    InvalidField {
        event_id: i32,
        field: &'static str,
        value: i64,
    },

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for violations of cell/cluster referential integrity.
    #[must_use]
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Self::DanglingCellReference { .. } | Self::DuplicateClusterIndex { .. }
        )
    }

    /// Event the error was raised for, if any.
    #[must_use]
    pub fn event_id(&self) -> Option<i32> {
        match self {
            Self::DanglingCellReference { event_id, .. }
            | Self::DuplicateClusterIndex { event_id, .. }
            | Self::ColumnLengthMismatch { event_id, .. }
            | Self::InvalidField { event_id, .. } => Some(*event_id),
            Self::Config(_) => None,
        }
    }
}
