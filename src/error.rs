use thiserror::Error;

/// Errors produced by the grouping engine.
///
/// Every failure is a caller contract violation detected before any traversal
/// starts; there is nothing transient to retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GroupingError {
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InputError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("no items to group")]
    Empty,

    #[error("embedding vectors must have at least one dimension")]
    ZeroDimension,

    #[error("vector {index} has length {found}, expected {expected}")]
    DimensionMismatch {
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("vector {index} contains a non-finite component")]
    NonFinite { index: usize },

    #[error("distance matrix row {row} has {found} columns, expected {expected}")]
    NotSquare {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("got {found} entity tag sets for {expected} items")]
    TagCountMismatch { expected: usize, found: usize },

    #[error("item at position {position} carries index {index}")]
    IndexMismatch { position: usize, index: usize },
}

impl GroupingError {
    pub fn input(&self) -> &InputError {
        match self {
            GroupingError::InvalidInput(inner) => inner,
        }
    }
}

pub type Result<T> = std::result::Result<T, GroupingError>;
