//! Batching error types

use thiserror::Error;

use crate::batch::BatchId;

/// Errors raised by geometry buffer operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeometryError {
    /// Slice range is not within `0..=len` or is reversed
    #[error("slice {start}..{end} is out of range for {len} vertices")]
    SliceOutOfRange {
        start: usize,
        end: usize,
        len: usize,
    },

    /// `update` source does not have the destination's length
    #[error("cannot update {expected} vertices from a source of {found}")]
    LengthMismatch { expected: usize, found: usize },
}

/// Errors raised while batching draws
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// A picture proxy was requested for a picture other than the batch's own
    #[error("picture is not the picture bound to batch {batch}")]
    ForeignPicture { batch: BatchId },

    /// Triangles made by one batch were drawn through another batch's picture
    #[error("triangles made by batch {owner} cannot be drawn through batch {target}")]
    ForeignTriangles { owner: BatchId, target: BatchId },

    /// Batch state is already borrowed, e.g. by a live `Batch::container()`
    #[error("batch {batch} is busy: its container is borrowed")]
    BatchBusy { batch: BatchId },

    /// Buffer operation failed
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Broad classification of a [`BatchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Programmer error. Continuing would silently render wrong output, so
    /// callers should treat this as fatal.
    InvariantViolation,
    /// Bad indices or lengths handed to a buffer operation
    InvalidArgument,
}

impl BatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BatchError::ForeignPicture { .. }
            | BatchError::ForeignTriangles { .. }
            | BatchError::BatchBusy { .. } => ErrorKind::InvariantViolation,
            BatchError::Geometry(_) => ErrorKind::InvalidArgument,
        }
    }

    pub fn is_invariant_violation(&self) -> bool {
        self.kind() == ErrorKind::InvariantViolation
    }
}

/// Result type for batching operations
pub type Result<T> = std::result::Result<T, BatchError>;
