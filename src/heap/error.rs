//! Error types for the heap module.

use std::fmt;

use super::page::RecordId;

/// Errors from slotted page operations.
#[derive(Debug)]
pub enum HeapError {
    /// Page has no room for the record.
    ///
    /// This is the sole recoverable page error; the append path reacts by
    /// allocating a fresh block.
    NoRoom {
        /// Bytes required for the payload and its slot.
        required: usize,
        /// Bytes available in free space.
        available: usize,
    },
    /// Record id is tombstoned or was never assigned.
    RecordNotFound(RecordId),
}

impl fmt::Display for HeapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeapError::NoRoom {
                required,
                available,
            } => {
                write!(
                    f,
                    "no room in page: need {} bytes, have {} available",
                    required, available
                )
            }
            HeapError::RecordNotFound(record_id) => {
                write!(f, "record {} not found or deleted", record_id)
            }
        }
    }
}

impl std::error::Error for HeapError {}
