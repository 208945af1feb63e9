//! Relation layer errors.

use std::fmt;

use crate::datum::{DataType, SerializationError};
use crate::heap::{Handle, HeapError};
use crate::storage::StorageError;

/// Errors from relation operations.
#[derive(Debug)]
pub enum TableError {
    /// A single marshalled row exceeds page capacity.
    RowTooLarge {
        /// Marshalled row size in bytes.
        size: usize,
        /// Largest row a fresh page accepts.
        max: usize,
    },

    /// An inserted row omits a declared column.
    MissingColumn(String),

    /// A requested column is not declared in the schema.
    UnknownColumn(String),

    /// A row value does not match the declared column type.
    TypeMismatch {
        /// Column whose value is mistyped.
        column: String,
        /// Declared type of the column.
        expected: DataType,
    },

    /// The handle's record is tombstoned or was never assigned.
    InvalidHandle(Handle),

    /// Row marshalling or unmarshalling failed.
    Serialization(SerializationError),

    /// Internal page error.
    Heap(HeapError),

    /// Internal storage error.
    Storage(StorageError),
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableError::RowTooLarge { size, max } => {
                write!(f, "row of {} bytes exceeds page capacity of {}", size, max)
            }
            TableError::MissingColumn(name) => {
                write!(f, "row is missing declared column \"{}\"", name)
            }
            TableError::UnknownColumn(name) => {
                write!(f, "table does not contain column \"{}\"", name)
            }
            TableError::TypeMismatch { column, expected } => {
                write!(f, "column \"{}\" expects a {} value", column, expected)
            }
            TableError::InvalidHandle(handle) => {
                write!(f, "no row at handle {}", handle)
            }
            TableError::Serialization(e) => write!(f, "serialization error: {}", e),
            TableError::Heap(e) => write!(f, "heap error: {}", e),
            TableError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TableError::Serialization(e) => Some(e),
            TableError::Heap(e) => Some(e),
            TableError::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<SerializationError> for TableError {
    fn from(e: SerializationError) -> Self {
        TableError::Serialization(e)
    }
}

impl From<HeapError> for TableError {
    fn from(e: HeapError) -> Self {
        TableError::Heap(e)
    }
}

impl From<StorageError> for TableError {
    fn from(e: StorageError) -> Self {
        TableError::Storage(e)
    }
}
