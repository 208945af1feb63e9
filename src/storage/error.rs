//! Storage layer errors.

use std::path::PathBuf;

use crate::storage::BlockId;

/// Storage layer errors.
#[derive(Debug)]
pub enum StorageError {
    /// Block not found in the file.
    ///
    /// This occurs when reading a block number beyond the allocated count
    /// (or block 0, which is never valid).
    BlockNotFound(BlockId),

    /// Invalid block number for a write.
    ///
    /// Writes may target an existing block or extend the file by exactly one
    /// block; anything else is rejected.
    InvalidBlockId(BlockId),

    /// Invalid buffer size provided to a block read or write.
    ///
    /// Buffers must be exactly BLOCK_SIZE bytes.
    InvalidBufferSize {
        /// Expected buffer size (BLOCK_SIZE).
        expected: usize,
        /// Actual buffer size provided.
        actual: usize,
    },

    /// No file exists at the given path.
    NotFound(PathBuf),

    /// A file already exists at the given path.
    AlreadyExists(PathBuf),

    /// Data corruption detected.
    ///
    /// This indicates that the backing file has an invalid size or format.
    Corrupted(String),

    /// Operation on a closed heap file.
    Closed,

    /// I/O error from the underlying file system.
    Io(std::io::Error),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::BlockNotFound(id) => write!(f, "block not found: {}", id),
            StorageError::InvalidBlockId(id) => write!(f, "invalid block id: {}", id),
            StorageError::InvalidBufferSize { expected, actual } => {
                write!(f, "invalid buffer size: expected {}, got {}", expected, actual)
            }
            StorageError::NotFound(path) => write!(f, "no such file: {}", path.display()),
            StorageError::AlreadyExists(path) => {
                write!(f, "file already exists: {}", path.display())
            }
            StorageError::Corrupted(msg) => write!(f, "data corruption: {}", msg),
            StorageError::Closed => write!(f, "heap file is closed"),
            StorageError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}
