//! Record-oriented block file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::storage::{BLOCK_SIZE, BlockId, StorageError};

/// A file of fixed-size blocks keyed by 1-based block number.
///
/// Blocks are stored as contiguous 4KB spans of a single file:
///
/// ```text
/// +------------------+------------------+------------------+
/// | Block 1 (4KB)    | Block 2 (4KB)    | Block 3 (4KB)    | ...
/// +------------------+------------------+------------------+
/// ^ offset 0         ^ offset 4096      ^ offset 8192
/// ```
///
/// The block count is recovered from the file size on open, so the file
/// carries no header of its own. The handle is exclusively owned; all
/// operations are synchronous and run to completion.
pub struct BlockFile {
    /// Path to the backing file.
    path: PathBuf,
    /// Open file handle.
    file: File,
    /// Number of blocks currently in the file.
    block_count: u32,
}

impl BlockFile {
    /// Creates a new, empty block file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if a file is already present at
    /// the path.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => StorageError::AlreadyExists(path.clone()),
                _ => StorageError::Io(e),
            })?;

        Ok(Self {
            path,
            file,
            block_count: 0,
        })
    }

    /// Opens an existing block file and recovers its block count from the
    /// file size.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if no file exists at the path.
    /// Returns `StorageError::Corrupted` if the file size is not a multiple
    /// of BLOCK_SIZE.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => StorageError::NotFound(path.clone()),
                _ => StorageError::Io(e),
            })?;

        let file_size = file.metadata()?.len();
        if file_size % BLOCK_SIZE as u64 != 0 {
            return Err(StorageError::Corrupted(format!(
                "file size {} is not a multiple of block size {}",
                file_size, BLOCK_SIZE
            )));
        }

        Ok(Self {
            path,
            file,
            block_count: (file_size / BLOCK_SIZE as u64) as u32,
        })
    }

    /// Reads a block into a caller-provided buffer.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != BLOCK_SIZE`.
    /// Returns `StorageError::BlockNotFound` if the block has not been written.
    pub fn read_block(&mut self, block_id: BlockId, buf: &mut [u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }
        if block_id.number() == 0 || block_id.number() > self.block_count {
            return Err(StorageError::BlockNotFound(block_id));
        }

        self.file.seek(SeekFrom::Start(block_id.byte_offset()))?;
        self.file.read_exact(buf)?;
        Ok(())
    }

    /// Writes a full block from a caller-provided buffer.
    ///
    /// A write may target an existing block or append exactly one block past
    /// the current end of the file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidBufferSize` if `buf.len() != BLOCK_SIZE`.
    /// Returns `StorageError::InvalidBlockId` for block 0 or a block number
    /// more than one past the end.
    pub fn write_block(&mut self, block_id: BlockId, buf: &[u8]) -> Result<(), StorageError> {
        if buf.len() != BLOCK_SIZE {
            return Err(StorageError::InvalidBufferSize {
                expected: BLOCK_SIZE,
                actual: buf.len(),
            });
        }
        let number = block_id.number();
        if number == 0 || number > self.block_count + 1 {
            return Err(StorageError::InvalidBlockId(block_id));
        }

        self.file.seek(SeekFrom::Start(block_id.byte_offset()))?;
        self.file.write_all(buf)?;
        if number == self.block_count + 1 {
            self.block_count = number;
        }
        Ok(())
    }

    /// Returns the number of blocks in the file.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Syncs all pending writes to physical disk (fsync).
    pub fn sync_all(&mut self) -> Result<(), StorageError> {
        self.file.sync_all()?;
        Ok(())
    }

    /// Returns the path to the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
