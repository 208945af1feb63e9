//! Heap file: a named, persistent sequence of slotted pages.

use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::storage::{BLOCK_SIZE, BlockFile, BlockId, StorageError};

use super::page::SlottedPage;

/// A named heap file backed by a [`BlockFile`] at `<home>/<name>.db`.
///
/// The heap file owns the block-store handle and tracks `last`, the largest
/// allocated block id. Blocks are allocated by appending; there is no
/// free-list, and a page whose records have all been deleted stays in place
/// with every slot tombstoned.
///
/// Pages move between the file and the caller as whole values: [`get`]
/// hands out an owned [`SlottedPage`], and changes only reach the file on an
/// explicit [`put`].
///
/// [`get`]: HeapFile::get
/// [`put`]: HeapFile::put
pub struct HeapFile {
    name: String,
    path: PathBuf,
    store: Option<BlockFile>,
    last: u32,
}

impl HeapFile {
    /// Creates a handle for the relation `name` under `home`. No file is
    /// touched until `create` or `open`.
    pub fn new(name: &str, home: &Path) -> Self {
        Self {
            name: name.to_string(),
            path: home.join(format!("{}.db", name)),
            store: None,
            last: 0,
        }
    }

    /// Returns the relation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns true while the backing store is open.
    pub fn is_open(&self) -> bool {
        self.store.is_some()
    }

    /// Creates the backing file and allocates block 1, so that `last >= 1`
    /// holds for the whole life of the file.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the backing file exists.
    pub fn create(&mut self) -> Result<(), StorageError> {
        let store = BlockFile::create(&self.path)?;
        self.store = Some(store);
        self.last = 0;
        debug!("created heap file {}", self.path.display());
        self.get_new()?;
        Ok(())
    }

    /// Opens the backing file and recovers `last` from its block count.
    /// Opening an already-open file is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the backing file does not exist.
    pub fn open(&mut self) -> Result<(), StorageError> {
        if self.store.is_some() {
            return Ok(());
        }
        let store = BlockFile::open(&self.path)?;
        self.last = store.block_count();
        self.store = Some(store);
        debug!("opened heap file {} ({} blocks)", self.path.display(), self.last);
        Ok(())
    }

    /// Syncs and releases the backing store. Closing a closed file is a no-op.
    pub fn close(&mut self) -> Result<(), StorageError> {
        if let Some(mut store) = self.store.take() {
            store.sync_all()?;
        }
        Ok(())
    }

    /// Closes the file and removes it from the file system.
    pub fn drop(&mut self) -> Result<(), StorageError> {
        self.close()?;
        std::fs::remove_file(&self.path)?;
        self.last = 0;
        debug!("dropped heap file {}", self.path.display());
        Ok(())
    }

    /// Allocates a fresh, empty page at block `last + 1` and writes it
    /// through to the store.
    pub fn get_new(&mut self) -> Result<SlottedPage, StorageError> {
        self.last += 1;
        let page = SlottedPage::new(BlockId::new(self.last));
        self.store_mut()?.write_block(page.block_id(), page.as_bytes())?;
        trace!("allocated block {} in {}", page.block_id(), self.name);
        Ok(page)
    }

    /// Reads the page for the given block id.
    pub fn get(&mut self, block_id: BlockId) -> Result<SlottedPage, StorageError> {
        let mut data = Box::new([0u8; BLOCK_SIZE]);
        self.store_mut()?.read_block(block_id, &mut data[..])?;
        Ok(SlottedPage::from_bytes(block_id, data))
    }

    /// Writes a page back to its block.
    pub fn put(&mut self, page: &SlottedPage) -> Result<(), StorageError> {
        self.store_mut()?.write_block(page.block_id(), page.as_bytes())
    }

    /// Returns every allocated block id, `1..=last`.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + use<> {
        (1..=self.last).map(BlockId::new)
    }

    /// Returns the largest allocated block id.
    pub fn last_block_id(&self) -> BlockId {
        BlockId::new(self.last)
    }

    fn store_mut(&mut self) -> Result<&mut BlockFile, StorageError> {
        self.store.as_mut().ok_or(StorageError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_allocates_block_one() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());

        file.create().unwrap();
        assert!(file.is_open());
        assert_eq!(file.last_block_id(), BlockId::new(1));
        assert_eq!(file.block_ids().collect::<Vec<_>>(), vec![BlockId::new(1)]);

        let page = file.get(BlockId::new(1)).unwrap();
        assert_eq!(page.record_count(), 0);
    }

    #[test]
    fn test_create_twice_fails() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());
        file.create().unwrap();
        file.close().unwrap();

        let mut second = HeapFile::new("t", dir.path());
        assert!(matches!(
            second.create(),
            Err(StorageError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_open_missing_fails() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("missing", dir.path());
        assert!(matches!(file.open(), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_open_recovers_last() {
        let dir = tempdir().unwrap();

        {
            let mut file = HeapFile::new("t", dir.path());
            file.create().unwrap();
            file.get_new().unwrap();
            file.get_new().unwrap();
            file.close().unwrap();
        }

        let mut file = HeapFile::new("t", dir.path());
        file.open().unwrap();
        assert_eq!(file.last_block_id(), BlockId::new(3));
    }

    #[test]
    fn test_get_put_roundtrip() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());
        file.create().unwrap();

        let mut page = file.get(BlockId::new(1)).unwrap();
        let id = page.add(b"payload").unwrap();
        file.put(&page).unwrap();

        let page = file.get(BlockId::new(1)).unwrap();
        assert_eq!(page.get(id), Some(b"payload".as_slice()));
    }

    #[test]
    fn test_closed_file_errors() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());
        file.create().unwrap();
        file.close().unwrap();

        assert!(matches!(
            file.get(BlockId::new(1)),
            Err(StorageError::Closed)
        ));
    }

    #[test]
    fn test_drop_removes_file() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());
        file.create().unwrap();
        let path = file.path().to_path_buf();
        assert!(path.exists());

        file.drop().unwrap();
        assert!(!path.exists());

        // The name can be created again afterwards
        let mut again = HeapFile::new("t", dir.path());
        again.create().unwrap();
    }

    #[test]
    fn test_block_ids_monotonic() {
        let dir = tempdir().unwrap();
        let mut file = HeapFile::new("t", dir.path());
        file.create().unwrap();

        let b2 = file.get_new().unwrap();
        let b3 = file.get_new().unwrap();
        assert_eq!(b2.block_id(), BlockId::new(2));
        assert_eq!(b3.block_id(), BlockId::new(3));
        assert_eq!(
            file.block_ids().collect::<Vec<_>>(),
            vec![BlockId::new(1), BlockId::new(2), BlockId::new(3)]
        );
    }
}
