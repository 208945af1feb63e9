//! Heap table: typed relation operations over a heap file.

use std::path::Path;

use log::debug;

use crate::datum::{DataType, Value};
use crate::heap::{Handle, HeapError, HeapFile, MAX_RECORD_SIZE};
use crate::storage::{BlockId, StorageError};

use super::error::TableError;
use super::row::Row;

/// An unordered (heap) table with a declared schema.
///
/// The schema is an ordered sequence of `(column name, data type)` pairs,
/// supplied at construction as parallel vectors; the marshalled byte layout
/// of every row follows this declared order. No catalog is persisted; the
/// caller supplies the same schema each time it reopens the relation.
///
/// All operations are synchronous and require exclusive access (`&mut self`);
/// see the crate-level notes on the single-threaded resource model.
///
/// # Example
///
/// ```no_run
/// use heapstore::datum::{DataType, Value};
/// use heapstore::table::{HeapTable, Row};
///
/// let mut table = HeapTable::new(
///     "users",
///     vec!["id".into(), "name".into()],
///     vec![DataType::Int, DataType::Text],
///     std::path::Path::new("/var/lib/mydb"),
/// );
/// table.create()?;
/// let handle = table.insert(
///     &Row::new()
///         .with("id", Value::Int(1))
///         .with("name", Value::Text("ada".into())),
/// )?;
/// let row = table.project(handle)?;
/// # Ok::<(), heapstore::table::TableError>(())
/// ```
pub struct HeapTable {
    column_names: Vec<String>,
    column_types: Vec<DataType>,
    file: HeapFile,
}

impl HeapTable {
    /// Creates a table handle for `name` under `home`.
    ///
    /// `column_names` and `column_types` are parallel; position `i` describes
    /// column `i`.
    ///
    /// # Panics
    ///
    /// Panics if the two schema vectors differ in length.
    pub fn new(
        name: &str,
        column_names: Vec<String>,
        column_types: Vec<DataType>,
        home: &Path,
    ) -> Self {
        assert_eq!(
            column_names.len(),
            column_types.len(),
            "column names and types must be parallel"
        );
        Self {
            column_names,
            column_types,
            file: HeapFile::new(name, home),
        }
    }

    /// Returns the table name.
    pub fn name(&self) -> &str {
        self.file.name()
    }

    /// Returns the declared column names, in schema order.
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    /// Creates the backing heap file. Fails if the relation already exists.
    pub fn create(&mut self) -> Result<(), TableError> {
        self.file.create()?;
        debug!("created table {}", self.name());
        Ok(())
    }

    /// Opens the relation, creating it first if its backing file is missing.
    pub fn create_if_not_exists(&mut self) -> Result<(), TableError> {
        match self.file.open() {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound(_)) => self.create(),
            Err(e) => Err(e.into()),
        }
    }

    /// Opens the backing heap file. A no-op if already open.
    pub fn open(&mut self) -> Result<(), TableError> {
        self.file.open()?;
        Ok(())
    }

    /// Closes the backing heap file.
    pub fn close(&mut self) -> Result<(), TableError> {
        self.file.close()?;
        Ok(())
    }

    /// Drops the relation: closes it and removes the backing file.
    pub fn drop(&mut self) -> Result<(), TableError> {
        self.file.drop()?;
        debug!("dropped table {}", self.name());
        Ok(())
    }

    /// Inserts a row and returns its handle.
    ///
    /// The relation is opened if necessary. The row must supply a value of
    /// the declared type for every schema column; extra columns are silently
    /// dropped. The row is appended to the last block, or to a freshly
    /// allocated block when that one is full.
    ///
    /// # Errors
    ///
    /// Returns `MissingColumn` / `TypeMismatch` for an invalid row and
    /// `RowTooLarge` if the marshalled row cannot fit even an empty page.
    pub fn insert(&mut self, row: &Row) -> Result<Handle, TableError> {
        self.file.open()?;
        let full = self.validate(row)?;
        let data = self.marshal(&full)?;
        self.append(&data)
    }

    /// Deletes the row at the given handle, tombstoning its record.
    ///
    /// The record id stays reserved, so other handles into the same block
    /// remain valid. Deleting an already-dead handle is a no-op.
    pub fn del(&mut self, handle: Handle) -> Result<(), TableError> {
        let mut page = self.file.get(handle.block_id)?;
        page.del(handle.record_id);
        self.file.put(&page)?;
        Ok(())
    }

    /// Updates the row at the given handle, overlaying `new_values` on the
    /// stored row, and returns the row's authoritative handle.
    ///
    /// The update happens in place when the page can absorb the new size; the
    /// returned handle then equals `handle`. When the page is out of room,
    /// the old record is tombstoned and the row is appended elsewhere; the
    /// returned handle differs and `handle` is dead from then on. Callers
    /// must adopt the returned handle.
    ///
    /// # Errors
    ///
    /// Returns `InvalidHandle` if the handle's record is dead and
    /// `TypeMismatch` if an overlaid value does not match the schema.
    pub fn update(&mut self, handle: Handle, new_values: &Row) -> Result<Handle, TableError> {
        let mut page = self.file.get(handle.block_id)?;
        let mut merged = match page.get(handle.record_id) {
            Some(bytes) => self.unmarshal(bytes)?,
            None => return Err(TableError::InvalidHandle(handle)),
        };
        for (column, value) in new_values.iter() {
            if self.column_names.iter().any(|c| c == column) {
                merged.set(column, value.clone());
            }
        }
        let merged = self.validate(&merged)?;
        let data = self.marshal(&merged)?;

        match page.put(handle.record_id, &data) {
            Ok(()) => {
                self.file.put(&page)?;
                Ok(handle)
            }
            Err(HeapError::NoRoom { .. }) => {
                debug!("relocating row {} in table {}", handle, self.name());
                page.del(handle.record_id);
                self.file.put(&page)?;
                self.append(&data)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Returns handles for every row in the table.
    pub fn select(&mut self) -> Result<Vec<Handle>, TableError> {
        self.scan(None)
    }

    /// Returns handles for every row matching the predicate.
    ///
    /// The predicate is a conjunction of equality constraints: a row matches
    /// when its value equals the predicate's value for every predicate
    /// column.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if the predicate names an undeclared column.
    pub fn select_where(&mut self, predicate: &Row) -> Result<Vec<Handle>, TableError> {
        for (column, _) in predicate.iter() {
            if !self.column_names.iter().any(|c| c == column) {
                return Err(TableError::UnknownColumn(column.to_string()));
            }
        }
        self.scan(Some(predicate))
    }

    /// Returns the full row at the given handle.
    pub fn project(&mut self, handle: Handle) -> Result<Row, TableError> {
        let page = self.file.get(handle.block_id)?;
        let bytes = page
            .get(handle.record_id)
            .ok_or(TableError::InvalidHandle(handle))?;
        self.unmarshal(bytes)
    }

    /// Returns the row at the given handle restricted to `columns`.
    ///
    /// An empty `columns` slice means the whole row.
    ///
    /// # Errors
    ///
    /// Returns `UnknownColumn` if a requested column is not in the schema.
    pub fn project_columns(
        &mut self,
        handle: Handle,
        columns: &[String],
    ) -> Result<Row, TableError> {
        let row = self.project(handle)?;
        if columns.is_empty() {
            return Ok(row);
        }
        let mut projected = Row::new();
        for column in columns {
            match row.get(column) {
                Some(value) => projected.set(column.clone(), value.clone()),
                None => return Err(TableError::UnknownColumn(column.clone())),
            }
        }
        Ok(projected)
    }

    /// Builds the full row in schema order from the caller's row.
    ///
    /// Extra columns in the input are silently dropped; there is no type
    /// coercion.
    fn validate(&self, row: &Row) -> Result<Row, TableError> {
        let mut full = Row::new();
        for (name, ty) in self.column_names.iter().zip(&self.column_types) {
            let value = row
                .get(name)
                .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
            if value.data_type() != *ty {
                return Err(TableError::TypeMismatch {
                    column: name.clone(),
                    expected: *ty,
                });
            }
            full.set(name.clone(), value.clone());
        }
        Ok(full)
    }

    /// Serializes a validated row into its on-page byte encoding, columns in
    /// schema order, exactly sized.
    fn marshal(&self, row: &Row) -> Result<Vec<u8>, TableError> {
        let mut size = 0;
        for name in &self.column_names {
            let value = row
                .get(name)
                .ok_or_else(|| TableError::MissingColumn(name.clone()))?;
            size += value.serialized_size();
        }

        let mut data = vec![0u8; size];
        let mut offset = 0;
        for name in &self.column_names {
            if let Some(value) = row.get(name) {
                offset += value.serialize(&mut data[offset..])?;
            }
        }
        debug_assert_eq!(offset, size);
        Ok(data)
    }

    /// Mirror of `marshal`: decodes a record back into an owned row.
    fn unmarshal(&self, data: &[u8]) -> Result<Row, TableError> {
        let mut row = Row::new();
        let mut offset = 0;
        for (name, ty) in self.column_names.iter().zip(&self.column_types) {
            let (value, consumed) = Value::deserialize(&data[offset..], *ty)?;
            row.set(name.clone(), value);
            offset += consumed;
        }
        Ok(row)
    }

    /// Appends marshalled row bytes, allocating a fresh block when the last
    /// one is full.
    fn append(&mut self, data: &[u8]) -> Result<Handle, TableError> {
        let mut page = self.file.get(self.file.last_block_id())?;
        let record_id = match page.add(data) {
            Ok(id) => id,
            Err(HeapError::NoRoom { .. }) => {
                page = self.file.get_new()?;
                match page.add(data) {
                    Ok(id) => id,
                    Err(HeapError::NoRoom { .. }) => {
                        return Err(TableError::RowTooLarge {
                            size: data.len(),
                            max: MAX_RECORD_SIZE,
                        });
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            Err(e) => return Err(e.into()),
        };
        self.file.put(&page)?;
        Ok(Handle::new(page.block_id(), record_id))
    }

    /// Full scan, optionally filtered by an equality predicate.
    fn scan(&mut self, predicate: Option<&Row>) -> Result<Vec<Handle>, TableError> {
        let mut handles = Vec::new();
        let block_ids: Vec<BlockId> = self.file.block_ids().collect();
        for block_id in block_ids {
            let page = self.file.get(block_id)?;
            for record_id in page.ids() {
                if let Some(filter) = predicate {
                    let Some(bytes) = page.get(record_id) else {
                        continue;
                    };
                    let row = self.unmarshal(bytes)?;
                    if !filter.iter().all(|(column, value)| row.get(column) == Some(value)) {
                        continue;
                    }
                }
                handles.push(Handle::new(block_id, record_id));
            }
        }
        Ok(handles)
    }
}
