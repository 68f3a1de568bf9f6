//! Redb (pure Rust embedded database) backend.
//!
//! Every write runs in its own ACID transaction, so a crash never leaves a
//! half-written submission or statistics snapshot behind.
//!
//! ```yaml
//! storage:
//!   backend: redb
//!   path: /var/lib/antiplag/data.redb
//! ```

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableTable, TableDefinition};

use crate::backend::StorageBackend;
use crate::error::StoreError;

const ANTIPLAG_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("antiplag_data");

/// Redb backend; the `Arc<Database>` is shared across threads, redb does its
/// own locking and MVCC.
pub struct RedbBackend {
    db: Arc<Database>,
}

impl RedbBackend {
    /// Open or create the database file at `path`.
    ///
    /// ```no_run
    /// use submission::RedbBackend;
    ///
    /// let backend = RedbBackend::open("/tmp/antiplag.redb").unwrap();
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path).map_err(|e| StoreError::backend(e.to_string()))?;

        let write_txn = db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            // Opening creates the table on first use.
            let _table = write_txn
                .open_table(ANTIPLAG_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl StorageBackend for RedbBackend {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(ANTIPLAG_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StoreError::backend(e.to_string()))?;
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(ANTIPLAG_TABLE)
            .map_err(|e| StoreError::backend(e.to_string()))?;

        let value = table
            .get(key)
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn batch_put(&self, entries: Vec<(String, Vec<u8>)>) -> Result<(), StoreError> {
        let write_txn = self
            .db
            .begin_write()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        {
            let mut table = write_txn
                .open_table(ANTIPLAG_TABLE)
                .map_err(|e| StoreError::backend(e.to_string()))?;
            for (key, value) in entries {
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| StoreError::backend(e.to_string()))?;
            }
        }
        write_txn
            .commit()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        Ok(())
    }

    fn scan_prefix(
        &self,
        prefix: &str,
        visitor: &mut dyn FnMut(&str, &[u8]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        let read_txn = self
            .db
            .begin_read()
            .map_err(|e| StoreError::backend(e.to_string()))?;
        let table = read_txn
            .open_table(ANTIPLAG_TABLE)
            .map_err(|e| StoreError::backend(e.to_string()))?;

        for item in table
            .range(prefix..)
            .map_err(|e| StoreError::backend(e.to_string()))?
        {
            let (key, value) = item.map_err(|e| StoreError::backend(e.to_string()))?;
            if !key.value().starts_with(prefix) {
                break;
            }
            visitor(key.value(), value.value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn redb_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend.put("key1", b"value1").unwrap();
        assert_eq!(backend.get("key1").unwrap(), Some(b"value1".to_vec()));
        assert_eq!(backend.get("nonexistent").unwrap(), None);

        backend.put("key1", b"value2").unwrap();
        assert_eq!(backend.get("key1").unwrap(), Some(b"value2".to_vec()));
    }

    #[test]
    fn redb_scan_prefix_in_key_order() {
        let temp_file = NamedTempFile::new().unwrap();
        let backend = RedbBackend::open(temp_file.path()).unwrap();

        backend
            .batch_put(vec![
                ("sub/t1/00000000000000000002".into(), b"2".to_vec()),
                ("sub/t1/00000000000000000001".into(), b"1".to_vec()),
                ("sub/t2/00000000000000000003".into(), b"3".to_vec()),
            ])
            .unwrap();

        let mut collected = Vec::new();
        backend
            .scan_prefix("sub/t1/", &mut |_, value| {
                collected.push(value.to_vec());
                Ok(())
            })
            .unwrap();
        assert_eq!(collected, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[test]
    fn redb_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("antiplag.redb");
        {
            let backend = RedbBackend::open(&path).unwrap();
            backend.put("persisted", b"yes").unwrap();
        }
        let backend = RedbBackend::open(&path).unwrap();
        assert_eq!(backend.get("persisted").unwrap(), Some(b"yes".to_vec()));
    }
}
