//! redb-backed persistence.
//!
//! One table holds every entry, keyed `"<namespace>/<key>"`. Each `put` is
//! its own committed write transaction, so a successful return means the
//! value is durable.

use std::path::Path;

use cuelight_core::{Store, error::StoreError};
use redb::{Database, TableDefinition};
use tracing::{debug, info, instrument};

use crate::error::ServerError;

// Key: "<namespace>/<key>", Value: stored string
const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

/// Durable [`Store`] on a redb file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create the database at `path`.
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self, ServerError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ServerError::Storage(e.to_string()))?;
        }
        let db = Database::create(path).map_err(|e| ServerError::Storage(e.to_string()))?;

        let txn = db.begin_write().map_err(|e| ServerError::Storage(e.to_string()))?;
        txn.open_table(ENTRIES).map_err(|e| ServerError::Storage(e.to_string()))?;
        txn.commit().map_err(|e| ServerError::Storage(e.to_string()))?;

        info!("opened store");
        Ok(Self { db })
    }
}

fn entry_key(namespace: &str, key: &str) -> String {
    format!("{namespace}/{key}")
}

fn backend(error: impl std::fmt::Display) -> StoreError {
    StoreError::Backend(error.to_string())
}

impl Store for RedbStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let txn = self.db.begin_read().map_err(backend)?;
        let table = txn.open_table(ENTRIES).map_err(backend)?;
        let value = table.get(entry_key(namespace, key).as_str()).map_err(backend)?;
        Ok(value.map(|guard| guard.value().to_string()))
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let entry = entry_key(namespace, key);
        let txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = txn.open_table(ENTRIES).map_err(backend)?;
            table.insert(entry.as_str(), value).map_err(backend)?;
        }
        txn.commit().map_err(backend)?;
        debug!(entry, "stored");
        Ok(())
    }
}
