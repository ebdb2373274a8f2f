//! Persistence adapter.
//!
//! An opaque string store partitioned by namespace. The cue engine keeps
//! labels under [`CUE_NAMESPACE`] and the bootstrap keeps credentials under
//! [`crate::credentials::WIFI_NAMESPACE`], so the two never collide.
//!
//! A missing key is a normal state ("use the default"), not an error.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing::warn;

use crate::error::StoreError;

/// Namespace holding per-channel labels.
pub const CUE_NAMESPACE: &str = "cue_texts";

/// Key under which channel `index`'s label is stored.
pub fn cue_text_key(index: usize) -> String {
    format!("cue{index}")
}

/// String key-value store.
pub trait Store: Send + Sync {
    /// Read `key` from `namespace`.
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` to `key` in `namespace`. Returns once the write is
    /// durable.
    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<S: Store + ?Sized> Store for Arc<S> {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(namespace, key)
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).put(namespace, key, value)
    }
}

/// Load saved labels for `count` channels.
///
/// Read failures are logged and treated as "never customized".
pub fn load_cue_texts(store: &dyn Store, count: usize) -> Vec<Option<String>> {
    (0..count)
        .map(|index| match store.get(CUE_NAMESPACE, &cue_text_key(index)) {
            Ok(text) => text,
            Err(error) => {
                warn!(index, %error, "failed to load cue text, using default");
                None
            },
        })
        .collect()
}

/// In-memory store for tests and simulation.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<(String, String), String>>,
    read_only: bool,
}

impl MemoryStore {
    /// Empty writable store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose writes always fail; reads see whatever was seeded.
    pub fn read_only(seed: impl IntoIterator<Item = ((String, String), String)>) -> Self {
        Self { entries: Mutex::new(seed.into_iter().collect()), read_only: true }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Store for MemoryStore {
    fn get(&self, namespace: &str, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(entries.get(&(namespace.to_string(), key.to_string())).cloned())
    }

    fn put(&self, namespace: &str, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::Backend("read-only store".to_string()));
        }
        let mut entries = self.entries.lock().map_err(|e| StoreError::Backend(e.to_string()))?;
        entries.insert((namespace.to_string(), key.to_string()), value.to_string());
        Ok(())
    }
}

/// Stand-in used when the real store failed to open.
///
/// Reads find nothing, writes fail with [`StoreError::Unavailable`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NullStore;

impl Store for NullStore {
    fn get(&self, _namespace: &str, _key: &str) -> Result<Option<String>, StoreError> {
        Ok(None)
    }

    fn put(&self, _namespace: &str, _key: &str, _value: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable)
    }
}
