//! Key-value persistence for client state.
//!
//! Every piece of state the client keeps between runs (session, cart,
//! offline queue, theme) lives under its own key as an independent JSON
//! value. There is no schema versioning and no cross-process locking:
//! concurrent writers to the same key are last-writer-wins.
//!
//! # Backends
//!
//! - [`MemoryStore`] - process-local, used by tests and throwaway runs
//! - [`FileStore`] - one file per key under a state directory

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::warn;

/// Well-known storage keys.
pub mod keys {
    /// Bearer credential of the current session.
    pub const ACCESS_TOKEN: &str = "access_token";
    /// JSON identity of the current session.
    pub const USER: &str = "user";
    /// Cart lines.
    pub const CART: &str = "rada_cart";
    /// Sales waiting for connectivity.
    pub const OFFLINE_QUEUE: &str = "rada_queue";
    /// UI theme preference.
    pub const THEME: &str = "theme";
}

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem error.
    #[error("storage I/O error for key {key}: {source}")]
    Io {
        /// Key being read or written.
        key: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Value could not be serialized.
    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        /// Key being written.
        key: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// Key contains characters the backend cannot store.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),
}

/// Synchronous string key-value store.
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read. A missing key is
    /// `Ok(None)`, not an error.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and deserialize a JSON value.
///
/// A value that no longer parses is treated as absent.
///
/// # Errors
///
/// Returns an error only if the backend read fails.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            warn!(key, error = %e, "Ignoring unparseable stored value");
            Ok(None)
        }
    }
}

/// Serialize and store a JSON value.
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_load_json_missing_key() {
        let store = MemoryStore::new();
        let value: Option<Vec<u32>> = load_json(&store, "nothing").unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_load_json_corrupt_value_is_absent() {
        let store = MemoryStore::new();
        store.set(keys::CART, "{not json").unwrap();
        let value: Option<Vec<u32>> = load_json(&store, keys::CART).unwrap();
        assert!(value.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        save_json(&store, keys::CART, &[1_u32, 2, 3]).unwrap();
        assert_eq!(store.get(keys::CART).unwrap().as_deref(), Some("[1,2,3]"));
        let value: Option<Vec<u32>> = load_json(&store, keys::CART).unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
    }
}
