//! Persistent key-value storage for session and preference data.
//!
//! This module provides:
//! - `KeyValueStore`: async get/set/remove of string values by string key
//! - `MemoryStore`: process-local backend, used in tests and `--store memory`
//! - `FileStore`: one JSON document on disk, survives restarts
//! - `KeyringStore`: OS keychain entries via the `keyring` crate
//!
//! Every operation may fail with `StoreError`. Removing a key that is not
//! present is not an error.

pub mod file;
pub mod keychain;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Keychain access failed: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Async string-keyed string storage, durable across process restarts
/// for every backend except `MemoryStore`.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete `key`. Succeeds when the key was never set.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
