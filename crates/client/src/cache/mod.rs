//! Local plaintext cache in front of the vault.
//!
//! The store itself is supplied by the caller through [`KvStore`]. This crate
//! only reads, writes and enumerates it; [`CacheFront`] decides when.

pub mod front;
pub mod memory;

use bytes::Bytes;
use common::VaultError;
use thiserror::Error;

pub use front::{CacheFront, Partition};
pub use memory::{MemoryStore, NullStore};

/// Errors reported by a [`KvStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be accessed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The list pattern was rejected by the store.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

impl From<StoreError> for VaultError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(msg) => VaultError::GeneralFailure(msg),
            StoreError::InvalidPattern(msg) => VaultError::InvalidParameter(msg),
        }
    }
}

/// Key-value store used as the local cache.
///
/// Each call is expected to be atomic on its own. No transaction spans more
/// than one call.
#[cfg_attr(test, mockall::automock)]
pub trait KvStore: Send + Sync {
    /// Value stored under `key`, or `None` if there is none.
    fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    /// Store `value` under `key`. An empty value deletes the key.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Keys matching the glob `pattern` (`*` and `?`).
    fn list(&self, pattern: &str) -> Result<Vec<String>, StoreError>;
}
