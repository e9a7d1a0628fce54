//! `vault-client`: client-side pseudonymization against a remote vault.
//!
//! Personal data is encrypted locally into recipes and stored by the vault
//! under an opaque vid. The vault never sees plaintext or keys.
//!
//! Typical use:
//! 1. Load [`ClientConfig`] from the environment and call [`init_logging`].
//! 2. Create a [`VaultClient`] with the app id and optionally a [`KvStore`].
//! 3. [`add`](VaultClient::add) data with [`IndexWord`]s, keep the vid.
//! 4. [`get`](VaultClient::get) it back, [`search`](VaultClient::search)
//!    with [`SearchWord`]s, and eventually
//!    [`change_app_id`](VaultClient::change_app_id) to rotate the key.

pub mod cache;
pub mod client;
pub mod config;
pub mod crypto;
pub mod last_error;
pub mod migration;
pub mod result;
pub mod telemetry;
pub mod transport;

pub use cache::{KvStore, MemoryStore, NullStore, StoreError};
pub use client::VaultClient;
pub use common::VaultError;
pub use config::ClientConfig;
pub use crypto::{sha256_hex, IndexWord, SearchWord};
pub use last_error::last_error;
pub use migration::IndexWords;
pub use result::{GetResult, GetStatus, VidMap};
pub use telemetry::{init_logging, redact, register_secret, set_secret_placeholder};
pub use transport::{
    HeaderHook, HeaderSet, HttpTransport, PostFieldHook, PostFields, Transport, TransportError,
    TransportFuture, TransportRequest,
};
