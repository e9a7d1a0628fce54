//! Cryptographic building blocks of the vault client.
//!
//! This module has no I/O. It provides:
//!
//! - [`key`]: app id and password key derivation
//! - [`cipher`]: the recipe format (AES-256-CBC with a SHA-256 MAC)
//! - [`search`]: blind index and search words
//!
//! # Recipe format
//!
//! ```text
//! aes-256-cbc:<checksum>:<hex(iv)>:b:<base64(ciphertext)>
//! ```

pub mod cipher;
pub mod key;
pub mod search;

use sha2::{Digest, Sha256};

pub use cipher::{decrypt, encrypt, CipherError, Decrypted, Recipe};
pub use key::{AppKey, Checksum, KeyBytes, KEY_LEN};
pub use search::{IndexWord, SearchWord};

/// Lowercase hex SHA-256 of `text`.
pub fn sha256_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}
