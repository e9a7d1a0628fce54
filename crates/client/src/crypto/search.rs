//! Blind index: prefix-searchable hashes of search terms.
//!
//! Each term byte is chained through SHA-256 together with the hex image of
//! the previous digest and the app id. One hex byte of every digest goes into
//! the output, so the word for a prefix of a term is a prefix of the word for
//! the whole term. The vault matches search words against stored index words
//! by plain prefix comparison.
//!
//! Index words are padded to a multiple of [`BLOCK_CHARS`] term bytes so their
//! length reveals only a coarse bound of the term length. A term length that is
//! already a multiple gets no extra block.

use std::fmt;

use common::VaultError;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Term bytes per index padding block.
pub const BLOCK_CHARS: usize = 16;

/// Image the hash chain starts from.
const INITIAL_IMAGE: [u8; 32] = [
    0xf1, 0x74, 0x8e, 0x98, 0x19, 0x66, 0x4b, 0x32, 0x4a, 0xe0, 0x79, 0xa9, 0xef, 0x22, 0xe3, 0x3e,
    0x90, 0x14, 0xff, 0xce, 0x30, 0x25, 0x61, 0xb9, 0xbf, 0x71, 0xa3, 0x79, 0x16, 0xc1, 0xd2, 0xa3,
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("search term is empty")]
    EmptyTerm,

    #[error("app id is empty")]
    EmptyKey,
}

impl From<SearchError> for VaultError {
    fn from(e: SearchError) -> Self {
        VaultError::InvalidParameter(e.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Index,
    Search,
}

/// Word attached to a record at write time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexWord(String);

impl IndexWord {
    /// Hash `term` for indexing under `app_id`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] if `term` or `app_id` is empty.
    pub fn new(term: &str, app_id: &str) -> Result<Self, VaultError> {
        Ok(Self(blind_hash(term, app_id, Mode::Index)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Word submitted with a search query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchWord(String);

impl SearchWord {
    /// Hash `term` for searching under `app_id`. Any prefix of an indexed
    /// term matches.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] if `term` or `app_id` is empty.
    pub fn new(term: &str, app_id: &str) -> Result<Self, VaultError> {
        Ok(Self(blind_hash(term, app_id, Mode::Search)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for SearchWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn blind_hash(term: &str, key: &str, mode: Mode) -> Result<String, SearchError> {
    if term.is_empty() {
        return Err(SearchError::EmptyTerm);
    }
    if key.is_empty() {
        return Err(SearchError::EmptyKey);
    }

    let term = term.to_lowercase();
    let bytes = term.as_bytes();
    let n = bytes.len();
    let steps = match mode {
        Mode::Index => n.div_ceil(BLOCK_CHARS) * BLOCK_CHARS,
        Mode::Search => n,
    };

    let mut image = hex::encode(INITIAL_IMAGE);
    let mut first: Option<[u8; 32]> = None;
    let mut out = String::with_capacity(steps * 2);

    for i in 0..steps {
        // Past the term: a zero terminator, then filler from the first digest.
        let byte = match i.cmp(&n) {
            std::cmp::Ordering::Less => bytes[i],
            std::cmp::Ordering::Equal => 0,
            std::cmp::Ordering::Greater => first.map_or(0, |d| d[i - n - 1]),
        };

        let mut hasher = Sha256::new();
        hasher.update([byte]);
        hasher.update(image.as_bytes());
        hasher.update(key.as_bytes());
        hasher.update([0u8]);
        let digest: [u8; 32] = hasher.finalize().into();

        out.push_str(&hex::encode(&digest[..1]));
        image = hex::encode(digest);
        first.get_or_insert(digest);
    }

    Ok(out)
}
