//! Key derivation from app ids and publishing passwords.

use std::fmt;

use common::VaultError;
use sha2::{Digest, Sha256};

/// Byte length of an AES-256 key (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Minimum number of characters of an app id.
pub const MIN_APP_ID_LEN: usize = 14;

/// Number of trailing app id characters that form the checksum.
pub const CHECKSUM_LEN: usize = 2;

/// Fixed-size key buffer that holds exactly [`KEY_LEN`] bytes.
///
/// When this type is dropped, the memory is overwritten with zeroes to
/// minimise the window during which key material lives in RAM.
#[derive(Clone)]
pub struct KeyBytes(Box<[u8; KEY_LEN]>);

impl KeyBytes {
    /// `SHA256(secret)`.
    pub fn from_secret(secret: &str) -> Self {
        let mut buf = Box::new([0u8; KEY_LEN]);
        buf.copy_from_slice(&Sha256::digest(secret.as_bytes()));
        Self(buf)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl Drop for KeyBytes {
    fn drop(&mut self) {
        self.0.iter_mut().for_each(|b| *b = 0);
    }
}

impl fmt::Debug for KeyBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("KeyBytes([REDACTED])")
    }
}

/// The two-character tag embedded in every recipe.
///
/// An owned copy of the last [`CHECKSUM_LEN`] characters of the app id, so it
/// stays valid independently of the caller's app id string. Publishing uses
/// the empty checksum.
///
/// Length and checksum are measured in `char`s, not bytes. For ASCII app
/// ids this matches byte-oriented clients. For a non-ASCII app id a client
/// that takes the last two bytes tags its recipes differently, so entries
/// it migrated are reported as foreign rather than already migrated, and
/// the minimum length check can disagree as well.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Extract the checksum of `app_id`.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty app id,
    /// [`VaultError::InvalidParameter`] if it is shorter than
    /// [`MIN_APP_ID_LEN`] characters.
    pub fn of(app_id: &str) -> Result<Self, VaultError> {
        let len = app_id.chars().count();
        if len == 0 {
            return Err(VaultError::ParameterMissing("app id is empty".into()));
        }
        if len < MIN_APP_ID_LEN {
            return Err(VaultError::InvalidParameter(format!(
                "app id length must at least be {MIN_APP_ID_LEN} but only is {len}"
            )));
        }
        Ok(Self(app_id.chars().skip(len - CHECKSUM_LEN).collect()))
    }

    /// The empty checksum used for published entries.
    pub fn empty() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Checksum {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encryption key plus the checksum tagged onto recipes made with it.
#[derive(Debug, Clone)]
pub struct AppKey {
    key: KeyBytes,
    checksum: Checksum,
}

impl AppKey {
    /// Derive the key and checksum of an app id.
    ///
    /// # Errors
    ///
    /// See [`Checksum::of`].
    pub fn derive(app_id: &str) -> Result<Self, VaultError> {
        let checksum = Checksum::of(app_id)?;
        Ok(Self {
            key: KeyBytes::from_secret(app_id),
            checksum,
        })
    }

    /// Derive the key of a publishing password. There is no length
    /// requirement and the checksum is empty.
    ///
    /// # Errors
    ///
    /// [`VaultError::ParameterMissing`] for an empty password.
    pub fn for_password(password: &str) -> Result<Self, VaultError> {
        if password.is_empty() {
            return Err(VaultError::ParameterMissing(
                "publishing password is empty".into(),
            ));
        }
        Ok(Self {
            key: KeyBytes::from_secret(password),
            checksum: Checksum::empty(),
        })
    }

    pub fn key(&self) -> &KeyBytes {
        &self.key
    }

    pub fn checksum(&self) -> &Checksum {
        &self.checksum
    }
}
