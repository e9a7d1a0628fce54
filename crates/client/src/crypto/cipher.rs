//! Recipe encryption and decryption of individual PID records.
//!
//! MAC-then-encrypt: the SHA-256 of the plaintext is appended after the
//! PKCS#7 padding and the whole buffer is encrypted with AES-256-CBC.
//!
//! ```text
//! bytes  = plaintext ‖ pkcs7_pad(plaintext) ‖ SHA256(plaintext)
//! recipe = "aes-256-cbc:" ‖ checksum ‖ ":" ‖ hex(iv) ‖ ":b:" ‖ base64(AES-256-CBC(iv, bytes))
//! ```
//!
//! Padding is always applied, so a plaintext whose length is a multiple of
//! the block size gets a full extra block of `0x10` bytes.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use common::VaultError;
use sha2::{Digest, Sha256};
use thiserror::Error;

use super::key::{Checksum, KeyBytes};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block size and IV length in bytes.
pub const BLOCK_SIZE: usize = 16;

/// Length of the SHA-256 MAC appended to the padded plaintext.
pub const MAC_LEN: usize = 32;

/// Cipher name that starts every recipe.
pub const RECIPE_CIPHER: &str = "aes-256-cbc";

/// Codec tag for base64 payloads, the only one defined.
pub const CODEC_BASE64: &str = "b";

/// Number of `:`-separated fields in a recipe.
const RECIPE_FIELDS: usize = 5;

const RECIPE_PREFIX: &str = "aes-256-cbc:";

static IV_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A parsed recipe string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    /// Checksum of the app id the record was encrypted with. Empty for
    /// published records.
    pub checksum: String,
    /// Raw IV bytes.
    pub iv: [u8; BLOCK_SIZE],
    /// Raw ciphertext bytes.
    pub ciphertext: Vec<u8>,
}

impl Recipe {
    /// Encode this value to its canonical string representation.
    pub fn to_string_repr(&self) -> String {
        format!(
            "{RECIPE_CIPHER}:{}:{}:{CODEC_BASE64}:{}",
            self.checksum,
            hex::encode(self.iv),
            STANDARD.encode(&self.ciphertext),
        )
    }

    /// Parse a recipe string.
    ///
    /// Fields are taken from the right: iv, codec and payload never contain
    /// `:`, the checksum may.
    ///
    /// # Errors
    ///
    /// Returns [`CipherError::InvalidFormat`] on any structural violation.
    pub fn parse(s: &str) -> Result<Self, CipherError> {
        let rest = s
            .strip_prefix(RECIPE_PREFIX)
            .ok_or_else(|| CipherError::InvalidFormat("recipe is incompatible".into()))?;
        let parts: Vec<&str> = rest.rsplitn(RECIPE_FIELDS - 1, ':').collect();
        let [payload, codec, iv_hex, checksum] = parts[..] else {
            return Err(CipherError::InvalidFormat(format!(
                "expected {RECIPE_FIELDS} fields, found {}",
                parts.len() + 1
            )));
        };

        let iv_bytes = hex::decode(iv_hex)
            .map_err(|e| CipherError::InvalidFormat(format!("bad iv: {e}")))?;
        let iv: [u8; BLOCK_SIZE] = iv_bytes
            .try_into()
            .map_err(|_| CipherError::InvalidFormat("iv must be 16 bytes".into()))?;

        if codec != CODEC_BASE64 {
            return Err(CipherError::InvalidFormat(format!(
                "invalid codec '{codec}'"
            )));
        }
        let ciphertext = STANDARD
            .decode(payload)
            .map_err(|e| CipherError::InvalidFormat(format!("bad payload: {e}")))?;

        Ok(Self {
            checksum: checksum.to_owned(),
            iv,
            ciphertext,
        })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The recipe does not match the expected structure.
    #[error("invalid recipe: {0}")]
    InvalidFormat(String),

    /// Padding or MAC check failed. Carries the checksum found in the recipe
    /// so callers can tell which app id the record belongs to.
    #[error("authentication failed: {reason}")]
    Authentication {
        reason: &'static str,
        checksum: String,
    },

    /// The block cipher itself failed.
    #[error("cipher failure: {0}")]
    Primitive(String),
}

impl From<CipherError> for VaultError {
    fn from(e: CipherError) -> Self {
        match e {
            CipherError::InvalidFormat(msg) => VaultError::ProtocolError(msg),
            CipherError::Authentication { reason, .. } => {
                VaultError::InvalidCredentials(reason.into())
            }
            CipherError::Primitive(msg) => VaultError::GeneralFailure(msg),
        }
    }
}

/// Result of a successful [`decrypt`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub plaintext: String,
    /// Checksum found in the recipe.
    pub checksum: String,
}

/// The final, padded plaintext block: the trailing partial block followed by
/// PKCS#7 padding, or a full block of `0x10` for block-aligned input.
pub fn padded_tail(plaintext: &[u8]) -> [u8; BLOCK_SIZE] {
    let rem = plaintext.len() % BLOCK_SIZE;
    let pad = (BLOCK_SIZE - rem) as u8;
    let mut last = [pad; BLOCK_SIZE];
    last[..rem].copy_from_slice(&plaintext[plaintext.len() - rem..]);
    last
}

/// Encrypt `plaintext` into a recipe string tagged with `checksum`.
///
/// A fresh IV is generated per call.
///
/// # Errors
///
/// Returns [`CipherError::Primitive`] if the block cipher fails.
pub fn encrypt(key: &KeyBytes, checksum: &Checksum, plaintext: &str) -> Result<String, CipherError> {
    encrypt_with_iv(key, checksum, plaintext, make_iv())
}

fn encrypt_with_iv(
    key: &KeyBytes,
    checksum: &Checksum,
    plaintext: &str,
    iv: [u8; BLOCK_SIZE],
) -> Result<String, CipherError> {
    let bytes = plaintext.as_bytes();
    let full = bytes.len() - bytes.len() % BLOCK_SIZE;

    let mut buf = Vec::with_capacity(full + BLOCK_SIZE + MAC_LEN);
    buf.extend_from_slice(&bytes[..full]);
    buf.extend_from_slice(&padded_tail(bytes));
    buf.extend_from_slice(&Sha256::digest(bytes));

    let ciphertext = Aes256CbcEnc::new(key.as_bytes().into(), (&iv).into())
        .encrypt_padded_vec_mut::<NoPadding>(&buf);
    if ciphertext.len() != buf.len() {
        return Err(CipherError::Primitive("unexpected ciphertext length".into()));
    }

    Ok(Recipe {
        checksum: checksum.as_str().to_owned(),
        iv,
        ciphertext,
    }
    .to_string_repr())
}

/// Decrypt a recipe string back to its plaintext.
///
/// # Errors
///
/// Returns [`CipherError::InvalidFormat`] for malformed recipes and
/// [`CipherError::Authentication`] when the padding byte is outside `1..=16`
/// or the MAC does not match, which is what a wrong key looks like.
pub fn decrypt(key: &KeyBytes, recipe: &str) -> Result<Decrypted, CipherError> {
    let Recipe {
        checksum,
        iv,
        ciphertext,
    } = Recipe::parse(recipe)?;

    if ciphertext.len() % BLOCK_SIZE != 0 || ciphertext.len() < BLOCK_SIZE + MAC_LEN {
        return Err(CipherError::InvalidFormat(format!(
            "ciphertext length {} is not a valid payload size",
            ciphertext.len()
        )));
    }

    let out = Aes256CbcDec::new(key.as_bytes().into(), (&iv).into())
        .decrypt_padded_vec_mut::<NoPadding>(&ciphertext)
        .map_err(|_| CipherError::Primitive("block decryption failed".into()))?;

    let (body, mac) = out.split_at(out.len() - MAC_LEN);
    let pad = usize::from(body[body.len() - 1]);
    if pad == 0 || pad > BLOCK_SIZE {
        return Err(CipherError::Authentication {
            reason: "invalid padding after decryption",
            checksum,
        });
    }
    let plaintext = &body[..body.len() - pad];
    if Sha256::digest(plaintext).as_slice() != mac {
        return Err(CipherError::Authentication {
            reason: "MAC mismatch",
            checksum,
        });
    }

    let plaintext = String::from_utf8(plaintext.to_vec())
        .map_err(|_| CipherError::InvalidFormat("plaintext is not valid UTF-8".into()))?;
    Ok(Decrypted {
        plaintext,
        checksum,
    })
}

/// IV from a time and counter seed. Unique per call, not unpredictable.
fn make_iv() -> [u8; BLOCK_SIZE] {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let counter = IV_COUNTER.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % 1000;
    let seed = format!(
        "{:010}.{:05}.{:03}",
        now.as_secs(),
        now.subsec_micros(),
        counter
    );
    let mut iv = [0u8; BLOCK_SIZE];
    iv.copy_from_slice(&Sha256::digest(seed.as_bytes())[..BLOCK_SIZE]);
    iv
}
