//! Structured logging with secret redaction.
//!
//! # Invariants
//!
//! - No plaintext PID, key material or app id in any log field.
//! - Secrets registered with [`register_secret`] are replaced by their
//!   placeholder in every log line and in the thread-local last error.
//! - Log level is configurable via `RUST_LOG` or `DV_LOG_LEVEL`
//!   (default: `info`).

pub mod init;
pub mod redact;

pub use init::init_logging;
pub use redact::{redact, register_secret, set_secret_placeholder};
