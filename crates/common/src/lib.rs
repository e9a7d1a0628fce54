//! Common types, wire protocol definitions, and errors shared by everything
//! that talks to the pseudonymization vault.

pub mod error;
pub mod protocol;

pub use error::VaultError;
