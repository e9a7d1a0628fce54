//! The seam between the client and the wire.
//!
//! A [`Transport`] posts form fields to the vault and hands back the raw
//! response body. [`HttpTransport`] is the production implementation; tests
//! plug in their own.

pub mod http;

use std::future::Future;
use std::pin::Pin;

use common::protocol::JSON_FIELD;
use common::VaultError;
use thiserror::Error;

pub use http::HttpTransport;

/// Future returned by [`Transport::post`].
pub type TransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<String, TransportError>> + Send + 'a>>;

/// Errors of the transport layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Name resolution, connect or timeout failure.
    #[error("vault unreachable: {0}")]
    NoInternet(String),

    /// TLS handshake or certificate verification failure.
    #[error("TLS handshake failed: {0}")]
    SslHandshake(String),

    /// Any other request failure.
    #[error("request failed: {0}")]
    Failed(String),
}

impl From<TransportError> for VaultError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::NoInternet(msg) => VaultError::NoInternet(msg),
            TransportError::SslHandshake(msg) => VaultError::SslHandshakeError(msg),
            TransportError::Failed(msg) => VaultError::ProtocolError(msg),
        }
    }
}

/// One POST to the vault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub url: String,
    /// Form fields, url-encoded into the body in this order.
    pub fields: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
}

impl TransportRequest {
    /// Value of the form field `name`.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The JSON request body.
    pub fn json(&self) -> Option<&str> {
        self.field(JSON_FIELD)
    }
}

/// Posts requests to the vault.
pub trait Transport: Send + Sync {
    /// Send `request` and return the response body. HTTP status codes are not
    /// interpreted; the body is what the vault answered.
    fn post<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a>;
}

// ---------------------------------------------------------------------------
// Request hooks
// ---------------------------------------------------------------------------

/// Headers added to a request by a [`HeaderHook`].
///
/// Setting a name that is already present replaces it, `None` removes it and
/// an empty string sends the header with an empty value. Names compare
/// case-insensitively.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderSet {
    entries: Vec<(String, String)>,
}

impl HeaderSet {
    /// Set or remove a header.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] if the name is empty or contains `:`,
    /// or the value contains a line break.
    pub fn set(&mut self, name: &str, value: Option<&str>) -> Result<(), VaultError> {
        if name.is_empty() || name.contains(':') {
            return Err(VaultError::InvalidParameter(format!(
                "invalid header name '{name}'"
            )));
        }
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        if let Some(value) = value {
            if value.contains(['\r', '\n']) {
                return Err(VaultError::InvalidParameter(format!(
                    "value of header '{name}' contains a line break"
                )));
            }
            self.entries.push((name.to_owned(), value.to_owned()));
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.entries
    }
}

/// Form fields of a request. The [`JSON_FIELD`] field is reserved for the
/// vault request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFields {
    entries: Vec<(String, String)>,
}

impl PostFields {
    pub(crate) fn with_body(json: String) -> Self {
        Self {
            entries: vec![(JSON_FIELD.to_owned(), json)],
        }
    }

    /// Set a form field, replacing an earlier value of the same name.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] for the reserved name or an empty one.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), VaultError> {
        if name.is_empty() {
            return Err(VaultError::InvalidParameter("empty post field name".into()));
        }
        if name == JSON_FIELD {
            return Err(VaultError::InvalidParameter(format!(
                "post field '{JSON_FIELD}' is reserved"
            )));
        }
        match self.entries.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value.to_owned(),
            None => self.entries.push((name.to_owned(), value.to_owned())),
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.entries
    }
}

/// Called before every request to add headers. An error aborts the request.
pub trait HeaderHook: Send + Sync {
    fn apply(&self, headers: &mut HeaderSet) -> Result<(), VaultError>;
}

impl<F> HeaderHook for F
where
    F: Fn(&mut HeaderSet) -> Result<(), VaultError> + Send + Sync,
{
    fn apply(&self, headers: &mut HeaderSet) -> Result<(), VaultError> {
        self(headers)
    }
}

/// Called before every request to add form fields, e.g. provider
/// credentials. An error aborts the request.
pub trait PostFieldHook: Send + Sync {
    fn apply(&self, fields: &mut PostFields) -> Result<(), VaultError>;
}

impl<F> PostFieldHook for F
where
    F: Fn(&mut PostFields) -> Result<(), VaultError> + Send + Sync,
{
    fn apply(&self, fields: &mut PostFields) -> Result<(), VaultError> {
        self(fields)
    }
}
