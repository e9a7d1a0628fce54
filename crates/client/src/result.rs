//! Classification of vault responses into typed per-vid results.

use std::collections::HashMap;

use common::protocol::{ResponseStatus, VaultResponse};
use common::VaultError;
use serde_json::Value;
use tracing::{debug, warn};

use crate::crypto::{self, CipherError, KeyBytes};

/// Outcome for a single vid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GetStatus {
    Success,
    NotFound,
    /// The record was encrypted with a different key.
    InvalidCredentials,
    /// The vault returned no usable entry for the vid.
    ProtocolError,
}

/// Result for one vid. Owns its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResult {
    pub status: GetStatus,
    /// Plaintext on success. For [`GetStatus::InvalidCredentials`] in recode
    /// mode, the checksum found in the record's recipe.
    pub data: Option<String>,
}

impl GetResult {
    pub fn success(data: impl Into<String>) -> Self {
        Self {
            status: GetStatus::Success,
            data: Some(data.into()),
        }
    }

    pub fn status_only(status: GetStatus) -> Self {
        Self { status, data: None }
    }

    /// The error this result stands for, `None` on success.
    pub fn to_error(&self, vid: &str) -> Option<VaultError> {
        match self.status {
            GetStatus::Success => None,
            GetStatus::NotFound => Some(VaultError::NotFound(format!("vid '{vid}'"))),
            GetStatus::InvalidCredentials => Some(VaultError::InvalidCredentials(format!(
                "vid '{vid}' was encrypted with another key"
            ))),
            GetStatus::ProtocolError => Some(VaultError::ProtocolError(format!(
                "no usable entry for vid '{vid}'"
            ))),
        }
    }
}

/// Results keyed by vid. The map owns every entry and its data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VidMap(HashMap<String, GetResult>);

impl VidMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, vid: impl Into<String>, result: GetResult) {
        self.0.insert(vid.into(), result);
    }

    pub fn get(&self, vid: &str) -> Option<&GetResult> {
        self.0.get(vid)
    }

    pub(crate) fn get_mut(&mut self, vid: &str) -> Option<&mut GetResult> {
        self.0.get_mut(vid)
    }

    pub fn status(&self, vid: &str) -> Option<GetStatus> {
        self.0.get(vid).map(|r| r.status)
    }

    pub fn data(&self, vid: &str) -> Option<&str> {
        self.0.get(vid).and_then(|r| r.data.as_deref())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GetResult)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `true` when every entry is [`GetStatus::Success`].
    pub fn is_complete_success(&self) -> bool {
        self.0.values().all(|r| r.status == GetStatus::Success)
    }
}

impl IntoIterator for VidMap {
    type Item = (String, GetResult);
    type IntoIter = std::collections::hash_map::IntoIter<String, GetResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Parse a response body and check its top-level status.
///
/// # Errors
///
/// [`VaultError::ProtocolError`] if the body is not JSON or has no status,
/// [`VaultError::Rejected`] for a non-OK status with a numeric code and
/// [`VaultError::ProtocolError`] for a non-OK status without one.
pub fn check_status(body: &str) -> Result<VaultResponse, VaultError> {
    let resp: VaultResponse = serde_json::from_str(body)
        .map_err(|e| VaultError::ProtocolError(format!("response is not valid JSON: {e}")))?;

    let status = resp
        .status
        .clone()
        .ok_or_else(|| VaultError::ProtocolError("no status specified".into()))?;
    if status == ResponseStatus::Ok {
        return Ok(resp);
    }

    if status == ResponseStatus::Unknown {
        warn!("vault status was of unknown type");
    }
    let desc = resp.desc.clone().unwrap_or_default();
    match resp.code() {
        Some(code) => Err(VaultError::Rejected {
            status: status.as_str().to_owned(),
            code,
            desc,
        }),
        None => Err(VaultError::ProtocolError(format!(
            "status {} without error code: {desc}",
            status.as_str()
        ))),
    }
}

/// The vid assigned by an `add` or `publish` response.
///
/// # Errors
///
/// [`VaultError::ProtocolError`] if the response carries no vid.
pub fn parse_vid(resp: &VaultResponse) -> Result<String, VaultError> {
    match resp.vid.as_deref() {
        Some(vid) if !vid.is_empty() => Ok(vid.to_owned()),
        _ => Err(VaultError::ProtocolError("response did not include a vid".into())),
    }
}

/// Vids of a `search` response. Non-string entries are skipped.
///
/// # Errors
///
/// [`VaultError::ProtocolError`] if the `vids` array is missing.
pub fn parse_search(resp: &VaultResponse) -> Result<Vec<String>, VaultError> {
    let vids = resp
        .vids
        .as_ref()
        .ok_or_else(|| VaultError::ProtocolError("response did not include vids".into()))?;
    let out: Vec<String> = vids
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.clone()),
            _ => {
                warn!("search result entry was not a string");
                None
            }
        })
        .collect();
    debug!(count = out.len(), "search results");
    Ok(out)
}

/// Classify and decrypt the per-vid entries of a `get` response.
///
/// Every vid in `vids` gets an entry. In `recode` mode an
/// [`GetStatus::InvalidCredentials`] entry carries the recipe's checksum.
///
/// # Errors
///
/// [`VaultError::ProtocolError`] if the response has no `data` object.
pub fn classify_entries(
    key: &KeyBytes,
    resp: &VaultResponse,
    vids: &[String],
    recode: bool,
) -> Result<VidMap, VaultError> {
    let data = resp
        .data
        .as_ref()
        .and_then(Value::as_object)
        .ok_or_else(|| VaultError::ProtocolError("response did not include data".into()))?;

    let mut out = VidMap::new();
    for vid in vids {
        let result = match data.get(vid) {
            Some(entry) => classify_entry(key, entry, recode),
            None => {
                warn!("response did not include a requested entry");
                GetResult::status_only(GetStatus::ProtocolError)
            }
        };
        out.insert(vid.clone(), result);
    }
    Ok(out)
}

fn classify_entry(key: &KeyBytes, entry: &Value, recode: bool) -> GetResult {
    let status = entry
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value::<ResponseStatus>(s).ok());
    match status {
        Some(ResponseStatus::NotFound) => return GetResult::status_only(GetStatus::NotFound),
        Some(ResponseStatus::Ok) => {}
        other => {
            warn!(status = ?other, "unexpected entry status");
            return GetResult::status_only(GetStatus::ProtocolError);
        }
    }

    let Some(recipe) = entry.get("data").and_then(Value::as_str) else {
        warn!("entry has no data");
        return GetResult::status_only(GetStatus::ProtocolError);
    };

    match crypto::decrypt(key, recipe) {
        Ok(d) => GetResult::success(d.plaintext),
        Err(CipherError::Authentication { checksum, .. }) => GetResult {
            status: GetStatus::InvalidCredentials,
            data: recode.then_some(checksum),
        },
        Err(e) => {
            warn!(error = %e, "failed to decrypt entry");
            GetResult::status_only(GetStatus::ProtocolError)
        }
    }
}
