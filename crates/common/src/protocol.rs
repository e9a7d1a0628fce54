//! Request and response bodies exchanged with the vault.
//!
//! Every request is a JSON object posted in the form field [`JSON_FIELD`].
//! Responses carry a top-level `status` and, depending on the operation, a
//! `vid`, a `data` object keyed by vid, or a `vids` array.

use serde::{Deserialize, Serialize};

/// Protocol version sent with every request unless configured otherwise.
pub const PROTOCOL_VERSION: u32 = 2;

/// Name of the form field that carries the JSON request body.
pub const JSON_FIELD: &str = "json";

/// Valid range of the `duration` field of a publish request, in days.
pub const PUBLISH_DURATION_DAYS: std::ops::RangeInclusive<u32> = 1..=365;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Operation requested from the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    Add,
    Update,
    Get,
    GetPublished,
    Publish,
    Search,
    Delete,
}

/// The `vid` field: a single vid for `update`, a list for `get`-family and
/// `delete` requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VidField {
    One(String),
    Many(Vec<String>),
}

/// Request body sent to the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRequest {
    /// Protocol version, fixed per deployment.
    pub version: u32,
    /// Requested operation.
    pub op: Op,
    /// Recipe string for `add`, `update` and `publish`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    /// Target vid(s).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vid: Option<VidField>,
    /// Index words (`add`, `update`) or search words (`search`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub words: Option<Vec<String>>,
    /// Days until a published entry expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
}

impl VaultRequest {
    /// Construct a bare request for `op`; fields are filled in by the caller.
    pub fn new(version: u32, op: Op) -> Self {
        Self {
            version,
            op,
            data: None,
            vid: None,
            words: None,
            duration: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Status of a response or of a single entry in a `get` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "INVALID")]
    Invalid,
    #[serde(rename = "ERROR")]
    Error,
    #[serde(rename = "NOTFOUND")]
    NotFound,
    /// Any status this client does not know.
    #[serde(other)]
    Unknown,
}

impl ResponseStatus {
    /// Wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseStatus::Ok => "OK",
            ResponseStatus::Invalid => "INVALID",
            ResponseStatus::Error => "ERROR",
            ResponseStatus::NotFound => "NOTFOUND",
            ResponseStatus::Unknown => "UNKNOWN",
        }
    }
}

/// Response body received from the vault.
///
/// Fields are kept loosely typed where the vault is known to vary so that a
/// single unexpected entry does not make the whole response unreadable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultResponse {
    #[serde(default)]
    pub status: Option<ResponseStatus>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default)]
    pub vid: Option<String>,
    /// Object keyed by vid for `get`-family responses.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default)]
    pub vids: Option<Vec<serde_json::Value>>,
}

impl VaultResponse {
    /// Numeric error code, if present and integral.
    pub fn code(&self) -> Option<i64> {
        self.code.as_ref().and_then(serde_json::Value::as_i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_request_omits_unset_fields() {
        let mut req = VaultRequest::new(PROTOCOL_VERSION, Op::Add);
        req.data = Some("aes-256-cbc:18:00:b:AA==".into());
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["version"], 2);
        assert_eq!(v["op"], "add");
        assert!(v.get("vid").is_none());
        assert!(v.get("words").is_none());
        assert!(v.get("duration").is_none());
    }

    #[test]
    fn op_names_match_wire_spelling() {
        let ops = [
            (Op::Add, "add"),
            (Op::Update, "update"),
            (Op::Get, "get"),
            (Op::GetPublished, "getpublished"),
            (Op::Publish, "publish"),
            (Op::Search, "search"),
            (Op::Delete, "delete"),
        ];
        for (op, name) in ops {
            assert_eq!(serde_json::to_value(op).unwrap(), json!(name));
        }
    }

    #[test]
    fn vid_field_is_string_or_array() {
        let mut req = VaultRequest::new(PROTOCOL_VERSION, Op::Update);
        req.vid = Some(VidField::One("v1".into()));
        assert_eq!(serde_json::to_value(&req).unwrap()["vid"], "v1");

        req.op = Op::Get;
        req.vid = Some(VidField::Many(vec!["a".into(), "b".into()]));
        assert_eq!(serde_json::to_value(&req).unwrap()["vid"], json!(["a", "b"]));
    }

    #[test]
    fn response_parses_get_data() {
        let body = r#"{"status":"OK","data":{"v1":{"status":"OK","data":"x"}}}"#;
        let resp: VaultResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.status, Some(ResponseStatus::Ok));
        assert_eq!(resp.data.unwrap()["v1"]["data"], "x");
    }

    #[test]
    fn response_tolerates_unknown_status() {
        let resp: VaultResponse =
            serde_json::from_str(r#"{"status":"MAYBE","code":3,"desc":"?"}"#).unwrap();
        assert_eq!(resp.status, Some(ResponseStatus::Unknown));
        assert_eq!(resp.code(), Some(3));
    }
}
