//! Configuration of the vault client.
//!
//! Values are read from environment variables prefixed `DV_`
//! (`DV_SERVICE_URL`, `DV_CONNECT_TIMEOUT_SECS`, ...) or built in code with
//! [`ClientConfig::new`].

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DV";

/// Placeholder that replaces registered secrets in log output.
pub const DEFAULT_SECRET_PLACEHOLDER: &str = "^^^SECRET^^^";

/// Validated client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// URL requests are posted to. **Required.**
    pub service_url: String,

    /// Value of the `version` field of every request.
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,

    /// Connect timeout in seconds.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Proxy URL, e.g. `http://proxy.local:3128`.
    #[serde(default)]
    pub proxy: Option<String>,

    #[serde(default)]
    pub proxy_user: Option<String>,

    #[serde(default)]
    pub proxy_pass: Option<String>,

    /// PEM file or directory of PEM files with additional trusted CAs.
    #[serde(default)]
    pub cert_path: Option<String>,

    /// Accept any server certificate. Only for test deployments.
    #[serde(default)]
    pub skip_cert_check: bool,

    /// Sent as the product part of the `User-Agent` header.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    #[serde(default = "default_app_version")]
    pub app_version: String,

    /// Text that replaces registered secrets in logs and error messages.
    #[serde(default = "default_secret_placeholder")]
    pub secret_placeholder: String,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_protocol_version() -> u32 {
    common::protocol::PROTOCOL_VERSION
}
fn default_connect_timeout() -> u64 {
    8
}
fn default_app_name() -> String {
    env!("CARGO_PKG_NAME").into()
}
fn default_app_version() -> String {
    env!("CARGO_PKG_VERSION").into()
}
fn default_secret_placeholder() -> String {
    DEFAULT_SECRET_PLACEHOLDER.into()
}
fn default_log_level() -> String {
    "info".into()
}

impl ClientConfig {
    /// Configuration with defaults for everything but the service URL.
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: normalize_url(&service_url.into()),
            protocol_version: default_protocol_version(),
            connect_timeout_secs: default_connect_timeout(),
            proxy: None,
            proxy_user: None,
            proxy_pass: None,
            cert_path: None,
            skip_cert_check: false,
            app_name: default_app_name(),
            app_version: default_app_version(),
            secret_placeholder: default_secret_placeholder(),
            log_level: default_log_level(),
        }
    }

    /// Load and validate configuration from `DV_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is absent or a value is
    /// invalid.
    pub fn from_env() -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to build configuration from environment")?;

        let mut c: ClientConfig = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.service_url = normalize_url(&c.service_url);
        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    pub fn validate(&self) -> Result<()> {
        ensure_non_empty(&self.service_url, "DV_SERVICE_URL")?;
        if self.protocol_version == 0 {
            anyhow::bail!("DV_PROTOCOL_VERSION must be > 0");
        }
        if self.connect_timeout_secs == 0 {
            anyhow::bail!("DV_CONNECT_TIMEOUT_SECS must be > 0");
        }
        if let Some(path) = &self.cert_path {
            if !Path::new(path).exists() {
                anyhow::bail!("DV_CERT_PATH '{path}' does not exist");
            }
        }
        if self.proxy_user.is_some() && self.proxy.is_none() {
            anyhow::bail!("DV_PROXY_USER is set but DV_PROXY is not");
        }
        ensure_non_empty(&self.secret_placeholder, "DV_SECRET_PLACEHOLDER")?;
        Ok(())
    }

    /// `User-Agent` header value.
    pub fn user_agent(&self) -> String {
        format!("{}/{}", self.app_name, self.app_version)
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}

fn ensure_non_empty(value: &str, name: &str) -> Result<()> {
    if value.trim().is_empty() {
        anyhow::bail!("{name} is required and must not be empty");
    }
    Ok(())
}
