//! [`Transport`] over HTTPS with `reqwest` and rustls.

use std::error::Error as StdError;
use std::fs;
use std::path::Path;
use std::time::Duration;

use common::VaultError;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Certificate, Client, Proxy};
use tracing::{debug, warn};

use super::{Transport, TransportError, TransportFuture, TransportRequest};
use crate::config::ClientConfig;

/// Production transport. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Build a transport from the TLS, proxy and timeout settings in `config`.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidParameter`] for an unusable proxy URL or CA path,
    /// [`VaultError::GeneralFailure`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, VaultError> {
        let mut builder = Client::builder()
            .use_rustls_tls()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(config.user_agent());

        if let Some(url) = &config.proxy {
            let mut proxy = Proxy::all(url.as_str())
                .map_err(|e| VaultError::InvalidParameter(format!("invalid proxy: {e}")))?;
            if let Some(user) = &config.proxy_user {
                proxy = proxy.basic_auth(user, config.proxy_pass.as_deref().unwrap_or(""));
            }
            builder = builder.proxy(proxy);
        }

        if let Some(path) = &config.cert_path {
            for cert in load_ca_certs(Path::new(path))? {
                builder = builder.add_root_certificate(cert);
            }
        }

        if config.skip_cert_check {
            warn!("server certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder
            .build()
            .map_err(|e| VaultError::GeneralFailure(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn post<'a>(&'a self, request: &'a TransportRequest) -> TransportFuture<'a> {
        Box::pin(async move {
            let mut req = self
                .client
                .post(&request.url)
                .form(&request.fields)
                .build()
                .map_err(classify)?;

            for (name, value) in &request.headers {
                let name = HeaderName::from_bytes(name.as_bytes())
                    .map_err(|e| TransportError::Failed(format!("header name: {e}")))?;
                let value = HeaderValue::from_str(value)
                    .map_err(|e| TransportError::Failed(format!("header value: {e}")))?;
                req.headers_mut().insert(name, value);
            }

            let resp = self.client.execute(req).await.map_err(classify)?;
            debug!(status = resp.status().as_u16(), "vault responded");
            resp.text().await.map_err(classify)
        })
    }
}

/// CA certificates from a PEM file, or from every PEM file in a directory.
fn load_ca_certs(path: &Path) -> Result<Vec<Certificate>, VaultError> {
    let files = if path.is_dir() {
        fs::read_dir(path)
            .map_err(|e| VaultError::InvalidParameter(format!("cannot read CA directory: {e}")))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect()
    } else {
        vec![path.to_path_buf()]
    };

    let mut certs = Vec::new();
    for file in &files {
        let pem = fs::read(file).map_err(|e| {
            VaultError::InvalidParameter(format!("cannot read CA file {}: {e}", file.display()))
        })?;
        match Certificate::from_pem_bundle(&pem) {
            Ok(found) => certs.extend(found),
            Err(e) => debug!(file = %file.display(), error = %e, "skipping non-PEM file"),
        }
    }
    if certs.is_empty() {
        return Err(VaultError::InvalidParameter(format!(
            "no CA certificates found in {}",
            path.display()
        )));
    }
    Ok(certs)
}

/// Map a `reqwest` failure onto the transport error classes.
fn classify(e: reqwest::Error) -> TransportError {
    let msg = e.to_string();
    if is_tls_failure(&e) {
        TransportError::SslHandshake(msg)
    } else if e.is_connect() || e.is_timeout() {
        TransportError::NoInternet(msg)
    } else {
        TransportError::Failed(msg)
    }
}

fn is_tls_failure(e: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(e);
    while let Some(err) = current {
        if err.downcast_ref::<rustls::Error>().is_some() {
            return true;
        }
        if let Some(io) = err.downcast_ref::<std::io::Error>() {
            if io
                .get_ref()
                .is_some_and(|inner| inner.downcast_ref::<rustls::Error>().is_some())
            {
                return true;
            }
        }
        current = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_with_defaults() {
        assert!(HttpTransport::new(&ClientConfig::new("https://vault.example")).is_ok());
    }

    #[test]
    fn builds_with_proxy_credentials() {
        let mut cfg = ClientConfig::new("https://vault.example");
        cfg.proxy = Some("http://proxy.local:3128".into());
        cfg.proxy_user = Some("bob".into());
        cfg.proxy_pass = Some("hunter2".into());
        assert!(HttpTransport::new(&cfg).is_ok());
    }

    #[test]
    fn rejects_missing_ca_file() {
        let mut cfg = ClientConfig::new("https://vault.example");
        cfg.cert_path = Some("/nonexistent/ca.pem".into());
        assert!(matches!(
            HttpTransport::new(&cfg),
            Err(VaultError::InvalidParameter(_))
        ));
    }

    #[test]
    fn tls_error_detected_through_io_error() {
        let tls = rustls::Error::General("bad certificate".into());
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, tls);
        assert!(is_tls_failure(&io));
        let plain = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(!is_tls_failure(&plain));
    }

    #[tokio::test]
    async fn unreachable_host_is_no_internet() {
        // port 9 on localhost: nothing listens, connect is refused
        let transport = HttpTransport::new(&ClientConfig::new("http://127.0.0.1:9")).unwrap();
        let req = TransportRequest {
            url: "http://127.0.0.1:9/".into(),
            fields: vec![("json".into(), "{}".into())],
            headers: vec![],
        };
        let err = transport.post(&req).await.unwrap_err();
        assert!(matches!(err, TransportError::NoInternet(_)), "{err:?}");
    }
}
