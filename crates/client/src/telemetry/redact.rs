//! Process-wide registry of secrets that must never appear in output.

use std::io::{self, Write};
use std::sync::{OnceLock, RwLock};

use tracing_subscriber::fmt::MakeWriter;

use crate::config::DEFAULT_SECRET_PLACEHOLDER;

/// Upper bound on registered secrets. The oldest registration is dropped
/// first.
pub const MAX_SECRETS: usize = 256;

#[derive(Debug, Default)]
struct Registry {
    placeholder: Option<String>,
    /// `(secret, placeholder, registration)`, longest secret first.
    secrets: Vec<(String, String, u64)>,
    next: u64,
}

impl Registry {
    fn insert(&mut self, secret: &str, cap: usize) {
        if secret.is_empty() || self.secrets.iter().any(|(s, _, _)| s == secret) {
            return;
        }
        if self.secrets.len() >= cap {
            if let Some(oldest) = self
                .secrets
                .iter()
                .enumerate()
                .min_by_key(|(_, (_, _, seq))| *seq)
                .map(|(i, _)| i)
            {
                self.secrets.remove(oldest);
            }
        }
        let placeholder = self
            .placeholder
            .clone()
            .unwrap_or_else(|| DEFAULT_SECRET_PLACEHOLDER.to_owned());
        self.secrets.push((secret.to_owned(), placeholder, self.next));
        self.next += 1;
        self.secrets.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
    }

    fn apply(&self, text: &str) -> String {
        let mut out = text.to_owned();
        for (secret, placeholder, _) in &self.secrets {
            if out.contains(secret.as_str()) {
                out = out.replace(secret.as_str(), placeholder);
            }
        }
        out
    }
}

fn registry() -> &'static RwLock<Registry> {
    static REGISTRY: OnceLock<RwLock<Registry>> = OnceLock::new();
    REGISTRY.get_or_init(|| RwLock::new(Registry::default()))
}

/// Set the placeholder used for secrets registered from now on.
pub fn set_secret_placeholder(placeholder: &str) {
    if let Ok(mut reg) = registry().write() {
        if reg.placeholder.as_deref() != Some(placeholder) {
            reg.placeholder = Some(placeholder.to_owned());
        }
    }
}

/// Register `secret` for redaction. Empty and already registered secrets
/// are ignored. At most [`MAX_SECRETS`] are kept.
pub fn register_secret(secret: &str) {
    if let Ok(mut reg) = registry().write() {
        reg.insert(secret, MAX_SECRETS);
    }
}

/// `text` with every registered secret replaced by its placeholder.
pub fn redact(text: &str) -> String {
    match registry().read() {
        Ok(reg) => reg.apply(text),
        Err(_) => text.to_owned(),
    }
}

/// [`MakeWriter`] that redacts each formatted event before writing it to
/// stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct RedactingMakeWriter;

impl<'a> MakeWriter<'a> for RedactingMakeWriter {
    type Writer = RedactingWriter;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter { buf: Vec::new() }
    }
}

/// Buffers one event; flushes the redacted text on drop.
#[derive(Debug)]
pub struct RedactingWriter {
    buf: Vec<u8>,
}

impl Write for RedactingWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for RedactingWriter {
    fn drop(&mut self) {
        if self.buf.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&self.buf);
        let _ = io::stderr().write_all(redact(&text).as_bytes());
    }
}
