//! Error types for router detection and scanning

use thiserror::Error;

use crate::routers::Variant;

/// Errors raised while detecting or scanning a router
#[derive(Debug, Error)]
pub enum Error {
    /// No known firmware variant answered the detection probes
    #[error("no supported TP-Link firmware detected on {host} ({})", summarize(.attempts))]
    Detection {
        host: String,
        attempts: Vec<(Variant, String)>,
    },

    /// The router rejected the credentials or the session
    #[error("authentication rejected: {0}")]
    Authentication(String),

    /// The response did not have the shape the variant expects
    #[error("unexpected response format: {0}")]
    Parse(String),

    /// Connect, I/O or timeout failure
    #[error("network error: {0}")]
    Network(String),

    /// HTTP status that is neither a success nor an auth rejection
    #[error("unexpected HTTP status {status} from {path}")]
    UnexpectedStatus { status: u16, path: String },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Network(err.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for Error {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        Error::Network("request timed out".into())
    }
}

fn summarize(attempts: &[(Variant, String)]) -> String {
    if attempts.is_empty() {
        return "no variants tried".into();
    }
    attempts
        .iter()
        .map(|(variant, reason)| format!("{}: {}", variant.tag(), reason))
        .collect::<Vec<_>>()
        .join("; ")
}
