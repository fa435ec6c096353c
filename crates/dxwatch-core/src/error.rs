// ── Core error types ──
//
// User-facing errors from dxwatch-core. The `From<dxwatch_api::Error>`
// impl translates transport-layer failures into domain-appropriate
// variants; the `Display` output is what stores record in `error`.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach monitoring backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Backend request timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Unexpected response from backend: {message}")]
    InvalidResponse { message: String },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Request rejected by backend: {message}")]
    Rejected { message: String, status: u16 },

    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } => true,
            Self::Api {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<dxwatch_api::Error> for CoreError {
    fn from(err: dxwatch_api::Error) -> Self {
        match err {
            dxwatch_api::Error::Transport(ref e) => {
                if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            dxwatch_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            dxwatch_api::Error::Timeout { timeout_ms } => CoreError::Timeout { timeout_ms },
            dxwatch_api::Error::Tls(msg) => CoreError::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            dxwatch_api::Error::Api { status: 404, message } => {
                CoreError::NotFound { resource: message }
            }
            dxwatch_api::Error::Api { status, message } if (400..500).contains(&status) => {
                CoreError::Rejected { message, status }
            }
            dxwatch_api::Error::Api { status, message } => CoreError::Api {
                message,
                status: Some(status),
            },
            dxwatch_api::Error::Deserialization { message, body: _ } => {
                CoreError::InvalidResponse { message }
            }
        }
    }
}
