//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use dxwatch_config::ConfigError;
use dxwatch_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to backend at {url}")]
    #[diagnostic(
        code(dxwatch::connection_failed),
        help(
            "Check that the appliance is running and reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k)."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out after {timeout_ms}ms")]
    #[diagnostic(
        code(dxwatch::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout { timeout_ms: u64 },

    // ── Backend responses ────────────────────────────────────────────

    #[error("{resource} not found")]
    #[diagnostic(
        code(dxwatch::not_found),
        help("Check the endpoint paths configured for this profile.")
    )]
    NotFound { resource: String },

    #[error("Request rejected ({status}): {message}")]
    #[diagnostic(code(dxwatch::rejected))]
    Rejected { message: String, status: u16 },

    #[error("API error: {message}")]
    #[diagnostic(code(dxwatch::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(dxwatch::validation))]
    Validation { field: String, reason: String },

    #[error("Operation '{action}' requires confirmation")]
    #[diagnostic(
        code(dxwatch::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(dxwatch::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: dxwatch config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(dxwatch::no_config),
        help(
            "Pass --server <URL>, or create a profile with: dxwatch config init\n\
             Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(dxwatch::config))]
    Config(#[from] ConfigError),

    // ── IO / Serialization ────────────────────────────────────────────

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. }
            | Self::NonInteractiveRequiresYes { .. }
            | Self::NoConfig { .. }
            | Self::ProfileNotFound { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => {
                CliError::ConnectionFailed { url, reason }
            }
            CoreError::Timeout { timeout_ms } => CliError::Timeout { timeout_ms },
            CoreError::NotFound { resource } => CliError::NotFound { resource },
            CoreError::Rejected { message, status } => CliError::Rejected { message, status },
            CoreError::InvalidResponse { message } => CliError::ApiError {
                message: format!("unexpected response: {message}"),
            },
            CoreError::Api { message, status: _ } => CliError::ApiError { message },
            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },
        }
    }
}
