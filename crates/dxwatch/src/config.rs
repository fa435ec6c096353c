//! CLI configuration: thin wrapper around `dxwatch_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (`--server`, `--timeout`, `--insecure`).

use std::time::Duration;

use dxwatch_core::{ClientConfig, TlsMode};

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use dxwatch_config::{
    Config, Profile, config_path, load_config, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `ClientConfig` from the config file, active profile, and flags.
///
/// Flags win over the profile, which wins over `[defaults]`. Without a
/// matching profile, `--server` alone is enough.
pub fn resolve_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut client = match (cfg.profiles.get(&profile_name), &global.server) {
        (Some(profile), server) => {
            let mut profile = profile.clone();
            if let Some(server) = server {
                profile.server.clone_from(server);
            }
            profile.to_client_config(&cfg.defaults)?
        }
        (None, Some(server)) => Profile::new(server.clone()).to_client_config(&cfg.defaults)?,
        (None, None) if global.profile.is_some() => {
            let mut available: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    if let Some(ms) = global.timeout {
        client.timeout = Duration::from_millis(ms);
    }
    if global.insecure {
        client.tls = TlsMode::DangerAcceptInvalid;
    }

    tracing::debug!(
        profile = %profile_name,
        server = %client.base_url,
        timeout = ?client.timeout,
        "resolved client config"
    );
    Ok(client)
}
