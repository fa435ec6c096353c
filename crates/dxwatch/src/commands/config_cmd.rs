//! Config subcommand handlers.

use std::io::IsTerminal;

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Profile};
use crate::error::CliError;
use crate::output;

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn validate_server(server: &str) -> Result<(), CliError> {
    url::Url::parse(server)
        .map(|_| ())
        .map_err(|e| CliError::Validation {
            field: "server".into(),
            reason: format!("invalid URL '{server}': {e}"),
        })
}

/// Ask for profile name and server, or take them from flags when there is
/// no terminal to prompt on.
fn gather_profile(global: &GlobalOpts) -> Result<(String, Profile), CliError> {
    let default_name = global.profile.clone().unwrap_or_else(|| "default".into());

    if !std::io::stdin().is_terminal() {
        let server = global.server.clone().ok_or_else(|| CliError::Validation {
            field: "server".into(),
            reason: "non-interactive init needs --server <URL>".into(),
        })?;
        validate_server(&server)?;
        return Ok((default_name, Profile::new(server)));
    }

    let name: String = Input::new()
        .with_prompt("Profile name")
        .default(default_name)
        .interact_text()
        .map_err(prompt_err)?;

    let server: String = Input::new()
        .with_prompt("Backend URL")
        .default(
            global
                .server
                .clone()
                .unwrap_or_else(|| "http://192.168.1.20:8080".into()),
        )
        .validate_with(|input: &String| validate_server(input).map_err(|e| e.to_string()))
        .interact_text()
        .map_err(prompt_err)?;

    let interval: u64 = Input::new()
        .with_prompt("Metrics polling interval (ms)")
        .default(dxwatch_core::DEFAULT_POLLING_INTERVAL_MS)
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::new(server);
    if interval != dxwatch_core::DEFAULT_POLLING_INTERVAL_MS {
        profile.polling_interval_ms = Some(interval);
    }
    Ok((name, profile))
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: guided setup ──────────────────────────────────────
        ConfigCommand::Init => {
            let path = config::config_path();
            if !global.quiet {
                eprintln!("dxwatch configuration");
                eprintln!("   Config path: {}\n", path.display());
            }

            let (name, profile) = gather_profile(global)?;

            // Keep any profiles already on disk.
            let mut cfg = config::load_config_or_default();
            cfg.profiles.insert(name.clone(), profile);
            cfg.default_profile = Some(name.clone());

            let written = config::save_config(&cfg)?;

            if !global.quiet {
                eprintln!("✓ Configuration written to {}", written.display());
                eprintln!("  Active profile: {name}");
                eprintln!("\n  Test it: dxwatch device status");
            }
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n({e})")),
                |c| {
                    let mut names: Vec<&str> = c.profiles.keys().map(String::as_str).collect();
                    names.sort_unstable();
                    names.join("\n")
                },
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }
    }
}
