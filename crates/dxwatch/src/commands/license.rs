//! License command handlers.

use dxwatch_core::{License, LicenseStatus, Monitor};

use crate::cli::{GlobalOpts, LicenseArgs, LicenseCommand};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

/// Show only the last four characters of a key.
fn mask_key(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    if key.chars().count() <= 4 {
        tail
    } else {
        format!("****{tail}")
    }
}

fn detail(l: &License, color: bool) -> String {
    let tone = match l.status {
        LicenseStatus::Active => Tone::Good,
        LicenseStatus::Trial => Tone::Warn,
        LicenseStatus::Expired | LicenseStatus::Inactive => Tone::Bad,
        LicenseStatus::Unknown => Tone::Neutral,
    };
    let mut lines = vec![
        format!("Status:    {}", output::paint(&l.status.to_string(), tone, color)),
        format!(
            "Key:       {}",
            l.key.as_deref().map_or_else(|| "-".into(), mask_key)
        ),
        format!("Plan:      {}", util::or_dash(l.plan.as_deref())),
        format!(
            "Cameras:   {}",
            l.max_cameras.map_or_else(|| "-".into(), |n| n.to_string())
        ),
        format!("Activated: {}", util::fmt_time(l.activated_at)),
        format!("Expires:   {}", util::fmt_time(l.expires_at)),
    ];
    if !l.features.is_empty() {
        lines.push(format!("Features:  {}", l.features.join(", ")));
    }
    lines.join("\n")
}

fn render(license: &License, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        license,
        |l| detail(l, color),
        |l| l.status.to_string(),
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(
    monitor: &Monitor,
    args: LicenseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let applied = match args.command {
        LicenseCommand::Show => monitor.refresh_license().await?,
        LicenseCommand::Activate { key } => {
            if key.trim().is_empty() {
                return Err(CliError::Validation {
                    field: "key".into(),
                    reason: "license key cannot be empty".into(),
                });
            }
            monitor.activate_license(key.trim()).await?
        }
        LicenseCommand::Deactivate => {
            if !util::confirm(
                "Deactivate the license on this device?",
                "license deactivate",
                global.yes,
            )? {
                return Ok(());
            }
            monitor.deactivate_license().await?
        }
    };

    if let Some(license) = util::fresh(applied, "license") {
        render(&license, global);
    }
    Ok(())
}
