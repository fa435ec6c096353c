//! Device command handlers.

use dxwatch_core::{Device, DeviceState, DeviceStatus, DeviceUpdate, Monitor};

use crate::cli::{DeviceArgs, DeviceCommand, GlobalOpts};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Detail views ────────────────────────────────────────────────────

fn detail(d: &Device) -> String {
    let mut lines = vec![
        format!("ID:       {}", d.id),
        format!("Name:     {}", if d.name.is_empty() { "-" } else { d.name.as_str() }),
        format!("Model:    {}", util::or_dash(d.model.as_deref())),
        format!("Serial:   {}", util::or_dash(d.serial_number.as_deref())),
        format!("Firmware: {}", util::or_dash(d.firmware_version.as_deref())),
        format!("IP:       {}", util::or_dash(d.ip_address.as_deref())),
        format!("MAC:      {}", util::or_dash(d.mac_address.as_deref())),
        format!("Location: {}", util::or_dash(d.location.as_deref())),
        format!("Timezone: {}", util::or_dash(d.timezone.as_deref())),
    ];
    if !d.config.is_empty() {
        lines.push(format!("Config:   {} keys", d.config.len()));
    }
    lines.join("\n")
}

fn state_tone(state: DeviceState) -> Tone {
    match state {
        DeviceState::Running => Tone::Good,
        DeviceState::Starting | DeviceState::Restarting | DeviceState::Degraded => Tone::Warn,
        DeviceState::Stopped => Tone::Bad,
        DeviceState::Unknown => Tone::Neutral,
    }
}

fn status_detail(s: &DeviceStatus, color: bool) -> String {
    let online = if s.online {
        output::paint("yes", Tone::Good, color)
    } else {
        output::paint("no", Tone::Bad, color)
    };
    let mut lines = vec![
        format!("Online:   {online}"),
        format!(
            "State:    {}",
            output::paint(&s.state.to_string(), state_tone(s.state), color)
        ),
        format!("Uptime:   {}", util::fmt_uptime(s.uptime)),
        format!("Cameras:  {}", s.camera_count),
        format!("Streams:  {}", s.active_streams),
        format!("Seen:     {}", util::fmt_time(s.last_seen)),
    ];
    if let Some(ref message) = s.message {
        lines.push(format!("Message:  {message}"));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: DeviceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        DeviceCommand::Show => {
            if let Some(device) = util::fresh(monitor.refresh_device().await?, "device") {
                let out = output::render_single(&global.output, &device, detail, |d| d.id.clone());
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        DeviceCommand::Status => {
            if let Some(status) = util::fresh(monitor.refresh_status().await?, "status") {
                let out = output::render_single(
                    &global.output,
                    &status,
                    |s| status_detail(s, color),
                    |s| s.state.to_string(),
                );
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        DeviceCommand::Update {
            name,
            location,
            timezone,
        } => {
            let update = DeviceUpdate {
                name,
                location,
                timezone,
            };
            if update.is_empty() {
                return Err(CliError::Validation {
                    field: "update".into(),
                    reason: "pass at least one of --name, --location, --timezone".into(),
                });
            }
            let applied = monitor.update_device(&update).await?;
            if let Some(device) = util::fresh(applied, "update device") {
                let out = output::render_single(&global.output, &device, detail, |d| d.id.clone());
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        DeviceCommand::Restart => {
            if !util::confirm("Restart the device now?", "device restart", global.yes)? {
                return Ok(());
            }
            monitor.restart_device().await?;
            if !global.quiet {
                eprintln!("Restart requested");
            }
            Ok(())
        }
    }
}
