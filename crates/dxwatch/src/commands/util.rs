//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::time::Duration;

use chrono::{DateTime, Utc};

use dxwatch_core::{Applied, EventFilter, ExportFormat, TimeRange};

use crate::cli::{EventFilterArgs, ExportFormatArg, TimeArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal on stdin there is nobody to ask, so the operation
/// is refused unless `--yes` is set.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))
}

// ── Argument conversion ─────────────────────────────────────────────

/// Take the value of a fresh result. A superseded one has nothing to show,
/// which is logged rather than silently exiting.
pub fn fresh<T>(applied: Applied<T>, op: &str) -> Option<T> {
    let value = applied.fresh();
    if value.is_none() {
        tracing::warn!(op, "result superseded by a newer request; nothing to show");
    }
    value
}

fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| CliError::Validation {
            field: field.into(),
            reason: format!("expected RFC 3339 timestamp, got '{raw}' ({e})"),
        })
}

/// Resolve `--start` / `--since` / `--end` against `now`.
pub fn time_range(args: &TimeArgs, now: DateTime<Utc>) -> Result<TimeRange, CliError> {
    let start = match (&args.start, &args.since) {
        (Some(raw), _) => Some(parse_timestamp("start", raw)?),
        (None, Some(raw)) => {
            let ago = humantime::parse_duration(raw).map_err(|e| CliError::Validation {
                field: "since".into(),
                reason: format!("'{raw}': {e}"),
            })?;
            let ago = chrono::Duration::from_std(ago).map_err(|e| CliError::Validation {
                field: "since".into(),
                reason: e.to_string(),
            })?;
            Some(now - ago)
        }
        (None, None) => None,
    };
    let end = args
        .end
        .as_deref()
        .map(|raw| parse_timestamp("end", raw))
        .transpose()?;

    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(CliError::Validation {
                field: "end".into(),
                reason: "end must not be before start".into(),
            });
        }
    }
    Ok(TimeRange::new(start, end))
}

pub fn event_filter(args: &EventFilterArgs, now: DateTime<Utc>) -> Result<EventFilter, CliError> {
    let range = time_range(&args.range, now)?;
    Ok(EventFilter {
        start_date: range.start,
        end_date: range.end,
        types: args.types.clone(),
        streams: args.streams.clone(),
        apps: args.apps.clone(),
        page: None,
        page_size: None,
    })
}

pub fn export_format(arg: ExportFormatArg) -> ExportFormat {
    match arg {
        ExportFormatArg::Csv => ExportFormat::Csv,
        ExportFormatArg::Xlsx => ExportFormat::Xlsx,
    }
}

// ── Display helpers ─────────────────────────────────────────────────

pub fn fmt_uptime(secs: u64) -> String {
    humantime::format_duration(Duration::from_secs(secs)).to_string()
}

pub fn fmt_bytes(bytes: u64) -> String {
    bytesize::ByteSize(bytes).to_string()
}

pub fn fmt_time(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(|| "-".into(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string())
}

pub fn or_dash(value: Option<&str>) -> &str {
    value.unwrap_or("-")
}
