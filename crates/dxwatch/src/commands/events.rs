//! Event command handlers.

use std::io::Write;
use std::path::PathBuf;

use tabled::Tabled;

use dxwatch_core::{Event, EventStatistics, Monitor};

use crate::cli::{EventsArgs, EventsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct EventRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Type")]
    event_type: String,
    #[tabled(rename = "Stream")]
    stream: String,
    #[tabled(rename = "App")]
    app: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl From<&Event> for EventRow {
    fn from(e: &Event) -> Self {
        Self {
            id: e.id.clone(),
            time: util::fmt_time(Some(e.timestamp)),
            event_type: e.event_type.clone(),
            stream: util::or_dash(e.stream.as_deref()).to_owned(),
            app: util::or_dash(e.app.as_deref()).to_owned(),
            message: util::or_dash(e.message.as_deref()).to_owned(),
        }
    }
}

fn stats_detail(s: &EventStatistics) -> String {
    let mut lines = vec![format!("Total: {}", s.total)];
    for (title, counts) in [
        ("By type", &s.by_type),
        ("By stream", &s.by_stream),
        ("By app", &s.by_app),
    ] {
        if counts.is_empty() {
            continue;
        }
        lines.push(String::new());
        lines.push(format!("{title}:"));
        let mut sorted: Vec<_> = counts.iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (key, count) in sorted {
            lines.push(format!("  {key:<20} {count}"));
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: &Monitor,
    args: EventsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let now = chrono::Utc::now();

    match args.command {
        EventsCommand::List {
            filter,
            page,
            page_size,
        } => {
            if page == 0 || page_size == 0 {
                return Err(CliError::Validation {
                    field: "page".into(),
                    reason: "page and page size start at 1".into(),
                });
            }
            let mut filter = util::event_filter(&filter, now)?;
            filter.page = Some(page);
            filter.page_size = Some(page_size);

            if let Some(response) = util::fresh(monitor.search_events(filter).await?, "events") {
                let out = output::render_list(
                    &global.output,
                    &response.data,
                    |e| EventRow::from(e),
                    |e| e.id.clone(),
                );
                output::print_output(&out, global.quiet);

                let p = response.pagination;
                if !global.quiet && matches!(global.output, crate::cli::OutputFormat::Table) {
                    eprintln!(
                        "page {}/{} ({} events total)",
                        p.page, p.total_pages, p.total
                    );
                }
            }
            Ok(())
        }

        EventsCommand::Stats { filter } => {
            let filter = util::event_filter(&filter, now)?;
            let applied = monitor.load_statistics(&filter).await?;
            if let Some(stats) = util::fresh(applied, "statistics") {
                let out = output::render_single(&global.output, &stats, stats_detail, |s| {
                    s.total.to_string()
                });
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        EventsCommand::Export {
            filter,
            format,
            out,
        } => {
            let filter = util::event_filter(&filter, now)?;
            let format = util::export_format(format);
            let bytes = monitor.export_events(&filter, format).await?;

            let target = out.unwrap_or_else(|| PathBuf::from(format!("events.{}", format.extension())));
            if target.as_os_str() == "-" {
                std::io::stdout().lock().write_all(&bytes)?;
            } else {
                std::fs::write(&target, &bytes)?;
                if !global.quiet {
                    eprintln!("Wrote {} bytes to {}", bytes.len(), target.display());
                }
            }
            Ok(())
        }
    }
}
