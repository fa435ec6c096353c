//! Metrics command handlers.

use std::sync::Arc;

use serde::Serialize;
use tabled::Tabled;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dxwatch_core::{Loadable, MetricsPoller, MetricsSnapshot, MetricsState, Monitor};

use crate::cli::{GlobalOpts, MetricsArgs, MetricsCommand, OutputFormat};
use crate::error::CliError;
use crate::output::{self, Tone};

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct MetricsRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "CPU")]
    cpu: String,
    #[tabled(rename = "Memory")]
    memory: String,
    #[tabled(rename = "Disk")]
    disk: String,
    #[tabled(rename = "Uptime")]
    uptime: String,
}

/// History entries paired with their position, oldest first.
#[derive(Serialize)]
struct Indexed<'a> {
    #[serde(skip)]
    index: usize,
    #[serde(flatten)]
    sample: &'a MetricsSnapshot,
}

impl From<&Indexed<'_>> for MetricsRow {
    fn from(entry: &Indexed<'_>) -> Self {
        let m = entry.sample;
        Self {
            index: entry.index,
            cpu: format!("{:.1}%", m.cpu_percent),
            memory: format!("{:.1}%", m.memory_percent),
            disk: format!("{:.1}%", m.disk_percent),
            uptime: util::fmt_uptime(m.uptime),
        }
    }
}

// ── Detail views ────────────────────────────────────────────────────

fn percent(value: f64, color: bool) -> String {
    output::paint(&format!("{value:.1}%"), output::load_tone(value), color)
}

fn detail(m: &MetricsSnapshot, color: bool) -> String {
    [
        format!("CPU:    {} of {} cores", percent(m.cpu_percent, color), m.cpu_count),
        format!(
            "Memory: {} ({} / {})",
            percent(m.memory_percent, color),
            util::fmt_bytes(m.memory_used),
            util::fmt_bytes(m.memory_total)
        ),
        format!(
            "Disk:   {} ({} / {})",
            percent(m.disk_percent, color),
            util::fmt_bytes(m.disk_used),
            util::fmt_bytes(m.disk_total)
        ),
        format!("Uptime: {}", util::fmt_uptime(m.uptime)),
    ]
    .join("\n")
}

/// One line per sample for `watch` in table mode.
fn watch_line(m: &MetricsSnapshot, color: bool) -> String {
    format!(
        "{}  cpu {}  mem {}  disk {}",
        chrono::Local::now().format("%H:%M:%S"),
        percent(m.cpu_percent, color),
        percent(m.memory_percent, color),
        percent(m.disk_percent, color),
    )
}

fn plain(m: &MetricsSnapshot) -> String {
    format!(
        "{:.1}\t{:.1}\t{:.1}",
        m.cpu_percent, m.memory_percent, m.disk_percent
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    monitor: Arc<Monitor>,
    args: MetricsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);

    match args.command {
        MetricsCommand::Show => {
            if let Some(sample) = util::fresh(monitor.poll_metrics_once().await?, "metrics") {
                let out =
                    output::render_single(&global.output, &sample, |m| detail(m, color), plain);
                output::print_output(&out, global.quiet);
            }
            Ok(())
        }

        MetricsCommand::History { range } => {
            let range = util::time_range(&range, chrono::Utc::now())?;
            util::fresh(monitor.load_metrics_history(range).await?, "metrics history");

            let state = monitor.metrics_store().get_state();
            let entries: Vec<Indexed<'_>> = state
                .data
                .history
                .iter()
                .enumerate()
                .map(|(index, sample)| Indexed { index, sample })
                .collect();
            let out = output::render_list(
                &global.output,
                &entries,
                |e| MetricsRow::from(e),
                |e| plain(e.sample),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        MetricsCommand::Watch { interval, count } => watch(monitor, interval, count, global).await,
    }
}

/// Run the poller and print every completed fetch until Ctrl-C or `count`.
async fn watch(
    monitor: Arc<Monitor>,
    interval: Option<u64>,
    count: Option<usize>,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let store = monitor.metrics_store();
    if let Some(ms) = interval {
        store.set_polling_interval(ms);
    }

    // The listener sees every publication, so no loading transition is lost.
    let (tx, mut rx) = mpsc::unbounded_channel::<Loadable<MetricsState>>();
    let _subscription = store.subscribe(move |state| {
        let _ = tx.send(state.clone());
    });

    let poller = MetricsPoller::spawn(Arc::clone(&monitor), CancellationToken::new());
    tracing::info!(interval_ms = store.polling_interval(), "watching metrics");

    let mut was_loading = false;
    let mut printed = 0usize;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            next = rx.recv() => {
                let Some(state) = next else { break };
                let finished = was_loading && !state.is_loading;
                was_loading = state.is_loading;
                if !finished {
                    continue;
                }

                if let Some(ref err) = state.error {
                    if !global.quiet {
                        eprintln!("{}", output::paint(&format!("poll failed: {err}"), Tone::Bad, color));
                    }
                    continue;
                }
                let Some(sample) = state.data.metrics else { continue };

                let out = match global.output {
                    OutputFormat::Table => watch_line(&sample, color),
                    // One document per line keeps the stream parseable.
                    OutputFormat::Json | OutputFormat::JsonCompact => output::render_single(
                        &OutputFormat::JsonCompact,
                        &sample,
                        |m| detail(m, color),
                        plain,
                    ),
                    ref format => output::render_single(format, &sample, |m| detail(m, color), plain),
                };
                output::print_output(&out, global.quiet);

                printed += 1;
                if count.is_some_and(|n| printed >= n) {
                    break;
                }
            }
        }
    }

    poller.stop().await;
    Ok(())
}
