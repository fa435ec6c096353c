//! Command dispatch: bridges CLI args -> Monitor operations -> output formatting.

pub mod config_cmd;
pub mod device;
pub mod events;
pub mod license;
pub mod metrics;
pub mod util;

use std::sync::Arc;

use dxwatch_core::Monitor;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a backend-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, monitor: Monitor, global: &GlobalOpts) -> Result<(), CliError> {
    let monitor = Arc::new(monitor);
    match cmd {
        Command::Device(args) => device::handle(&monitor, args, global).await,
        Command::License(args) => license::handle(&monitor, args, global).await,
        Command::Metrics(args) => metrics::handle(monitor, args, global).await,
        Command::Events(args) => events::handle(&monitor, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Ok(()),
    }
}
