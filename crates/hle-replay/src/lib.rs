//! Replay host for the emulated services.
//!
//! The host plays the part of the service manager process: it loads the
//! layered [`hle_config::Config`], installs telemetry, builds the APT facades
//! over one shared module and registers them. A JSONL trace then drives
//! sessions against those facades, standing in for the guest transport.
//! See [`protocol`] for the record format.

mod bootstrap;
pub mod protocol;
mod replay;
mod telemetry;

#[cfg(test)]
mod tests;

use std::io::{BufRead, Write};
use std::process::ExitCode;

use tracing::{error, info};

pub use bootstrap::{
    APT_MODULE, BootstrapError, ConfigLoader, Host, SystemConfigLoader, bootstrap_with,
    dispatch_policy,
};
pub use protocol::{ReplayCommand, ReplayEvent};
pub use replay::{ReplayError, ReplaySummary, Replayer, StepError};
pub use telemetry::{TelemetryError, TelemetryHandle};

const RUN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::run");

/// Bootstraps a host, replays `input` against it and shuts it down.
///
/// Events go to `stdout`; fatal errors are also written to `stderr`. The exit
/// code is a failure when bootstrap fails, the trace cannot be processed or
/// any step produced an error event.
pub fn run<R, W, E>(loader: &dyn ConfigLoader, input: R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    R: BufRead,
    W: Write,
    E: Write,
{
    let host = match bootstrap_with(loader) {
        Ok(host) => host,
        Err(bootstrap_error) => {
            let _ = writeln!(stderr, "{bootstrap_error}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = Replayer::new(&host).replay(input, stdout);
    if let Err(shutdown_error) = host.shutdown() {
        error!(target: RUN_TARGET, error = %shutdown_error, "shutdown failed");
    }

    match outcome {
        Ok(summary) => {
            info!(
                target: RUN_TARGET,
                steps = summary.steps,
                failures = summary.failures,
                "replay finished"
            );
            if summary.failures == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(replay_error) => {
            error!(target: RUN_TARGET, error = %replay_error, "replay aborted");
            let _ = writeln!(stderr, "{replay_error}");
            ExitCode::FAILURE
        }
    }
}
