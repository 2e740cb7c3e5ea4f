//! Replays a JSONL request trace against the emulated services.
//!
//! Requests are read from stdin and one JSON event per request is written to
//! stdout. Telemetry goes to stderr.

use std::io::{self, StderrLock, StdoutLock};
use std::process::ExitCode;

use hle_replay::SystemConfigLoader;

fn main() -> ExitCode {
    let stdin = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    hle_replay::run(&SystemConfigLoader, stdin, &mut stdout, &mut stderr)
}
