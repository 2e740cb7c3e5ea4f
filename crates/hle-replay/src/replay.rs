//! Applies a replay trace to a bootstrapped host.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::{self, BufRead, Write};

use hle_ipc::{ConnectError, DispatchOutcome, IpcRequest, Session, SnapshotError};
use thiserror::Error;
use tracing::{debug, warn};

use crate::bootstrap::Host;
use crate::protocol::{ReplayCommand, ReplayEvent};

const REPLAY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::replay");

/// Fatal replay failures. The trace stops at the first one.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading the trace failed.
    #[error("failed to read the replay trace: {0}")]
    Read(#[source] io::Error),
    /// Writing an event failed.
    #[error("failed to write a replay event: {0}")]
    Write(#[source] io::Error),
    /// Encoding an event failed.
    #[error("failed to encode a replay event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failure of a single step. Reported as an error event; the trace goes on.
#[derive(Debug, Error)]
pub enum StepError {
    /// The line is not a replay command.
    #[error("invalid replay command: {0}")]
    Decode(#[from] serde_json::Error),
    /// The trace names a session it never connected.
    #[error("session `{session}` is not connected")]
    UnknownSession {
        /// Trace-local session name.
        session: String,
    },
    /// The trace connects a session name twice.
    #[error("session `{session}` is already connected")]
    DuplicateSession {
        /// Trace-local session name.
        session: String,
    },
    /// The service manager refused the connection.
    #[error(transparent)]
    Connect(#[from] ConnectError),
    /// Capturing or restoring module state failed.
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Counters reported once a trace is exhausted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    /// Non-blank lines read.
    pub steps: usize,
    /// Steps that produced an error event.
    pub failures: usize,
}

/// Replays trace steps against one host, tracking its named sessions.
#[derive(Debug)]
pub struct Replayer<'host> {
    host: &'host Host,
    sessions: HashMap<String, Session>,
}

impl<'host> Replayer<'host> {
    /// Starts a replay with no open sessions.
    #[must_use]
    pub fn new(host: &'host Host) -> Self {
        Self {
            host,
            sessions: HashMap::new(),
        }
    }

    /// Applies one step.
    ///
    /// # Errors
    ///
    /// Returns [`StepError`] when the step cannot be applied.
    pub fn apply(&mut self, command: ReplayCommand) -> Result<ReplayEvent, StepError> {
        match command {
            ReplayCommand::Connect { session, service } => self.connect(session, &service),
            ReplayCommand::Request {
                session,
                words,
                buffers,
            } => self.request(session, &IpcRequest::with_buffers(words, buffers)),
            ReplayCommand::Close { session } => {
                let open = self
                    .sessions
                    .remove(&session)
                    .ok_or_else(|| StepError::UnknownSession {
                        session: session.clone(),
                    })?;
                open.close();
                Ok(ReplayEvent::Closed { session })
            }
            ReplayCommand::Snapshot => Ok(ReplayEvent::Snapshot {
                snapshot: self.host.apt().module().capture()?,
            }),
            ReplayCommand::Restore { snapshot } => {
                self.host.apt().module().restore(&snapshot)?;
                Ok(ReplayEvent::Restored {
                    module: snapshot.module().to_owned(),
                })
            }
        }
    }

    /// Applies every line of `input`, writing one event per step to `output`.
    ///
    /// Blank lines are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the trace cannot be read or an event
    /// cannot be written.
    pub fn replay<R, W>(&mut self, input: R, output: &mut W) -> Result<ReplaySummary, ReplayError>
    where
        R: BufRead,
        W: Write,
    {
        let mut summary = ReplaySummary::default();
        for (index, read) in input.lines().enumerate() {
            let line = read.map_err(ReplayError::Read)?;
            if line.trim().is_empty() {
                continue;
            }
            summary.steps += 1;
            let event = match serde_json::from_str(&line)
                .map_err(StepError::from)
                .and_then(|command| self.apply(command))
            {
                Ok(event) => event,
                Err(error) => {
                    warn!(target: REPLAY_TARGET, line = index + 1, %error, "replay step failed");
                    summary.failures += 1;
                    ReplayEvent::Error {
                        line: index + 1,
                        message: error.to_string(),
                    }
                }
            };
            serde_json::to_writer(&mut *output, &event).map_err(ReplayError::Encode)?;
            writeln!(output).map_err(ReplayError::Write)?;
        }
        output.flush().map_err(ReplayError::Write)?;
        Ok(summary)
    }

    fn connect(&mut self, session: String, service: &str) -> Result<ReplayEvent, StepError> {
        match self.sessions.entry(session) {
            Entry::Occupied(occupied) => Err(StepError::DuplicateSession {
                session: occupied.key().clone(),
            }),
            Entry::Vacant(vacant) => {
                let opened = self.host.manager().connect(service)?;
                let id = opened.id();
                let name = vacant.key().clone();
                vacant.insert(opened);
                debug!(target: REPLAY_TARGET, session = %name, service, id, "session connected");
                Ok(ReplayEvent::Connected {
                    session: name,
                    service: service.to_owned(),
                    id,
                })
            }
        }
    }

    fn request(&self, session: String, request: &IpcRequest) -> Result<ReplayEvent, StepError> {
        let open = self
            .sessions
            .get(&session)
            .ok_or_else(|| StepError::UnknownSession {
                session: session.clone(),
            })?;
        let Some(outcome) = open.submit(request) else {
            return Ok(ReplayEvent::Dropped { session });
        };
        let kind = outcome.kind().to_owned();
        let (words, buffers) = DispatchOutcome::into_response(outcome).into_parts();
        Ok(ReplayEvent::Response {
            session,
            outcome: kind,
            words,
            buffers,
        })
    }
}
