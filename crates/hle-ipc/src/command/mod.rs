//! Command descriptors and the per-facade command table.
//!
//! A facade describes its command set as a static list of
//! [`CommandDescriptor`]s. [`CommandTable::new`] sorts the list by command
//! number and rejects duplicates, after which lookups are a binary search.
//! Entries whose handler is [`CommandHandler::Stubbed`] are known to the
//! facade but have no behaviour; the dispatcher answers them through its
//! stub policy.


use std::fmt;

use thiserror::Error;

use crate::dispatch::HandlerFailure;
use crate::ipc::{CommandHeader, IpcResponse, RequestParser};
use crate::module::SharedModule;

/// Handler signature shared by every implemented command.
///
/// The handler receives the facade's shared module and a parser positioned at
/// the first normal parameter, and returns the complete response.
pub type HandlerFn<S> =
    fn(&SharedModule<S>, &mut RequestParser<'_>) -> Result<IpcResponse, HandlerFailure>;

/// Behaviour bound to a command number.
pub enum CommandHandler<S> {
    /// The command has a real implementation.
    Implemented(HandlerFn<S>),
    /// The command is known but has no implementation.
    Stubbed,
}

impl<S> CommandHandler<S> {
    /// Returns `true` for [`CommandHandler::Stubbed`].
    #[must_use]
    pub const fn is_stubbed(&self) -> bool {
        matches!(self, Self::Stubbed)
    }
}

impl<S> Clone for CommandHandler<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for CommandHandler<S> {}

impl<S> fmt::Debug for CommandHandler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implemented(_) => f.write_str("Implemented"),
            Self::Stubbed => f.write_str("Stubbed"),
        }
    }
}

/// One entry of a command table.
pub struct CommandDescriptor<S> {
    header: CommandHeader,
    name: &'static str,
    handler: CommandHandler<S>,
}

impl<S> CommandDescriptor<S> {
    /// Describes an implemented command.
    ///
    /// `header` is the expected header word: the command number together with
    /// the parameter-shape signature the guest is expected to send.
    #[must_use]
    pub const fn implemented(header: u32, name: &'static str, handler: HandlerFn<S>) -> Self {
        Self {
            header: CommandHeader::from_raw(header),
            name,
            handler: CommandHandler::Implemented(handler),
        }
    }

    /// Describes a command that is known but not implemented.
    #[must_use]
    pub const fn stubbed(header: u32, name: &'static str) -> Self {
        Self {
            header: CommandHeader::from_raw(header),
            name,
            handler: CommandHandler::Stubbed,
        }
    }

    /// Command number.
    #[must_use]
    pub const fn command(&self) -> u16 {
        self.header.command()
    }

    /// Expected header word.
    #[must_use]
    pub const fn header(&self) -> CommandHeader {
        self.header
    }

    /// Display name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Bound behaviour.
    #[must_use]
    pub const fn handler(&self) -> CommandHandler<S> {
        self.handler
    }
}

impl<S> Clone for CommandDescriptor<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for CommandDescriptor<S> {}

impl<S> fmt::Debug for CommandDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("header", &format_args!("{}", self.header))
            .field("name", &self.name)
            .field("handler", &self.handler)
            .finish()
    }
}

/// Errors raised while building a command table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Two descriptors share a command number.
    #[error("command {command:#06X} is declared twice ('{first}' and '{second}')")]
    DuplicateCommand {
        command: u16,
        first: &'static str,
        second: &'static str,
    },
}

/// Immutable, sorted command table.
pub struct CommandTable<S> {
    entries: Vec<CommandDescriptor<S>>,
}

impl<S> CommandTable<S> {
    /// Builds a table from descriptors in any order.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::DuplicateCommand`] when two descriptors share a
    /// command number, even if their signatures differ.
    pub fn new(
        descriptors: impl IntoIterator<Item = CommandDescriptor<S>>,
    ) -> Result<Self, TableError> {
        let mut entries: Vec<_> = descriptors.into_iter().collect();
        entries.sort_by_key(CommandDescriptor::command);
        let duplicate = entries.windows(2).find_map(|pair| match pair {
            [first, second] if first.command() == second.command() => Some((first, second)),
            _ => None,
        });
        if let Some((first, second)) = duplicate {
            return Err(TableError::DuplicateCommand {
                command: first.command(),
                first: first.name,
                second: second.name,
            });
        }
        Ok(Self { entries })
    }

    /// Looks up the descriptor for `command`.
    #[must_use]
    pub fn resolve(&self, command: u16) -> Option<&CommandDescriptor<S>> {
        self.entries
            .binary_search_by_key(&command, CommandDescriptor::command)
            .ok()
            .and_then(|index| self.entries.get(index))
    }

    /// Number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no descriptors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptors in ascending command order.
    pub fn iter(&self) -> impl Iterator<Item = &CommandDescriptor<S>> {
        self.entries.iter()
    }

    /// Number of implemented descriptors.
    #[must_use]
    pub fn implemented_count(&self) -> usize {
        self.len() - self.stubbed_count()
    }

    /// Number of stubbed descriptors.
    #[must_use]
    pub fn stubbed_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.handler.is_stubbed())
            .count()
    }
}

impl<S> fmt::Debug for CommandTable<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("len", &self.len())
            .field("stubbed", &self.stubbed_count())
            .finish()
    }
}
