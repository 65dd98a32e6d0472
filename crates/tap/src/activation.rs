//! Deferred command-line activation
//!
//! Command-line options such as `-z stat,ip,tree` ask for a tap listener
//! before any capture is open, so the listener cannot be created while the
//! arguments are parsed. Extensions register a command prefix together with
//! a resolver; argument parsing hands every candidate token to
//! [`CommandRegistry::try_activate`], and once the capture context exists
//! [`CommandRegistry::run_pending`] calls the resolvers, which subscribe
//! their listeners on the [`TapPoint`].

use std::fmt;
use std::io;

use tracing::{debug, warn};

use crate::error::{Result, TapError};
use crate::tap_point::TapPoint;

/// Creates the listener for an activated command
///
/// Receives the tap point to subscribe on and the full command-line token.
pub type Resolver = Box<dyn FnMut(&mut TapPoint, &str) -> Result<()>>;

struct TapCommand {
    prefix: String,
    resolver: Resolver,
}

struct PendingActivation {
    /// Index into `CommandRegistry::commands`
    command: usize,
    argument: String,
}

/// Registered command prefixes and the activations waiting to run
#[derive(Default)]
pub struct CommandRegistry {
    commands: Vec<TapCommand>,
    pending: Vec<PendingActivation>,
}

impl CommandRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command prefix and the resolver creating its listener
    pub fn register_command(
        &mut self,
        prefix: impl Into<String>,
        resolver: impl FnMut(&mut TapPoint, &str) -> Result<()> + 'static,
    ) {
        self.commands.push(TapCommand {
            prefix: prefix.into(),
            resolver: Box::new(resolver),
        });
    }

    /// Claim a command-line token if it starts with a registered prefix
    ///
    /// When several prefixes match, the most recently registered wins.
    /// Returns false if the token belongs to someone else.
    pub fn try_activate(&mut self, token: &str) -> bool {
        let Some(command) = self
            .commands
            .iter()
            .rposition(|c| token.starts_with(c.prefix.as_str()))
        else {
            return false;
        };

        debug!(
            command = %self.commands[command].prefix,
            argument = token,
            "tap activation queued"
        );
        self.pending.push(PendingActivation {
            command,
            argument: token.to_string(),
        });
        true
    }

    /// Activations waiting to run, as `(matched prefix, argument)`
    pub fn pending(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pending.iter().map(|p| {
            (
                self.commands[p.command].prefix.as_str(),
                p.argument.as_str(),
            )
        })
    }

    /// Number of activations waiting to run
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Run every pending activation in the order it was claimed
    ///
    /// Call once the capture context is set up and before the first packet
    /// is decoded. Every activation is consumed whether or not its resolver
    /// succeeds; a failure does not stop the ones after it.
    pub fn run_pending(&mut self, taps: &mut TapPoint) -> ActivationSummary {
        let mut summary = ActivationSummary::default();

        for activation in std::mem::take(&mut self.pending) {
            let command = &mut self.commands[activation.command];
            match (command.resolver)(taps, &activation.argument) {
                Ok(()) => {
                    debug!(
                        command = %command.prefix,
                        argument = %activation.argument,
                        "tap activation started"
                    );
                    summary.started += 1;
                }
                Err(e) => {
                    warn!(
                        command = %command.prefix,
                        argument = %activation.argument,
                        error = %e,
                        "tap activation failed"
                    );
                    summary
                        .failures
                        .push(TapError::activation(activation.argument, e));
                }
            }
        }

        summary
    }

    /// Registered command prefixes, in registration order
    pub fn list_commands(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().map(|c| c.prefix.as_str())
    }

    /// Write the registered prefixes for usage output, one indented per line
    pub fn write_usage<W: io::Write>(&self, mut writer: W) -> io::Result<()> {
        for prefix in self.list_commands() {
            writeln!(writer, "     {prefix}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.list_commands().collect::<Vec<_>>())
            .field("pending", &self.pending.len())
            .finish()
    }
}

/// Outcome of [`CommandRegistry::run_pending`]
#[derive(Debug, Default)]
pub struct ActivationSummary {
    /// Activations whose resolver succeeded
    pub started: usize,
    /// Errors of the activations that did not
    pub failures: Vec<TapError>,
}

impl ActivationSummary {
    /// True if every activation started
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
#[path = "activation_test.rs"]
mod tests;
