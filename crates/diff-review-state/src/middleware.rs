//! Middleware intercepting commands before they reach the reducer.

use crate::command::Command;
use crate::state::DiffState;

/// Middleware trait - intercepts commands before they reach the reducer
pub trait Middleware: Send {
    /// Handle a command
    ///
    /// - `command`: The command about to be applied
    /// - `state`: Current state (read-only)
    ///
    /// Returns `true` to continue the chain, `false` to consume the command
    fn handle(&mut self, command: &Command, state: &DiffState) -> bool;
}

/// LoggingMiddleware - logs all commands passing through
#[derive(Debug, Default)]
pub struct LoggingMiddleware;

impl LoggingMiddleware {
    pub fn new() -> Self {
        Self
    }
}

impl Middleware for LoggingMiddleware {
    fn handle(&mut self, command: &Command, _state: &DiffState) -> bool {
        log::debug!("Command: {:?}", command);
        true
    }
}
