//! Engine store - owns the state and runs commands through the middleware
//! chain and the reducer.

use diff_review_config::EngineConfig;

use crate::command::Command;
use crate::error::{ApplyResult, Outcome};
use crate::middleware::{LoggingMiddleware, Middleware};
use crate::reducer;
use crate::state::DiffState;

pub struct DiffViewEngine {
    state: DiffState,
    middleware: Vec<Box<dyn Middleware>>,
}

impl DiffViewEngine {
    pub fn new(initial_state: DiffState) -> Self {
        Self {
            state: initial_state,
            middleware: Vec::new(),
        }
    }

    /// Engine over a fresh state, logging every command.
    pub fn with_config(config: &EngineConfig) -> Self {
        let mut engine = Self::new(DiffState::new(config));
        engine.add_middleware(Box::new(LoggingMiddleware::new()));
        engine
    }

    /// Add middleware to the chain
    pub fn add_middleware(&mut self, middleware: Box<dyn Middleware>) {
        self.middleware.push(middleware);
    }

    /// Get the current state
    pub fn state(&self) -> &DiffState {
        &self.state
    }

    /// Run a command through the middleware chain and apply it.
    ///
    /// A command consumed by middleware is reported as `Unchanged`.
    pub fn dispatch(&mut self, command: Command) -> ApplyResult {
        for middleware in &mut self.middleware {
            if !middleware.handle(&command, &self.state) {
                log::debug!("Command {} consumed by middleware", command.name());
                return Ok(Outcome::Unchanged);
            }
        }

        let name = command.name();
        let result = reducer::apply(&mut self.state, command);
        match &result {
            Ok(Outcome::Skipped(miss)) => log::warn!("{} skipped: {}", name, miss),
            Err(err) => log::error!("{} rejected: {}", name, err),
            Ok(_) => {}
        }
        result
    }
}

impl Default for DiffViewEngine {
    fn default() -> Self {
        Self::with_config(&EngineConfig::default())
    }
}
