//! Single-writer actor around the engine.
//!
//! One tokio task owns the [`DiffViewEngine`]; commands and read queries are
//! sent over a channel and answered through oneshot replies, so every
//! mutation is serialized no matter how many load workflows run at once.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::command::Command;
use crate::engine_store::DiffViewEngine;
use crate::error::ApplyResult;
use crate::state::DiffState;

/// The engine task has stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Diff engine task has stopped")]
pub struct EngineClosed;

type Query = Box<dyn FnOnce(&DiffState) + Send>;

enum Request {
    Dispatch {
        command: Command,
        reply: oneshot::Sender<ApplyResult>,
    },
    Query(Query),
}

/// Cloneable handle to the engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<Request>,
}

impl EngineHandle {
    /// Move the engine onto a new task. Must be called within a tokio runtime.
    ///
    /// The task ends once every handle is dropped.
    pub fn spawn(engine: DiffViewEngine) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run(engine, rx));
        Self { tx }
    }

    /// Apply a command and wait for its outcome.
    pub async fn dispatch(&self, command: Command) -> Result<ApplyResult, EngineClosed> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Request::Dispatch { command, reply })
            .map_err(|_| EngineClosed)?;
        rx.await.map_err(|_| EngineClosed)
    }

    /// Run a read-only function against the current state.
    pub async fn query<R, F>(&self, f: F) -> Result<R, EngineClosed>
    where
        R: Send + 'static,
        F: FnOnce(&DiffState) -> R + Send + 'static,
    {
        let (reply, rx) = oneshot::channel();
        let query: Query = Box::new(move |state| {
            let _ = reply.send(f(state));
        });
        self.tx.send(Request::Query(query)).map_err(|_| EngineClosed)?;
        rx.await.map_err(|_| EngineClosed)
    }
}

async fn run(mut engine: DiffViewEngine, mut rx: mpsc::UnboundedReceiver<Request>) {
    while let Some(request) = rx.recv().await {
        match request {
            Request::Dispatch { command, reply } => {
                let result = engine.dispatch(command);
                if reply.send(result).is_err() {
                    log::debug!("Dispatch caller went away before the reply");
                }
            }
            Request::Query(query) => query(engine.state()),
        }
    }
    log::debug!("Diff engine task stopped");
}
