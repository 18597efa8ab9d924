//! Supervised execution of the worker process.

mod error;
mod runner;
mod stderr;

pub use error::{Outcome, SupervisorError};
pub use runner::{
    CommandState, WorkerCommand, DEFAULT_POLL_INTERVAL, DEFAULT_TERMINATE_TIMEOUT,
};
pub use stderr::StderrBuffer;
