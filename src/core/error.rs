//! Error types for remesh

use thiserror::Error;

/// Main error type for the crate
#[derive(Debug, Error)]
pub enum Error {
    /// No region is pending. Expected while idle; callers treat it as "nothing to do".
    #[error("update queue is empty")]
    EmptyQueue,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// True for the idle signal from `pop`/`peek`
    pub fn is_empty_queue(&self) -> bool {
        matches!(self, Error::EmptyQueue)
    }
}
