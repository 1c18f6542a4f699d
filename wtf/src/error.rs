//! Error types shared by the glossary store, the interpreter and the chat adapter.
//!
//! "Not found" is deliberately absent: lookups that can legitimately miss
//! return `Option` instead of an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WtfError {
    /// Durable read or write failure in the underlying SQLite database.
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
    #[error("connector error: {0}")]
    Connector(String),
    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),
}

impl WtfError {
    /// Storage failures are the only errors an operator needs to hear about.
    pub fn is_storage(&self) -> bool {
        matches!(self, WtfError::Storage(_) | WtfError::LockPoisoned(_))
    }
}

pub type WtfResult<T> = Result<T, WtfError>;
