//! REPL errors

use std::io;

use thiserror::Error;

/// Errors surfaced by session construction and I/O
#[derive(Debug, Error)]
pub enum ReplError {
    /// Unusable options, detected at construction
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("History error: {message}")]
    History { message: String },
}

impl ReplError {
    pub fn config(message: impl Into<String>) -> Self {
        ReplError::Config {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReplError>;
