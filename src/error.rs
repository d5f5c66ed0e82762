//! Error types for outline extraction.
//!
//! Only the document boundary can fail. The heuristic stages are total over any
//! sequence of text lines, including the empty one.

use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be decoded at all.
    #[error("Unreadable document: {0}")]
    InputUnreadable(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid or unparsable tuning configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::InputUnreadable(err.to_string())
    }
}

impl From<pdf_extract::OutputError> for Error {
    fn from(err: pdf_extract::OutputError) -> Self {
        Error::InputUnreadable(err.to_string())
    }
}
