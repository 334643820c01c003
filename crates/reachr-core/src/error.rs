//! Error taxonomy shared by every Reachr operation.
//!
//! Callers map these onto transport status codes: [`Error::NotFound`] is a
//! 404, [`Error::InvalidInput`] a 400, [`Error::StorageUnavailable`] a 500
//! and [`Error::Conflict`] a 409.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown contact id.
    #[error("contact not found: {0}")]
    NotFound(String),

    /// Caller-supplied data failed validation (empty tag, empty name, bad user id).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backing store could not be read or written.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// Reserved for optimistic-concurrency checks; nothing raises it yet.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl Error {
    pub fn storage(err: anyhow::Error) -> Self {
        Error::StorageUnavailable(format!("{err:#}"))
    }

    /// Stable machine-readable code, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "not_found",
            Error::InvalidInput(_) => "bad_request",
            Error::StorageUnavailable(_) => "storage_unavailable",
            Error::Conflict(_) => "conflict",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
