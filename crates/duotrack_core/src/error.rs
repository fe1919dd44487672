//! crates/duotrack_core/src/error.rs
//!
//! The error taxonomy of the core operations.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed input. The message names the offending field.
    #[error("{0}")]
    Validation(String),

    /// The referenced item is absent or not visible to the requester.
    #[error("{0}")]
    NotFound(String),

    /// The requester is known but lacks permission.
    #[error("{0}")]
    Forbidden(String),

    /// The request clashes with existing state.
    #[error("{0}")]
    Conflict(String),

    #[error("Service Port Error: {0}")]
    Port(PortError),
}

impl From<PortError> for CoreError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => CoreError::NotFound(msg),
            PortError::Conflict(msg) => CoreError::Conflict(msg),
            other => CoreError::Port(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
