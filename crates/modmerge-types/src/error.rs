use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("guid is empty")]
    EmptyGuid,

    #[error("invalid guid: {0:?}")]
    InvalidGuid(String),

    #[error("unknown field name: {0}")]
    UnknownField(String),
}
