use thiserror::Error;

use crate::constants::FIELD_COUNT;

/// Broad classification used by callers that only care whether a failure
/// was their fault or the engine's.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    ConsistencyViolation,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FieldError {
    #[error("field index {0} out of range [0, {FIELD_COUNT})")]
    FieldIndexOutOfRange(usize),

    #[error("byte value {0} out of range [0, 255]")]
    ByteOutOfRange(i64),

    #[error("pattern must have exactly {FIELD_COUNT} entries, got {0}")]
    PatternLength(usize),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("field constant consistency violation: {0}")]
    ConsistencyViolation(String),
}

impl FieldError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FieldError::ConsistencyViolation(_) => ErrorKind::ConsistencyViolation,
            _ => ErrorKind::InvalidInput,
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldError>;
