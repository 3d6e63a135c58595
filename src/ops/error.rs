use crate::io::lock::LockError;
use crate::io::table_io::TableError;
use crate::ops::validate::ValidateError;

/// Error type for record store operations.
///
/// Every variant except `PartialWrite`, `Lock` and `IoError` is a rejected
/// request: nothing was written and the caller can re-prompt.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("out of range: {0}")]
    OutOfRange(String),
    #[error("invalid entry: {0}")]
    InvalidFormat(String),
    #[error("{0} cannot be empty")]
    EmptyInput(String),
    #[error("{operation} left registry and files out of step: {detail} (details in .recovery.log)")]
    PartialWrite { operation: String, detail: String },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StoreError {
    /// True for errors caused by the request itself rather than by the
    /// filesystem. Front ends re-prompt on these.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::NotFound(_)
                | StoreError::AlreadyExists(_)
                | StoreError::OutOfRange(_)
                | StoreError::InvalidFormat(_)
                | StoreError::EmptyInput(_)
        )
    }
}

impl From<ValidateError> for StoreError {
    fn from(e: ValidateError) -> Self {
        match e {
            ValidateError::EmptyInput => StoreError::EmptyInput("entry".to_string()),
            other => StoreError::InvalidFormat(other.to_string()),
        }
    }
}
