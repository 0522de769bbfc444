use std::path::PathBuf;

use attache_core::AttacheError;
use thiserror::Error;

/// Data store errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// The uid tries to climb out of the store with a `../` segment
    #[error("Bad uid: {0}")]
    BadUid(String),

    #[error("Unable to form url: {0}")]
    UnableToFormUrl(String),

    /// A resolved path ended up outside of the store root
    #[error("Path {} is outside of the store root", .0.display())]
    OutsideRoot(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Meta serialization error: {0}")]
    Meta(#[from] serde_yaml::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for AttacheError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::BadUid(_) => AttacheError::BadRequest(err.to_string()),
            other => AttacheError::Storage(other.to_string()),
        }
    }
}
