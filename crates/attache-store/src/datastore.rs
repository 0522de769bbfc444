//! Data store abstraction
//!
//! Every backend turns content into a uid on write and hands the same content
//! back for that uid until it is destroyed.

use attache_core::{Content, Meta};
use bytes::Bytes;

use crate::error::{StoreError, StoreResult};

/// Options accepted by [`DataStore::write`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Explicit relative path to store under instead of a derived one
    pub path: Option<String>,
}

impl WriteOptions {
    pub fn with_path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// Storage trait - unified interface for data store backends
pub trait DataStore: Send + Sync {
    /// Store content and return its uid
    fn write(&self, content: &Content, options: &WriteOptions) -> StoreResult<String>;

    /// Read content back; `Ok(None)` when nothing is stored under the uid
    fn read(&self, uid: &str) -> StoreResult<Option<(Bytes, Meta)>>;

    /// Remove stored content; destroying a missing uid is not an error
    fn destroy(&self, uid: &str) -> StoreResult<()>;

    /// Public url path for serving the content directly, when the backend can form one
    fn url_for(&self, uid: &str) -> StoreResult<String> {
        Err(StoreError::UnableToFormUrl(format!(
            "{} data store cannot serve {} directly",
            self.name(),
            uid
        )))
    }

    /// Get data store name for logging
    fn name(&self) -> &str;
}
