//! # attache-store
//!
//! Data stores for Attache.
//!
//! ## Features
//!
//! - [`DataStore`] abstraction shared by every backend
//! - [`FileDataStore`]: files under a root directory, YAML meta sidecars,
//!   collision-safe naming, empty directory pruning and public url paths
//! - [`MemoryDataStore`] for tests and embedding
//! - [`App`] and [`AppRegistry`] for named store instances
//!
//! ## Example
//!
//! ```rust,no_run
//! use attache_core::Content;
//! use attache_store::{DataStore, FileDataStore, WriteOptions};
//!
//! # fn main() -> Result<(), attache_store::StoreError> {
//! let store = FileDataStore::new("/var/tmp/attache").with_server_root("/var/tmp");
//!
//! let uid = store.write(&Content::new("bytes").with_name("beach.png"), &WriteOptions::default())?;
//! let url = store.url_for(&uid)?; // "/attache/<date>/<time>_0_beach.png"
//! let (data, meta) = store.read(&uid)?.expect("just written");
//! store.destroy(&uid)?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod datastore;
pub mod error;
pub mod file;
pub mod memory;
pub mod uid;

#[cfg(test)]
mod conformance;

pub use app::{App, AppRegistry, DEFAULT_APP_NAME};
pub use datastore::{DataStore, WriteOptions};
pub use error::{StoreError, StoreResult};
pub use file::collision::{Disambiguator, RandomSuffix};
pub use file::path::{Clock, FixedClock, SystemClock, WriteSequence};
pub use file::FileDataStore;
pub use memory::MemoryDataStore;
pub use uid::validate_uid;
