//! In-memory data store for testing and embedding

use std::collections::HashMap;

use attache_core::{Content, Meta, NAME_KEY};
use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::datastore::{DataStore, WriteOptions};
use crate::error::StoreResult;
use crate::uid::{random_token, validate_uid};

const UID_LENGTH: usize = 16;

/// Data store holding everything in a map; contents vanish with the store
#[derive(Debug, Default)]
pub struct MemoryDataStore {
    entries: RwLock<HashMap<String, (Bytes, Meta)>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn random_uid() -> String {
        random_token(UID_LENGTH)
    }
}

impl DataStore for MemoryDataStore {
    fn write(&self, content: &Content, options: &WriteOptions) -> StoreResult<String> {
        if let Some(path) = &options.path {
            validate_uid(path)?;
        }

        let mut entries = self.entries.write();
        let uid = match &options.path {
            Some(path) if !entries.contains_key(path) => path.clone(),
            _ => loop {
                let uid = Self::random_uid();
                if !entries.contains_key(&uid) {
                    break uid;
                }
            },
        };

        entries.insert(uid.clone(), (content.data().clone(), content.meta.clone()));
        debug!(uid = %uid, size = content.size(), "Content stored in memory");
        Ok(uid)
    }

    fn read(&self, uid: &str) -> StoreResult<Option<(Bytes, Meta)>> {
        validate_uid(uid)?;
        let Some((data, mut meta)) = self.entries.read().get(uid).cloned() else {
            return Ok(None);
        };

        if !meta.contains_key(NAME_KEY) {
            let basename = uid.rsplit('/').next().unwrap_or(uid);
            meta.insert(NAME_KEY.to_string(), Value::String(basename.to_string()));
        }
        Ok(Some((data, meta)))
    }

    fn destroy(&self, uid: &str) -> StoreResult<()> {
        validate_uid(uid)?;
        self.entries.write().remove(uid);
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
