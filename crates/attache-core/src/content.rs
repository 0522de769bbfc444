//! Content model
//!
//! A [`Content`] is what callers hand to a data store: an opaque payload plus a
//! free-form metadata map. The logical name lives in the metadata under
//! [`NAME_KEY`].

use std::collections::BTreeMap;

use bytes::Bytes;
use serde_json::Value;

/// Metadata key holding the logical name of a piece of content
pub const NAME_KEY: &str = "name";

/// Metadata attached to stored content
pub type Meta = BTreeMap<String, Value>;

/// Payload plus metadata
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Content {
    data: Bytes,
    /// Free-form metadata, persisted next to the payload when enabled
    pub meta: Meta,
}

impl Content {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            meta: Meta::new(),
        }
    }

    /// Empty content, typically filled later with [`Content::update`]
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.set_name(name);
        self
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Logical name, if one is set and is a string
    pub fn name(&self) -> Option<&str> {
        self.meta.get(NAME_KEY).and_then(Value::as_str)
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.meta.insert(NAME_KEY.to_string(), Value::String(name.into()));
    }

    /// Replace payload and merge in metadata, as returned by a data store read
    pub fn update(&mut self, data: impl Into<Bytes>, meta: Meta) {
        self.data = data.into();
        self.meta.extend(meta);
    }
}
