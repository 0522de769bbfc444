//! Named apps and the registry holding them
//!
//! An [`App`] bundles a data store with the settings used to serve its
//! content. Apps are looked up by name through an [`AppRegistry`] owned by the
//! composition root (the server binary, or a test).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::datastore::DataStore;
use crate::memory::MemoryDataStore;
use crate::uid::random_token;

/// Name used when no app name is given
pub const DEFAULT_APP_NAME: &str = "default";

const GENERATED_SECRET_LENGTH: usize = 32;

/// A data store plus serving settings, addressed by name
pub struct App {
    name: String,
    datastore: Arc<dyn DataStore>,
    secret: String,
    verify_urls: bool,
}

impl App {
    /// App with a freshly generated secret and url verification on
    pub fn new(name: impl Into<String>, datastore: Arc<dyn DataStore>) -> Self {
        Self {
            name: name.into(),
            datastore,
            secret: random_token(GENERATED_SECRET_LENGTH),
            verify_urls: true,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = secret.into();
        self
    }

    pub fn with_verify_urls(mut self, verify_urls: bool) -> Self {
        self.verify_urls = verify_urls;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn datastore(&self) -> &dyn DataStore {
        self.datastore.as_ref()
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn verify_urls(&self) -> bool {
        self.verify_urls
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("datastore", &self.datastore.name())
            .field("verify_urls", &self.verify_urls)
            .finish_non_exhaustive()
    }
}

/// Name -> app map with explicit lifecycle
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<HashMap<String, Arc<App>>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `app`, replacing any app of the same name
    pub fn create(&self, app: App) -> Arc<App> {
        let app = Arc::new(app);
        let replaced = self
            .apps
            .write()
            .insert(app.name().to_string(), app.clone())
            .is_some();
        info!(app = %app.name(), datastore = %app.datastore().name(), replaced, "App registered");
        app
    }

    /// Existing app called `name`, or a new one backed by a memory data store
    pub fn instance(&self, name: Option<&str>) -> Arc<App> {
        let name = name.unwrap_or(DEFAULT_APP_NAME);
        if let Some(app) = self.get(name) {
            return app;
        }

        let mut apps = self.apps.write();
        apps.entry(name.to_string())
            .or_insert_with(|| {
                info!(app = %name, "App created with memory data store");
                Arc::new(App::new(name, Arc::new(MemoryDataStore::new())))
            })
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<Arc<App>> {
        self.apps.read().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<Arc<App>> {
        self.apps.write().remove(name)
    }

    /// Registered app names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.apps.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.apps.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.apps.read().is_empty()
    }

    /// Drop every registered app
    pub fn reset(&self) {
        let dropped = std::mem::take(&mut *self.apps.write()).len();
        info!(dropped, "App registry reset");
    }
}
