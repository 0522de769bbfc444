//! Configuration types and loading

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// File data store configuration
    pub datastore: DatastoreConfig,

    /// Settings of the app served by this process
    pub app: AppSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Prefix the routed endpoint is mounted under
    pub mount_path: String,
}

/// File data store settings
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DatastoreConfig {
    /// Directory content is written under
    pub root_path: PathBuf,
    /// Directory a web server exposes as the URL root, used by `url_for`
    pub server_root: Option<PathBuf>,
    /// Write `.meta.yml` sidecars next to stored content
    pub store_meta: bool,
}

impl Default for DatastoreConfig {
    fn default() -> Self {
        Self {
            root_path: PathBuf::from("/var/tmp/attache"),
            server_root: None,
            store_meta: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppSettings {
    /// Registry name of the app
    pub name: String,
    /// Secret mixed into job SHAs
    pub secret: String,
    /// Require a valid SHA on every served job
    pub verify_urls: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                mount_path: "/media".to_string(),
            },
            datastore: DatastoreConfig::default(),
            app: AppSettings {
                name: "default".to_string(),
                secret: "change-me-in-production".to_string(),
                verify_urls: true,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup, starting from defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let parse_bool = |v: &str| v == "true" || v == "1" || v == "yes";

        // Server
        if let Some(host) = lookup("ATTACHE_HOST") {
            config.server.host = host;
        }
        if let Some(port) = lookup("ATTACHE_PORT") {
            config.server.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "ATTACHE_PORT".to_string(),
                message: format!("{:?} is not a valid port", port),
            })?;
        }
        if let Some(mount) = lookup("ATTACHE_MOUNT_PATH") {
            config.server.mount_path = mount;
        }

        // Datastore
        if let Some(root) = lookup("ATTACHE_ROOT_PATH") {
            config.datastore.root_path = PathBuf::from(root);
        }
        if let Some(server_root) = lookup("ATTACHE_SERVER_ROOT") {
            config.datastore.server_root =
                (!server_root.is_empty()).then(|| PathBuf::from(server_root));
        }
        if let Some(v) = lookup("ATTACHE_STORE_META") {
            config.datastore.store_meta = parse_bool(&v);
        }

        // App
        if let Some(name) = lookup("ATTACHE_APP_NAME") {
            config.app.name = name;
        }
        if let Some(secret) = lookup("ATTACHE_SECRET") {
            config.app.secret = secret;
        }
        if let Some(v) = lookup("ATTACHE_VERIFY_URLS") {
            config.app.verify_urls = parse_bool(&v);
        }

        if config.app.secret.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "ATTACHE_SECRET".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(config)
    }

    /// Get the server address
    pub fn server_addr(&self) -> std::net::SocketAddr {
        use std::net::SocketAddr;
        let ip: std::net::IpAddr = self.server.host.parse().unwrap_or([0, 0, 0, 0].into());
        SocketAddr::new(ip, self.server.port)
    }
}
