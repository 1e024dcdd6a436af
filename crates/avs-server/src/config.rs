//! Server configuration
//!
//! Resolution order:
//! 1. Built-in defaults
//! 2. Optional TOML file (`--config`)
//! 3. Environment: `HOST`, `PORT`, `DATABASE_URL`, `OBJECT_STORE_DIR`,
//!    `AVS_ENV=production` and the Gemini key variables

use avs_genai::{api_key_from_env, GeminiConfig};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration loading failure
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

/// Listener settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: IpAddr,
    pub port: u16,
    /// Maximum JSON request body, bytes
    pub body_limit: u64,
    /// Maximum upload size, bytes
    pub upload_limit: u64,
    /// Marks cookies `Secure`
    pub production: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 5000,
            body_limit: 10 * 1024 * 1024,
            upload_limit: 25 * 1024 * 1024,
            production: false,
        }
    }
}

/// Session cookie settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub cookie_name: String,
    pub ttl_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            cookie_name: "avs.sid".to_string(),
            ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl SessionSection {
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Persistence settings; in-memory tables without a database URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub database_url: Option<String>,
    pub max_connections: Option<u32>,
}

/// Object store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectsSection {
    pub root: PathBuf,
    pub ticket_ttl_secs: u64,
}

impl Default for ObjectsSection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("data/objects"),
            ticket_ttl_secs: 15 * 60,
        }
    }
}

impl ObjectsSection {
    #[inline]
    #[must_use]
    pub fn ticket_ttl(&self) -> Duration {
        Duration::from_secs(self.ticket_ttl_secs)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub server: ServerSection,
    pub session: SessionSection,
    pub storage: StorageSection,
    pub genai: GeminiConfig,
    pub objects: ObjectsSection,
}

impl StudioConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed TOML or wrong types
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML file
    ///
    /// # Errors
    /// Fails when the file cannot be read or parsed
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Defaults or file, then the process environment
    ///
    /// # Errors
    /// Fails on an unreadable file or an unparsable variable
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_env(|var| std::env::var(var).ok())
    }

    /// Apply overrides from an environment lookup
    ///
    /// # Errors
    /// [`ConfigError::Env`] when `HOST` or `PORT` cannot be parsed
    pub fn with_env(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(host) = get("HOST") {
            self.server.host = host.trim().parse().map_err(|_| ConfigError::Env {
                var: "HOST",
                value: host.clone(),
            })?;
        }
        if let Some(port) = get("PORT") {
            self.server.port = port.trim().parse().map_err(|_| ConfigError::Env {
                var: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.storage.database_url = Some(url);
        }
        if let Some(dir) = get("OBJECT_STORE_DIR") {
            self.objects.root = PathBuf::from(dir);
        }
        if get("AVS_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production")) {
            self.server.production = true;
        }
        if self.genai.api_key.is_none() {
            self.genai.api_key = avs_genai::gemini::API_KEY_VARS
                .iter()
                .find_map(|var| get(var))
                .map(|key| key.trim().to_string());
        }
        Ok(self)
    }

    /// With database URL
    #[inline]
    #[must_use]
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.storage.database_url = Some(url.into());
        self
    }

    /// With object store root
    #[inline]
    #[must_use]
    pub fn with_objects_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.objects.root = root.into();
        self
    }

    /// With production flag
    #[inline]
    #[must_use]
    pub fn with_production(mut self, production: bool) -> Self {
        self.server.production = production;
        self
    }

    /// Listen address
    #[inline]
    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.server.host, self.server.port)
    }

    /// Whether records live in memory only
    #[inline]
    #[must_use]
    pub fn is_memory_storage(&self) -> bool {
        self.storage.database_url.is_none()
    }

    /// Whether a generative AI key is available
    #[inline]
    #[must_use]
    pub fn has_genai_key(&self) -> bool {
        self.genai.api_key.is_some() || api_key_from_env().is_some()
    }
}
