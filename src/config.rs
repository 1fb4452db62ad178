//! # Configuration Management
//!
//! Centralized configuration for the depot server.
//!
//! This module provides structured configuration for the listener, the
//! on-disk layout, the credential table, and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Environment variable overrides via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## On-disk layout
//! The server owns two directory trees: a flat repository of published files
//! and a quarantine root with one subdirectory per user. Uploads land in
//! quarantine and only an approved publish moves them into the repository.

use crate::error::{DepotError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Maximum accepted length of a single control line, in bytes (terminator
/// excluded). Longer lines are drained and rejected to bound memory.
pub const MAX_LINE_LEN: usize = 1024;

/// Default cap on a declared upload size (16 MB).
pub const MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

/// Chunk size for streaming file payloads.
pub const TRANSFER_CHUNK: usize = 4096;

/// Main configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DepotConfig {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// On-disk layout and transfer limits
    #[serde(default)]
    pub storage: StorageConfig,

    /// Credential table
    #[serde(default)]
    pub auth: AuthConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DepotConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| DepotError::Config(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| DepotError::Config(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| DepotError::Config(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Start with defaults
        let mut config = Self::default();

        // Override with environment variables
        if let Ok(addr) = std::env::var("DEPOT_SERVER_ADDRESS") {
            config.server.address = addr;
        }

        if let Ok(root) = std::env::var("DEPOT_STORAGE_ROOT") {
            config.storage = StorageConfig::under_root(root);
        }

        if let Ok(max) = std::env::var("DEPOT_MAX_UPLOAD_BYTES") {
            if let Ok(val) = max.parse::<u64>() {
                config.storage.max_upload_bytes = val;
            }
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        errors.extend(self.server.validate());
        errors.extend(self.storage.validate());
        errors.extend(self.auth.validate());
        errors.extend(self.logging.validate());

        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(DepotError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

/// Listener configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Listen address (e.g., "0.0.0.0:8080")
    pub address: String,

    /// Timeout for graceful server shutdown
    #[serde(with = "duration_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: String::from("0.0.0.0:8080"),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl ServerConfig {
    /// Validate listener configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:8080')",
                self.address
            ));
        }

        if self.shutdown_timeout.as_secs() < 1 {
            errors.push("Shutdown timeout too short (minimum: 1s)".to_string());
        } else if self.shutdown_timeout.as_secs() > 60 {
            errors.push("Shutdown timeout too long (maximum: 60s)".to_string());
        }

        errors
    }
}

/// On-disk layout and transfer limits
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// The published, listable file collection (flat namespace)
    pub repository_dir: PathBuf,

    /// Root of the per-user quarantine areas
    pub quarantine_dir: PathBuf,

    /// Largest declared upload size accepted by PUT
    pub max_upload_bytes: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::under_root("shared")
    }
}

impl StorageConfig {
    /// Lay out both directories under a common root, matching the
    /// `<root>/main` + `<root>/uploads` convention.
    pub fn under_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref();
        Self {
            repository_dir: root.join("main"),
            quarantine_dir: root.join("uploads"),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        }
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.repository_dir.as_os_str().is_empty() {
            errors.push("Repository directory cannot be empty".to_string());
        }

        if self.quarantine_dir.as_os_str().is_empty() {
            errors.push("Quarantine directory cannot be empty".to_string());
        }

        if self.repository_dir == self.quarantine_dir {
            errors.push("Repository and quarantine directories must differ".to_string());
        }

        if self.max_upload_bytes == 0 {
            errors.push("Max upload size must be greater than 0".to_string());
        } else if self.max_upload_bytes > 1024 * 1024 * 1024 {
            errors.push(format!(
                "Max upload size very large: {} bytes (maximum recommended: 1 GB)",
                self.max_upload_bytes
            ));
        }

        errors
    }
}

/// Credential table configuration
///
/// A mapping of user identity to secret, loaded verbatim into the static
/// credential store. The default table mirrors the three demo accounts.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// identity -> secret
    pub users: BTreeMap<String, String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut users = BTreeMap::new();
        users.insert("cl1".to_string(), "cl1pass".to_string());
        users.insert("cl2".to_string(), "cl2pass".to_string());
        users.insert("cl3".to_string(), "cl3pass".to_string());
        Self { users }
    }
}

impl AuthConfig {
    /// Validate the credential table
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.users.is_empty() {
            errors.push("Credential table is empty - no user can authenticate".to_string());
        }

        for (user, secret) in &self.users {
            if user.is_empty() {
                errors.push("Credential table contains an empty user identity".to_string());
            }
            if secret.is_empty() {
                errors.push(format!("User '{user}' has an empty secret"));
            }
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("depot-protocol"),
            log_level: Level::INFO,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
