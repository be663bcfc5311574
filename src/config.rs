//! Habitlab configuration management

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main Habitlab configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HabitlabConfig {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Identity header configuration
    #[serde(default)]
    pub auth: AuthConfig,
}

impl HabitlabConfig {
    /// Load configuration from a TOML file, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.auth.user_header.trim().is_empty() || self.auth.role_header.trim().is_empty() {
            return Err(Error::Config("auth header names must not be empty".to_string()));
        }
        if self.auth.admin_role.trim().is_empty() {
            return Err(Error::Config("auth.admin_role must not be empty".to_string()));
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Allowed CORS origins (empty = any)
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 18810,
            cors_origins: Vec::new(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for all persisted documents
    pub base_dir: PathBuf,
}

impl StorageConfig {
    pub fn content_dir(&self) -> PathBuf {
        self.base_dir.join("content")
    }

    pub fn subscriptions_dir(&self) -> PathBuf {
        self.base_dir.join("subscriptions")
    }

    pub fn journal_dir(&self) -> PathBuf {
        self.base_dir.join("journal")
    }

    pub fn settings_dir(&self) -> PathBuf {
        self.base_dir.join("settings")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: dirs_next::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("habitlab"),
        }
    }
}

/// Identity headers set by the upstream authenticating gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Header carrying the authenticated user id
    pub user_header: String,

    /// Header carrying the caller's role
    pub role_header: String,

    /// Role value that grants access to admin routes
    pub admin_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            user_header: "x-user-id".to_string(),
            role_header: "x-user-role".to_string(),
            admin_role: "admin".to_string(),
        }
    }
}
