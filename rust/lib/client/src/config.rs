//! Client configuration.
//!
//! Reads/writes `~/.folio/config.toml`. A missing file means defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::http::Transport;

const FALLBACK_SERVER: &str = "https://andikarna-001-site1.ltempurl.com/api";

/// API base URL baked in at build time, if `FOLIO_API_BASE_URL` was set.
pub fn default_server() -> String {
    option_env!("FOLIO_API_BASE_URL")
        .unwrap_or(FALLBACK_SERVER)
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API base URL (e.g. "https://host/api").
    pub server: String,

    /// redb file holding the credential store.
    pub session_path: PathBuf,

    /// Per-request transport timeout.
    pub timeout_secs: u64,

    /// Tokens expiring within this many seconds count as expired.
    pub refresh_leeway_secs: i64,

    /// Default list page size.
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            session_path: dirs_path().join("session.redb"),
            timeout_secs: 30,
            refresh_leeway_secs: 30,
            page_size: 10,
        }
    }
}

impl ClientConfig {
    /// Default config file path: ~/.folio/config.toml.
    pub fn default_path() -> PathBuf {
        dirs_path().join("config.toml")
    }

    /// Load config from disk, or return default if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config: ClientConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        self.validate()?;
        let io = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(io)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = self.server.trim();
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(ConfigError::InvalidServer(self.server.clone()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// HTTP transport for this configuration.
    pub fn transport(&self) -> Result<Transport, reqwest::Error> {
        Transport::new(self.server.trim(), self.timeout())
    }
}

/// Return the Folio config directory (~/.folio).
fn dirs_path() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".folio")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.refresh_leeway_secs, 30);
        assert_eq!(config.page_size, 10);
        assert!(config.session_path.ends_with("session.redb"));
        config.validate().unwrap();
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ClientConfig {
            server: "http://localhost:7086/api".to_string(),
            page_size: 25,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "server = \"http://localhost:1/api\"\n").unwrap();
        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.server, "http://localhost:1/api");
        assert_eq!(config.page_size, 10);
    }

    #[test]
    fn rejects_bad_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        std::fs::write(&path, "server = \"ftp://nope\"\n").unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::InvalidServer(_))));

        std::fs::write(&path, "server = [\n").unwrap();
        assert!(matches!(ClientConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
