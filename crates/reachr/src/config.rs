//! TOML configuration parsing and validation.
//!
//! Every section is optional. A missing file is tolerated by the CLI, which
//! falls back to [`Config::minimal`].
//!
//! ```toml
//! [storage]
//! backend = "files"
//! root = "/data"
//!
//! [server]
//! bind = "127.0.0.1:8000"
//! user_header = "x-reachr-user"
//!
//! [search]
//! quick_limit = 10
//!
//! [logging]
//! level = "info"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which [`Store`](reachr_core::store::Store) backend to open.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Files,
    Sqlite,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Root of the per-user directory tree for the `files` backend.
    #[serde(default = "default_root")]
    pub root: PathBuf,
    /// Database file for the `sqlite` backend.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Files,
            root: default_root(),
            path: None,
        }
    }
}

fn default_root() -> PathBuf {
    PathBuf::from("/data")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Header carrying the caller's account id, set by the upstream gateway.
    #[serde(default = "default_user_header")]
    pub user_header: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            user_header: default_user_header(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_user_header() -> String {
    "x-reachr-user".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Result cap for the quick (voice) search.
    #[serde(default = "default_quick_limit")]
    pub quick_limit: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            quick_limit: default_quick_limit(),
        }
    }
}

fn default_quick_limit() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Default `tracing` filter. `RUST_LOG` wins when set.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    /// Defaults for every section. Used when no config file exists.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// SQLite database path, defaulting to `reachr.sqlite` under the
    /// storage root.
    pub fn sqlite_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| self.storage.root.join("reachr.sqlite"))
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parse and validate a TOML document.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.search.quick_limit < 1 {
        anyhow::bail!("search.quick_limit must be >= 1");
    }

    if config.server.user_header.trim().is_empty() {
        anyhow::bail!("server.user_header must not be empty");
    }

    if config.storage.backend == Backend::Files && config.storage.root.as_os_str().is_empty() {
        anyhow::bail!("storage.root must not be empty");
    }

    if let Some(path) = &config.storage.path {
        if path.as_os_str().is_empty() {
            anyhow::bail!("storage.path must not be empty when set");
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.storage.backend, Backend::Files);
        assert_eq!(cfg.storage.root, PathBuf::from("/data"));
        assert_eq!(cfg.server.bind, "127.0.0.1:8000");
        assert_eq!(cfg.server.user_header, "x-reachr-user");
        assert_eq!(cfg.search.quick_limit, 10);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn test_sqlite_backend() {
        let cfg = parse_config(
            r#"
            [storage]
            backend = "sqlite"
            path = "/tmp/r.sqlite"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.storage.backend, Backend::Sqlite);
        assert_eq!(cfg.sqlite_path(), PathBuf::from("/tmp/r.sqlite"));
    }

    #[test]
    fn test_sqlite_path_defaults_under_root() {
        let cfg = parse_config("[storage]\nroot = \"/srv/reachr\"\n").unwrap();
        assert_eq!(cfg.sqlite_path(), PathBuf::from("/srv/reachr/reachr.sqlite"));
    }

    #[test]
    fn test_rejects_zero_quick_limit() {
        let err = parse_config("[search]\nquick_limit = 0\n").unwrap_err();
        assert!(err.to_string().contains("quick_limit"));
    }

    #[test]
    fn test_rejects_unknown_backend() {
        assert!(parse_config("[storage]\nbackend = \"postgres\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        let err = load_config(Path::new("/nonexistent/reachr.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
