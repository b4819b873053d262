//! Configuration loading.
//!
//! A config file (TOML, YAML or JSON) is discovered with the prefer crate or
//! given explicitly, applied over built-in defaults, and finally overridden
//! by environment variables. The result is an explicit [`Settings`] value
//! handed to each command.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::crawl::{IngestOptions, DEFAULT_MISS_THRESHOLD};
use crate::repository::util::is_postgres_url;
use crate::repository::{DbContext, DbError};

/// Default database filename.
pub const DEFAULT_DATABASE_FILENAME: &str = "fmsacquire.db";

/// Report pages live at `<base>/<id>`.
pub const DEFAULT_BASE_URL: &str = "https://www.fixmystreet.com/report/";

/// Highest report number known when the archive was first surveyed.
pub const DEFAULT_INITIAL_BOUND: i64 = 7_519_450;

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Base data directory.
    pub data_dir: PathBuf,
    /// Database filename inside `data_dir`.
    pub database_filename: String,
    /// Database URL (overrides data_dir/database_filename if set).
    pub database_url: Option<String>,
    /// Prefix that report ids are appended to.
    pub base_url: String,
    /// None for the crate agent, "impersonate", or a literal agent string.
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
    /// Delay after each request in milliseconds.
    pub request_delay_ms: u64,
    /// Upper bound written when the crawl state is first created.
    pub initial_bound: i64,
    /// Consecutive 404s that end boundary discovery.
    pub miss_threshold: u32,
    /// Seconds to wait after announcing a truncate.
    pub truncate_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        // Documents dir -> Home dir -> Current dir
        let data_dir = dirs::document_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fms");

        Self {
            data_dir,
            database_filename: DEFAULT_DATABASE_FILENAME.to_string(),
            database_url: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: None,
            request_timeout: 30,
            request_delay_ms: 1000,
            initial_bound: DEFAULT_INITIAL_BOUND,
            miss_threshold: DEFAULT_MISS_THRESHOLD,
            truncate_delay_secs: 3,
        }
    }
}

impl Settings {
    /// Get the database URL, constructing from path if not explicitly set.
    pub fn database_url(&self) -> String {
        if let Some(ref url) = self.database_url {
            url.clone()
        } else {
            format!("sqlite:{}", self.database_path().display())
        }
    }

    pub fn is_postgres(&self) -> bool {
        self.database_url
            .as_ref()
            .is_some_and(|url| is_postgres_url(url))
    }

    /// Full path to the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_filename)
    }

    pub fn ensure_directories(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create data directory '{}': {}",
                    self.data_dir.display(),
                    e
                ),
            )
        })
    }

    pub fn create_db_context(&self) -> Result<DbContext, DbError> {
        DbContext::from_url(&self.database_url())
    }

    pub fn parsed_base_url(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Session options derived from these settings.
    pub fn ingest_options(&self) -> IngestOptions {
        IngestOptions {
            pacing: Duration::from_millis(self.request_delay_ms),
            truncate_delay: Duration::from_secs(self.truncate_delay_secs),
            miss_threshold: self.miss_threshold,
            ..IngestOptions::default()
        }
    }

    /// Apply `DATABASE_URL`, `FMS_BASE_URL` and `FMS_USER_AGENT`.
    fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|s| !s.is_empty());

        if let Some(url) = var("DATABASE_URL") {
            tracing::debug!(
                "Using DATABASE_URL from environment: {}",
                crate::repository::redact_url_password(&url)
            );
            self.database_url = Some(url);
        }
        if let Some(base_url) = var("FMS_BASE_URL") {
            tracing::debug!("Using FMS_BASE_URL from environment: {}", base_url);
            self.base_url = base_url;
        }
        if let Some(user_agent) = var("FMS_USER_AGENT") {
            self.user_agent = Some(user_agent);
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "target")]
    pub data_dir: Option<String>,
    /// Database filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Delay between requests in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_delay_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_bound: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub miss_threshold: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncate_delay_secs: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Discover a `fmsacquire` config file in the standard locations.
    pub async fn load() -> Self {
        match prefer::load("fmsacquire").await {
            Ok(pref_config) => match pref_config.source_path() {
                Some(path) => Self::load_from_path(path).await.unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Self::default()
                }),
                None => Self::default(),
            },
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path, parsed by extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents)
                .map_err(|e| format!("Failed to parse TOML config: {}", e))?,
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .map_err(|e| format!("Failed to parse YAML config: {}", e))?,
            _ => serde_json::from_str(&contents)
                .map_err(|e| format!("Failed to parse JSON config: {}", e))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Directory of the config file, for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are joined onto `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref data_dir) = self.data_dir {
            settings.data_dir = self.resolve_path(data_dir, base_dir);
        }
        if let Some(ref database) = self.database {
            settings.database_filename = database.clone();
        }
        if let Some(ref base_url) = self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(ref user_agent) = self.user_agent {
            settings.user_agent = Some(user_agent.clone());
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
        if let Some(delay) = self.request_delay_ms {
            settings.request_delay_ms = delay;
        }
        if let Some(bound) = self.initial_bound {
            settings.initial_bound = bound;
        }
        if let Some(threshold) = self.miss_threshold {
            settings.miss_threshold = threshold;
        }
        if let Some(delay) = self.truncate_delay_secs {
            settings.truncate_delay_secs = delay;
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Data directory or database file (`--target`).
    pub target: Option<PathBuf>,
}

/// Split a `--target` into a data directory and, for `.db` paths, a filename.
fn resolve_target(path: &Path) -> (PathBuf, Option<String>) {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };

    let is_db_file = path
        .extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3");

    if is_db_file {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string);
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, None)
    }
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await.unwrap_or_else(|e| {
            tracing::warn!("{}", e);
            Config::default()
        }),
        None => Config::load().await,
    };

    let mut settings = Settings::default();
    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some(ref target) = options.target {
        let (data_dir, filename) = resolve_target(target);
        settings.data_dir = data_dir;
        if let Some(filename) = filename {
            settings.database_filename = filename;
        }
    }

    settings.apply_env_overrides(|name| std::env::var(name).ok());

    (settings, config)
}
