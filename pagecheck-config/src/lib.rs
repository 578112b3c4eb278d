//! Loader for `pagecheck` configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files / inline snippets first, then
//! `PAGECHECK__SECTION__KEY` environment variables. After merging, `${VAR}`
//! placeholders in string values are expanded (recursively, bounded depth)
//! and the result is deserialized into [`PagecheckConfig`]. Every field has a
//! default, so an empty source set is a valid configuration.
use config::{Config, Environment, File};
use pagecheck_common::observability::{LogConfig, LogFormat};
use serde::Deserialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub use config::ConfigError;

const EXPANSION_ROUNDS: usize = 8;
const DEFAULT_DATABASE_URL: &str = "sqlite://pagecheck.db";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagecheckConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Outbound page fetch settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Skip TLS chain validation. Checks only ever issue read-only GETs.
    #[serde(default = "default_true")]
    pub accept_invalid_certs: bool,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_timeout_secs(),
            accept_invalid_certs: true,
            max_redirects: default_max_redirects(),
            user_agent: default_user_agent(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub stderr: bool,
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            format: LogFormat::Text,
            stderr: false,
            filter: default_filter(),
        }
    }
}

impl LoggingConfig {
    /// Map onto the logging initializer's settings.
    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            log_dir: self.dir.clone(),
            emit_stderr: self.stderr,
            format: self.format,
            default_filter: self.filter.clone(),
            ..LogConfig::default()
        }
    }
}

// `DATABASE_URL` is honoured when the config does not name a database.
fn default_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into())
}
fn default_max_connections() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_true() -> bool {
    true
}
fn default_max_redirects() -> usize {
    5
}
fn default_user_agent() -> String {
    concat!("pagecheck/", env!("CARGO_PKG_VERSION")).into()
}
fn default_filter() -> String {
    "info".into()
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) if s.contains('$') => *s = expand_str(s),
        Value::Array(items) => items.iter_mut().for_each(expand_env_in_value),
        Value::Object(fields) => fields.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

// Re-expands until stable so a variable may name another; unknown variables
// and cycles stop at whatever was reached.
fn expand_str(raw: &str) -> String {
    let mut current = raw.to_owned();
    for _ in 0..EXPANSION_ROUNDS {
        match shellexpand::env(&current) {
            Ok(next) if next != current => current = next.into_owned(),
            _ => break,
        }
    }
    current
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct PagecheckConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for PagecheckConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PagecheckConfigLoader {
    /// Start with no files and no env overlay.
    ///
    /// ```
    /// use pagecheck_config::PagecheckConfigLoader;
    ///
    /// let config = PagecheckConfigLoader::new()
    ///     .with_yaml_str("fetch:\n  timeout_secs: 2")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.fetch.timeout_secs, 2);
    /// assert_eq!(config.fetch.max_redirects, 5);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format inferred by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet (tests, CLI overrides).
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Overlay `PAGECHECK__SECTION__KEY` environment variables.
    ///
    /// Call last so the environment wins over files.
    pub fn with_env(mut self) -> Self {
        self.builder = self.builder.add_source(
            Environment::with_prefix("PAGECHECK")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );
        self
    }

    /// Consume the builder and deserialize the merged sources.
    ///
    /// ```
    /// use pagecheck_config::PagecheckConfigLoader;
    ///
    /// unsafe { std::env::set_var("PC_DOC_DB", "sqlite://doc.db"); }
    ///
    /// let config = PagecheckConfigLoader::new()
    ///     .with_yaml_str("database:\n  url: \"${PC_DOC_DB}\"")
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// assert_eq!(config.database.url, "sqlite://doc.db");
    ///
    /// unsafe { std::env::remove_var("PC_DOC_DB"); }
    /// ```
    pub fn load(self) -> Result<PagecheckConfig, ConfigError> {
        let cfg = self.builder.build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: PagecheckConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
