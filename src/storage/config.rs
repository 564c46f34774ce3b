//! Configuration file loading and management.
//!
//! Loads configuration from:
//! - Linux: `~/.config/docstream/config.toml`
//! - macOS: `~/Library/Application Support/com.docstream.docstream/config.toml`
//! - Windows: `%APPDATA%/docstream/docstream/config/config.toml`
//!
//! ## Precedence
//!
//! Settings are resolved with the following precedence (highest first):
//! 1. CLI flags
//! 2. Environment variables
//! 3. Config file
//! 4. Built-in defaults
//!
//! ## Environment Variables
//!
//! - `DOCSTREAM_BASE_URL`: API base URL
//! - `DOCSTREAM_TIMEOUT`: Request timeout in seconds
//! - `DOCSTREAM_SESSION_BACKEND`: Session storage (file, keyring, memory)
//! - `DOCSTREAM_CONFIG`: Override config file path

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::core::auth::{AuthPaths, DEFAULT_LOGIN_PATH, DEFAULT_LOGOUT_PATH, DEFAULT_PROFILE_PATH};
use crate::core::format::DEFAULT_FORMAT_PATH;
use crate::core::models::FormattingMode;
use crate::error::{DocstreamError, Result};

// =============================================================================
// Environment Variable Names
// =============================================================================

/// Environment variable for the API base URL.
pub const ENV_BASE_URL: &str = "DOCSTREAM_BASE_URL";
/// Environment variable for timeout in seconds.
pub const ENV_TIMEOUT: &str = "DOCSTREAM_TIMEOUT";
/// Environment variable for the session backend.
pub const ENV_SESSION_BACKEND: &str = "DOCSTREAM_SESSION_BACKEND";
/// Environment variable to override config file path.
pub const ENV_CONFIG: &str = "DOCSTREAM_CONFIG";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api/v1";
pub const DEFAULT_REFRESH_PATH: &str = "/auth/token/refresh/";

const MAX_TIMEOUT_SECONDS: u64 = 300;

// =============================================================================
// Session backend selection
// =============================================================================

/// Where the session is persisted between runs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackendKind {
    /// JSON file in the cache directory.
    #[default]
    File,
    /// OS keyring.
    Keyring,
    /// Nothing persisted; the session ends with the process.
    Memory,
}

impl SessionBackendKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Keyring => "keyring",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for SessionBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionBackendKind {
    type Err = DocstreamError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(Self::File),
            "keyring" => Ok(Self::Keyring),
            "memory" => Ok(Self::Memory),
            other => Err(DocstreamError::Config(format!(
                "Invalid session backend \"{other}\". Valid backends: file, keyring, memory"
            ))),
        }
    }
}

// =============================================================================
// Resolved Configuration
// =============================================================================

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub session_backend: Option<SessionBackendKind>,
}

/// Fully resolved configuration after merging CLI, env vars, and config file.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Config file that was consulted (it may not exist).
    pub config_path: PathBuf,
    /// API base URL, without trailing slash.
    pub base_url: String,
    /// Timeout for non-streaming calls.
    #[serde(serialize_with = "serialize_secs")]
    pub timeout: Duration,
    /// Maximum gap between streamed chunks. `None` disables the check.
    #[serde(serialize_with = "serialize_opt_secs")]
    pub stream_idle_timeout: Option<Duration>,
    pub session_backend: SessionBackendKind,
    pub refresh_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub profile_path: String,
    pub format_path: String,
    pub default_mode: FormattingMode,
    pub output_dir: Option<PathBuf>,
    /// Source of each overridable setting.
    pub sources: ConfigSources,
}

/// Tracks the source of each configuration value.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigSources {
    pub base_url: ConfigSource,
    pub timeout: ConfigSource,
    pub session_backend: ConfigSource,
}

/// Where a configuration value came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigSource {
    /// Value from CLI flag.
    Cli,
    /// Value from environment variable.
    Env,
    /// Value from config file.
    ConfigFile,
    /// Built-in default.
    #[default]
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI flag"),
            Self::Env => write!(f, "environment variable"),
            Self::ConfigFile => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

fn serialize_secs<S: serde::Serializer>(
    value: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}

#[allow(clippy::ref_option)]
fn serialize_opt_secs<S: serde::Serializer>(
    value: &Option<Duration>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(value) => serializer.serialize_some(&value.as_secs()),
        None => serializer.serialize_none(),
    }
}

impl ResolvedConfig {
    /// Resolve final configuration from CLI overrides, the process
    /// environment and the config file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The config file exists but is invalid
    /// - An environment variable holds an invalid value
    pub fn resolve(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve_with(overrides, &AppPaths::new(), |key| std::env::var(key).ok())
    }

    /// Resolve with explicit paths and environment lookup.
    ///
    /// # Errors
    ///
    /// See [`ResolvedConfig::resolve`].
    pub fn resolve_with<F>(overrides: &ConfigOverrides, paths: &AppPaths, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        let config_path = overrides
            .config_path
            .clone()
            .or_else(|| env(ENV_CONFIG).map(PathBuf::from))
            .unwrap_or_else(|| paths.config_file());
        let config = Config::load_from(&config_path)?;
        config.validate()?;

        let mut sources = ConfigSources::default();

        let base_url = Self::resolve_base_url(overrides, &env, &config, &mut sources.base_url)?;
        let timeout = Self::resolve_timeout(overrides, &env, &config, &mut sources.timeout)?;
        let session_backend =
            Self::resolve_session_backend(overrides, &env, &config, &mut sources.session_backend)?;

        let idle = config.api.stream_idle_timeout_seconds;
        let api = config.api;
        Ok(Self {
            config_path,
            base_url,
            timeout,
            stream_idle_timeout: (idle > 0).then(|| Duration::from_secs(idle)),
            session_backend,
            refresh_path: api.refresh_path,
            login_path: api.login_path,
            logout_path: api.logout_path,
            profile_path: api.profile_path,
            format_path: api.format_path,
            default_mode: config.format.default_mode,
            output_dir: config.format.output_dir,
            sources,
        })
    }

    /// Auth endpoint paths.
    #[must_use]
    pub fn auth_paths(&self) -> AuthPaths {
        AuthPaths {
            login: self.login_path.clone(),
            logout: self.logout_path.clone(),
            profile: self.profile_path.clone(),
        }
    }

    fn resolve_base_url(
        overrides: &ConfigOverrides,
        env: &impl Fn(&str) -> Option<String>,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<String> {
        let (value, from) = if let Some(url) = &overrides.base_url {
            (url.clone(), ConfigSource::Cli)
        } else if let Some(url) = env(ENV_BASE_URL) {
            (url, ConfigSource::Env)
        } else if config.api.base_url == DEFAULT_BASE_URL {
            (config.api.base_url.clone(), ConfigSource::Default)
        } else {
            (config.api.base_url.clone(), ConfigSource::ConfigFile)
        };

        validate_base_url(&value)?;
        *source = from;
        Ok(value.trim().trim_end_matches('/').to_string())
    }

    fn resolve_timeout(
        overrides: &ConfigOverrides,
        env: &impl Fn(&str) -> Option<String>,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<Duration> {
        // 1. CLI --timeout flag
        if let Some(seconds) = overrides.timeout_seconds {
            validate_timeout(seconds)?;
            *source = ConfigSource::Cli;
            return Ok(Duration::from_secs(seconds));
        }

        // 2. Environment variable
        if let Some(value) = env(ENV_TIMEOUT) {
            let seconds = value.trim().parse::<u64>().map_err(|_| {
                DocstreamError::Config(format!("{ENV_TIMEOUT} must be a number of seconds, got \"{value}\""))
            })?;
            validate_timeout(seconds)?;
            *source = ConfigSource::Env;
            return Ok(Duration::from_secs(seconds));
        }

        // 3. Config file (already validated)
        *source = if config.api.timeout_seconds == ApiConfig::default().timeout_seconds {
            ConfigSource::Default
        } else {
            ConfigSource::ConfigFile
        };
        Ok(Duration::from_secs(config.api.timeout_seconds))
    }

    fn resolve_session_backend(
        overrides: &ConfigOverrides,
        env: &impl Fn(&str) -> Option<String>,
        config: &Config,
        source: &mut ConfigSource,
    ) -> Result<SessionBackendKind> {
        if let Some(kind) = overrides.session_backend {
            *source = ConfigSource::Cli;
            return Ok(kind);
        }
        if let Some(value) = env(ENV_SESSION_BACKEND) {
            let kind = value.parse()?;
            *source = ConfigSource::Env;
            return Ok(kind);
        }
        *source = if config.session.backend == SessionBackendKind::default() {
            ConfigSource::Default
        } else {
            ConfigSource::ConfigFile
        };
        Ok(config.session.backend)
    }
}

fn validate_timeout(seconds: u64) -> Result<()> {
    if seconds == 0 || seconds > MAX_TIMEOUT_SECONDS {
        return Err(DocstreamError::Config(format!(
            "Timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds"
        )));
    }
    Ok(())
}

fn validate_base_url(url: &str) -> Result<()> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(DocstreamError::Config(format!(
            "Invalid base URL \"{url}\". It must start with http:// or https://"
        )))
    }
}

// =============================================================================
// Config file
// =============================================================================

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend endpoints and timeouts.
    pub api: ApiConfig,
    /// Session persistence.
    pub session: SessionConfig,
    /// Formatting defaults.
    pub format: FormatConfig,
}

/// Backend endpoints and timeouts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub refresh_path: String,
    pub login_path: String,
    pub logout_path: String,
    pub profile_path: String,
    pub format_path: String,
    /// Timeout for non-streaming requests in seconds.
    pub timeout_seconds: u64,
    /// Maximum gap between streamed chunks in seconds; 0 disables.
    pub stream_idle_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub backend: SessionBackendKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Mode used when `--mode` is not given.
    pub default_mode: FormattingMode,
    /// Directory for `format --save`.
    pub output_dir: Option<PathBuf>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_path: DEFAULT_REFRESH_PATH.to_string(),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            logout_path: DEFAULT_LOGOUT_PATH.to_string(),
            profile_path: DEFAULT_PROFILE_PATH.to_string(),
            format_path: DEFAULT_FORMAT_PATH.to_string(),
            timeout_seconds: 30,
            stream_idle_timeout_seconds: 120,
        }
    }
}

impl Config {
    /// Load configuration from the default config file path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().config_file())
    }

    /// Load configuration from a specific path.
    ///
    /// Returns default config if the file doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error only if the file exists but is invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        tracing::debug!(?path, "Loading config file");
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DocstreamError::Config(format!("Invalid config file: {e}")))?;

        Ok(config)
    }

    /// Save configuration to a specific path.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or the write fails.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DocstreamError::Config(format!("Failed to serialize config: {e}")))?;

        fs::write(path, content)?;
        tracing::debug!(?path, "Config file saved");
        Ok(())
    }

    /// Validate configuration values.
    ///
    /// Checks that:
    /// - The base URL is an http(s) URL
    /// - Every endpoint path is non-empty
    /// - Timeout is within reasonable bounds (1-300 seconds)
    ///
    /// # Errors
    ///
    /// Returns [`DocstreamError::Config`] describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        validate_base_url(&self.api.base_url)?;

        for (name, value) in [
            ("refresh_path", &self.api.refresh_path),
            ("login_path", &self.api.login_path),
            ("logout_path", &self.api.logout_path),
            ("profile_path", &self.api.profile_path),
            ("format_path", &self.api.format_path),
        ] {
            if value.trim().is_empty() {
                return Err(DocstreamError::Config(format!("[api] {name} must not be empty")));
            }
        }

        validate_timeout(self.api.timeout_seconds)
    }
}
