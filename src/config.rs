use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::{Validate, ValidationError};

/// Default values for configuration
const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";
const CONFIG_DIR: &str = "config";
const ENV_PREFIX: &str = "PAYDA";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_POLL_INTERVAL_MS: u64 = 3_000;
const DEFAULT_REFRESH_DELAY_MS: u64 = 500;
const DEFAULT_WELCOME_DELAY_MS: u64 = 100;
const DEFAULT_DEDUP_WINDOW_MS: u64 = 2_000;
const DEFAULT_TOAST_LIFETIME_MS: u64 = 5_000;
const DEFAULT_RECENT_DONATION_LIMIT: usize = 10;

/// Client configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Base address of the PAYDA REST backend
    #[serde(default = "default_api_base_url")]
    #[validate(custom = "validate_base_url")]
    pub api_base_url: String,

    /// Application environment
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    #[validate(custom = "validate_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    #[validate(range(min = 1, max = 300))]
    pub request_timeout_secs: u64,

    /// Interval between polling ticks in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    #[validate(range(min = 100))]
    pub poll_interval_ms: u64,

    /// Delay before the refresh that follows a claim or redemption
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Delay before the welcome notification of a signed-in session
    #[serde(default = "default_welcome_delay_ms")]
    pub welcome_delay_ms: u64,

    /// Window in which identical notifications are suppressed
    #[serde(default = "default_dedup_window_ms")]
    pub dedup_window_ms: u64,

    /// How long a toast stays visible
    #[serde(default = "default_toast_lifetime_ms")]
    pub toast_lifetime_ms: u64,

    /// Number of donations shown on a need detail view
    #[serde(default = "default_recent_donation_limit")]
    #[validate(range(min = 1, max = 500))]
    pub recent_donation_limit: usize,

    /// Explicit location of the preferences file
    #[serde(default)]
    pub preferences_path: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            environment: default_environment(),
            log_level: default_log_level(),
            log_json: false,
            request_timeout_secs: default_request_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            refresh_delay_ms: default_refresh_delay_ms(),
            welcome_delay_ms: default_welcome_delay_ms(),
            dedup_window_ms: default_dedup_window_ms(),
            toast_lifetime_ms: default_toast_lifetime_ms(),
            recent_donation_limit: default_recent_donation_limit(),
            preferences_path: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration pointing at the given backend, defaults elsewhere
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            ..Default::default()
        }
    }

    /// Gets log level reference
    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Checks if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment.eq_ignore_ascii_case("development")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }

    pub fn dedup_window(&self) -> Duration {
        Duration::from_millis(self.dedup_window_ms)
    }

    pub fn toast_lifetime(&self) -> Duration {
        Duration::from_millis(self.toast_lifetime_ms)
    }

    /// Resolves the preferences file location.
    ///
    /// Order: explicit `preferences_path`, then `$PAYDA_CLI_HOME/preferences.json`,
    /// then `$HOME/.payda/preferences.json`.
    pub fn preferences_file(&self) -> Option<PathBuf> {
        if let Some(path) = self.preferences_path.as_ref().filter(|p| !p.trim().is_empty()) {
            return Some(PathBuf::from(path));
        }

        if let Ok(dir) = env::var("PAYDA_CLI_HOME") {
            let mut path = PathBuf::from(dir);
            path.push("preferences.json");
            return Some(path);
        }

        env::var("HOME").ok().map(|home| {
            let mut path = PathBuf::from(home);
            path.push(".payda");
            path.push("preferences.json");
            path
        })
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Default value functions
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_refresh_delay_ms() -> u64 {
    DEFAULT_REFRESH_DELAY_MS
}

fn default_welcome_delay_ms() -> u64 {
    DEFAULT_WELCOME_DELAY_MS
}

fn default_dedup_window_ms() -> u64 {
    DEFAULT_DEDUP_WINDOW_MS
}

fn default_toast_lifetime_ms() -> u64 {
    DEFAULT_TOAST_LIFETIME_MS
}

fn default_recent_donation_limit() -> usize {
    DEFAULT_RECENT_DONATION_LIMIT
}

fn validate_base_url(raw: &str) -> Result<(), ValidationError> {
    match url::Url::parse(raw) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => {
            let mut err = ValidationError::new("api_base_url");
            err.message = Some("Must be an absolute http(s) URL".into());
            Err(err)
        }
    }
}

/// Validates log level values
fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if valid_levels.contains(&level.to_lowercase().as_str()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("log_level");
        err.message = Some("Must be one of: trace, debug, info, warn, error".into());
        Err(err)
    }
}

/// Initializes tracing using the provided log level as the default filter
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_directive = format!("payda_client={},payda={}", level, level);
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_writer(std::io::stderr);

    if json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.try_init();
    }
}

/// Loads client configuration
///
/// Layers configuration sources in this order:
/// 1. Built-in defaults
/// 2. Default config (config/default.toml)
/// 3. Environment-specific config (config/{env}.toml)
/// 4. Environment variables (PAYDA__*)
pub fn load_config() -> Result<ClientConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    let config = Config::builder()
        .set_default("environment", run_env.as_str())?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    let client_config: ClientConfig = config.try_deserialize()?;

    client_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!(api_base_url = %client_config.api_base_url, "Configuration loaded successfully");
    Ok(client_config)
}
