//! Application configuration structs
//!
//! Loads configuration from environment variables (and a `.env` file when
//! present). Every setting has a default, so an empty environment is valid.

use feed_core::InviteMap;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub viewer: ViewerConfig,
    pub relay: RelayConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub env: Environment,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "production" => Ok(Self::Production),
            "staging" => Ok(Self::Staging),
            "development" => Ok(Self::Development),
            other => Err(format!("unknown environment `{other}`")),
        }
    }
}

/// Feed viewer configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// Base URL of the relay (`http://host:port`)
    pub base_url: String,
    /// Directory holding the persisted feed cache
    pub state_dir: PathBuf,
    /// Maximum number of cached messages
    pub cache_capacity: usize,
    /// Evict this many messages at once on overflow (`None` = strict FIFO)
    pub eviction_batch: Option<usize>,
    /// Apply the letter-rotation pass to rendered text
    pub obfuscate: bool,
    /// Where the rendered page snapshot is written
    pub output_path: PathBuf,
}

/// Relay server configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Append-only JSON-lines message log to tail
    pub messages_path: PathBuf,
    /// Guild invite links served at `/invites`
    pub invites: InviteMap,
    /// Number of recent messages served at `/recents`
    pub recents_capacity: usize,
    /// Per-subscriber queue size; messages are dropped when full
    pub queue_size: usize,
}

impl RelayConfig {
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Default value functions
fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_state_dir() -> PathBuf {
    PathBuf::from("./state")
}

fn default_cache_capacity() -> usize {
    100
}

fn default_output_path() -> PathBuf {
    PathBuf::from("./feed.html")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_messages_path() -> PathBuf {
    PathBuf::from("./messages.json")
}

fn default_recents_capacity() -> usize {
    100
}

fn default_queue_size() -> usize {
    16
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if a variable is set to an unparseable value
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        Ok(Self {
            app: AppSettings {
                env: vars.parse("APP_ENV")?.unwrap_or_default(),
                log_json: vars.flag("FEED_LOG_JSON")?.unwrap_or(false),
            },
            viewer: ViewerConfig {
                base_url: vars.string("FEED_BASE_URL").unwrap_or_else(default_base_url),
                state_dir: vars
                    .string("FEED_STATE_DIR")
                    .map_or_else(default_state_dir, PathBuf::from),
                cache_capacity: vars
                    .positive("FEED_CACHE_CAPACITY")?
                    .unwrap_or_else(default_cache_capacity),
                eviction_batch: vars.positive("FEED_EVICTION_BATCH")?,
                obfuscate: vars.flag("FEED_OBFUSCATE")?.unwrap_or(false),
                output_path: vars
                    .string("FEED_OUTPUT")
                    .map_or_else(default_output_path, PathBuf::from),
            },
            relay: RelayConfig {
                host: vars.string("RELAY_HOST").unwrap_or_else(default_host),
                port: vars.parse("RELAY_PORT")?.unwrap_or_else(default_port),
                messages_path: vars
                    .string("RELAY_MESSAGES_PATH")
                    .map_or_else(default_messages_path, PathBuf::from),
                invites: vars
                    .string("RELAY_INVITES")
                    .map(|raw| parse_invites(&raw))
                    .transpose()?
                    .unwrap_or_default(),
                recents_capacity: vars
                    .positive("RELAY_RECENTS_CAPACITY")?
                    .unwrap_or_else(default_recents_capacity),
                queue_size: vars
                    .positive("RELAY_QUEUE_SIZE")?
                    .unwrap_or_else(default_queue_size),
            },
        })
    }
}

/// Typed access to a variable lookup
struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Non-empty trimmed value
    fn string(&self, name: &'static str) -> Option<String> {
        (self.0)(name)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn parse<T>(&self, name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.string(name)
            .map(|raw| {
                raw.parse()
                    .map_err(|e: T::Err| ConfigError::InvalidValue(name, e.to_string()))
            })
            .transpose()
    }

    fn positive(&self, name: &'static str) -> Result<Option<usize>, ConfigError> {
        match self.parse::<usize>(name)? {
            Some(0) => Err(ConfigError::InvalidValue(name, "must be at least 1".to_string())),
            other => Ok(other),
        }
    }

    fn flag(&self, name: &'static str) -> Result<Option<bool>, ConfigError> {
        self.string(name)
            .map(|raw| match raw.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidValue(name, raw)),
            })
            .transpose()
    }
}

/// Parse `name=url,name=url` into an invite map
fn parse_invites(raw: &str) -> Result<InviteMap, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            entry
                .split_once('=')
                .map(|(guild, url)| (guild.trim().to_string(), url.trim().to_string()))
                .filter(|(guild, url)| !guild.is_empty() && !url.is_empty())
                .ok_or_else(|| ConfigError::InvalidValue("RELAY_INVITES", entry.to_string()))
        })
        .collect()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
