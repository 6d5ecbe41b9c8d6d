use std::env;
use std::path::Path;

use figment::{Figment, providers::{Env, Format, Serialized, Toml}};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::Level;

use crate::dto::repository::DEFAULT_NAMESPACE;
use crate::filter::DEFAULT_MIN_SCORE;

/// Environment variable holding the path of the config file.
pub const CONFIG_PATH_ENV: &str = "HUBTAGS_CONFIG";
/// Prefix of environment variables that override config values.
pub const ENV_PREFIX: &str = "HUBTAGS_";

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct RegistryConfig {
    /// Base url of the registry api, without a trailing slash.
    #[serde(default = "default_registry_url")]
    pub url: String,
    /// Namespace used for repositories given without one.
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Per request timeout. Unset means requests may hang forever.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: default_registry_url(),
            default_namespace: default_namespace(),
            user_agent: default_user_agent(),
            timeout_secs: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct FilterConfig {
    /// Lowest fuzzy score a tag needs to be shown for a non-empty query.
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_score: default_min_score(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Human,
    Json,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RollPeriod {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct LogConfig {
    /// The minimum level of logging
    #[serde(deserialize_with = "deserialize_log_level", serialize_with = "serialize_log_level", default = "default_log_level")]
    pub level: Level,
    /// Also write logs to a rolling file at `path`.
    #[serde(default)]
    pub file: bool,
    /// The path of the logging file
    #[serde(default = "default_log_path")]
    pub path: String,
    /// The format of the produced logs
    #[serde(default)]
    pub format: LogFormat,
    /// The roll period of the file
    #[serde(default)]
    pub roll_period: RollPeriod,
    pub env_filter: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: false,
            path: default_log_path(),
            format: LogFormat::default(),
            roll_period: RollPeriod::default(),
            env_filter: None,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Config {
    /// Load the config from `path`, or from the file named by `HUBTAGS_CONFIG`, or from
    /// `hubtags.toml`.
    ///
    /// Environment variables prefixed with `HUBTAGS_` override the file, nested keys are
    /// separated with `__`, e.g. `HUBTAGS_REGISTRY__URL`. A missing file is not an error.
    pub fn new(path: Option<&Path>) -> Result<Self, figment::Error> {
        let path = match path {
            Some(path) => path.display().to_string(),
            None => match env::var(CONFIG_PATH_ENV) {
                Ok(path) => path,
                Err(_) => "hubtags.toml".to_string(),
            }
        };

        Self::figment(&path).extract::<Config>().map(Config::normalized)
    }

    /// Layers, lowest precedence first: defaults, the toml file, the environment.
    pub fn figment(path: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    fn normalized(mut self) -> Self {
        let url = self.registry.url.trim_end_matches('/');
        self.registry.url = url.to_string();
        self
    }
}

fn default_registry_url() -> String {
    "https://hub.docker.com".to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_user_agent() -> String {
    format!("hubtags/{}", env!("CARGO_PKG_VERSION"))
}

fn default_min_score() -> u32 {
    DEFAULT_MIN_SCORE
}

fn default_log_level() -> Level {
    Level::INFO
}

fn default_log_path() -> String {
    "hubtags.log".to_string()
}

fn deserialize_log_level<'de, D>(deserializer: D) -> Result<Level, D::Error>
where D: Deserializer<'de> {
    let s = String::deserialize(deserializer)?.to_lowercase();
    let s = s.as_str();

    match s {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(serde::de::Error::custom(format!("Unknown log level: '{}'", s))),
    }
}

fn serialize_log_level<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
where S: Serializer {
    serializer.serialize_str(&level.as_str().to_lowercase())
}
