use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// How long the notifier waits on a single recipient before moving on.
pub const DEFAULT_SEND_TIMEOUT_SECS: u64 = 10;
/// Assignments whose deadline passed this long ago are purged.
pub const DEFAULT_PURGE_AFTER_HOURS: u64 = 168;
/// Cadence of the background purge sweep.
pub const DEFAULT_PURGE_INTERVAL_SECS: u64 = 3600;

/// Top-level config (homeroom.toml + HOMEROOM_* env overrides).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HomeroomConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub retention: RetentionConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
}

impl Default for HomeroomConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            gateway: GatewayConfig::default(),
            retention: RetentionConfig::default(),
            authorization: AuthorizationConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Outbound messaging gateway — the "send text to address" primitive.
///
/// The chat transport itself lives outside this service; deliveries are
/// POSTed to whatever bridge the deployment runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Optional bearer token sent with every delivery.
    pub token: Option<String>,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: default_gateway_url(),
            token: None,
            send_timeout_secs: DEFAULT_SEND_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    #[serde(default = "default_purge_after")]
    pub purge_after_hours: u64,
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            purge_after_hours: DEFAULT_PURGE_AFTER_HOURS,
            purge_interval_secs: DEFAULT_PURGE_INTERVAL_SECS,
        }
    }
}

/// Accounts provisioned as active global administrators at startup.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthorizationConfig {
    #[serde(default)]
    pub global_admins: Vec<i64>,
}

fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.homeroom/homeroom.db", home)
}

fn default_gateway_url() -> String {
    "http://127.0.0.1:8900/send".to_string()
}

fn default_send_timeout() -> u64 {
    DEFAULT_SEND_TIMEOUT_SECS
}

fn default_purge_after() -> u64 {
    DEFAULT_PURGE_AFTER_HOURS
}

fn default_purge_interval() -> u64 {
    DEFAULT_PURGE_INTERVAL_SECS
}

impl HomeroomConfig {
    /// Load config from a TOML file with HOMEROOM_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.homeroom/homeroom.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: HomeroomConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("HOMEROOM_").split("_"))
            .extract()
            .map_err(|e| crate::error::HomeroomError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.homeroom/homeroom.toml", home)
}
