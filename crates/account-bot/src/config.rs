//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,

    /// MTProto gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Authentication flow configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Bot configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from @BotFather
    pub bot_token: String,

    /// Bot API endpoint
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// getUpdates long-poll wait
    #[serde(default = "default_poll_timeout", with = "humantime_serde")]
    pub poll_timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// MTProto gateway endpoint
    #[serde(default = "default_gateway_url")]
    pub base_url: String,

    /// Request timeout
    #[serde(default = "default_gateway_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// SQLite database path
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// How long an in-flight login may sit idle before it is dropped
    #[serde(default = "default_pending_ttl", with = "humantime_serde")]
    pub pending_ttl: Duration,

    /// How long an abandoned conversation state is kept
    #[serde(default = "default_state_ttl", with = "humantime_serde")]
    pub state_ttl: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default implementations
impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_gateway_url(),
            timeout: default_gateway_timeout(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            pending_ttl: default_pending_ttl(),
            state_ttl: default_state_ttl(),
        }
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions
fn default_api_url() -> String {
    "https://api.telegram.org".into()
}

fn default_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_gateway_url() -> String {
    "http://gateway:8080".into()
}

fn default_gateway_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_db_path() -> String {
    "accounts.db".into()
}

fn default_pending_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_state_ttl() -> Duration {
    Duration::from_secs(15 * 60)
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Note: try_parsing(true) would parse +15551234567 as a
                    // positive number stripping the + prefix. Keep strings
                    // as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
