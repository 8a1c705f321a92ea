//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use url::Url;

use crate::models::Roster;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Club roster configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// chess.com usernames of club members
    #[serde(default = "default_players")]
    pub players: Vec<String>,
}

fn default_players() -> Vec<String> {
    ["PipoGambit", "dalmu7", "elcubanoaj", "cdalmeida", "maximuni"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
        }
    }
}

impl RosterConfig {
    pub fn roster(&self) -> Roster {
        Roster::new(self.players.iter().cloned())
    }
}

/// chess.com API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChessComConfig {
    /// API root
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout in seconds, per request
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    "https://api.chess.com/pub".to_string()
}

fn default_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("club-standings/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for ChessComConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8889
}

fn default_cors_origin() -> String {
    "*".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub roster: RosterConfig,

    #[serde(default)]
    pub chess_com: ChessComConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            roster: RosterConfig::default(),
            chess_com: ChessComConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roster.players.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "Roster player names must not be blank".to_string(),
            ));
        }

        if self.roster.roster().is_empty() {
            return Err(ConfigError::ValidationError(
                "Roster must list at least one player".to_string(),
            ));
        }

        if self.chess_com.timeout_seconds == 0 {
            return Err(ConfigError::ValidationError(
                "chess.com timeout must be greater than 0".to_string(),
            ));
        }

        if let Err(e) = Url::parse(&self.chess_com.base_url) {
            return Err(ConfigError::ValidationError(format!(
                "chess.com base_url is not a valid URL: {}",
                e
            )));
        }

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "Server port must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
