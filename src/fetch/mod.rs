//! Game fetching from the chess.com public API.
//!
//! `GameSource` is the seam between aggregation and I/O: the aggregator only
//! ever talks to a `GameSource`, and `ChessComClient` is the production
//! implementation. Every call fetches fresh data; nothing is cached.

pub mod chess_com;
#[cfg(test)]
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::ChessComConfig;
use crate::models::{GameRecord, MonthKey};
use chess_com::{ArchiveResponse, ArchivesResponse, CurrentGamesResponse};

/// Errors that can occur during fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Rate limited by {host}, retry after {retry_after_secs}s")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One month of a player's archived games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archive {
    pub month: MonthKey,
    pub url: Url,
}

/// Where games come from.
#[async_trait]
pub trait GameSource: Send + Sync {
    /// Source identifier for logging.
    fn name(&self) -> &'static str;

    /// Games the player is currently playing.
    async fn current_games(&self, player: &str) -> Result<Vec<GameRecord>, FetchError>;

    /// The player's monthly archives, in the order the host lists them.
    async fn archives(&self, player: &str) -> Result<Vec<Archive>, FetchError>;

    /// Finished games stored in one monthly archive.
    async fn archive_games(&self, archive: &Archive) -> Result<Vec<GameRecord>, FetchError>;
}

/// Configuration for the chess.com client.
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// API root, e.g. `https://api.chess.com/pub`
    pub base_url: String,

    /// Request timeout
    pub timeout: Duration,

    /// User agent string
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.chess.com/pub".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: format!("club-standings/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl From<&ChessComConfig> for FetcherConfig {
    fn from(config: &ChessComConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
            user_agent: config.user_agent.clone(),
        }
    }
}

/// chess.com published-data API client.
pub struct ChessComClient {
    client: Client,
    config: FetcherConfig,
}

impl ChessComClient {
    /// Create a new client with the given configuration.
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .unwrap_or_else(|_| HeaderValue::from_static("club-standings")),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build `{base_url}/player/{player}/{suffix}`.
    fn player_url(&self, player: &str, suffix: &str) -> Result<Url, FetchError> {
        let raw = format!(
            "{}/player/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            player.to_lowercase(),
            suffix
        );
        Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, FetchError> {
        debug!("Fetching {}", url);

        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(FetchError::RateLimited {
                host: url.host_str().unwrap_or("unknown").to_string(),
                retry_after_secs: retry_after,
            });
        }

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl GameSource for ChessComClient {
    fn name(&self) -> &'static str {
        "chess.com"
    }

    async fn current_games(&self, player: &str) -> Result<Vec<GameRecord>, FetchError> {
        let url = self.player_url(player, "games")?;
        let response: CurrentGamesResponse = self.get_json(&url).await?;

        Ok(response
            .games
            .into_iter()
            .map(|g| g.into_record())
            .collect())
    }

    async fn archives(&self, player: &str) -> Result<Vec<Archive>, FetchError> {
        let url = self.player_url(player, "games/archives")?;
        let response: ArchivesResponse = self.get_json(&url).await?;

        let mut archives = Vec::with_capacity(response.archives.len());
        for raw in response.archives {
            let parsed = Url::parse(&raw)
                .ok()
                .and_then(|url| chess_com::archive_month(&url).map(|month| Archive { month, url }));
            match parsed {
                Some(archive) => archives.push(archive),
                None => warn!(player, archive = %raw, "Skipping unparseable archive URL"),
            }
        }

        Ok(archives)
    }

    async fn archive_games(&self, archive: &Archive) -> Result<Vec<GameRecord>, FetchError> {
        let response: ArchiveResponse = self.get_json(&archive.url).await?;

        Ok(response
            .games
            .into_iter()
            .map(|g| g.into_record())
            .collect())
    }
}
