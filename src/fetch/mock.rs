//! In-memory game source for tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use url::Url;

use super::{Archive, FetchError, GameSource};
use crate::models::{GameRecord, MonthKey};

/// Serves canned games per player. Player lookups ignore case.
#[derive(Debug, Default, Clone)]
pub struct MockSource {
    current: HashMap<String, Vec<GameRecord>>,
    archives: HashMap<String, Vec<(MonthKey, Vec<GameRecord>)>>,
    failing_players: HashSet<String>,
    failing_archives: HashSet<String>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_current(mut self, player: &str, games: Vec<GameRecord>) -> Self {
        self.current
            .entry(player.to_lowercase())
            .or_default()
            .extend(games);
        self
    }

    pub fn with_archive(mut self, player: &str, month: MonthKey, games: Vec<GameRecord>) -> Self {
        self.archives
            .entry(player.to_lowercase())
            .or_default()
            .push((month, games));
        self
    }

    /// Every request for this player fails.
    pub fn with_failing_player(mut self, player: &str) -> Self {
        self.failing_players.insert(player.to_lowercase());
        self
    }

    /// Requests for this one archive fail.
    pub fn with_failing_archive(mut self, player: &str, month: MonthKey) -> Self {
        self.failing_archives
            .insert(Self::archive_url(player, month).to_string());
        self
    }

    pub fn archive_url(player: &str, month: MonthKey) -> Url {
        Url::parse(&format!(
            "https://mock.test/pub/player/{}/games/{:04}/{:02}",
            player.to_lowercase(),
            month.year,
            month.month
        ))
        .unwrap()
    }

    fn check_player(&self, player: &str) -> Result<(), FetchError> {
        if self.failing_players.contains(&player.to_lowercase()) {
            return Err(FetchError::HttpStatus {
                status: 503,
                url: format!("https://mock.test/pub/player/{}", player),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GameSource for MockSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn current_games(&self, player: &str) -> Result<Vec<GameRecord>, FetchError> {
        self.check_player(player)?;
        Ok(self
            .current
            .get(&player.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }

    async fn archives(&self, player: &str) -> Result<Vec<Archive>, FetchError> {
        self.check_player(player)?;
        Ok(self
            .archives
            .get(&player.to_lowercase())
            .map(|months| {
                months
                    .iter()
                    .map(|(month, _)| Archive {
                        month: *month,
                        url: Self::archive_url(player, *month),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn archive_games(&self, archive: &Archive) -> Result<Vec<GameRecord>, FetchError> {
        if self.failing_archives.contains(archive.url.as_str()) {
            return Err(FetchError::HttpStatus {
                status: 500,
                url: archive.url.to_string(),
            });
        }

        self.archives
            .iter()
            .flat_map(|(player, months)| months.iter().map(move |entry| (player, entry)))
            .find(|(player, (month, _))| Self::archive_url(player, *month) == archive.url)
            .map(|(_, (_, games))| games.clone())
            .ok_or_else(|| FetchError::HttpStatus {
                status: 404,
                url: archive.url.to_string(),
            })
    }
}
