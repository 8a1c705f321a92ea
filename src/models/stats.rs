//! Standings models: per-player records and monthly buckets.

use serde::{Deserialize, Serialize};

use super::{GameRecord, MonthKey};

/// A player's record within one month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Player name as spelled in the roster
    pub player: String,

    pub wins: u32,
    pub losses: u32,
    pub draws: u32,

    /// 1 per win, 0.5 per draw
    pub points: f64,

    /// Wins / games played × 100, rounded to 2 decimals
    pub win_percentage: f64,

    /// Wins counted before the player's first loss, in bucket order
    pub win_streak: u32,
}

impl PlayerStats {
    /// Zero-valued record for a player.
    pub fn new(player: impl Into<String>) -> Self {
        Self {
            player: player.into(),
            wins: 0,
            losses: 0,
            draws: 0,
            points: 0.0,
            win_percentage: 0.0,
            win_streak: 0,
        }
    }

    pub fn games_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }
}

/// Finished games completed in one calendar month, with standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthBucket {
    #[serde(flatten)]
    pub key: MonthKey,

    /// Most recent first
    pub games: Vec<GameRecord>,

    /// Players with at least one game, by win percentage descending
    pub standings: Vec<PlayerStats>,
}

impl MonthBucket {
    pub fn new(key: MonthKey) -> Self {
        Self {
            key,
            games: Vec::new(),
            standings: Vec::new(),
        }
    }

    /// Get a player's stats by name (case insensitive).
    pub fn get_player(&self, name: &str) -> Option<&PlayerStats> {
        self.standings
            .iter()
            .find(|s| super::same_player(&s.player, name))
    }
}

/// Games still being played. These have no calendar month.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentGames {
    pub games: Vec<GameRecord>,
}

/// One page of the "load previous month" listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthPage {
    /// The month that was asked for
    pub requested: MonthKey,

    /// The requested month's bucket, if any club games were played in it
    pub bucket: Option<MonthBucket>,

    /// Nearest earlier month with archived history
    pub next: Option<MonthKey>,
}
