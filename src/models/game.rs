//! Game record model: one game between two players as reported by the host.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::GameId;

/// Outcome of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GameResult {
    WhiteWin,
    BlackWin,
    Draw,
    InProgress,
    /// A result code the host sent that we do not recognize.
    Unrecognized(String),
}

impl GameResult {
    /// Parse a PGN `Result` tag value.
    pub fn from_pgn(code: &str) -> Self {
        match code.trim() {
            "1-0" => GameResult::WhiteWin,
            "0-1" => GameResult::BlackWin,
            "1/2-1/2" => GameResult::Draw,
            "*" => GameResult::InProgress,
            other => GameResult::Unrecognized(other.to_string()),
        }
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameResult::WhiteWin => write!(f, "1-0"),
            GameResult::BlackWin => write!(f, "0-1"),
            GameResult::Draw => write!(f, "1/2-1/2"),
            GameResult::InProgress => write!(f, "*"),
            GameResult::Unrecognized(code) => write!(f, "{}", code),
        }
    }
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Checkmate,
    Resignation,
    Timeout,
    Agreement,
    InsufficientMaterial,
    Stalemate,
    Repetition,
    FiftyMove,
    Abandoned,
    #[default]
    None,
}

impl Termination {
    /// Map a chess.com per-side result code to a termination reason.
    ///
    /// Returns `None` for codes that do not describe how the game ended
    /// (`win`, or anything unknown).
    pub fn from_side_result(code: &str) -> Option<Self> {
        let reason = match code {
            "checkmated" => Termination::Checkmate,
            "resigned" => Termination::Resignation,
            "timeout" => Termination::Timeout,
            "agreed" => Termination::Agreement,
            "insufficient" | "timevsinsufficient" => Termination::InsufficientMaterial,
            "stalemate" => Termination::Stalemate,
            "repetition" => Termination::Repetition,
            "50move" => Termination::FiftyMove,
            "abandoned" => Termination::Abandoned,
            _ => return None,
        };
        Some(reason)
    }
}

/// A single game as fetched from the host. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Canonical game URL
    pub id: GameId,

    /// White player's username
    pub white: String,

    /// Black player's username
    pub black: String,

    /// When the game finished; absent while in progress
    pub completed_at: Option<DateTime<Utc>>,

    /// Result code
    pub result: GameResult,

    /// How the game ended
    pub termination: Termination,
}

impl GameRecord {
    /// Create a new GameRecord.
    pub fn new(
        id: impl Into<GameId>,
        white: impl Into<String>,
        black: impl Into<String>,
        completed_at: Option<DateTime<Utc>>,
        result: GameResult,
    ) -> Self {
        Self {
            id: id.into(),
            white: white.into(),
            black: black.into(),
            completed_at,
            result,
            termination: Termination::None,
        }
    }

    /// Set how the game ended.
    pub fn with_termination(mut self, termination: Termination) -> Self {
        self.termination = termination;
        self
    }
}
