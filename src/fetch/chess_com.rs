//! chess.com public API payloads and their conversion into game records.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use url::Url;

use crate::models::{GameRecord, GameResult, MonthKey, Termination};

static PGN_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*\[([A-Za-z0-9_]+)\s+"((?:[^"\\]|\\.)*)"\s*\]"#).unwrap()
});

/// Per-side result codes that mean the game was drawn.
const DRAW_CODES: &[&str] = &[
    "agreed",
    "repetition",
    "stalemate",
    "insufficient",
    "50move",
    "timevsinsufficient",
];

/// `GET /player/{name}/games`
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentGamesResponse {
    #[serde(default)]
    pub games: Vec<CurrentGame>,
}

/// A daily game still in progress. Players are profile URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct CurrentGame {
    pub url: String,
    #[serde(default)]
    pub pgn: String,
    pub white: String,
    pub black: String,
}

/// `GET /player/{name}/games/archives`
#[derive(Debug, Clone, Deserialize)]
pub struct ArchivesResponse {
    #[serde(default)]
    pub archives: Vec<String>,
}

/// `GET /player/{name}/games/{YYYY}/{MM}`
#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveResponse {
    #[serde(default)]
    pub games: Vec<FinishedGame>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishedGame {
    pub url: String,
    #[serde(default)]
    pub pgn: String,
    /// Unix seconds
    #[serde(default)]
    pub end_time: Option<i64>,
    pub white: FinishedSide,
    pub black: FinishedSide,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishedSide {
    pub username: String,
    /// "win", "checkmated", "resigned", "timeout", "agreed", ...
    pub result: String,
    #[serde(default)]
    pub rating: Option<u32>,
}

/// Tag pairs from a PGN header section.
pub fn pgn_tags(pgn: &str) -> HashMap<&str, &str> {
    PGN_TAG
        .captures_iter(pgn)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect()
}

/// Username at the end of a profile URL such as
/// `https://api.chess.com/pub/player/hikaru`.
pub fn username_from_profile(profile: &str) -> String {
    profile
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(profile)
        .to_string()
}

/// Month of an archive URL, read from its last two path segments.
pub fn archive_month(archive: &Url) -> Option<MonthKey> {
    let segments: Vec<&str> = archive.path_segments()?.filter(|s| !s.is_empty()).collect();
    let [.., year, month] = segments.as_slice() else {
        return None;
    };
    MonthKey::new(year.parse().ok()?, month.parse().ok()?)
}

fn pgn_end_time(tags: &HashMap<&str, &str>) -> Option<DateTime<Utc>> {
    let date = tags.get("EndDate")?;
    let time = tags.get("EndTime")?;
    NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y.%m.%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc())
}

impl CurrentGame {
    pub fn into_record(self) -> GameRecord {
        let tags = pgn_tags(&self.pgn);
        let white = tags
            .get("White")
            .map(|s| s.to_string())
            .unwrap_or_else(|| username_from_profile(&self.white));
        let black = tags
            .get("Black")
            .map(|s| s.to_string())
            .unwrap_or_else(|| username_from_profile(&self.black));
        let result = tags
            .get("Result")
            .map(|r| GameResult::from_pgn(r))
            .unwrap_or(GameResult::InProgress);

        GameRecord::new(self.url, white, black, None, result)
    }
}

impl FinishedGame {
    pub fn into_record(self) -> GameRecord {
        let tags = pgn_tags(&self.pgn);
        let white = tags
            .get("White")
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.white.username.clone());
        let black = tags
            .get("Black")
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.black.username.clone());

        let result = match tags.get("Result") {
            Some(code) => GameResult::from_pgn(code),
            None => self.result_from_sides(),
        };

        let completed_at = self
            .end_time
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .or_else(|| pgn_end_time(&tags));

        GameRecord::new(self.url.clone(), white, black, completed_at, result)
            .with_termination(self.termination())
    }

    fn result_from_sides(&self) -> GameResult {
        let (w, b) = (self.white.result.as_str(), self.black.result.as_str());
        if w == "win" {
            GameResult::WhiteWin
        } else if b == "win" {
            GameResult::BlackWin
        } else if DRAW_CODES.contains(&w) && DRAW_CODES.contains(&b) {
            GameResult::Draw
        } else {
            GameResult::Unrecognized(format!("{}/{}", w, b))
        }
    }

    /// The losing side's code says how a decisive game ended.
    fn termination(&self) -> Termination {
        let code = if self.white.result == "win" {
            &self.black.result
        } else {
            &self.white.result
        };
        Termination::from_side_result(code).unwrap_or_default()
    }
}
