//! Club roster: the fixed set of players whose games are tracked.

use serde::{Deserialize, Serialize};

/// Ordered list of club members. Name identity is case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct Roster {
    players: Vec<String>,
}

impl Roster {
    /// Build a roster, dropping blank names and later case-insensitive
    /// duplicates of an earlier name.
    pub fn new<I, S>(players: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique: Vec<String> = Vec::new();
        for player in players {
            let player = player.into().trim().to_string();
            if player.is_empty() || unique.iter().any(|p| same_player(p, &player)) {
                continue;
            }
            unique.push(player);
        }
        Self { players: unique }
    }

    /// Player names in roster order, spelled as configured.
    pub fn players(&self) -> &[String] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Position of a player in the roster, ignoring case.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.players.iter().position(|p| same_player(p, name))
    }

    /// Whether `name` is a club member, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }
}

/// Case-folded name comparison.
pub fn same_player(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

impl From<Vec<String>> for Roster {
    fn from(players: Vec<String>) -> Self {
        Roster::new(players)
    }
}

impl From<Roster> for Vec<String> {
    fn from(roster: Roster) -> Self {
        roster.players
    }
}
