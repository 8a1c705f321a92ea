//! Standings calculation engine.
//!
//! Turns the raw games fetched for every club member into monthly standings:
//! - Deduplication by game URL and filtering to games between two members
//! - Grouping of finished games into calendar months, newest first
//! - Per-month player records and ranking
//!
//! Nothing here fails: every function produces a best-effort answer from
//! whatever input arrived.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use crate::models::{
    CurrentGames, GameId, GameRecord, GameResult, MonthBucket, MonthKey, PlayerStats, Roster,
};

/// Drop repeated game ids and games not played between two club members.
///
/// Keeps first-seen order. A game whose id was already seen is skipped even
/// if its first occurrence was rejected. Each side is tested against the
/// roster separately, so a self-play game by a member counts as two matches
/// and is kept.
pub fn dedup_and_filter(roster: &Roster, games: Vec<GameRecord>) -> Vec<GameRecord> {
    let mut seen: HashSet<GameId> = HashSet::new();
    let mut selected = Vec::new();

    for game in games {
        if !seen.insert(game.id.clone()) {
            continue;
        }

        let members_found =
            usize::from(roster.contains(&game.white)) + usize::from(roster.contains(&game.black));
        if members_found == 2 {
            selected.push(game);
        }
    }

    selected
}

/// Result of splitting games by completion state.
#[derive(Debug, Clone, Default)]
pub struct Grouped {
    /// Buckets, newest month first
    pub buckets: Vec<MonthBucket>,

    /// Games without a completion time
    pub current: CurrentGames,
}

/// Sort games newest first and group finished ones by month.
///
/// Games without a completion time never enter a bucket. Every bucket gets
/// its standings computed from its own games only.
pub fn group_by_month(roster: &Roster, mut games: Vec<GameRecord>) -> Grouped {
    // Stable: in-progress games (None) sort last and keep arrival order.
    games.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let mut months: BTreeMap<MonthKey, Vec<GameRecord>> = BTreeMap::new();
    let mut current = Vec::new();

    for game in games {
        match game.completed_at {
            Some(at) => months.entry(MonthKey::of(at)).or_default().push(game),
            None => current.push(game),
        }
    }

    let buckets = months
        .into_iter()
        .rev()
        .map(|(key, games)| {
            let standings = compute_standings(roster, &games);
            MonthBucket {
                key,
                games,
                standings,
            }
        })
        .collect();

    Grouped {
        buckets,
        current: CurrentGames { games: current },
    }
}

/// Per-player records for one month's games, ranked by win percentage.
///
/// Games are processed in the order given (newest first within a bucket).
/// A win extends the winner's streak only while that player has no loss
/// recorded yet. In-progress and unrecognized results change nothing.
/// Players without games are left out. Ties keep roster order.
pub fn compute_standings(roster: &Roster, games: &[GameRecord]) -> Vec<PlayerStats> {
    let mut stats: Vec<PlayerStats> = roster
        .players()
        .iter()
        .map(|p| PlayerStats::new(p.as_str()))
        .collect();

    for game in games {
        let white = roster.index_of(&game.white);
        let black = roster.index_of(&game.black);
        let (Some(white), Some(black)) = (white, black) else {
            continue;
        };

        match game.result {
            GameResult::WhiteWin => record_win(&mut stats, white, black),
            GameResult::BlackWin => record_win(&mut stats, black, white),
            GameResult::Draw => {
                for idx in [white, black] {
                    stats[idx].draws += 1;
                    stats[idx].points += 0.5;
                }
            }
            GameResult::InProgress | GameResult::Unrecognized(_) => {}
        }
    }

    let mut ranked: Vec<PlayerStats> = stats
        .into_iter()
        .filter(|s| s.games_played() > 0)
        .map(|mut s| {
            s.win_percentage = calculate_win_percentage(s.wins, s.losses, s.draws);
            s
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.win_percentage
            .partial_cmp(&a.win_percentage)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

// Self-play (winner == loser) records both a win and a loss for the player,
// and the streak is read before the loss lands, so it counts. Recording only
// the loser's side, or checking the streak after the loss, would give a
// different record for the same game.
fn record_win(stats: &mut [PlayerStats], winner: usize, loser: usize) {
    let streak_intact = stats[winner].losses == 0;
    stats[winner].wins += 1;
    stats[winner].points += 1.0;
    if streak_intact {
        stats[winner].win_streak += 1;
    }
    stats[loser].losses += 1;
}

/// Win percentage rounded to 2 decimals; 0 when no games were played.
pub fn calculate_win_percentage(wins: u32, losses: u32, draws: u32) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        round_to_hundredths(100.0 * wins as f64 / total as f64)
    }
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Pick the month to page to after the current one.
///
/// `proposals` holds one entry per player whose archive list was fetched:
/// that player's nearest earlier archive month, or `None` if it has no
/// earlier history. A month proposed by more than half of the players wins.
/// Without a majority the latest proposed month is used.
pub fn choose_next_month(proposals: &[Option<MonthKey>]) -> Option<MonthKey> {
    let mut votes: BTreeMap<MonthKey, usize> = BTreeMap::new();
    for month in proposals.iter().flatten() {
        *votes.entry(*month).or_insert(0) += 1;
    }

    let responded = proposals.len();
    votes
        .iter()
        .find(|(_, &count)| count * 2 > responded)
        .map(|(month, _)| *month)
        .or_else(|| votes.keys().next_back().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at(year: i32, month: u32, day: u32) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap())
    }

    fn game(
        id: &str,
        white: &str,
        black: &str,
        completed: Option<DateTime<Utc>>,
        result: GameResult,
    ) -> GameRecord {
        GameRecord::new(id, white, black, completed, result)
    }

    fn roster() -> Roster {
        Roster::new(["A", "B", "C"])
    }

    fn ids(games: &[GameRecord]) -> Vec<&str> {
        games.iter().map(|g| g.id.as_str()).collect()
    }

    #[test]
    fn test_dedup_keeps_first_seen_order() {
        let games = vec![
            game("g2", "A", "B", at(2024, 5, 2), GameResult::WhiteWin),
            game("g1", "B", "C", at(2024, 5, 1), GameResult::Draw),
            game("g2", "A", "B", at(2024, 5, 2), GameResult::WhiteWin),
            game("g3", "C", "A", at(2024, 5, 3), GameResult::BlackWin),
        ];

        let filtered = dedup_and_filter(&roster(), games);
        assert_eq!(ids(&filtered), vec!["g2", "g1", "g3"]);
    }

    #[test]
    fn test_filter_drops_games_against_outsiders() {
        let games = vec![
            game("g1", "A", "magnus", at(2024, 5, 1), GameResult::WhiteWin),
            game("g2", "hikaru", "B", at(2024, 5, 1), GameResult::Draw),
            game("g3", "a", "b", at(2024, 5, 1), GameResult::Draw),
        ];

        let filtered = dedup_and_filter(&roster(), games);
        assert_eq!(ids(&filtered), vec!["g3"]);
    }

    #[test]
    fn test_filter_marks_rejected_id_as_seen() {
        let games = vec![
            game("g1", "A", "outsider", at(2024, 5, 1), GameResult::WhiteWin),
            game("g1", "A", "B", at(2024, 5, 1), GameResult::WhiteWin),
        ];

        assert!(dedup_and_filter(&roster(), games).is_empty());
    }

    #[test]
    fn test_filter_accepts_self_play() {
        let games = vec![game("g1", "A", "a", at(2024, 5, 1), GameResult::Draw)];

        let filtered = dedup_and_filter(&roster(), games);
        assert_eq!(ids(&filtered), vec!["g1"]);
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let games = vec![
            game("g1", "A", "B", at(2024, 5, 1), GameResult::WhiteWin),
            game("g1", "A", "B", at(2024, 5, 1), GameResult::WhiteWin),
            game("g2", "A", "x", at(2024, 5, 1), GameResult::WhiteWin),
            game("g3", "C", "B", None, GameResult::InProgress),
        ];

        let once = dedup_and_filter(&roster(), games);
        let twice = dedup_and_filter(&roster(), once.clone());
        assert_eq!(once, twice);

        let unique: HashSet<_> = once.iter().map(|g| g.id.clone()).collect();
        assert_eq!(unique.len(), once.len());
        assert!(once
            .iter()
            .all(|g| roster().contains(&g.white) && roster().contains(&g.black)));
    }

    #[test]
    fn test_group_by_month_orders_buckets_descending() {
        let games = vec![
            game("g1", "A", "B", at(2024, 3, 10), GameResult::WhiteWin),
            game("g2", "A", "B", at(2024, 5, 1), GameResult::WhiteWin),
            game("g3", "A", "B", at(2023, 12, 31), GameResult::Draw),
            game("g4", "A", "B", at(2024, 5, 20), GameResult::BlackWin),
        ];

        let grouped = group_by_month(&roster(), games);
        let keys: Vec<String> = grouped.buckets.iter().map(|b| b.key.to_string()).collect();
        assert_eq!(keys, vec!["2024-05", "2024-03", "2023-12"]);

        for pair in grouped.buckets.windows(2) {
            assert!(pair[0].key > pair[1].key);
        }

        // Newest first inside the bucket
        assert_eq!(ids(&grouped.buckets[0].games), vec!["g4", "g2"]);
        for bucket in &grouped.buckets {
            assert!(bucket
                .games
                .iter()
                .all(|g| MonthKey::of(g.completed_at.unwrap()) == bucket.key));
        }
    }

    #[test]
    fn test_group_by_month_keeps_unfinished_games_out_of_buckets() {
        let games = vec![
            game("live", "A", "B", None, GameResult::WhiteWin),
            game("g1", "A", "C", at(2024, 5, 1), GameResult::WhiteWin),
            game("live2", "B", "C", None, GameResult::InProgress),
        ];

        let grouped = group_by_month(&roster(), games);
        assert_eq!(grouped.buckets.len(), 1);
        assert_eq!(ids(&grouped.buckets[0].games), vec!["g1"]);
        assert_eq!(ids(&grouped.current.games), vec!["live", "live2"]);
    }

    #[test]
    fn test_group_by_month_empty_input() {
        let grouped = group_by_month(&roster(), Vec::new());
        assert!(grouped.buckets.is_empty());
        assert!(grouped.current.games.is_empty());
    }

    #[test]
    fn test_club_example_month() {
        let games = vec![
            game("ab", "A", "B", at(2024, 5, 10), GameResult::WhiteWin),
            game("bc", "B", "C", at(2024, 5, 12), GameResult::Draw),
            game("ax", "A", "external", at(2024, 5, 14), GameResult::WhiteWin),
            game("ab", "A", "B", at(2024, 5, 10), GameResult::WhiteWin),
        ];

        let filtered = dedup_and_filter(&roster(), games);
        assert_eq!(filtered.len(), 2);

        let grouped = group_by_month(&roster(), filtered);
        assert_eq!(grouped.buckets.len(), 1);
        let bucket = &grouped.buckets[0];
        assert_eq!(bucket.key, MonthKey::new(2024, 5).unwrap());

        let a = bucket.get_player("A").unwrap();
        assert_eq!((a.wins, a.losses, a.draws), (1, 0, 0));
        assert_eq!(a.points, 1.0);
        assert_eq!(a.win_percentage, 100.0);

        let b = bucket.get_player("B").unwrap();
        assert_eq!((b.wins, b.losses, b.draws), (0, 1, 1));
        assert_eq!(b.points, 0.5);
        assert_eq!(b.win_percentage, 0.0);

        let c = bucket.get_player("C").unwrap();
        assert_eq!((c.wins, c.losses, c.draws), (0, 0, 1));
        assert_eq!(c.points, 0.5);
        assert_eq!(c.win_percentage, 0.0);

        assert_eq!(bucket.standings[0].player, "A");
        assert_eq!(bucket.standings.len(), 3);
    }

    #[test]
    fn test_standings_drop_players_without_games() {
        let games = vec![game("g1", "A", "B", at(2024, 5, 1), GameResult::BlackWin)];

        let standings = compute_standings(&roster(), &games);
        let players: Vec<&str> = standings.iter().map(|s| s.player.as_str()).collect();
        assert_eq!(players, vec!["B", "A"]);
    }

    #[test]
    fn test_standings_use_roster_spelling() {
        let games = vec![game("g1", "a", "b", at(2024, 5, 1), GameResult::WhiteWin)];

        let standings = compute_standings(&roster(), &games);
        assert_eq!(standings[0].player, "A");
    }

    #[test]
    fn test_points_sum_to_game_count() {
        let games = vec![
            game("g1", "A", "B", at(2024, 5, 1), GameResult::WhiteWin),
            game("g2", "B", "C", at(2024, 5, 2), GameResult::Draw),
            game("g3", "C", "A", at(2024, 5, 3), GameResult::BlackWin),
            game("g4", "C", "B", at(2024, 5, 4), GameResult::WhiteWin),
        ];

        let standings = compute_standings(&roster(), &games);
        let total: f64 = standings.iter().map(|s| s.points).sum();
        assert_eq!(total, 4.0);

        for s in &standings {
            assert!((0.0..=100.0).contains(&s.win_percentage));
            assert_eq!(
                s.win_percentage,
                calculate_win_percentage(s.wins, s.losses, s.draws)
            );
        }
    }

    #[test]
    fn test_unrecognized_result_has_no_effect() {
        let games = vec![
            game("g1", "A", "B", at(2024, 5, 1), GameResult::Unrecognized("?".into())),
            game("g2", "A", "C", at(2024, 5, 1), GameResult::InProgress),
        ];

        assert!(compute_standings(&roster(), &games).is_empty());
    }

    #[test]
    fn test_win_streak_stops_counting_after_first_loss() {
        // Newest first: A wins, wins, loses, wins.
        let games = vec![
            game("g4", "A", "B", at(2024, 5, 4), GameResult::WhiteWin),
            game("g3", "C", "A", at(2024, 5, 3), GameResult::BlackWin),
            game("g2", "A", "B", at(2024, 5, 2), GameResult::BlackWin),
            game("g1", "A", "C", at(2024, 5, 1), GameResult::WhiteWin),
        ];

        let standings = compute_standings(&roster(), &games);
        let a = standings.iter().find(|s| s.player == "A").unwrap();
        assert_eq!(a.wins, 3);
        assert_eq!(a.losses, 1);
        assert_eq!(a.win_streak, 2);
    }

    #[test]
    fn test_draws_do_not_break_streak() {
        let games = vec![
            game("g3", "A", "B", at(2024, 5, 3), GameResult::WhiteWin),
            game("g2", "A", "B", at(2024, 5, 2), GameResult::Draw),
            game("g1", "B", "A", at(2024, 5, 1), GameResult::BlackWin),
        ];

        let standings = compute_standings(&roster(), &games);
        assert_eq!(standings[0].player, "A");
        assert_eq!(standings[0].win_streak, 2);
    }

    #[test]
    fn test_self_play_counts_win_and_loss_for_same_player() {
        let games = vec![game("g1", "A", "A", at(2024, 5, 1), GameResult::WhiteWin)];

        let standings = compute_standings(&roster(), &games);
        assert_eq!(standings.len(), 1);
        assert_eq!((standings[0].wins, standings[0].losses), (1, 1));
        assert_eq!(standings[0].win_streak, 1);
        assert_eq!(standings[0].win_percentage, 50.0);
    }

    #[test]
    fn test_self_play_draw_counts_both_sides() {
        let games = vec![game("g1", "A", "A", at(2024, 5, 1), GameResult::Draw)];

        let standings = compute_standings(&roster(), &games);
        assert_eq!(standings.len(), 1);
        assert_eq!(standings[0].draws, 2);
        assert_eq!(standings[0].points, 1.0);
        assert_eq!(standings[0].win_percentage, 0.0);
    }

    #[test]
    fn test_standings_ties_keep_roster_order() {
        let games = vec![
            game("g1", "C", "A", at(2024, 5, 1), GameResult::Draw),
            game("g2", "B", "A", at(2024, 5, 2), GameResult::Draw),
        ];

        let standings = compute_standings(&roster(), &games);
        let players: Vec<&str> = standings.iter().map(|s| s.player.as_str()).collect();
        assert_eq!(players, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_choose_next_month_majority() {
        let may = MonthKey::new(2024, 5);
        let feb = MonthKey::new(2024, 2);
        let proposals = vec![may, feb, feb, None, feb];

        assert_eq!(choose_next_month(&proposals), feb);
    }

    #[test]
    fn test_choose_next_month_without_majority_takes_latest() {
        let proposals = vec![
            MonthKey::new(2024, 1),
            MonthKey::new(2023, 11),
            None,
            None,
        ];

        assert_eq!(choose_next_month(&proposals), MonthKey::new(2024, 1));
    }

    #[test]
    fn test_choose_next_month_exact_half_is_not_majority() {
        let proposals = vec![
            MonthKey::new(2023, 1),
            MonthKey::new(2023, 1),
            MonthKey::new(2024, 3),
            None,
        ];

        assert_eq!(choose_next_month(&proposals), MonthKey::new(2024, 3));
    }

    #[test]
    fn test_choose_next_month_no_history() {
        assert_eq!(choose_next_month(&[None, None]), None);
        assert_eq!(choose_next_month(&[]), None);
    }

    #[test]
    fn test_calculate_win_percentage() {
        assert_eq!(calculate_win_percentage(0, 0, 0), 0.0);
        assert_eq!(calculate_win_percentage(1, 2, 0), 33.33);
        assert_eq!(calculate_win_percentage(2, 1, 0), 66.67);
        assert_eq!(calculate_win_percentage(3, 0, 0), 100.0);
        assert_eq!(calculate_win_percentage(1, 6, 0), 14.29);
    }
}
