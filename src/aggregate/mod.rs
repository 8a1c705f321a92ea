//! Concurrent fetch-then-aggregate pipeline.
//!
//! Each request fans out one task per club member (and, for archived games,
//! one more per monthly archive), joins them all, then runs the calculation
//! engine single-threaded over the joined games. A failed fetch is logged and
//! its games are simply missing from the result; nothing here returns an
//! error.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::calculate::{choose_next_month, dedup_and_filter, group_by_month};
use crate::fetch::{Archive, GameSource};
use crate::models::{CurrentGames, GameRecord, MonthBucket, MonthKey, MonthPage, Roster};

/// Builds club views from a game source.
#[derive(Clone)]
pub struct Aggregator {
    source: Arc<dyn GameSource>,
}

/// What one player contributed to a single-month page.
struct PlayerMonth {
    games: Vec<GameRecord>,
    /// Nearest archive month before the requested one
    next: Option<MonthKey>,
}

impl Aggregator {
    pub fn new(source: Arc<dyn GameSource>) -> Self {
        Self { source }
    }

    /// Games currently in progress between club members.
    pub async fn unfinished_games(&self, roster: &Roster) -> CurrentGames {
        let mut tasks = JoinSet::new();
        for (idx, player) in roster.players().iter().enumerate() {
            let source = Arc::clone(&self.source);
            let player = player.clone();
            tasks.spawn(async move {
                let games = match source.current_games(&player).await {
                    Ok(games) => games,
                    Err(e) => {
                        warn!(
                            player = %player,
                            source = source.name(),
                            "Could not fetch current games: {}",
                            e
                        );
                        Vec::new()
                    }
                };
                (idx, games)
            });
        }

        let fetched: Vec<GameRecord> = join_in_order(tasks).await.into_iter().flatten().collect();
        let selected = dedup_and_filter(roster, fetched);
        let grouped = group_by_month(roster, selected);

        debug!(games = grouped.current.games.len(), "Collected current club games");
        grouped.current
    }

    /// Every finished club game, grouped by month, newest month first.
    pub async fn finished_games(&self, roster: &Roster) -> Vec<MonthBucket> {
        let mut tasks = JoinSet::new();
        for (idx, player) in roster.players().iter().enumerate() {
            let source = Arc::clone(&self.source);
            let player = player.clone();
            tasks.spawn(async move { (idx, all_archived_games(source, player).await) });
        }

        let fetched: Vec<GameRecord> = join_in_order(tasks).await.into_iter().flatten().collect();
        let fetched_count = fetched.len();
        let selected = dedup_and_filter(roster, fetched);
        let grouped = group_by_month(roster, selected);

        info!(
            fetched = fetched_count,
            months = grouped.buckets.len(),
            "Aggregated finished club games"
        );
        grouped.buckets
    }

    /// One month of finished club games plus the month to load next.
    pub async fn finished_games_for_month(&self, roster: &Roster, month: MonthKey) -> MonthPage {
        let mut tasks = JoinSet::new();
        for (idx, player) in roster.players().iter().enumerate() {
            let source = Arc::clone(&self.source);
            let player = player.clone();
            tasks.spawn(async move { (idx, archived_month(source, player, month).await) });
        }

        let mut games = Vec::new();
        let mut proposals = Vec::new();
        for player_month in join_in_order(tasks).await.into_iter().flatten() {
            games.extend(player_month.games);
            proposals.push(player_month.next);
        }

        let selected = dedup_and_filter(roster, games);
        let bucket = group_by_month(roster, selected)
            .buckets
            .into_iter()
            .find(|b| b.key == month);
        let next = choose_next_month(&proposals);

        debug!(
            %month,
            found = bucket.is_some(),
            next = ?next,
            "Loaded single month"
        );

        MonthPage {
            requested: month,
            bucket,
            next,
        }
    }
}

/// Await every task and return outputs in spawn order.
///
/// Tasks that panicked are logged and left out.
async fn join_in_order<T: Send + 'static>(mut tasks: JoinSet<(usize, T)>) -> Vec<T> {
    let mut done = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(item) => done.push(item),
            Err(e) => error!("Fetch task failed: {}", e),
        }
    }
    done.sort_by_key(|(idx, _)| *idx);
    done.into_iter().map(|(_, item)| item).collect()
}

/// All games in all of a player's monthly archives.
async fn all_archived_games(source: Arc<dyn GameSource>, player: String) -> Vec<GameRecord> {
    let archives = match source.archives(&player).await {
        Ok(archives) => archives,
        Err(e) => {
            warn!(player = %player, source = source.name(), "Could not list archives: {}", e);
            return Vec::new();
        }
    };

    let mut tasks = JoinSet::new();
    for (idx, archive) in archives.into_iter().enumerate() {
        let source = Arc::clone(&source);
        let player = player.clone();
        tasks.spawn(async move {
            let games = archive_games(source.as_ref(), &player, &archive).await;
            (idx, games)
        });
    }

    join_in_order(tasks).await.into_iter().flatten().collect()
}

/// A player's games for `month` and their nearest earlier archive month.
///
/// `None` when the player's archive list could not be fetched, so the player
/// takes no part in choosing the next month.
async fn archived_month(
    source: Arc<dyn GameSource>,
    player: String,
    month: MonthKey,
) -> Option<PlayerMonth> {
    let archives = match source.archives(&player).await {
        Ok(archives) => archives,
        Err(e) => {
            warn!(player = %player, source = source.name(), "Could not list archives: {}", e);
            return None;
        }
    };

    let next = archives
        .iter()
        .map(|a| a.month)
        .filter(|m| *m < month)
        .max();

    let games = match archives.iter().find(|a| a.month == month) {
        Some(archive) => archive_games(source.as_ref(), &player, archive).await,
        None => Vec::new(),
    };

    Some(PlayerMonth { games, next })
}

async fn archive_games(
    source: &dyn GameSource,
    player: &str,
    archive: &Archive,
) -> Vec<GameRecord> {
    match source.archive_games(archive).await {
        Ok(games) => games,
        Err(e) => {
            warn!(
                player,
                url = %archive.url,
                source = source.name(),
                "Could not fetch archived games: {}",
                e
            );
            Vec::new()
        }
    }
}
