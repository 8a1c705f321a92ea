use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{CurrentGames, MonthBucket, MonthKey, MonthPage};

#[derive(Debug, Deserialize)]
pub struct MonthParams {
    pub year: Option<String>,
    pub month: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FinishedGamesResponse {
    pub months: Vec<MonthBucket>,
}

#[derive(Debug, Serialize)]
pub struct MonthGamesResponse {
    /// Requested month (if it had games) followed by empty months down to
    /// the next month with history
    pub months: Vec<MonthBucket>,
    /// Neither the requested month nor anything earlier has games
    pub no_games_found: bool,
    /// 0 when there is nothing earlier to load
    pub next_year: i32,
    /// 0 when there is nothing earlier to load
    pub next_month: u32,
}

pub async fn current_games(State(state): State<AppState>) -> Json<CurrentGames> {
    Json(state.aggregator.unfinished_games(&state.roster).await)
}

pub async fn finished_games(State(state): State<AppState>) -> Json<FinishedGamesResponse> {
    let months = state.aggregator.finished_games(&state.roster).await;
    Json(FinishedGamesResponse { months })
}

pub async fn month_games(
    State(state): State<AppState>,
    Query(params): Query<MonthParams>,
) -> Result<Json<MonthGamesResponse>, ApiError> {
    let month = parse_month_params(&params)?;
    let page = state
        .aggregator
        .finished_games_for_month(&state.roster, month)
        .await;
    Ok(Json(month_listing(page)))
}

fn parse_month_params(params: &MonthParams) -> Result<MonthKey, ApiError> {
    let year: i32 = params
        .year
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid year query param".to_string()))?;
    let month: u32 = params
        .month
        .as_deref()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| ApiError::BadRequest("Invalid month query param".to_string()))?;

    let key = MonthKey::new(year, month)
        .ok_or_else(|| ApiError::BadRequest(format!("Month must be 1-12, got {}", month)))?;

    if !key.is_requestable() {
        return Err(ApiError::BadRequest(format!(
            "Year {} is too far in the future",
            year
        )));
    }
    Ok(key)
}

/// Lay out one page of the month-by-month listing.
///
/// Months between the requested one and the next month with history get an
/// empty entry so the listing has no gaps. Filler never starts later than the
/// current month.
pub fn month_listing(page: MonthPage) -> MonthGamesResponse {
    let MonthPage {
        requested,
        bucket,
        next,
    } = page;

    let no_games_found = bucket.is_none() && next.is_none();
    let mut months = Vec::new();
    let found = bucket.is_some();
    if let Some(bucket) = bucket {
        months.push(bucket);
    }

    if let Some(next) = next {
        if !found {
            months.push(MonthBucket::new(requested));
        }

        let mut gap = requested.previous().min(MonthKey::current());
        while gap > next {
            months.push(MonthBucket::new(gap));
            gap = gap.previous();
        }
    }

    let (next_year, next_month) = next.map(|m| (m.year, m.month)).unwrap_or((0, 0));

    MonthGamesResponse {
        months,
        no_games_found,
        next_year,
        next_month,
    }
}
