use axum::{
    extract::{Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;

use crate::engine::{self, Analysis, IntervalStats};
use crate::error::InsightError;
use crate::store::{EntrySource, RECENT_ENTRY_LIMIT};
use super::{AppState, UserQuery};

#[derive(Serialize, Debug, PartialEq)]
pub struct CycleStatsResponse {
    entry_count: usize,
    data_quality: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    intervals: Option<IntervalStats>,
}

fn data_quality(entry_count: usize) -> &'static str {
    match entry_count {
        0..=2 => "building",
        3..=5 => "good",
        _ => "excellent",
    }
}

pub async fn get_cycle_stats(
    State(service): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<CycleStatsResponse>, InsightError> {
    let entries = service
        .store()
        .fetch_recent_entries(query.user_id, RECENT_ENTRY_LIMIT)
        .await?;

    let intervals = match engine::analyze(&entries)? {
        Analysis::Ready(stats) => Some(stats),
        Analysis::InsufficientData => None,
    };

    Ok(Json(CycleStatsResponse {
        entry_count: entries.len(),
        data_quality: data_quality(entries.len()),
        intervals,
    }))
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cycle-stats", get(get_cycle_stats))
        .with_state(state)
}
