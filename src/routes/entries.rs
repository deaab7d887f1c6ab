use axum::{
    Router,
    routing::{get, post},
    extract::{State, Query},
    Json,
    http::StatusCode,
};
use serde::Serialize;
use crate::models::CycleEntry;
use crate::error::InsightError;
use crate::service::RecomputeOutcome;
use crate::store::{EntrySource, RECENT_ENTRY_LIMIT};
use super::{AppState, UserQuery};

/// What happened to the forecast after an entry was stored.
#[derive(Serialize, Debug)]
#[serde(untagged)]
pub enum ForecastReport {
    Recomputed(RecomputeOutcome),
    /// The entry is stored but the dates could not be turned into intervals.
    Skipped { status: &'static str, error: String },
}

#[derive(Serialize, Debug)]
pub struct LoggedEntry {
    pub entry: CycleEntry,
    pub forecast: ForecastReport,
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/cycle-entry", post(log_entry))         // upsert + recompute
        .route("/cycle-entries", get(get_entries))
        .with_state(state)
}

async fn log_entry(
    State(service): State<AppState>,
    Json(body): Json<CycleEntry>,
) -> Result<(StatusCode, Json<LoggedEntry>), InsightError> {
    let entry = body.normalized()?;
    service.store().upsert_entry(&entry).await?;

    let today = chrono::Utc::now().naive_utc().date();
    let forecast = match service.recompute(entry.user_id, today).await {
        Ok(outcome) => {
            if matches!(outcome, RecomputeOutcome::Forecast { .. }) {
                service.schedule_advice(entry.user_id);
            }
            ForecastReport::Recomputed(outcome)
        }
        Err(e @ InsightError::InvalidInterval { .. }) => ForecastReport::Skipped {
            status: "invalid_interval",
            error: e.to_string(),
        },
        Err(e) => return Err(e),
    };

    Ok((StatusCode::CREATED, Json(LoggedEntry { entry, forecast })))
}

async fn get_entries(
    State(service): State<AppState>,
    Query(query): Query<UserQuery>,
) -> Result<Json<Vec<CycleEntry>>, InsightError> {
    let entries = service
        .store()
        .fetch_recent_entries(query.user_id, RECENT_ENTRY_LIMIT)
        .await?;

    Ok(Json(entries))
}
