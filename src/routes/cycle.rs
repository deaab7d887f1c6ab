use axum::{Router, routing::{get, post}, Json, extract::{State, Query}};
use serde::Serialize;
use crate::models::{PredictedCycle, Tier};
use crate::error::InsightError;
use crate::service::RecomputeOutcome;
use crate::store::InsightStore;
use super::{AppState, UserQuery};

#[derive(Serialize)]
pub struct PredictionView {
    #[serde(flatten)]
    pub prediction: PredictedCycle,
    pub tier: Tier,
    pub confidence_label: &'static str,
}

impl From<PredictedCycle> for PredictionView {
    fn from(prediction: PredictedCycle) -> Self {
        PredictionView {
            tier: prediction.tier(),
            confidence_label: prediction.confidence_label(),
            prediction,
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/predictions", get(get_predictions))
        .route("/predictions/generate", post(generate_predictions))
        .route("/next-period", get(get_next_period))
        .with_state(state)
}

async fn generate_predictions(
    State(service): State<AppState>,
    Json(body): Json<UserQuery>,
) -> Result<Json<RecomputeOutcome>, InsightError> {
    let today = chrono::Utc::now().naive_utc().date();
    let outcome = service.recompute(body.user_id, today).await?;

    if matches!(outcome, RecomputeOutcome::Forecast { .. }) {
        service.schedule_advice(body.user_id);
    }

    Ok(Json(outcome))
}

async fn get_predictions(
    State(service): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<PredictionView>>, InsightError> {
    let rows = service.store().fetch_predictions(params.user_id).await?;
    Ok(Json(rows.into_iter().map(PredictionView::from).collect()))
}

/// Days until the next predicted start, `null` before any forecast exists.
async fn get_next_period(
    State(service): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Option<i64>>, InsightError> {
    let rows = service.store().fetch_predictions(params.user_id).await?;
    let today = chrono::Utc::now().naive_utc().date();

    Ok(Json(rows.first().map(|next| {
        (next.predicted_start - today).num_days().max(0)
    })))
}
