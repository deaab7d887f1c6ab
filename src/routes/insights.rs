use axum::{extract::{State, Query}, Json, Router, routing::get};
use crate::engine::quotes::{quote_of_the_day, Quote};
use crate::error::InsightError;
use crate::models::{Advice, Alert};
use crate::store::{InsightStore, OPEN_ALERT_LIMIT};
use super::{AppState, UserQuery};

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/alerts", get(get_alerts))
        .route("/advice", get(get_advice))
        .route("/motivational-quote", get(get_quote))
        .with_state(state)
}

async fn get_alerts(
    State(service): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Vec<Alert>>, InsightError> {
    let alerts = service
        .store()
        .fetch_unresolved_alerts(params.user_id, OPEN_ALERT_LIMIT)
        .await?;
    Ok(Json(alerts))
}

async fn get_advice(
    State(service): State<AppState>,
    Query(params): Query<UserQuery>,
) -> Result<Json<Option<Advice>>, InsightError> {
    Ok(Json(service.store().fetch_latest_advice(params.user_id).await?))
}

async fn get_quote() -> Json<Quote> {
    Json(quote_of_the_day(chrono::Utc::now().naive_utc().date()))
}
