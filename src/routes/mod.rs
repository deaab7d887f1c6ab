use std::sync::Arc;

use axum::{routing::get, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::service::PredictionStore;

pub mod cycle;
pub mod cycle_stats;
pub mod entries;
pub mod insights;

pub type AppState = Arc<PredictionStore>;

#[derive(Deserialize)]
pub struct UserQuery {
    pub user_id: Uuid,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(entries::routes(state.clone()))
        .merge(cycle::routes(state.clone()))
        .merge(cycle_stats::routes(state.clone()))
        .merge(insights::routes(state))
        .route("/health", get(|| async { "✅ Backend up" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EveryRecompute;
    use crate::service::AdviceJobConfig;
    use crate::store::MemoryStore;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use chrono::{Duration, NaiveDate, Utc};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn test_app() -> Router {
        let service = PredictionStore::new(
            Arc::new(MemoryStore::new()),
            Arc::new(EveryRecompute),
            AdviceJobConfig::default(),
        );
        app(Arc::new(service))
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        send(app, Request::get(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        send(app, req).await
    }

    fn entry_body(user: Uuid, date: NaiveDate, symptoms: &[&str]) -> Value {
        json!({
            "user_id": user,
            "date": date,
            "flow": "medium",
            "mood": "happy",
            "symptoms": symptoms,
        })
    }

    #[tokio::test]
    async fn health() {
        let resp = test_app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn logging_entries_builds_a_forecast() {
        let app = test_app();
        let user = Uuid::new_v4();
        let today = Utc::now().naive_utc().date();

        let (status, body) = post_json(&app, "/cycle-entry", entry_body(user, today - Duration::days(28), &[])).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["forecast"]["status"], "insufficient_data");

        let (status, body) = post_json(&app, "/cycle-entry", entry_body(user, today, &["cramps"])).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["forecast"]["status"], "forecast");
        assert_eq!(body["forecast"]["predictions"].as_array().unwrap().len(), 5);

        let (_, predictions) = get_json(&app, &format!("/predictions?user_id={user}")).await;
        let predictions = predictions.as_array().unwrap();
        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions[0]["index"], 1);
        assert_eq!(predictions[0]["tier"], "accurate");
        assert_eq!(predictions[4]["tier"], "estimate");
        // two entries: 95 - 5 - 0 - 15
        assert_eq!(predictions[0]["confidence"], 75);
        assert_eq!(predictions[0]["confidence_label"], "medium");

        let (_, days) = get_json(&app, &format!("/next-period?user_id={user}")).await;
        assert_eq!(days, json!(28));

        let (_, stats) = get_json(&app, &format!("/cycle-stats?user_id={user}")).await;
        assert_eq!(stats["data_quality"], "building");
        assert_eq!(stats["intervals"]["mean_interval"], 28.0);
    }

    #[tokio::test]
    async fn advice_arrives_after_logging() {
        let app = test_app();
        let user = Uuid::new_v4();
        let today = Utc::now().naive_utc().date();
        post_json(&app, "/cycle-entry", entry_body(user, today - Duration::days(28), &["bloating"])).await;
        post_json(&app, "/cycle-entry", entry_body(user, today, &["bloating"])).await;

        let mut advice = Value::Null;
        for _ in 0..50 {
            advice = get_json(&app, &format!("/advice?user_id={user}")).await.1;
            if !advice.is_null() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(advice["advice"].as_str().unwrap().contains("bloating"));
    }

    #[tokio::test]
    async fn explicit_generate_also_schedules_advice() {
        use crate::store::EntrySource;

        let store = Arc::new(MemoryStore::new());
        let user = Uuid::new_v4();
        let today = Utc::now().naive_utc().date();
        for (date, symptoms) in [(today - Duration::days(28), &["fatigue"]), (today, &["fatigue"])] {
            let body = entry_body(user, date, symptoms);
            let entry: crate::models::CycleEntry = serde_json::from_value(body).unwrap();
            store.upsert_entry(&entry).await.unwrap();
        }
        let service = PredictionStore::new(store, Arc::new(EveryRecompute), AdviceJobConfig::default());
        let app = app(Arc::new(service));

        let (status, body) = post_json(&app, "/predictions/generate", json!({ "user_id": user })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "forecast");

        let mut advice = Value::Null;
        for _ in 0..50 {
            advice = get_json(&app, &format!("/advice?user_id={user}")).await.1;
            if !advice.is_null() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        assert!(advice["advice"].as_str().unwrap().contains("Fatigue"));
    }

    #[tokio::test]
    async fn overdue_user_sees_a_late_alert() {
        let app = test_app();
        let user = Uuid::new_v4();
        let first = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        post_json(&app, "/cycle-entry", entry_body(user, first, &[])).await;
        post_json(&app, "/cycle-entry", entry_body(user, first + Duration::days(28), &[])).await;

        let (status, alerts) = get_json(&app, &format!("/alerts?user_id={user}")).await;
        assert_eq!(status, StatusCode::OK);
        let alerts = alerts.as_array().unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0]["kind"], "late");
        assert_eq!(alerts[0]["resolved"], false);
    }

    #[tokio::test]
    async fn explicit_generate_without_entries() {
        let app = test_app();
        let (status, body) = post_json(&app, "/predictions/generate", json!({ "user_id": Uuid::new_v4() })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "insufficient_data");
    }

    #[tokio::test]
    async fn out_of_range_wellness_is_rejected() {
        let app = test_app();
        let mut body = entry_body(Uuid::new_v4(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[]);
        body["cramp_intensity"] = json!(9);
        let (status, body) = post_json(&app, "/cycle-entry", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("cramp_intensity"));
    }

    #[tokio::test]
    async fn far_future_dates_are_rejected_without_a_crash() {
        let app = test_app();
        let user = Uuid::new_v4();
        let mut body = entry_body(user, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(), &[]);
        body["date"] = json!("+200000-01-01");
        let (status, body) = post_json(&app, "/cycle-entry", body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("date"));

        // service still answers afterwards
        let (status, _) = get_json(&app, &format!("/cycle-entries?user_id={user}")).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_reads() {
        let app = test_app();
        let user = Uuid::new_v4();
        assert_eq!(get_json(&app, &format!("/advice?user_id={user}")).await.1, Value::Null);
        assert_eq!(get_json(&app, &format!("/next-period?user_id={user}")).await.1, Value::Null);
        assert_eq!(get_json(&app, &format!("/alerts?user_id={user}")).await.1, json!([]));

        let (status, quote) = get_json(&app, "/motivational-quote").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["author"], "Unknown");
    }
}
