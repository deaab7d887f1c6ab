use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EntrySource, InsightStore};
use crate::error::InsightResult;
use crate::models::{Advice, Alert, AlertKind, CycleEntry, PredictedCycle};

#[derive(Default)]
struct UserData {
    entries: BTreeMap<NaiveDate, CycleEntry>,
    predictions: Vec<PredictedCycle>,
    alerts: Vec<Alert>,
    advice: Option<Advice>,
}

/// Process-local store. Every replace-set runs under one write lock, so
/// readers see either the old set or the new one.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, UserData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn unresolved(&self, user_id: Uuid, kind: Option<AlertKind>, limit: i64) -> Vec<Alert> {
        let users = self.users.read().await;
        users
            .get(&user_id)
            .map(|u| {
                u.alerts
                    .iter()
                    .rev()
                    .filter(|a| !a.resolved && kind.map_or(true, |k| a.kind == k))
                    .take(limit.max(0) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl EntrySource for MemoryStore {
    async fn fetch_recent_entries(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<CycleEntry>> {
        let users = self.users.read().await;
        Ok(users
            .get(&user_id)
            .map(|u| {
                u.entries
                    .values()
                    .rev()
                    .take(limit.max(0) as usize)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn upsert_entry(&self, entry: &CycleEntry) -> InsightResult<()> {
        let mut users = self.users.write().await;
        users
            .entry(entry.user_id)
            .or_default()
            .entries
            .insert(entry.date, entry.clone());
        Ok(())
    }
}

#[async_trait]
impl InsightStore for MemoryStore {
    async fn replace_predictions(&self, user_id: Uuid, rows: &[PredictedCycle]) -> InsightResult<()> {
        let mut users = self.users.write().await;
        users.entry(user_id).or_default().predictions = rows.to_vec();
        Ok(())
    }

    async fn insert_alert(&self, alert: &Alert) -> InsightResult<()> {
        let mut users = self.users.write().await;
        users.entry(alert.user_id).or_default().alerts.push(alert.clone());
        Ok(())
    }

    async fn replace_advice(&self, advice: &Advice) -> InsightResult<()> {
        let mut users = self.users.write().await;
        users.entry(advice.user_id).or_default().advice = Some(advice.clone());
        Ok(())
    }

    async fn fetch_predictions(&self, user_id: Uuid) -> InsightResult<Vec<PredictedCycle>> {
        let users = self.users.read().await;
        let mut rows = users.get(&user_id).map(|u| u.predictions.clone()).unwrap_or_default();
        rows.sort_by_key(|p| p.index);
        Ok(rows)
    }

    async fn fetch_unresolved_alerts(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<Alert>> {
        Ok(self.unresolved(user_id, None, limit).await)
    }

    async fn fetch_unresolved_alerts_of_kind(
        &self,
        user_id: Uuid,
        kind: AlertKind,
        limit: i64,
    ) -> InsightResult<Vec<Alert>> {
        Ok(self.unresolved(user_id, Some(kind), limit).await)
    }

    async fn fetch_latest_advice(&self, user_id: Uuid) -> InsightResult<Option<Advice>> {
        let users = self.users.read().await;
        Ok(users.get(&user_id).and_then(|u| u.advice.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertKind, Flow, Mood, Wellness};
    use chrono::Utc;

    fn entry(user_id: Uuid, day: u32, flow: Flow) -> CycleEntry {
        CycleEntry {
            user_id,
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
            flow,
            mood: Mood::Happy,
            symptoms: vec![],
            notes: None,
            wellness: Wellness::default(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites_same_date_and_fetch_is_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        store.upsert_entry(&entry(user, 1, Flow::Light)).await.unwrap();
        store.upsert_entry(&entry(user, 9, Flow::Light)).await.unwrap();
        store.upsert_entry(&entry(user, 1, Flow::Heavy)).await.unwrap();

        let rows = store.fetch_recent_entries(user, 90).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].date.format("%d").to_string(), "09");
        assert_eq!(rows[1].flow, Flow::Heavy);

        let limited = store.fetch_recent_entries(user, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn users_are_partitioned() {
        let store = MemoryStore::new();
        let a = Uuid::new_v4();
        store.upsert_entry(&entry(a, 1, Flow::Light)).await.unwrap();
        assert!(store.fetch_recent_entries(Uuid::new_v4(), 90).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unresolved_alerts_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for (i, resolved) in [false, true, false].into_iter().enumerate() {
            store
                .insert_alert(&Alert {
                    id: Uuid::new_v4(),
                    user_id: user,
                    kind: AlertKind::Late,
                    message: format!("alert {i}"),
                    resolved,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let open = store.fetch_unresolved_alerts(user, 5).await.unwrap();
        let messages: Vec<_> = open.iter().map(|a| a.message.as_str()).collect();
        assert_eq!(messages, vec!["alert 2", "alert 0"]);
    }

    #[tokio::test]
    async fn unresolved_alerts_filtered_by_kind() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for (i, kind) in [AlertKind::Late, AlertKind::Reminder, AlertKind::Late].into_iter().enumerate() {
            store
                .insert_alert(&Alert {
                    id: Uuid::new_v4(),
                    user_id: user,
                    kind,
                    message: format!("alert {i}"),
                    resolved: false,
                    created_at: Utc::now(),
                })
                .await
                .unwrap();
        }
        let late = store.fetch_unresolved_alerts_of_kind(user, AlertKind::Late, 1).await.unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].message, "alert 2");

        let reminders = store.fetch_unresolved_alerts_of_kind(user, AlertKind::Reminder, 5).await.unwrap();
        assert_eq!(reminders.len(), 1);
        assert!(store.fetch_unresolved_alerts_of_kind(user, AlertKind::Prediction, 5).await.unwrap().is_empty());
    }
}
