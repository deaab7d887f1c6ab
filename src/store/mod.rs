//! Storage boundary for entries and derived insight rows.
//!
//! Replace-set updates (`replace_predictions`, `replace_advice`) are single
//! named operations so each backend can make them atomic with whatever
//! primitive it has. Postgres swaps predictions in a transaction holding a
//! per-user advisory lock and upserts the single advice row; memory takes
//! one write lock.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::InsightResult;
use crate::models::{Advice, Alert, AlertKind, CycleEntry, PredictedCycle};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Window of entries the analyzer and advice engine look at.
pub const RECENT_ENTRY_LIMIT: i64 = 90;
/// Unresolved alerts returned to readers.
pub const OPEN_ALERT_LIMIT: i64 = 5;

/// Raw entries, owned by the logging side. Read-only to the insight engine.
#[async_trait]
pub trait EntrySource: Send + Sync {
    /// Most recent entries for the user, newest first.
    async fn fetch_recent_entries(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<CycleEntry>>;

    /// Inserts the entry or overwrites the one already stored for that date.
    async fn upsert_entry(&self, entry: &CycleEntry) -> InsightResult<()>;
}

#[async_trait]
pub trait InsightStore: Send + Sync {
    /// Atomically swaps the user's whole prediction set for `rows`.
    async fn replace_predictions(&self, user_id: Uuid, rows: &[PredictedCycle]) -> InsightResult<()>;

    async fn insert_alert(&self, alert: &Alert) -> InsightResult<()>;

    /// Atomically swaps the user's advice for this single row.
    async fn replace_advice(&self, advice: &Advice) -> InsightResult<()>;

    /// Predictions in ascending index order.
    async fn fetch_predictions(&self, user_id: Uuid) -> InsightResult<Vec<PredictedCycle>>;

    /// Unresolved alerts, newest first.
    async fn fetch_unresolved_alerts(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<Alert>>;

    /// Unresolved alerts of one kind, newest first.
    async fn fetch_unresolved_alerts_of_kind(
        &self,
        user_id: Uuid,
        kind: AlertKind,
        limit: i64,
    ) -> InsightResult<Vec<Alert>>;

    async fn fetch_latest_advice(&self, user_id: Uuid) -> InsightResult<Option<Advice>>;
}

pub trait Store: EntrySource + InsightStore {}

impl<T: EntrySource + InsightStore> Store for T {}
