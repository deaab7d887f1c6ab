use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::{EntrySource, InsightStore};
use crate::error::InsightResult;
use crate::models::{Advice, Alert, AlertKind, CycleEntry, Level, PredictedCycle, Wellness};

/// Seed for the per-user advisory lock taken by prediction replace-sets.
const PREDICTIONS_LOCK: i64 = 1;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS cycle_entries (
        user_id UUID NOT NULL,
        date DATE NOT NULL,
        flow TEXT NOT NULL,
        mood TEXT NOT NULL,
        symptoms TEXT[] NOT NULL DEFAULT '{}',
        notes TEXT,
        cramp_intensity SMALLINT,
        energy_level TEXT,
        cravings TEXT[] NOT NULL DEFAULT '{}',
        hunger_level SMALLINT,
        sleep_quality SMALLINT,
        stress_level TEXT,
        emotional_state TEXT[] NOT NULL DEFAULT '{}',
        PRIMARY KEY (user_id, date)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS predicted_cycles (
        user_id UUID NOT NULL,
        idx SMALLINT NOT NULL,
        predicted_start DATE NOT NULL,
        predicted_end DATE NOT NULL,
        confidence INT NOT NULL,
        generated_at TIMESTAMPTZ NOT NULL,
        PRIMARY KEY (user_id, idx)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS alerts (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL,
        kind TEXT NOT NULL,
        message TEXT NOT NULL,
        resolved BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS alerts_by_user ON alerts (user_id, created_at DESC)",
    r#"
    CREATE TABLE IF NOT EXISTS advice (
        user_id UUID PRIMARY KEY,
        advice TEXT NOT NULL,
        generated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    // advice tables created before user_id was the key
    "CREATE UNIQUE INDEX IF NOT EXISTS advice_user_key ON advice (user_id)",
];

#[derive(sqlx::FromRow)]
struct EntryRow {
    user_id: Uuid,
    date: NaiveDate,
    flow: String,
    mood: String,
    symptoms: Vec<String>,
    notes: Option<String>,
    cramp_intensity: Option<i16>,
    energy_level: Option<String>,
    cravings: Vec<String>,
    hunger_level: Option<i16>,
    sleep_quality: Option<i16>,
    stress_level: Option<String>,
    emotional_state: Vec<String>,
}

impl TryFrom<EntryRow> for CycleEntry {
    type Error = crate::error::InsightError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(CycleEntry {
            user_id: row.user_id,
            date: row.date,
            flow: row.flow.parse()?,
            mood: row.mood.parse()?,
            symptoms: row.symptoms,
            notes: row.notes,
            wellness: Wellness {
                cramp_intensity: row.cramp_intensity,
                energy_level: row.energy_level.as_deref().map(str::parse::<Level>).transpose()?,
                cravings: row.cravings,
                hunger_level: row.hunger_level,
                sleep_quality: row.sleep_quality,
                stress_level: row.stress_level.as_deref().map(str::parse::<Level>).transpose()?,
                emotional_state: row.emotional_state,
            },
        })
    }
}

#[derive(sqlx::FromRow)]
struct PredictionRow {
    user_id: Uuid,
    idx: i16,
    predicted_start: NaiveDate,
    predicted_end: NaiveDate,
    confidence: i32,
    generated_at: DateTime<Utc>,
}

impl From<PredictionRow> for PredictedCycle {
    fn from(row: PredictionRow) -> Self {
        PredictedCycle {
            user_id: row.user_id,
            index: row.idx,
            predicted_start: row.predicted_start,
            predicted_end: row.predicted_end,
            confidence: row.confidence,
            generated_at: row.generated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AlertRow {
    id: Uuid,
    user_id: Uuid,
    kind: String,
    message: String,
    resolved: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = crate::error::InsightError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        Ok(Alert {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind.parse()?,
            message: row.message,
            resolved: row.resolved,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct AdviceRow {
    user_id: Uuid,
    advice: String,
    generated_at: DateTime<Utc>,
}

/// Holds a per-user lock for `set` until the surrounding transaction ends.
async fn lock_user(conn: &mut PgConnection, user_id: Uuid, set: i64) -> InsightResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtextextended($1::text, $2))")
        .bind(user_id)
        .bind(set)
        .execute(conn)
        .await?;
    Ok(())
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the tables if they do not exist yet.
    pub async fn ensure_schema(&self) -> InsightResult<()> {
        for statement in SCHEMA {
            sqlx::query(*statement).execute(&self.pool).await?;
        }
        tracing::info!("🗄️ Schema ready");
        Ok(())
    }
}

#[async_trait]
impl EntrySource for PgStore {
    async fn fetch_recent_entries(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<CycleEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(
            r#"
            SELECT user_id, date, flow, mood, symptoms, notes,
                   cramp_intensity, energy_level, cravings, hunger_level,
                   sleep_quality, stress_level, emotional_state
            FROM cycle_entries
            WHERE user_id = $1
            ORDER BY date DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(CycleEntry::try_from).collect()
    }

    async fn upsert_entry(&self, entry: &CycleEntry) -> InsightResult<()> {
        let w = &entry.wellness;
        sqlx::query(
            r#"
            INSERT INTO cycle_entries (
                user_id, date, flow, mood, symptoms, notes,
                cramp_intensity, energy_level, cravings, hunger_level,
                sleep_quality, stress_level, emotional_state
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id, date) DO UPDATE SET
                flow = EXCLUDED.flow,
                mood = EXCLUDED.mood,
                symptoms = EXCLUDED.symptoms,
                notes = EXCLUDED.notes,
                cramp_intensity = EXCLUDED.cramp_intensity,
                energy_level = EXCLUDED.energy_level,
                cravings = EXCLUDED.cravings,
                hunger_level = EXCLUDED.hunger_level,
                sleep_quality = EXCLUDED.sleep_quality,
                stress_level = EXCLUDED.stress_level,
                emotional_state = EXCLUDED.emotional_state
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.date)
        .bind(entry.flow.as_str())
        .bind(entry.mood.as_str())
        .bind(&entry.symptoms)
        .bind(&entry.notes)
        .bind(w.cramp_intensity)
        .bind(w.energy_level.map(|l| l.as_str()))
        .bind(&w.cravings)
        .bind(w.hunger_level)
        .bind(w.sleep_quality)
        .bind(w.stress_level.map(|l| l.as_str()))
        .bind(&w.emotional_state)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                tracing::error!("❌ Entry upsert failed: {}", db_err.message());
                if let Some(constraint) = db_err.constraint() {
                    tracing::info!("🔒 Constraint violated: {}", constraint);
                }
            }
            e
        })?;

        Ok(())
    }
}

#[async_trait]
impl InsightStore for PgStore {
    async fn replace_predictions(&self, user_id: Uuid, rows: &[PredictedCycle]) -> InsightResult<()> {
        let mut tx = self.pool.begin().await?;
        // concurrent recomputes for one user queue here instead of colliding on the key
        lock_user(&mut tx, user_id, PREDICTIONS_LOCK).await?;

        sqlx::query("DELETE FROM predicted_cycles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO predicted_cycles
                    (user_id, idx, predicted_start, predicted_end, confidence, generated_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(row.user_id)
            .bind(row.index)
            .bind(row.predicted_start)
            .bind(row.predicted_end)
            .bind(row.confidence)
            .bind(row.generated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn insert_alert(&self, alert: &Alert) -> InsightResult<()> {
        sqlx::query(
            "INSERT INTO alerts (id, user_id, kind, message, resolved, created_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(alert.id)
        .bind(alert.user_id)
        .bind(alert.kind.as_str())
        .bind(&alert.message)
        .bind(alert.resolved)
        .bind(alert.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn replace_advice(&self, advice: &Advice) -> InsightResult<()> {
        sqlx::query(
            r#"
            INSERT INTO advice (user_id, advice, generated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET advice = EXCLUDED.advice, generated_at = EXCLUDED.generated_at
            "#,
        )
        .bind(advice.user_id)
        .bind(&advice.advice)
        .bind(advice.generated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn fetch_predictions(&self, user_id: Uuid) -> InsightResult<Vec<PredictedCycle>> {
        let rows = sqlx::query_as::<_, PredictionRow>(
            r#"
            SELECT user_id, idx, predicted_start, predicted_end, confidence, generated_at
            FROM predicted_cycles
            WHERE user_id = $1
            ORDER BY idx ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PredictedCycle::from).collect())
    }

    async fn fetch_unresolved_alerts(&self, user_id: Uuid, limit: i64) -> InsightResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, user_id, kind, message, resolved, created_at
            FROM alerts
            WHERE user_id = $1 AND resolved = FALSE
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn fetch_unresolved_alerts_of_kind(
        &self,
        user_id: Uuid,
        kind: AlertKind,
        limit: i64,
    ) -> InsightResult<Vec<Alert>> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT id, user_id, kind, message, resolved, created_at
            FROM alerts
            WHERE user_id = $1 AND kind = $2 AND resolved = FALSE
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(kind.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn fetch_latest_advice(&self, user_id: Uuid) -> InsightResult<Option<Advice>> {
        let row = sqlx::query_as::<_, AdviceRow>(
            "SELECT user_id, advice, generated_at FROM advice WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Advice {
            user_id: r.user_id,
            advice: r.advice,
            generated_at: r.generated_at,
        }))
    }
}
