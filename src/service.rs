//! PredictionStore: the single entry point the logging layer calls after
//! an entry is written. Runs the engine over a fresh snapshot of entries and
//! persists predictions, alerts and advice.

use std::sync::Arc;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::engine::{self, Analysis, AlertPolicy};
use crate::error::{InsightError, InsightResult};
use crate::models::{Advice, Alert, PredictedCycle};
use crate::store::{EntrySource, InsightStore, Store, RECENT_ENTRY_LIMIT};

/// Scheduling and retry settings for the deferred advice job.
#[derive(Debug, Clone)]
pub struct AdviceJobConfig {
    pub delay: Duration,
    pub max_retries: usize,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for AdviceJobConfig {
    fn default() -> Self {
        Self {
            delay: Duration::ZERO,
            max_retries: 3,
            min_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecomputeOutcome {
    /// Fewer than two entries; nothing was written.
    InsufficientData,
    Forecast {
        predictions: Vec<PredictedCycle>,
        /// Late alert stored by this recompute, if any.
        alert: Option<Alert>,
    },
}

pub struct PredictionStore {
    store: Arc<dyn Store>,
    alert_policy: Arc<dyn AlertPolicy>,
    advice_job: AdviceJobConfig,
}

impl PredictionStore {
    pub fn new(store: Arc<dyn Store>, alert_policy: Arc<dyn AlertPolicy>, advice_job: AdviceJobConfig) -> Self {
        Self {
            store,
            alert_policy,
            advice_job,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Regenerates the forecast for `user_id` as of `today`.
    ///
    /// The prediction set is swapped as one unit. A late alert, when one is
    /// detected and admitted by the alert policy, is appended separately and
    /// never replaces earlier alerts.
    pub async fn recompute(&self, user_id: Uuid, today: NaiveDate) -> InsightResult<RecomputeOutcome> {
        let entries = self.store.fetch_recent_entries(user_id, RECENT_ENTRY_LIMIT).await?;

        let stats = match engine::analyze(&entries) {
            Ok(Analysis::Ready(stats)) => stats,
            Ok(Analysis::InsufficientData) => {
                tracing::info!(%user_id, entries = entries.len(), "not enough entries to forecast");
                return Ok(RecomputeOutcome::InsufficientData);
            }
            Err(e) => {
                tracing::warn!(%user_id, "⚠️ skipping forecast: {}", e);
                return Err(e);
            }
        };

        let generated_at = Utc::now();
        let predictions: Vec<PredictedCycle> = engine::forecast(&stats)?
            .into_iter()
            .map(|f| PredictedCycle {
                user_id,
                index: f.index,
                predicted_start: f.start,
                predicted_end: f.end,
                confidence: f.confidence,
                generated_at,
            })
            .collect();

        self.store.replace_predictions(user_id, &predictions).await?;
        tracing::info!(
            %user_id,
            mean_interval = stats.mean_interval,
            variability = stats.variability,
            "🔮 predictions regenerated"
        );

        let alert = match engine::detect_lateness(stats.anchor_date, stats.mean_interval, today) {
            Some(lateness) => {
                let candidate = lateness.into_alert(user_id, generated_at);
                let lookup = self.alert_policy.open_alert_lookup();
                let open = if lookup > 0 {
                    self.store
                        .fetch_unresolved_alerts_of_kind(user_id, candidate.kind, lookup)
                        .await?
                } else {
                    Vec::new()
                };
                if self.alert_policy.admit(&candidate, &open) {
                    self.store.insert_alert(&candidate).await?;
                    tracing::info!(
                        %user_id,
                        days_since_anchor = lateness.days_since_anchor,
                        days_late = lateness.days_late,
                        "⏰ late alert raised"
                    );
                    Some(candidate)
                } else {
                    tracing::debug!(%user_id, "late alert suppressed by policy");
                    None
                }
            }
            None => None,
        };

        Ok(RecomputeOutcome::Forecast { predictions, alert })
    }

    /// Rebuilds the user's advice. Returns `None` and leaves stored advice
    /// untouched when there are fewer than two entries.
    pub async fn recompute_advice(&self, user_id: Uuid) -> InsightResult<Option<Advice>> {
        let entries = self.store.fetch_recent_entries(user_id, RECENT_ENTRY_LIMIT).await?;

        let Some(text) = engine::compose_advice(&entries) else {
            return Ok(None);
        };

        let advice = Advice {
            user_id,
            advice: text,
            generated_at: Utc::now(),
        };
        self.store.replace_advice(&advice).await?;
        Ok(Some(advice))
    }

    /// Runs `recompute_advice` in the background after the configured delay.
    /// Transient failures are retried with exponential backoff; a final
    /// failure is logged and dropped, never surfaced to the prediction path.
    pub fn schedule_advice(self: &Arc<Self>, user_id: Uuid) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let job = &this.advice_job;
            if !job.delay.is_zero() {
                tokio::time::sleep(job.delay).await;
            }

            let run = || {
                let this = Arc::clone(&this);
                async move { this.recompute_advice(user_id).await }
            };

            let result = run
                .retry(
                    ExponentialBuilder::default()
                        .with_max_times(job.max_retries)
                        .with_min_delay(job.min_backoff)
                        .with_max_delay(job.max_backoff),
                )
                .when(InsightError::is_transient)
                .notify(|err, dur| {
                    tracing::warn!(%user_id, "Advice generation failed, retrying in {:?}: {}", dur, err);
                })
                .await;

            match result {
                Ok(Some(_)) => tracing::info!(%user_id, "💡 advice regenerated"),
                Ok(None) => tracing::debug!(%user_id, "not enough entries for advice"),
                Err(e) => tracing::error!(%user_id, "❌ advice generation gave up: {}", e),
            }
        })
    }
}
