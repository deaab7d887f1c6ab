use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{Alert, AlertKind};

/// Grace period past the mean interval before a period counts as late.
const GRACE_DAYS: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lateness {
    pub days_since_anchor: i64,
    pub days_late: i64,
}

impl Lateness {
    pub fn message(&self) -> String {
        format!(
            "Your period is {} days late. Consider taking a pregnancy test or consulting your healthcare provider.",
            self.days_late
        )
    }

    pub fn into_alert(self, user_id: Uuid, created_at: DateTime<Utc>) -> Alert {
        Alert {
            id: Uuid::new_v4(),
            user_id,
            kind: AlertKind::Late,
            message: self.message(),
            resolved: false,
            created_at,
        }
    }
}

pub fn detect_lateness(anchor_date: NaiveDate, mean_interval: f64, today: NaiveDate) -> Option<Lateness> {
    let days_since_anchor = (today - anchor_date).num_days();
    if (days_since_anchor as f64) > mean_interval + GRACE_DAYS {
        Some(Lateness {
            days_since_anchor,
            days_late: days_since_anchor - mean_interval.floor() as i64,
        })
    } else {
        None
    }
}

/// Decides whether a freshly detected late alert gets stored, given the
/// user's currently unresolved alerts.
pub trait AlertPolicy: Send + Sync {
    /// How many unresolved alerts of the candidate's kind `admit` needs to
    /// see. Zero skips the lookup and `admit` gets an empty slice.
    fn open_alert_lookup(&self) -> i64;

    fn admit(&self, candidate: &Alert, open: &[Alert]) -> bool;
}

/// Store one alert per recompute that detects lateness.
#[derive(Debug, Default, Clone, Copy)]
pub struct EveryRecompute;

impl AlertPolicy for EveryRecompute {
    fn open_alert_lookup(&self) -> i64 {
        0
    }

    fn admit(&self, _candidate: &Alert, _open: &[Alert]) -> bool {
        true
    }
}

/// At most one unresolved alert of each kind.
#[derive(Debug, Default, Clone, Copy)]
pub struct SingleOpen;

impl AlertPolicy for SingleOpen {
    fn open_alert_lookup(&self) -> i64 {
        1
    }

    fn admit(&self, candidate: &Alert, open: &[Alert]) -> bool {
        !open.iter().any(|a| a.kind == candidate.kind && !a.resolved)
    }
}
