use serde::{ Serialize, Deserialize };
use uuid::Uuid;
use chrono::{Datelike, NaiveDate, DateTime, Utc};
use std::str::FromStr;

use crate::error::InsightError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    Light,
    Medium,
    Heavy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    Neutral,
    Sad,
}

/// Shared scale for energy and stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text,)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = InsightError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(InsightError::CorruptRow(format!(
                        "unknown {} value '{}'",
                        stringify!($ty),
                        other
                    ))),
                }
            }
        }
    };
}

text_enum!(Flow { Light => "light", Medium => "medium", Heavy => "heavy" });
text_enum!(Mood { Happy => "happy", Neutral => "neutral", Sad => "sad" });
text_enum!(Level { Low => "low", Medium => "medium", High => "high" });
text_enum!(AlertKind { Late => "late", Prediction => "prediction", Reminder => "reminder" });

/// Optional wellness details attached to an entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Wellness {
    pub cramp_intensity: Option<i16>, // 0-5
    pub energy_level: Option<Level>,
    pub cravings: Vec<String>,
    pub hunger_level: Option<i16>, // 1-5
    pub sleep_quality: Option<i16>, // 1-5
    pub stress_level: Option<Level>,
    pub emotional_state: Vec<String>,
}

/// One observation per user per calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleEntry {
    pub user_id: Uuid,
    pub date: NaiveDate,
    pub flow: Flow,
    pub mood: Mood,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub wellness: Wellness,
}

/// Calendar years an entry date may fall in. Forecasts run a few hundred
/// days past the newest entry, so this keeps every window representable.
const ENTRY_YEARS: std::ops::RangeInclusive<i32> = 1900..=9999;

impl CycleEntry {
    /// Checks the date, the bounded scales and collapses repeated tags,
    /// keeping the first occurrence of each.
    pub fn normalized(mut self) -> Result<Self, InsightError> {
        if !ENTRY_YEARS.contains(&self.date.year()) {
            return Err(InsightError::InvalidEntry(format!(
                "date must fall between years {} and {}, got {}",
                ENTRY_YEARS.start(),
                ENTRY_YEARS.end(),
                self.date
            )));
        }
        check_scale("cramp_intensity", self.wellness.cramp_intensity, 0, 5)?;
        check_scale("hunger_level", self.wellness.hunger_level, 1, 5)?;
        check_scale("sleep_quality", self.wellness.sleep_quality, 1, 5)?;

        dedup_tags(&mut self.symptoms);
        dedup_tags(&mut self.wellness.cravings);
        dedup_tags(&mut self.wellness.emotional_state);
        Ok(self)
    }
}

fn check_scale(field: &str, value: Option<i16>, min: i16, max: i16) -> Result<(), InsightError> {
    match value {
        Some(v) if !(min..=max).contains(&v) => Err(InsightError::InvalidEntry(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, v
        ))),
        _ => Ok(()),
    }
}

fn dedup_tags(tags: &mut Vec<String>) {
    let mut seen = std::collections::HashSet::new();
    tags.retain(|t| seen.insert(t.clone()));
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Accurate,
    Estimate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedCycle {
    pub user_id: Uuid,
    pub index: i16,
    pub predicted_start: NaiveDate,
    pub predicted_end: NaiveDate,
    pub confidence: i32,
    pub generated_at: DateTime<Utc>,
}

impl PredictedCycle {
    pub fn tier(&self) -> Tier {
        if self.index <= 3 {
            Tier::Accurate
        } else {
            Tier::Estimate
        }
    }

    pub fn confidence_label(&self) -> &'static str {
        match self.confidence {
            c if c >= 80 => "high",
            c if c >= 60 => "medium",
            _ => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Late,
    Prediction,
    Reminder,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: AlertKind,
    pub message: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advice {
    pub user_id: Uuid,
    pub advice: String,
    pub generated_at: DateTime<Utc>,
}
