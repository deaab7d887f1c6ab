use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{InsightError, InsightResult};
use crate::models::CycleEntry;

/// Gap statistics over one user's entry dates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalStats {
    pub mean_interval: f64,
    /// Population standard deviation of the gaps.
    pub variability: f64,
    pub anchor_date: NaiveDate,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// Fewer than two entries. A normal state, not a failure.
    InsufficientData,
    Ready(IntervalStats),
}

pub fn analyze(entries: &[CycleEntry]) -> InsightResult<Analysis> {
    analyze_dates(entries.iter().map(|e| e.date).collect())
}

pub fn analyze_dates(mut dates: Vec<NaiveDate>) -> InsightResult<Analysis> {
    if dates.len() < 2 {
        return Ok(Analysis::InsufficientData);
    }

    dates.sort();

    let mut gaps = Vec::with_capacity(dates.len() - 1);
    for pair in dates.windows(2) {
        let gap = (pair[1] - pair[0]).num_days();
        if gap <= 0 {
            return Err(InsightError::InvalidInterval {
                previous: pair[0],
                next: pair[1],
            });
        }
        gaps.push(gap as f64);
    }

    let n = gaps.len() as f64;
    let mean_interval = gaps.iter().sum::<f64>() / n;
    let variability = (gaps
        .iter()
        .map(|g| (g - mean_interval).powi(2))
        .sum::<f64>()
        / n)
        .sqrt();

    Ok(Analysis::Ready(IntervalStats {
        mean_interval,
        variability,
        anchor_date: dates[dates.len() - 1],
        sample_size: dates.len(),
    }))
}
