use chrono::{Days, NaiveDate};

use super::intervals::IntervalStats;
use crate::error::{InsightError, InsightResult};

/// Number of windows produced by every forecast.
pub const FORECAST_HORIZON: i16 = 5;
/// Assumed bleed length. Not user configurable.
pub const PERIOD_LENGTH_DAYS: u64 = 5;

/// Windows 1..=3 use the near-term formula, the rest the long-range one.
const ACCURATE_TIER_MAX: i16 = 3;
const SMALL_SAMPLE: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    pub index: i16,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub confidence: i32,
}

/// Projects `FORECAST_HORIZON` windows forward from the anchor, index ascending.
///
/// Fails with `InvalidEntry` when a window would land past the last date
/// chrono can represent.
pub fn forecast(stats: &IntervalStats) -> InsightResult<Vec<Forecast>> {
    (1..=FORECAST_HORIZON)
        .map(|index| {
            // mean_interval is positive, so the saturating cast never goes negative
            let offset = (stats.mean_interval * index as f64).round() as u64;
            let start = stats
                .anchor_date
                .checked_add_days(Days::new(offset))
                .ok_or_else(|| out_of_range(stats.anchor_date, index))?;
            let end = start
                .checked_add_days(Days::new(PERIOD_LENGTH_DAYS))
                .ok_or_else(|| out_of_range(stats.anchor_date, index))?;
            Ok(Forecast {
                index,
                start,
                end,
                confidence: confidence(index, stats),
            })
        })
        .collect()
}

fn out_of_range(anchor: NaiveDate, index: i16) -> InsightError {
    InsightError::InvalidEntry(format!(
        "forecast window {index} after {anchor} falls outside the supported date range"
    ))
}

// Only a floor is applied. Tier A tops out at 90 with zero variability and a
// large sample, so no upper clamp is needed.
fn confidence(index: i16, stats: &IntervalStats) -> i32 {
    let i = index as f64;
    let raw = if index <= ACCURATE_TIER_MAX {
        let small_sample_penalty = if stats.sample_size < SMALL_SAMPLE { 15.0 } else { 0.0 };
        f64::max(70.0, 95.0 - 5.0 * i - 2.0 * stats.variability - small_sample_penalty)
    } else {
        f64::max(40.0, 65.0 - 8.0 * i - 3.0 * stats.variability)
    };
    raw.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean: f64, variability: f64, sample_size: usize) -> IntervalStats {
        IntervalStats {
            mean_interval: mean,
            variability,
            anchor_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            sample_size,
        }
    }

    #[test]
    fn produces_five_windows_in_index_order() {
        let rows = forecast(&stats(28.0, 0.0, 6)).unwrap();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
        assert_eq!(rows[0].start, NaiveDate::from_ymd_opt(2024, 1, 29).unwrap());
        assert_eq!(rows[4].start, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap());
    }

    #[test]
    fn every_window_spans_five_days() {
        for r in forecast(&stats(27.3, 3.1, 2)).unwrap() {
            assert_eq!((r.end - r.start).num_days(), 5);
        }
    }

    #[test]
    fn start_offset_rounds_fractional_means() {
        let rows = forecast(&stats(28.5, 0.5, 3)).unwrap();
        let anchor = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!((rows[0].start - anchor).num_days(), 29);
        assert_eq!((rows[1].start - anchor).num_days(), 57);
        assert_eq!((rows[2].start - anchor).num_days(), 86);
    }

    #[test]
    fn regular_cycles_with_large_sample() {
        let c: Vec<i32> = forecast(&stats(28.0, 0.0, 6)).unwrap().iter().map(|r| r.confidence).collect();
        assert_eq!(c, vec![90, 85, 80, 40, 40]);
    }

    #[test]
    fn small_sample_penalty_applies_to_near_term_only() {
        let c: Vec<i32> = forecast(&stats(28.0, 0.0, 4)).unwrap().iter().map(|r| r.confidence).collect();
        assert_eq!(c, vec![75, 70, 70, 40, 40]);
    }

    #[test]
    fn variability_lowers_confidence_down_to_tier_floors() {
        let c: Vec<i32> = forecast(&stats(28.0, 2.4, 8)).unwrap().iter().map(|r| r.confidence).collect();
        // 95-5-4.8 = 85.2, 95-10-4.8 = 80.2, 95-15-4.8 = 75.2
        assert_eq!(c[..3], [85, 80, 75]);

        let c: Vec<i32> = forecast(&stats(28.0, 20.0, 8)).unwrap().iter().map(|r| r.confidence).collect();
        assert_eq!(c, vec![70, 70, 70, 40, 40]);
    }

    #[test]
    fn anchor_near_the_end_of_the_calendar_is_an_error() {
        let s = IntervalStats {
            mean_interval: 28.0,
            variability: 0.0,
            anchor_date: NaiveDate::MAX - chrono::Duration::days(70),
            sample_size: 3,
        };
        match forecast(&s) {
            Err(InsightError::InvalidEntry(msg)) => assert!(msg.contains("window 3")),
            other => panic!("expected out of range error, got {other:?}"),
        }
    }

    #[test]
    fn huge_mean_does_not_panic() {
        let s = IntervalStats {
            mean_interval: 1e300,
            ..stats(28.0, 0.0, 3)
        };
        assert!(forecast(&s).is_err());
    }

    #[test]
    fn identical_input_gives_identical_windows() {
        let s = stats(29.25, 1.7, 5);
        assert_eq!(forecast(&s).unwrap(), forecast(&s).unwrap());
    }
}
