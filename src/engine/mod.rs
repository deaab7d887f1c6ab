//! Pure forecasting and insight computations. Nothing in here touches
//! storage or reads the clock; "today" is always passed in.

pub mod advice;
pub mod forecast;
pub mod intervals;
pub mod lateness;
pub mod quotes;

pub use advice::compose_advice;
pub use forecast::forecast;
pub use intervals::{analyze, Analysis, IntervalStats};
pub use lateness::{detect_lateness, AlertPolicy, EveryRecompute, SingleOpen};
