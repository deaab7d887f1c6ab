use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub quote: &'static str,
    pub author: &'static str,
}

const QUOTES: [&str; 10] = [
    "You are stronger than you think and more capable than you imagine",
    "Your body is doing something incredible - honor it",
    "Every cycle is a reminder of your body's amazing power",
    "Listen to your body, it's speaking to you",
    "You are not broken, you are cyclical",
    "Your period is not a weakness, it's a superpower",
    "Rest when you need to, you're not lazy - you're wise",
    "Your body knows what it's doing, trust the process",
    "You are exactly where you need to be in your cycle",
    "Embrace your rhythm, it's uniquely yours",
];

/// Rotates through the fixed quotes by day of year.
pub fn quote_of_the_day(today: NaiveDate) -> Quote {
    let idx = today.ordinal() as usize % QUOTES.len();
    Quote {
        quote: QUOTES[idx],
        author: "Unknown",
    }
}
