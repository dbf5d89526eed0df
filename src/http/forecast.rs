//! The forecast endpoint's record generation.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use serde::Serialize;

/// Fixed summary word list; drawn uniformly.
pub const SUMMARIES: [&str; 10] = [
    "Freezing",
    "Bracing",
    "Chilly",
    "Cool",
    "Mild",
    "Warm",
    "Balmy",
    "Hot",
    "Sweltering",
    "Scorching",
];

/// Records per response when the caller does not ask otherwise.
pub const DEFAULT_FORECAST_DAYS: i64 = 5;

/// Upper bound on the `days` query parameter.
pub const MAX_FORECAST_DAYS: i64 = 14;

const TEMP_MIN_C: i32 = -20;
const TEMP_MAX_C: i32 = 54;

/// One forecast record as returned to callers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherForecast {
    /// ISO-8601 calendar date.
    pub date: NaiveDate,
    pub temperature_c: i32,
    pub temperature_f: i32,
    pub summary: &'static str,
}

/// Generate one record per day for `today+1` through `today+days`, in
/// order. Temperature is uniform in [-20, 54]; the summary is uniform over
/// `SUMMARIES`.
pub fn generate(rng: &mut StdRng, today: NaiveDate, days: i64) -> Vec<WeatherForecast> {
    (1..=days)
        .map(|offset| {
            let temperature_c = rng.gen_range(TEMP_MIN_C..=TEMP_MAX_C);
            WeatherForecast {
                date: today + Duration::days(offset),
                temperature_c,
                temperature_f: fahrenheit(temperature_c),
                summary: SUMMARIES[rng.gen_range(0..SUMMARIES.len())],
            }
        })
        .collect()
}

fn fahrenheit(celsius: i32) -> i32 {
    32 + (celsius as f64 / 0.5556) as i32
}
