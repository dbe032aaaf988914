//! Turning the raw hourly arrays into something worth showing.
//!
//! Everything here is a pure function of its inputs: alignment of the
//! parallel arrays, the `(now, now + horizon]` window, advisory rules and the
//! night intervals used for chart shading.

use chrono::{Duration, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::{Result, WeatherError},
    model::{DailySeries, ForecastPoint, HourlySeries, parse_local_time},
};

/// Zip the hourly arrays into per-hour records.
///
/// All arrays must have the length of `time`, and timestamps must be strictly
/// increasing; anything else is a schema error.
pub fn align(hourly: &HourlySeries) -> Result<Vec<ForecastPoint>> {
    let n = hourly.time.len();

    check_len("temperature_2m", hourly.temperature_2m.len(), n)?;
    check_len("cloudcover", hourly.cloudcover.len(), n)?;
    check_len("rain", hourly.rain.len(), n)?;
    check_len(
        "precipitation_probability",
        hourly.precipitation_probability.len(),
        n,
    )?;
    check_len("windspeed_10m", hourly.windspeed_10m.len(), n)?;
    check_len("windgusts_10m", hourly.windgusts_10m.len(), n)?;
    if let Some(v) = &hourly.weathercode {
        check_len("weathercode", v.len(), n)?;
    }
    if let Some(v) = &hourly.pressure_msl {
        check_len("pressure_msl", v.len(), n)?;
    }
    if let Some(v) = &hourly.uv_index {
        check_len("uv_index", v.len(), n)?;
    }

    let mut points = Vec::with_capacity(n);
    let mut previous: Option<NaiveDateTime> = None;

    for (i, raw) in hourly.time.iter().enumerate() {
        let timestamp = parse_local_time(raw)?;
        if previous.is_some_and(|p| p >= timestamp) {
            return Err(WeatherError::schema(format!(
                "hourly.time is not increasing at index {i} ({raw})"
            )));
        }
        previous = Some(timestamp);

        points.push(ForecastPoint {
            timestamp,
            temperature: hourly.temperature_2m[i],
            cloud_cover: hourly.cloudcover[i],
            rain_mm: hourly.rain[i],
            rain_probability: hourly.precipitation_probability[i],
            wind_speed: hourly.windspeed_10m[i],
            wind_gust: hourly.windgusts_10m[i],
            pressure: hourly.pressure_msl.as_ref().and_then(|v| v[i]),
            uv_index: hourly.uv_index.as_ref().and_then(|v| v[i]),
            weather_code: hourly.weathercode.as_ref().and_then(|v| v[i]),
        });
    }

    Ok(points)
}

fn check_len(field: &str, len: usize, expected: usize) -> Result<()> {
    if len != expected {
        return Err(WeatherError::schema(format!(
            "hourly.{field} has {len} values but hourly.time has {expected}"
        )));
    }
    Ok(())
}

/// Points with `now < timestamp <= now + horizon`.
///
/// Relies on `points` being sorted by timestamp, which [`align`] guarantees.
pub fn window(points: &[ForecastPoint], now: NaiveDateTime, horizon: Duration) -> &[ForecastPoint] {
    let end = now + horizon;
    let first = points.partition_point(|p| p.timestamp <= now);
    let last = points.partition_point(|p| p.timestamp <= end);

    debug!(
        total = points.len(),
        selected = last.saturating_sub(first),
        "windowed forecast"
    );
    &points[first..last.max(first)]
}

/// Wall-clock time at a location, given its UTC offset.
pub fn local_now(utc_offset_seconds: i32) -> NaiveDateTime {
    (Utc::now() + Duration::seconds(i64::from(utc_offset_seconds))).naive_utc()
}

/// Thresholds for the advisory rules. Units follow the request: °C, mm,
/// km/h, percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryThresholds {
    pub rain_probability_pct: f64,
    pub rain_mm: f64,
    pub wind_gust_kmh: f64,
    pub heat_c: f64,
    pub freeze_c: f64,
    /// How many hours from the start of the window the rules look at.
    pub lookahead_hours: usize,
}

impl Default for AdvisoryThresholds {
    fn default() -> Self {
        Self {
            rain_probability_pct: 50.0,
            rain_mm: 0.2,
            wind_gust_kmh: 40.0,
            heat_c: 30.0,
            freeze_c: 0.0,
            lookahead_hours: 24,
        }
    }
}

/// Rules in priority order: the first one that matches anywhere in the
/// look-ahead wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Advisory {
    Rain,
    Wind,
    Heat,
    Freeze,
}

impl Advisory {
    pub const PRIORITY: [Advisory; 4] =
        [Advisory::Rain, Advisory::Wind, Advisory::Heat, Advisory::Freeze];

    pub fn message(self) -> &'static str {
        match self {
            Advisory::Rain => "Rain expected, bring an umbrella",
            Advisory::Wind => "Strong winds, stay safe",
            Advisory::Heat => "High heat, stay hydrated",
            Advisory::Freeze => "Freezing, dress warmly",
        }
    }

    fn matches(self, p: &ForecastPoint, t: &AdvisoryThresholds) -> bool {
        match self {
            Advisory::Rain => p.rain_probability > t.rain_probability_pct && p.rain_mm > t.rain_mm,
            Advisory::Wind => p.wind_gust > t.wind_gust_kmh,
            Advisory::Heat => p.temperature > t.heat_c,
            Advisory::Freeze => p.temperature < t.freeze_c,
        }
    }
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

pub fn evaluate_advisory(
    window: &[ForecastPoint],
    thresholds: &AdvisoryThresholds,
) -> Option<Advisory> {
    let lookahead = &window[..window.len().min(thresholds.lookahead_hours)];

    Advisory::PRIORITY
        .into_iter()
        .find(|rule| lookahead.iter().any(|p| rule.matches(p, thresholds)))
}

/// A half-open `[start, end)` stretch of darkness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NightInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// For each day, `[midnight, sunrise)` and `[sunset, next midnight)`.
///
/// Days without a sunrise or sunset (polar day/night) can report identical
/// times; empty intervals are dropped.
pub fn night_intervals(daily: &DailySeries) -> Result<Vec<NightInterval>> {
    if daily.sunrise.len() != daily.sunset.len() {
        return Err(WeatherError::schema(format!(
            "daily.sunrise has {} values but daily.sunset has {}",
            daily.sunrise.len(),
            daily.sunset.len()
        )));
    }

    let mut nights = Vec::with_capacity(daily.sunrise.len() * 2);
    for (rise, set) in daily.sunrise.iter().zip(&daily.sunset) {
        let sunrise = parse_local_time(rise)?;
        let sunset = parse_local_time(set)?;
        let midnight = sunrise.date().and_time(NaiveTime::MIN);
        let next_midnight = midnight + Duration::days(1);

        for night in [
            NightInterval {
                start: midnight,
                end: sunrise,
            },
            NightInterval {
                start: sunset,
                end: next_midnight,
            },
        ] {
            if night.start < night.end {
                nights.push(night);
            }
        }
    }

    Ok(nights)
}

/// Hours between hour-axis ticks for a horizon of `days`.
pub fn hour_tick_interval(days: u8) -> u32 {
    match days {
        0..=2 => 1,
        3..=5 => 2,
        _ => 4,
    }
}
