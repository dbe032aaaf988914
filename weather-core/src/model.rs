use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, WeatherError},
    location::Location,
};

/// Number of days ahead to forecast, already checked against the configured
/// upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Horizon(u8);

impl Horizon {
    pub fn new(days: u8, max_days: u8) -> Result<Self> {
        if days == 0 || days > max_days {
            return Err(WeatherError::invalid_input(format!(
                "forecast days must be between 1 and {max_days}, got {days}"
            )));
        }
        Ok(Self(days))
    }

    /// Parse a day count typed by a user (web form, prompt). Empty input
    /// falls back to `default_days`.
    pub fn parse(input: Option<&str>, default_days: u8, max_days: u8) -> Result<Self> {
        match input.map(str::trim).filter(|s| !s.is_empty()) {
            None => Self::new(default_days, max_days),
            Some(raw) => {
                let days: u8 = raw.parse().map_err(|_| {
                    WeatherError::invalid_input(format!("forecast days '{raw}' is not a number"))
                })?;
                Self::new(days, max_days)
            }
        }
    }

    pub fn days(self) -> u8 {
        self.0
    }

    pub fn duration(self) -> Duration {
        Duration::days(i64::from(self.0))
    }
}

#[derive(Debug, Clone)]
pub struct ForecastRequest {
    pub location: Location,
    pub horizon: Horizon,
}

/// Decoded Open-Meteo response body.
///
/// Only the fields this crate reads are declared; unknown keys are ignored.
/// A missing required key fails the whole decode.
#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    #[serde(default)]
    pub timezone: Option<String>,
    /// Offset of the location's local time, which every timestamp below uses.
    #[serde(default)]
    pub utc_offset_seconds: i32,
    pub current_weather: CurrentWeather,
    pub hourly: HourlySeries,
    pub daily: DailySeries,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurrentWeather {
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
    pub time: String,
}

/// Parallel arrays, one value per forecast hour, all indexed like `time`.
#[derive(Debug, Clone, Deserialize)]
pub struct HourlySeries {
    pub time: Vec<String>,
    pub temperature_2m: Vec<f64>,
    pub cloudcover: Vec<f64>,
    pub rain: Vec<f64>,
    pub precipitation_probability: Vec<f64>,
    pub windspeed_10m: Vec<f64>,
    pub windgusts_10m: Vec<f64>,

    // Only present when requested through `api.hourly_extras`.
    #[serde(default)]
    pub weathercode: Option<Vec<Option<i32>>>,
    #[serde(default)]
    pub pressure_msl: Option<Vec<Option<f64>>>,
    #[serde(default)]
    pub uv_index: Option<Vec<Option<f64>>>,
}

/// Hourly variables every chart and advisory depends on.
pub const REQUIRED_HOURLY: &[&str] = &[
    "temperature_2m",
    "cloudcover",
    "rain",
    "precipitation_probability",
    "windspeed_10m",
    "windgusts_10m",
];

#[derive(Debug, Clone, Deserialize)]
pub struct DailySeries {
    #[serde(default)]
    pub time: Vec<String>,
    pub sunrise: Vec<String>,
    pub sunset: Vec<String>,
}

/// One aligned forecast hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastPoint {
    pub timestamp: NaiveDateTime,
    pub temperature: f64,
    pub cloud_cover: f64,
    pub rain_mm: f64,
    pub rain_probability: f64,
    pub wind_speed: f64,
    pub wind_gust: f64,
    pub pressure: Option<f64>,
    pub uv_index: Option<f64>,
    pub weather_code: Option<i32>,
}

/// Current conditions ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentConditions {
    pub time: String,
    pub temperature: f64,
    pub windspeed: f64,
    pub weathercode: i32,
    pub description: String,
}

/// Parse the local timestamps Open-Meteo returns with `timezone=auto`,
/// e.g. `2026-02-05T14:00`.
pub fn parse_local_time(s: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .map_err(|_| WeatherError::schema(format!("invalid timestamp '{s}'")))
}
