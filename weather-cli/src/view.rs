//! Display-ready rows shared by the console and web output.

use serde::Serialize;
use weather_core::{ForecastPoint, ForecastReport, WeatherCodeTable};

#[derive(Debug, Clone, Serialize)]
pub struct HourRow {
    pub time: String,
    pub temperature: String,
    pub weather: String,
    pub cloud_cover: String,
    pub rain_mm: String,
    pub rain_probability: String,
    pub wind_speed: String,
    pub wind_gust: String,
    pub pressure: Option<String>,
    pub uv_index: Option<String>,
}

impl HourRow {
    pub fn new(point: &ForecastPoint, codes: &WeatherCodeTable) -> Self {
        Self {
            time: point.timestamp.format("%a %d %b %H:%M").to_string(),
            temperature: format!("{:.1}", point.temperature),
            weather: codes.describe_opt(point.weather_code).to_string(),
            cloud_cover: format!("{:.0}", point.cloud_cover),
            rain_mm: format!("{:.1}", point.rain_mm),
            rain_probability: format!("{:.0}", point.rain_probability),
            wind_speed: format!("{:.1}", point.wind_speed),
            wind_gust: format!("{:.1}", point.wind_gust),
            pressure: point.pressure.map(|p| format!("{p:.0}")),
            uv_index: point.uv_index.map(|u| format!("{u:.1}")),
        }
    }
}

pub fn rows(report: &ForecastReport, codes: &WeatherCodeTable) -> Vec<HourRow> {
    report
        .points
        .iter()
        .map(|p| HourRow::new(p, codes))
        .collect()
}
