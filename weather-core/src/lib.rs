//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration handling
//! - The city list and coordinate parsing
//! - The Open-Meteo forecast client
//! - Forecast windowing, advisories and chart rendering
//!
//! It is used by `weather-cli` for both the console and the web front-end.

pub mod chart;
pub mod codes;
pub mod config;
pub mod error;
pub mod forecast;
pub mod location;
pub mod model;
pub mod provider;
pub mod service;

pub use chart::{Chart, ChartKind};
pub use codes::WeatherCodeTable;
pub use config::{ChartFormat, Config};
pub use error::WeatherError;
pub use forecast::{Advisory, AdvisoryThresholds, NightInterval};
pub use location::{Location, LocationBook};
pub use model::{CurrentConditions, ForecastPoint, ForecastRequest, ForecastResponse, Horizon};
pub use provider::{ForecastProvider, OpenMeteoProvider};
pub use service::{ForecastReport, WeatherService};
