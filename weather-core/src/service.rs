use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    chart::{self, Chart},
    codes::WeatherCodeTable,
    config::Config,
    error::Result,
    forecast::{self, Advisory, AdvisoryThresholds, NightInterval},
    location::{Location, LocationBook},
    model::{CurrentConditions, ForecastPoint, ForecastRequest, ForecastResponse, Horizon},
    provider::{ForecastProvider, OpenMeteoProvider},
};

/// Everything one request produces, ready for a front-end to print or render.
#[derive(Debug, Clone)]
pub struct ForecastReport {
    pub location: Location,
    pub horizon: Horizon,
    pub timezone: Option<String>,
    /// Local time at the location when the report was built.
    pub now: NaiveDateTime,
    pub current: CurrentConditions,
    /// Only the hours inside `(now, now + horizon]`.
    pub points: Vec<ForecastPoint>,
    pub nights: Vec<NightInterval>,
    pub advisory: Option<Advisory>,
}

/// Resolver → fetcher → presenter, wired once at startup and shared
/// read-only between requests.
#[derive(Debug, Clone)]
pub struct WeatherService {
    provider: Arc<dyn ForecastProvider>,
    locations: Arc<LocationBook>,
    codes: Arc<WeatherCodeTable>,
    config: Arc<Config>,
}

impl WeatherService {
    pub fn new(
        provider: Arc<dyn ForecastProvider>,
        locations: LocationBook,
        codes: WeatherCodeTable,
        config: Config,
    ) -> Self {
        Self {
            provider,
            locations: Arc::new(locations),
            codes: Arc::new(codes),
            config: Arc::new(config),
        }
    }

    /// Open-Meteo provider, built-in cities plus configured extras, WMO codes.
    pub fn from_config(config: Config) -> Result<Self> {
        let provider = OpenMeteoProvider::new(&config.api)?;
        let locations = LocationBook::with_extras(&config.locations);
        Ok(Self::new(
            Arc::new(provider),
            locations,
            WeatherCodeTable::wmo(),
            config,
        ))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locations(&self) -> &LocationBook {
        &self.locations
    }

    pub fn codes(&self) -> &WeatherCodeTable {
        &self.codes
    }

    pub fn resolve(&self, city: &str) -> Result<&Location> {
        self.locations.resolve(city)
    }

    /// Validate a user-supplied day count against the configured bound.
    pub fn horizon(&self, days: Option<u8>) -> Result<Horizon> {
        let f = &self.config.forecast;
        Horizon::new(days.unwrap_or(f.default_days), f.max_days)
    }

    pub fn parse_horizon(&self, days: Option<&str>) -> Result<Horizon> {
        let f = &self.config.forecast;
        Horizon::parse(days, f.default_days, f.max_days)
    }

    /// Fetch once and build the report for the location's current local time.
    #[instrument(skip(self, location), fields(location = %location.name, days = horizon.days()))]
    pub async fn forecast(&self, location: &Location, horizon: Horizon) -> Result<ForecastReport> {
        let request = ForecastRequest {
            location: location.clone(),
            horizon,
        };
        let response = self.provider.fetch(&request).await?;

        let now = forecast::local_now(response.utc_offset_seconds);
        let report = build_report(response, request, now, &self.codes, &self.config.advisory)?;

        info!(
            hours = report.points.len(),
            advisory = report.advisory.map(Advisory::message),
            "forecast ready"
        );
        Ok(report)
    }

    pub fn charts(&self, report: &ForecastReport) -> Result<Vec<Chart>> {
        chart::render_all(
            &report.points,
            &report.nights,
            report.horizon,
            &self.config.chart,
        )
    }
}

/// The presenter half of the pipeline, separated from the fetch so it can be
/// driven with a fixed `now`.
pub fn build_report(
    response: ForecastResponse,
    request: ForecastRequest,
    now: NaiveDateTime,
    codes: &WeatherCodeTable,
    thresholds: &AdvisoryThresholds,
) -> Result<ForecastReport> {
    let aligned = forecast::align(&response.hourly)?;
    let points = forecast::window(&aligned, now, request.horizon.duration()).to_vec();
    let nights = forecast::night_intervals(&response.daily)?;
    let advisory = forecast::evaluate_advisory(&points, thresholds);

    let cw = response.current_weather;
    let current = CurrentConditions {
        description: codes.describe(cw.weathercode).to_string(),
        time: cw.time,
        temperature: cw.temperature,
        windspeed: cw.windspeed,
        weathercode: cw.weathercode,
    };

    Ok(ForecastReport {
        location: request.location,
        horizon: request.horizon,
        timezone: response.timezone,
        now,
        current,
        points,
        nights,
        advisory,
    })
}
