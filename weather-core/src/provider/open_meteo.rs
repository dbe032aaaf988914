use async_trait::async_trait;
use chrono::{Duration, NaiveDate, Utc};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

use crate::{
    config::ApiConfig,
    error::{Result, WeatherError},
    location::validate_coordinates,
    model::{ForecastRequest, ForecastResponse, REQUIRED_HOURLY},
};

use super::{ForecastProvider, truncate_body};

const USER_AGENT: &str = concat!("weather-cli/", env!("CARGO_PKG_VERSION"));

/// Days served by `/forecast`, today included.
const FORECAST_DAYS_LIMIT: i64 = 16;

/// Client for the keyless Open-Meteo `/forecast` endpoint.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    base_url: String,
    hourly: String,
}

impl OpenMeteoProvider {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| WeatherError::Fetch(format!("could not build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            hourly: hourly_fields(&config.hourly_extras),
        })
    }

    /// Query string for one request.
    ///
    /// The date range is padded by a day on each side of `today` (UTC) so the
    /// local-time window is covered whatever the location's offset. The end is
    /// capped at the last day the API serves.
    fn build_query(
        &self,
        request: &ForecastRequest,
        today: NaiveDate,
    ) -> Vec<(&'static str, String)> {
        let start = today - Duration::days(1);
        let padded_days = i64::from(request.horizon.days()) + 1;
        let end = today + Duration::days(padded_days.min(FORECAST_DAYS_LIMIT - 1));

        vec![
            ("latitude", request.location.latitude.to_string()),
            ("longitude", request.location.longitude.to_string()),
            ("current_weather", "true".to_string()),
            ("hourly", self.hourly.clone()),
            ("daily", "sunrise,sunset".to_string()),
            ("start_date", start.format("%Y-%m-%d").to_string()),
            ("end_date", end.format("%Y-%m-%d").to_string()),
            ("timezone", "auto".to_string()),
        ]
    }
}

/// Required hourly variables followed by the configured extras, without
/// duplicates.
fn hourly_fields(extras: &[String]) -> String {
    let mut fields: Vec<&str> = REQUIRED_HOURLY.to_vec();
    for extra in extras {
        let extra = extra.trim();
        if !extra.is_empty() && !fields.contains(&extra) {
            fields.push(extra);
        }
    }
    fields.join(",")
}

#[async_trait]
impl ForecastProvider for OpenMeteoProvider {
    #[instrument(
        skip(self, request),
        fields(
            location = %request.location.name,
            lat = %request.location.latitude,
            lon = %request.location.longitude,
            days = request.horizon.days(),
        )
    )]
    async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastResponse> {
        validate_coordinates(request.location.latitude, request.location.longitude)?;

        let url = format!("{}/forecast", self.base_url);
        let query = self.build_query(request, Utc::now().date_naive());
        debug!(url = %url, ?query, "requesting forecast");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "forecast request failed");
                WeatherError::Fetch(format!("request to Open-Meteo failed: {e}"))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::Fetch(format!("failed to read Open-Meteo response body: {e}"))
        })?;

        if !status.is_success() {
            warn!(%status, "forecast request rejected");
            return Err(WeatherError::Fetch(format!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: ForecastResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::schema(format!("unexpected Open-Meteo JSON: {e}")))?;

        info!(
            hours = parsed.hourly.time.len(),
            days = parsed.daily.sunrise.len(),
            timezone = parsed.timezone.as_deref().unwrap_or("UTC"),
            "forecast received"
        );

        Ok(parsed)
    }
}
