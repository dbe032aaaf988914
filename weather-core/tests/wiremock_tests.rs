//! Open-Meteo client and service behaviour against a mock HTTP server.

use std::sync::Arc;

use chrono::{Duration, NaiveTime, Utc};
use weather_core::{
    Config, ForecastProvider, ForecastRequest, Horizon, Location, LocationBook, OpenMeteoProvider,
    WeatherCodeTable, WeatherError, WeatherService, config::ApiConfig,
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

/// Five days of hourly UTC data starting yesterday at midnight.
fn sample_forecast() -> serde_json::Value {
    let yesterday = (Utc::now() - Duration::days(1)).date_naive();
    let start = yesterday.and_time(NaiveTime::MIN);
    let hours = 24 * 5;
    let fmt = |t: chrono::NaiveDateTime| t.format("%Y-%m-%dT%H:%M").to_string();

    let time: Vec<String> = (0..hours)
        .map(|h| fmt(start + Duration::hours(h)))
        .collect();
    let days: Vec<_> = (0..5).map(|d| start + Duration::days(d)).collect();

    serde_json::json!({
        "latitude": 52.52,
        "longitude": 13.419998,
        "generationtime_ms": 0.2,
        "utc_offset_seconds": 0,
        "timezone": "GMT",
        "timezone_abbreviation": "GMT",
        "elevation": 38.0,
        "current_weather": {
            "temperature": 7.4,
            "windspeed": 14.2,
            "winddirection": 250,
            "weathercode": 3,
            "is_day": 1,
            "time": fmt(start + Duration::days(1))
        },
        "hourly_units": { "time": "iso8601", "temperature_2m": "°C" },
        "hourly": {
            "time": time,
            "temperature_2m": vec![7.0; hours as usize],
            "cloudcover": vec![75; hours as usize],
            "rain": vec![0.0; hours as usize],
            "precipitation_probability": vec![5; hours as usize],
            "windspeed_10m": vec![14.0; hours as usize],
            "windgusts_10m": vec![52.0; hours as usize],
            "weathercode": vec![3; hours as usize],
            "pressure_msl": vec![1012.4; hours as usize],
            "uv_index": vec![0.5; hours as usize]
        },
        "daily": {
            "time": days.iter().map(|d| d.format("%Y-%m-%d").to_string()).collect::<Vec<_>>(),
            "sunrise": days.iter().map(|d| fmt(*d + Duration::hours(7))).collect::<Vec<_>>(),
            "sunset": days.iter().map(|d| fmt(*d + Duration::hours(18))).collect::<Vec<_>>()
        }
    })
}

fn api_config(mock_server: &MockServer) -> ApiConfig {
    ApiConfig {
        base_url: mock_server.uri(),
        timeout_secs: 5,
        ..ApiConfig::default()
    }
}

fn berlin(days: u8) -> ForecastRequest {
    ForecastRequest {
        location: Location::new("Berlin", 52.52, 13.41),
        horizon: Horizon::new(days, 16).expect("valid horizon"),
    }
}

async fn setup_forecast_mock(mock_server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(response)
        .mount(mock_server)
        .await;
}

// ============================================================================
// Provider
// ============================================================================

#[tokio::test]
async fn fetch_decodes_a_forecast() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_forecast()),
    )
    .await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let response = provider.fetch(&berlin(2)).await.expect("forecast");

    assert_eq!(response.hourly.time.len(), 120);
    assert_eq!(response.daily.sunrise.len(), 5);
    assert_eq!(response.current_weather.weathercode, 3);
    assert_eq!(response.timezone.as_deref(), Some("GMT"));
}

#[tokio::test]
async fn request_carries_the_expected_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("latitude", "52.52"))
        .and(query_param("longitude", "13.41"))
        .and(query_param("current_weather", "true"))
        .and(query_param("daily", "sunrise,sunset"))
        .and(query_param("timezone", "auto"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let result = provider.fetch(&berlin(3)).await;

    assert!(result.is_ok(), "Expected success, got: {result:?}");
}

#[tokio::test]
async fn server_error_is_a_fetch_error() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(500).set_body_string("Internal Server Error"),
    )
    .await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let result = provider.fetch(&berlin(2)).await;

    match result {
        Err(WeatherError::Fetch(msg)) => {
            assert!(msg.contains("500"));
            assert!(msg.contains("Internal Server Error"));
        }
        other => panic!("Expected Fetch error, got: {other:?}"),
    }
}

#[tokio::test]
async fn bad_request_is_a_fetch_error() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(400)
            .set_body_json(serde_json::json!({"error": true, "reason": "Invalid date"})),
    )
    .await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let result = provider.fetch(&berlin(2)).await;

    assert!(
        matches!(result, Err(WeatherError::Fetch(_))),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn invalid_json_is_a_schema_error() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_string("not valid json"),
    )
    .await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let result = provider.fetch(&berlin(2)).await;

    assert!(
        matches!(result, Err(WeatherError::Schema(_))),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn missing_section_is_a_schema_error() {
    let mock_server = MockServer::start().await;
    let mut body = sample_forecast();
    body.as_object_mut().expect("object").remove("daily");
    let response = ResponseTemplate::new(200).set_body_json(body);
    setup_forecast_mock(&mock_server, response).await;

    let provider = OpenMeteoProvider::new(&api_config(&mock_server)).expect("client");
    let result = provider.fetch(&berlin(2)).await;

    assert!(
        matches!(result, Err(WeatherError::Schema(_))),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn slow_server_times_out() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200)
            .set_body_json(sample_forecast())
            .set_delay(std::time::Duration::from_secs(3)),
    )
    .await;

    let config = ApiConfig {
        timeout_secs: 1,
        ..api_config(&mock_server)
    };
    let provider = OpenMeteoProvider::new(&config).expect("client");
    let result = provider.fetch(&berlin(2)).await;

    assert!(
        matches!(result, Err(WeatherError::Fetch(_))),
        "got: {result:?}"
    );
}

#[tokio::test]
async fn unreachable_server_is_a_fetch_error() {
    let config = ApiConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        timeout_secs: 2,
        ..ApiConfig::default()
    };
    let provider = OpenMeteoProvider::new(&config).expect("client");
    let result = provider.fetch(&berlin(1)).await;

    assert!(
        matches!(result, Err(WeatherError::Fetch(_))),
        "got: {result:?}"
    );
}

// ============================================================================
// Service
// ============================================================================

fn service(mock_server: &MockServer) -> WeatherService {
    let mut config = Config::default();
    config.api = api_config(mock_server);
    config.chart.width = 320;
    config.chart.height = 240;

    let provider = OpenMeteoProvider::new(&config.api).expect("client");
    WeatherService::new(
        Arc::new(provider),
        LocationBook::builtin(),
        WeatherCodeTable::wmo(),
        config,
    )
}

#[tokio::test]
async fn service_builds_windowed_report_with_wind_advisory() {
    let mock_server = MockServer::start().await;
    setup_forecast_mock(
        &mock_server,
        ResponseTemplate::new(200).set_body_json(sample_forecast()),
    )
    .await;

    let svc = service(&mock_server);
    let location = svc.resolve("BERLIN").expect("known city").clone();
    let horizon = svc.horizon(Some(2)).expect("horizon");

    let report = svc.forecast(&location, horizon).await.expect("report");

    assert_eq!(report.points.len(), 48);
    assert!(report.points.iter().all(|p| p.timestamp > report.now));
    let end = report.now + Duration::days(2);
    assert!(report.points.iter().all(|p| p.timestamp <= end));
    assert_eq!(report.advisory, Some(weather_core::Advisory::Wind));
    assert_eq!(report.current.description, "Overcast");
    assert_eq!(report.points[0].pressure, Some(1012.4));

    let charts = svc.charts(&report).expect("charts");
    assert_eq!(charts.len(), 4);
    assert!(charts.iter().all(|c| !c.bytes.is_empty()));
}

#[tokio::test]
async fn every_request_fetches_again() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_forecast()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let svc = service(&mock_server);
    let location = svc.resolve("Berlin").expect("known city").clone();
    let horizon = svc.horizon(None).expect("horizon");

    svc.forecast(&location, horizon).await.expect("first");
    svc.forecast(&location, horizon).await.expect("second");
}
