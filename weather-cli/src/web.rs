//! Web front-end: a single form page that renders the forecast with inline
//! chart images.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    Form, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tera::Tera;
use tracing::{error, info, warn};
use weather_core::{ForecastReport, Location, WeatherError, WeatherService};

use crate::view::{self, HourRow};

const TEMPLATE: &str = "weather.html";

pub struct AppState {
    service: WeatherService,
    templates: Tera,
}

impl AppState {
    pub fn new(service: WeatherService) -> Result<Self> {
        let mut templates = Tera::default();
        templates
            .add_raw_template(TEMPLATE, include_str!("../templates/weather.html"))
            .context("Failed to compile page template")?;
        Ok(Self { service, templates })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherForm {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub days: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Serialize)]
struct ChartView {
    title: String,
    data_uri: String,
}

#[derive(Serialize)]
struct ReportView {
    location: String,
    timezone: Option<String>,
    days: u8,
    current: weather_core::CurrentConditions,
    advisory: Option<&'static str>,
    rows: Vec<HourRow>,
    charts: Vec<ChartView>,
}

#[derive(Serialize)]
struct Page<'a> {
    cities: Vec<&'a Location>,
    search: String,
    city: String,
    days: String,
    max_days: u8,
    error: Option<String>,
    report: Option<ReportView>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index).post(submit))
        .route("/health", get(health))
        .with_state(state)
}

pub async fn serve(service: WeatherService, bind: &str) -> Result<()> {
    let state = Arc::new(AppState::new(service)?);
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("Failed to bind {bind}"))?;

    info!(addr = %bind, "serving weather form");
    axum::serve(listener, router(state)).await.context("Server error")?;
    Ok(())
}

async fn health() -> &'static str {
    "OK"
}

async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let page = state.blank_page(params.search.unwrap_or_default(), String::new(), None);
    state.render(StatusCode::OK, &page)
}

async fn submit(State(state): State<Arc<AppState>>, Form(form): Form<WeatherForm>) -> Response {
    let search = form.search.clone().unwrap_or_default();
    let city = form.city.trim().to_string();
    info!(city = %city, days = ?form.days, "forecast requested");

    match state.report_for(&city, form.days.as_deref()).await {
        Ok(report) => {
            let mut page = state.blank_page(search, city, form.days);
            page.report = Some(report);
            state.render(StatusCode::OK, &page)
        }
        Err(err) => {
            warn!(error = %err, "forecast request failed");
            let mut page = state.blank_page(search, city, form.days);
            page.error = Some(err.to_string());
            state.render(status_for(&err), &page)
        }
    }
}

fn status_for(err: &WeatherError) -> StatusCode {
    if err.is_recoverable() {
        return StatusCode::BAD_REQUEST;
    }
    match err {
        WeatherError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl AppState {
    async fn report_for(&self, city: &str, days: Option<&str>) -> Result<ReportView, WeatherError> {
        if city.is_empty() {
            return Err(WeatherError::invalid_input("please enter a city"));
        }

        let location = self.service.resolve(city)?.clone();
        let horizon = self.service.parse_horizon(days)?;
        let report = self.service.forecast(&location, horizon).await?;

        // Rendering is CPU-bound; keep it off the async workers.
        let service = self.service.clone();
        let (report, charts) = tokio::task::spawn_blocking(move || {
            let charts = service.charts(&report);
            (report, charts)
        })
        .await
        .map_err(|e| WeatherError::Chart(format!("chart task failed: {e}")))?;

        Ok(self.report_view(report, charts?))
    }

    fn report_view(&self, report: ForecastReport, charts: Vec<weather_core::Chart>) -> ReportView {
        ReportView {
            rows: view::rows(&report, self.service.codes()),
            location: report.location.name,
            timezone: report.timezone,
            days: report.horizon.days(),
            current: report.current,
            advisory: report.advisory.map(|a| a.message()),
            charts: charts
                .iter()
                .map(|c| ChartView {
                    title: c.title.clone(),
                    data_uri: c.data_uri(),
                })
                .collect(),
        }
    }

    fn blank_page(&self, search: String, city: String, days: Option<String>) -> Page<'_> {
        let cfg = &self.service.config().forecast;
        Page {
            cities: self.service.locations().search(&search),
            search,
            city,
            days: days
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| cfg.default_days.to_string()),
            max_days: cfg.max_days,
            error: None,
            report: None,
        }
    }

    fn render(&self, status: StatusCode, page: &Page<'_>) -> Response {
        let context = match tera::Context::from_serialize(page) {
            Ok(ctx) => ctx,
            Err(e) => return template_failure(e),
        };

        match self.templates.render(TEMPLATE, &context) {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => template_failure(e),
        }
    }
}

fn template_failure(e: tera::Error) -> Response {
    error!(error = ?e, "page rendering failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Could not render page").into_response()
}
