//! Forecast charts rendered in memory with `plotters`.
//!
//! Each chart has an hour axis along the bottom, a day axis along the top and
//! night-time shading. Output is PNG or SVG bytes; [`Chart::data_uri`] wraps
//! them for inlining into HTML.

use std::{io::Cursor, ops::Range, sync::OnceLock};

use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use plotters::{
    coord::{
        Shift,
        ranged1d::{KeyPointHint, NoDefaultFormatting, Ranged, ValueFormatter},
    },
    prelude::*,
    style::{FontStyle, register_font},
};
use serde::Serialize;
use tracing::debug;

use crate::{
    config::{ChartConfig, ChartFormat},
    error::{Result, WeatherError},
    forecast::{NightInterval, hour_tick_interval},
    model::{ForecastPoint, Horizon},
};

const FONT_FAMILY: &str = "sans-serif";
static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");
static FONT: OnceLock<std::result::Result<(), String>> = OnceLock::new();

/// Register the bundled font with plotters. Runs once per process.
fn ensure_font() -> Result<()> {
    FONT.get_or_init(|| {
        register_font(FONT_FAMILY, FontStyle::Normal, DEJAVU_SANS).map_err(|_| "invalid font data".to_string())
    })
    .clone()
    .map_err(|e| WeatherError::Chart(format!("could not load chart font: {e}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Temperature,
    Rain,
    CloudCover,
    Wind,
}

impl ChartKind {
    pub fn slug(self) -> &'static str {
        match self {
            ChartKind::Temperature => "temperature",
            ChartKind::Rain => "rain",
            ChartKind::CloudCover => "cloud_cover",
            ChartKind::Wind => "wind",
        }
    }

    fn title(self, days: u8) -> String {
        let what = match self {
            ChartKind::Temperature => "Hourly Temperature",
            ChartKind::Rain => "Hourly Rain & Rain Probability",
            ChartKind::CloudCover => "Hourly Cloud Cover",
            ChartKind::Wind => "Hourly Wind Speed & Gusts",
        };
        let unit = if days == 1 { "Day" } else { "Days" };
        format!("{what} (Next {days} {unit})")
    }
}

/// An encoded chart image.
#[derive(Debug, Clone)]
pub struct Chart {
    pub kind: ChartKind,
    pub title: String,
    pub format: ChartFormat,
    pub bytes: Vec<u8>,
}

impl Chart {
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.kind.slug(), self.format.extension())
    }

    pub fn data_uri(&self) -> String {
        encode_data_uri(self.format, &self.bytes)
    }
}

/// `data:<mime>;base64,<payload>` for embedding in an `<img src>`.
pub fn encode_data_uri(format: ChartFormat, bytes: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        format.mime_type(),
        STANDARD.encode(bytes)
    )
}

/// Render every chart for the windowed points. No points, no charts.
pub fn render_all(
    points: &[ForecastPoint],
    nights: &[NightInterval],
    horizon: Horizon,
    config: &ChartConfig,
) -> Result<Vec<Chart>> {
    let Some(frame) = Frame::new(points, nights, horizon) else {
        return Ok(Vec::new());
    };
    ensure_font()?;

    let mut kinds = vec![ChartKind::Temperature, ChartKind::Rain, ChartKind::CloudCover];
    if config.wind_chart {
        kinds.push(ChartKind::Wind);
    }

    kinds
        .into_iter()
        .map(|kind| render(&frame, kind, horizon, config))
        .collect()
}

fn render(
    frame: &Frame<'_>,
    kind: ChartKind,
    horizon: Horizon,
    config: &ChartConfig,
) -> Result<Chart> {
    let title = kind.title(horizon.days());
    let size = (config.width, config.height);

    let bytes = match config.format {
        ChartFormat::Png => {
            let mut buf = vec![0u8; config.width as usize * config.height as usize * 3];
            {
                let root = BitMapBackend::with_buffer(&mut buf, size).into_drawing_area();
                draw(&root, frame, kind, &title).map_err(chart_err)?;
                root.present().map_err(chart_err)?;
            }
            encode_png(buf, config.width, config.height)?
        }
        ChartFormat::Svg => {
            let mut svg = String::new();
            {
                let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
                draw(&root, frame, kind, &title).map_err(chart_err)?;
                root.present().map_err(chart_err)?;
            }
            svg.into_bytes()
        }
    };

    debug!(chart = kind.slug(), bytes = bytes.len(), "chart rendered");
    Ok(Chart {
        kind,
        title,
        format: config.format,
        bytes,
    })
}

fn encode_png(rgb: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>> {
    let img = image::RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| WeatherError::Chart("bitmap buffer has the wrong size".to_string()))?;

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .map_err(|e| WeatherError::Chart(format!("PNG encoding failed: {e}")))?;
    Ok(out.into_inner())
}

fn chart_err<E: std::error::Error + Send + Sync>(e: DrawingAreaErrorKind<E>) -> WeatherError {
    WeatherError::Chart(e.to_string())
}

fn time_at(origin: NaiveDateTime, x: f64) -> NaiveDateTime {
    origin + Duration::minutes((x * 60.0).round() as i64)
}

/// Linear axis over hours since `origin`, with tick positions fixed up front
/// and labelled as local time using `pattern`.
#[derive(Debug, Clone)]
struct TickAxis {
    range: Range<f64>,
    ticks: Vec<f64>,
    origin: NaiveDateTime,
    pattern: &'static str,
}

impl TickAxis {
    fn label_at(&self, x: f64) -> String {
        time_at(self.origin, x).format(self.pattern).to_string()
    }
}

impl Ranged for TickAxis {
    type FormatOption = NoDefaultFormatting;
    type ValueType = f64;

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        let frac = (value - self.range.start) / (self.range.end - self.range.start);
        limit.0 + (frac * f64::from(limit.1 - limit.0)).round() as i32
    }

    /// Every tick if they fit, otherwise every n-th one.
    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        let max = hint.max_num_points().max(1);
        let stride = self.ticks.len().div_ceil(max).max(1);
        self.ticks.iter().step_by(stride).copied().collect()
    }

    fn range(&self) -> Range<f64> {
        self.range.clone()
    }
}

impl ValueFormatter<f64> for TickAxis {
    fn format(value: &f64) -> String {
        format!("{value:.1}h")
    }

    fn format_ext(&self, value: &f64) -> String {
        self.label_at(*value)
    }
}

/// Shared x geometry: hours since the first point, plus tick positions and
/// clipped night intervals in the same units.
struct Frame<'a> {
    origin: NaiveDateTime,
    points: &'a [ForecastPoint],
    x_range: Range<f64>,
    hour_ticks: Vec<f64>,
    day_ticks: Vec<f64>,
    nights: Vec<Range<f64>>,
}

impl<'a> Frame<'a> {
    fn new(
        points: &'a [ForecastPoint],
        nights: &[NightInterval],
        horizon: Horizon,
    ) -> Option<Self> {
        let origin = points.first()?.timestamp;
        let last = points.last()?.timestamp;
        let offset = |t: NaiveDateTime| (t - origin).num_minutes() as f64 / 60.0;

        let x_range = -0.5..offset(last) + 0.5;

        let step = i64::from(hour_tick_interval(horizon.days()));
        let mut hour_ticks = Vec::new();
        let mut t = origin.date().and_time(NaiveTime::MIN);
        while t <= last {
            if t >= origin {
                hour_ticks.push(offset(t));
            }
            t += Duration::hours(step);
        }

        let mut day_ticks = Vec::new();
        let mut midnight = origin.date().and_time(NaiveTime::MIN);
        while midnight <= last {
            if midnight >= origin {
                day_ticks.push(offset(midnight));
            }
            midnight += Duration::days(1);
        }
        if day_ticks.is_empty() {
            day_ticks.push(0.0);
        }

        let nights = nights
            .iter()
            .map(|n| offset(n.start).max(x_range.start)..offset(n.end).min(x_range.end))
            .filter(|r| r.start < r.end)
            .collect();

        Some(Self {
            origin,
            points,
            x_range,
            hour_ticks,
            day_ticks,
            nights,
        })
    }

    fn x(&self, t: NaiveDateTime) -> f64 {
        (t - self.origin).num_minutes() as f64 / 60.0
    }

    fn axis(&self, ticks: &[f64], pattern: &'static str) -> TickAxis {
        TickAxis {
            range: self.x_range.clone(),
            ticks: ticks.to_vec(),
            origin: self.origin,
            pattern,
        }
    }

    fn hour_axis(&self) -> TickAxis {
        self.axis(&self.hour_ticks, "%H:%M")
    }

    fn day_axis(&self) -> TickAxis {
        self.axis(&self.day_ticks, "%a %d %b")
    }

    fn series(&self, value: impl Fn(&ForecastPoint) -> f64) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (self.x(p.timestamp), value(p)))
            .collect()
    }
}

type DrawResult<DB> =
    std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

const NIGHT: RGBColor = RGBColor(190, 195, 220);
const ORANGE: RGBColor = RGBColor(230, 120, 20);
const PURPLE: RGBColor = RGBColor(128, 60, 170);
const BAR_HALF_WIDTH: f64 = 0.35;

fn bar(x: f64, bottom: f64, top: f64, color: RGBAColor) -> Rectangle<(f64, f64)> {
    Rectangle::new(
        [(x - BAR_HALF_WIDTH, bottom), (x + BAR_HALF_WIDTH, top)],
        color.filled(),
    )
}

fn legend_box(x: i32, y: i32, color: RGBAColor) -> Rectangle<(i32, i32)> {
    Rectangle::new([(x, y - 5), (x + 20, y + 5)], color.filled())
}

fn draw<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    frame: &Frame<'_>,
    kind: ChartKind,
    title: &str,
) -> DrawResult<DB> {
    root.fill(&WHITE)?;

    let (y_range, y_desc) = match kind {
        ChartKind::Temperature => {
            let temps = frame.points.iter().map(|p| p.temperature);
            (padded(temps), "Temperature (°C)")
        }
        ChartKind::Rain => {
            let top = max_or(frame.points.iter().map(|p| p.rain_mm), 1.0) * 1.2;
            (0.0..top, "Rain (mm)")
        }
        ChartKind::CloudCover => (0.0..100.0, "Cloud cover (%)"),
        ChartKind::Wind => {
            let gusts = frame.points.iter().map(|p| p.wind_gust.max(p.wind_speed));
            (0.0..max_or(gusts, 10.0) * 1.15, "Wind (km/h)")
        }
    };
    let secondary_y = match kind {
        ChartKind::Rain => 0.0..100.0,
        _ => y_range.clone(),
    };

    let hours = frame.hour_axis();
    let days = frame.day_axis();

    let mut chart = ChartBuilder::on(root)
        .caption(title, (FONT_FAMILY, 24))
        .margin(12)
        .x_label_area_size(48)
        .y_label_area_size(56)
        .right_y_label_area_size(56)
        .top_x_label_area_size(32)
        .build_cartesian_2d(hours.clone(), y_range.clone())?
        .set_secondary_coord(days.clone(), secondary_y);

    let hour_label = |x: &f64| hours.label_at(*x);
    let day_label = |x: &f64| days.label_at(*x);

    chart
        .configure_mesh()
        .x_label_formatter(&hour_label)
        .x_desc("Time")
        .y_desc(y_desc)
        .light_line_style(BLACK.mix(0.08))
        .draw()?;

    let secondary_desc = match kind {
        ChartKind::Rain => "Rain probability (%)",
        _ => y_desc,
    };
    chart
        .configure_secondary_axes()
        .x_label_formatter(&day_label)
        .y_desc(secondary_desc)
        .draw()?;

    chart.draw_series(frame.nights.iter().map(|n| {
        Rectangle::new(
            [(n.start, y_range.start), (n.end, y_range.end)],
            NIGHT.mix(0.35).filled(),
        )
    }))?;

    match kind {
        ChartKind::Temperature => {
            let temps = frame.series(|p| p.temperature);
            chart
                .draw_series(LineSeries::new(temps.iter().copied(), RED.stroke_width(2)))?
                .label("Temperature (°C)")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], RED));
            chart.draw_series(
                temps
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, RED.filled())),
            )?;
        }
        ChartKind::Rain => {
            let green = GREEN.mix(0.7);
            chart
                .draw_series(
                    frame
                        .points
                        .iter()
                        .map(|p| bar(frame.x(p.timestamp), 0.0, p.rain_mm, green)),
                )?
                .label("Rain (mm)")
                .legend(move |(x, y)| legend_box(x, y, green));
            chart
                .draw_secondary_series(LineSeries::new(
                    frame.series(|p| p.rain_probability),
                    PURPLE.stroke_width(2),
                ))?
                .label("Rain probability (%)")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PURPLE));
        }
        ChartKind::CloudCover => {
            chart
                .draw_series(LineSeries::new(
                    frame.series(|p| p.cloud_cover),
                    BLUE.stroke_width(2),
                ))?
                .label("Cloud cover (%)")
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE));
        }
        ChartKind::Wind => {
            let cyan = CYAN.mix(0.8);
            let orange = ORANGE.mix(0.8);
            chart
                .draw_series(
                    frame
                        .points
                        .iter()
                        .map(|p| bar(frame.x(p.timestamp), 0.0, p.wind_speed, cyan)),
                )?
                .label("Wind speed (km/h)")
                .legend(move |(x, y)| legend_box(x, y, cyan));
            chart
                .draw_series(frame.points.iter().map(|p| {
                    let top = p.wind_gust.max(p.wind_speed);
                    bar(frame.x(p.timestamp), p.wind_speed, top, orange)
                }))?
                .label("Gusts (km/h)")
                .legend(move |(x, y)| legend_box(x, y, orange));
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    Ok(())
}

fn max_or(values: impl Iterator<Item = f64>, floor: f64) -> f64 {
    values.fold(floor, f64::max)
}

/// Min..max with 10% padding, or ±1 around a flat series.
fn padded(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return 0.0..1.0;
    }
    let pad = if (max - min).abs() > 1e-6 {
        (max - min) * 0.1
    } else {
        1.0
    };
    (min - pad)..(max + pad)
}
