//! Console front-end: prompts, printed report, chart files.

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use weather_core::{
    Chart, ForecastReport, Location, LocationBook, WeatherCodeTable, WeatherError, location,
};

use crate::view;

/// Source of typed answers. The real one is `inquire`; tests script it.
pub trait Prompter {
    fn ask(&mut self, message: &str) -> Result<String>;
}

#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn ask(&mut self, message: &str) -> Result<String> {
        inquire::Text::new(message)
            .prompt()
            .with_context(|| format!("Failed to read answer to '{message}'"))
    }
}

/// Turn the user's city (asked for if absent) into a location.
///
/// An unknown city prints the valid names and falls back to asking for
/// coordinates; non-numeric coordinates abort with `InvalidInput`.
pub fn resolve_location(
    book: &LocationBook,
    city: Option<String>,
    prompter: &mut dyn Prompter,
) -> Result<Location> {
    let city = match city {
        Some(c) => c,
        None => prompter.ask("Enter your city:")?,
    };

    match book.resolve(&city) {
        Ok(found) => Ok(found.clone()),
        Err(WeatherError::NotFound { available, .. }) => {
            println!("City not found. Available cities:");
            println!("{}", available.join(", "));

            let lat = prompter.ask("Enter latitude:")?;
            let lon = prompter.ask("Enter longitude:")?;
            Ok(location::parse_coordinates(&lat, &lon)?)
        }
        Err(other) => Err(other.into()),
    }
}

/// Print the current conditions, the advisory and one line per forecast hour.
pub fn write_report<W: Write>(
    out: &mut W,
    report: &ForecastReport,
    codes: &WeatherCodeTable,
) -> io::Result<()> {
    let c = &report.current;

    writeln!(out, "Weather for {}", report.location.name)?;
    if let Some(tz) = &report.timezone {
        writeln!(out, "  Timezone: {tz}")?;
    }
    writeln!(out)?;
    writeln!(out, "Current Weather:")?;
    writeln!(out, "  Temperature: {}°C", c.temperature)?;
    writeln!(out, "  Windspeed: {} km/h", c.windspeed)?;
    writeln!(out, "  Weather: {}", c.description)?;
    writeln!(out, "  Time: {}", c.time)?;
    writeln!(out)?;

    if let Some(advisory) = report.advisory {
        writeln!(out, "Advisory: {advisory}")?;
        writeln!(out)?;
    }

    let days = report.horizon.days();
    let plural = if days == 1 { "" } else { "s" };
    writeln!(out, "Forecast for next {days} day{plural} (hourly):")?;

    if report.points.is_empty() {
        writeln!(out, "  No forecast hours available.")?;
    }

    for row in view::rows(report, codes) {
        write!(
            out,
            "{}: {}°C, Weather: {}, Cloud: {}%, Rain: {}mm, Rain Probability: {}%, \
             Wind: {} km/h (gusts {})",
            row.time,
            row.temperature,
            row.weather,
            row.cloud_cover,
            row.rain_mm,
            row.rain_probability,
            row.wind_speed,
            row.wind_gust,
        )?;
        if let Some(p) = &row.pressure {
            write!(out, ", Pressure: {p} hPa")?;
        }
        if let Some(uv) = &row.uv_index {
            write!(out, ", UV: {uv}")?;
        }
        writeln!(out)?;
    }

    Ok(())
}

/// Write each chart to `dir` as `<location>-<kind>.<ext>`.
pub fn save_charts(charts: &[Chart], dir: &Path, location: &Location) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create chart directory: {}", dir.display()))?;

    let prefix = file_stem(&location.name);
    charts
        .iter()
        .map(|chart| {
            let path = dir.join(format!("{prefix}-{}", chart.file_name()));
            fs::write(&path, &chart.bytes)
                .with_context(|| format!("Failed to write chart: {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

fn file_stem(name: &str) -> String {
    let stem: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    stem.trim_matches('_').to_string()
}
