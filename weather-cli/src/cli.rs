use std::{io, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use weather_core::{ChartFormat, Config, Location, WeatherService, location};

use crate::{
    console::{self, InquirePrompter},
    web,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weather", version, about = "Weather forecast lookup")]
pub struct Cli {
    /// Use this config file instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show current weather, hourly forecast and charts for a city.
    Show {
        /// City name; prompted for when absent.
        city: Option<String>,

        /// Forecast horizon in days.
        #[arg(long)]
        days: Option<u8>,

        /// Latitude, instead of a city name.
        #[arg(long, requires = "lon", conflicts_with = "city", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude, instead of a city name.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Skip writing chart files.
        #[arg(long)]
        no_charts: bool,
    },

    /// List the known cities.
    Cities {
        /// Only list cities whose name contains this text.
        #[arg(long)]
        search: Option<String>,
    },

    /// Serve the forecast form over HTTP.
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Interactively change defaults and save them to the config file.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match self.config {
            Some(path) => path,
            None => Config::config_file_path()?,
        };
        let config = Config::load_from(&config_path)?;

        match self.command {
            Command::Show {
                city,
                days,
                lat,
                lon,
                no_charts,
            } => {
                let service = WeatherService::from_config(config)?;
                show(&service, city, days, lat.zip(lon), no_charts).await
            }
            Command::Cities { search } => {
                let service = WeatherService::from_config(config)?;
                let needle = search.as_deref().unwrap_or_default();
                for loc in service.locations().search(needle) {
                    println!(
                        "{:<16} {:>9.4} {:>9.4}",
                        loc.name, loc.latitude, loc.longitude
                    );
                }
                Ok(())
            }
            Command::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| config.server.bind.clone());
                let service = WeatherService::from_config(config)?;
                web::serve(service, &bind).await
            }
            Command::Configure => configure(config, &config_path),
        }
    }
}

async fn show(
    service: &WeatherService,
    city: Option<String>,
    days: Option<u8>,
    coordinates: Option<(f64, f64)>,
    no_charts: bool,
) -> Result<()> {
    let horizon = service.horizon(days)?;

    let location = match coordinates {
        Some((lat, lon)) => {
            location::validate_coordinates(lat, lon)?;
            Location::from_coordinates(lat, lon)
        }
        None => console::resolve_location(service.locations(), city, &mut InquirePrompter)?,
    };

    let report = service.forecast(&location, horizon).await?;
    console::write_report(&mut io::stdout().lock(), &report, service.codes())
        .context("Failed to print the report")?;

    if no_charts {
        return Ok(());
    }

    let charts = service.charts(&report)?;
    if charts.is_empty() {
        return Ok(());
    }

    let dir = &service.config().chart.output_dir;
    println!();
    for path in console::save_charts(&charts, dir, &report.location)? {
        println!("Saved chart: {}", path.display());
    }

    Ok(())
}

fn configure(mut config: Config, path: &std::path::Path) -> Result<()> {
    let max_days = config.forecast.max_days;

    config.forecast.default_days = inquire::CustomType::<u8>::new("Default forecast days:")
        .with_default(config.forecast.default_days)
        .with_help_message(&format!("1 to {max_days}"))
        .with_validator(move |d: &u8| {
            Ok(if (1..=max_days).contains(d) {
                inquire::validator::Validation::Valid
            } else {
                inquire::validator::Validation::Invalid(
                    format!("must be between 1 and {max_days}").into(),
                )
            })
        })
        .prompt()
        .context("Failed to read default forecast days")?;

    let formats = vec![ChartFormat::Png, ChartFormat::Svg];
    let start = formats
        .iter()
        .position(|f| *f == config.chart.format)
        .unwrap_or(0);
    let labels: Vec<&str> = formats.iter().map(|f| f.extension()).collect();
    let picked = inquire::Select::new("Chart format:", labels)
        .with_starting_cursor(start)
        .prompt()
        .context("Failed to read chart format")?;
    config.chart.format = if picked == "svg" { ChartFormat::Svg } else { ChartFormat::Png };

    config.chart.wind_chart = inquire::Confirm::new("Draw the wind chart?")
        .with_default(config.chart.wind_chart)
        .prompt()
        .context("Failed to read wind chart choice")?;

    let dir = inquire::Text::new("Chart directory:")
        .with_default(&config.chart.output_dir.display().to_string())
        .prompt()
        .context("Failed to read chart directory")?;
    config.chart.output_dir = PathBuf::from(dir);

    config.validate()?;
    config.save_to(path)?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_accepts_negative_coordinates() {
        let cli = Cli::try_parse_from([
            "weather", "show", "--lat", "-33.92", "--lon", "18.42", "--days", "3",
        ])
        .expect("parses");

        match cli.command {
            Command::Show {
                city,
                days,
                lat,
                lon,
                no_charts,
            } => {
                assert_eq!(city, None);
                assert_eq!(days, Some(3));
                assert_eq!(lat.zip(lon), Some((-33.92, 18.42)));
                assert!(!no_charts);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn lat_requires_lon() {
        let parsed = Cli::try_parse_from(["weather", "show", "--lat", "10"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn city_and_coordinates_conflict() {
        let parsed =
            Cli::try_parse_from(["weather", "show", "Paris", "--lat", "1", "--lon", "2"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::try_parse_from([
            "weather", "cities", "--search", "ber", "--config", "/tmp/w.toml",
        ])
        .expect("parses");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.toml")));
        assert!(matches!(cli.command, Command::Cities { search: Some(ref s) } if s == "ber"));
    }
}
