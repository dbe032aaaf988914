use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::{forecast::AdvisoryThresholds, location::Location};

/// Connection settings for the Open-Meteo forecast endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL without the trailing `/forecast`.
    pub base_url: String,

    /// Request timeout in seconds.
    pub timeout_secs: u64,

    /// Hourly variables requested on top of the ones every chart needs,
    /// e.g. `weathercode`, `pressure_msl`, `uv_index`.
    pub hourly_extras: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1".to_string(),
            timeout_secs: 30,
            hourly_extras: vec![
                "weathercode".to_string(),
                "pressure_msl".to_string(),
                "uv_index".to_string(),
            ],
        }
    }
}

/// Forecast horizon bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub default_days: u8,
    /// Upper bound accepted from users; the upstream API stops at 16.
    pub max_days: u8,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            default_days: 2,
            max_days: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    #[default]
    Png,
    Svg,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Svg => "svg",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ChartFormat::Png => "image/png",
            ChartFormat::Svg => "image/svg+xml",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    pub format: ChartFormat,
    /// Where the console front-end writes chart files.
    pub output_dir: PathBuf,
    /// Draw the wind speed / gust chart in addition to the three core charts.
    pub wind_chart: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            format: ChartFormat::Png,
            output_dir: PathBuf::from("charts"),
            wind_chart: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8000".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Every section is optional; a missing file means all defaults.
///
/// Example TOML:
/// ```toml
/// [forecast]
/// default_days = 3
///
/// [[locations]]
/// name = "Ouagadougou"
/// latitude = 12.37
/// longitude = -1.53
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub forecast: ForecastConfig,
    pub advisory: AdvisoryThresholds,
    pub chart: ChartConfig,
    pub server: ServerConfig,

    /// Extra cities appended after the built-in list.
    pub locations: Vec<Location>,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-task", "weather-cli")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Reject settings that would make every request fail.
    pub fn validate(&self) -> Result<()> {
        let f = &self.forecast;
        if f.max_days == 0 || f.max_days > 16 {
            return Err(anyhow!(
                "forecast.max_days must be within 1..=16, got {}",
                f.max_days
            ));
        }
        if f.default_days == 0 || f.default_days > f.max_days {
            return Err(anyhow!(
                "forecast.default_days must be within 1..={}, got {}",
                f.max_days,
                f.default_days
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(anyhow!("api.timeout_secs must be positive"));
        }
        if self.chart.width < 200 || self.chart.height < 150 {
            return Err(anyhow!(
                "chart size {}x{} is too small",
                self.chart.width,
                self.chart.height
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        cfg.validate().expect("defaults must validate");

        assert_eq!(cfg.forecast.default_days, 2);
        assert_eq!(cfg.api.base_url, "https://api.open-meteo.com/v1");
        assert_eq!(cfg.chart.format, ChartFormat::Png);
    }

    #[test]
    fn partial_toml_fills_in_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [forecast]
            default_days = 5

            [chart]
            format = "svg"

            [[locations]]
            name = "Ouagadougou"
            latitude = 12.37
            longitude = -1.53
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.forecast.default_days, 5);
        assert_eq!(cfg.forecast.max_days, 16);
        assert_eq!(cfg.chart.format, ChartFormat::Svg);
        assert_eq!(cfg.chart.width, 1200);
        assert_eq!(cfg.locations.len(), 1);
        assert_eq!(cfg.locations[0].name, "Ouagadougou");
    }

    #[test]
    fn validate_rejects_out_of_bound_days() {
        let mut cfg = Config::default();
        cfg.forecast.max_days = 20;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.forecast.default_days = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.forecast.max_days = 3;
        cfg.forecast.default_days = 4;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("default_days"));
    }

    #[test]
    fn save_and_load_preserve_settings() {
        let path = std::env::temp_dir()
            .join(format!("weather-core-config-{}", std::process::id()))
            .join("config.toml");

        let mut cfg = Config::default();
        cfg.forecast.default_days = 4;
        cfg.advisory.wind_gust_kmh = 55.0;
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.forecast.default_days, 4);
        assert_eq!(loaded.advisory.wind_gust_kmh, 55.0);

        let _ = fs::remove_dir_all(path.parent().expect("has parent"));
    }

    #[test]
    fn missing_file_means_defaults() {
        let path = std::env::temp_dir().join("weather-core-does-not-exist/config.toml");
        let cfg = Config::load_from(&path).expect("defaults");
        assert_eq!(cfg.forecast.default_days, 2);
    }
}
