use std::collections::BTreeMap;

/// WMO weather interpretation codes as used by Open-Meteo.
///
/// See <https://open-meteo.com/en/docs> for the code reference.
const WMO_CODES: &[(i32, &str)] = &[
    (0, "Clear sky"),
    (1, "Mainly clear"),
    (2, "Partly cloudy"),
    (3, "Overcast"),
    (45, "Fog"),
    (48, "Depositing rime fog"),
    (51, "Light drizzle"),
    (53, "Moderate drizzle"),
    (55, "Dense drizzle"),
    (56, "Light freezing drizzle"),
    (57, "Dense freezing drizzle"),
    (61, "Slight rain"),
    (63, "Moderate rain"),
    (65, "Heavy rain"),
    (66, "Light freezing rain"),
    (67, "Heavy freezing rain"),
    (71, "Slight snow fall"),
    (73, "Moderate snow fall"),
    (75, "Heavy snow fall"),
    (77, "Snow grains"),
    (80, "Slight rain showers"),
    (81, "Moderate rain showers"),
    (82, "Violent rain showers"),
    (85, "Slight snow showers"),
    (86, "Heavy snow showers"),
    (95, "Thunderstorm"),
    (96, "Thunderstorm with slight hail"),
    (99, "Thunderstorm with heavy hail"),
];

pub const UNKNOWN: &str = "Unknown";

/// Read-only code → description lookup.
#[derive(Debug, Clone)]
pub struct WeatherCodeTable {
    entries: BTreeMap<i32, String>,
}

impl WeatherCodeTable {
    pub fn new(entries: BTreeMap<i32, String>) -> Self {
        Self { entries }
    }

    pub fn wmo() -> Self {
        Self::new(
            WMO_CODES
                .iter()
                .map(|&(code, text)| (code, text.to_string()))
                .collect(),
        )
    }

    pub fn describe(&self, code: i32) -> &str {
        self.entries
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN)
    }

    /// Like [`describe`](Self::describe) but tolerates an absent code.
    pub fn describe_opt(&self, code: Option<i32>) -> &str {
        code.map_or(UNKNOWN, |c| self.describe(c))
    }
}

impl Default for WeatherCodeTable {
    fn default() -> Self {
        Self::wmo()
    }
}
