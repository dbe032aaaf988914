use serde::{Deserialize, Serialize};

use crate::error::{Result, WeatherError};

/// A named place the forecast can be requested for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
        }
    }

    /// A location made from raw coordinates, named after them.
    pub fn from_coordinates(latitude: f64, longitude: f64) -> Self {
        let name = format!("{latitude:.4}, {longitude:.4}");
        Self::new(name, latitude, longitude)
    }
}

const BUILTIN: &[(&str, f64, f64)] = &[
    ("Amsterdam", 52.3676, 4.9041),
    ("Athens", 37.9838, 23.7275),
    ("Berlin", 52.5200, 13.4050),
    ("Brussels", 50.8503, 4.3517),
    ("Buenos Aires", -34.6037, -58.3816),
    ("Cairo", 30.0444, 31.2357),
    ("Cape Town", -33.9249, 18.4241),
    ("Copenhagen", 55.6761, 12.5683),
    ("Dublin", 53.3498, -6.2603),
    ("Helsinki", 60.1699, 24.9384),
    ("Lagos", 6.5244, 3.3792),
    ("Lisbon", 38.7223, -9.1393),
    ("London", 51.5074, -0.1278),
    ("Madrid", 40.4168, -3.7038),
    ("Mexico City", 19.4326, -99.1332),
    ("Mumbai", 19.0760, 72.8777),
    ("Nairobi", -1.2921, 36.8219),
    ("New York", 40.7128, -74.0060),
    ("Oslo", 59.9139, 10.7522),
    ("Paris", 48.8566, 2.3522),
    ("Prague", 50.0755, 14.4378),
    ("Rome", 41.9028, 12.4964),
    ("Stockholm", 59.3293, 18.0686),
    ("Sydney", -33.8688, 151.2093),
    ("Tokyo", 35.6762, 139.6503),
    ("Toronto", 43.6532, -79.3832),
    ("Vienna", 48.2082, 16.3738),
    ("Warsaw", 52.2297, 21.0122),
];

/// The ordered, read-only list of cities the resolver knows about.
#[derive(Debug, Clone)]
pub struct LocationBook {
    locations: Vec<Location>,
}

impl LocationBook {
    pub fn new(locations: Vec<Location>) -> Self {
        Self { locations }
    }

    /// The built-in city list.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .map(|&(name, lat, lon)| Location::new(name, lat, lon))
                .collect(),
        )
    }

    /// Built-in list followed by user-configured extras.
    pub fn with_extras(extras: &[Location]) -> Self {
        let mut book = Self::builtin();
        book.locations.extend(extras.iter().cloned());
        book
    }

    pub fn all(&self) -> &[Location] {
        &self.locations
    }

    pub fn names(&self) -> Vec<String> {
        self.locations.iter().map(|l| l.name.clone()).collect()
    }

    /// Case-insensitive exact match on the name; the first match wins.
    pub fn resolve(&self, name: &str) -> Result<&Location> {
        let wanted = name.trim().to_lowercase();

        self.locations
            .iter()
            .find(|l| l.name.to_lowercase() == wanted)
            .ok_or_else(|| WeatherError::NotFound {
                query: name.trim().to_string(),
                available: self.names(),
            })
    }

    /// Case-insensitive substring filter, keeping book order. An empty
    /// filter returns everything.
    pub fn search(&self, filter: &str) -> Vec<&Location> {
        let needle = filter.trim().to_lowercase();
        self.locations
            .iter()
            .filter(|l| needle.is_empty() || l.name.to_lowercase().contains(&needle))
            .collect()
    }
}

/// Parse user-typed coordinates. Fails fast on anything non-numeric or out
/// of range.
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Result<Location> {
    let lat: f64 = latitude.trim().parse().map_err(|_| {
        WeatherError::invalid_input(format!(
            "latitude '{}' is not a number",
            latitude.trim()
        ))
    })?;
    let lon: f64 = longitude.trim().parse().map_err(|_| {
        WeatherError::invalid_input(format!(
            "longitude '{}' is not a number",
            longitude.trim()
        ))
    })?;

    validate_coordinates(lat, lon)?;
    Ok(Location::from_coordinates(lat, lon))
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(WeatherError::invalid_input(
            "latitude must be -90 to 90, longitude must be -180 to 180",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_ignores_case_for_every_city() {
        let book = LocationBook::builtin();

        for loc in book.all() {
            let exact = book.resolve(&loc.name).expect("exact name");
            let upper = book.resolve(&loc.name.to_uppercase()).expect("upper");
            let lower = book.resolve(&loc.name.to_lowercase()).expect("lower");

            assert_eq!(exact, loc);
            assert_eq!(upper, loc);
            assert_eq!(lower, loc);
        }
    }

    #[test]
    fn resolve_trims_whitespace() {
        let book = LocationBook::builtin();
        let loc = book.resolve("  new york ").expect("trimmed");
        assert_eq!(loc.name, "New York");
    }

    #[test]
    fn unknown_city_returns_full_name_list() {
        let book = LocationBook::builtin();
        let err = book.resolve("Atlantis").unwrap_err();

        match err {
            WeatherError::NotFound { query, available } => {
                assert_eq!(query, "Atlantis");
                assert_eq!(available, book.names());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let book = LocationBook::new(vec![
            Location::new("Springfield", 39.78, -89.65),
            Location::new("springfield", 42.10, -72.59),
        ]);

        let loc = book.resolve("SPRINGFIELD").expect("found");
        assert_eq!(loc.latitude, 39.78);
    }

    #[test]
    fn extras_are_appended() {
        let extra = Location::new("Ouagadougou", 12.37, -1.53);
        let book = LocationBook::with_extras(std::slice::from_ref(&extra));

        assert_eq!(book.all().last(), Some(&extra));
        assert_eq!(book.resolve("ouagadougou").expect("found"), &extra);
    }

    #[test]
    fn search_filters_by_substring_in_order() {
        let book = LocationBook::builtin();

        let names: Vec<_> = book.search("on").iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Lisbon", "London", "Toronto"]);

        assert_eq!(book.search("").len(), book.all().len());
        assert!(book.search("zzz").is_empty());
    }

    #[test]
    fn parse_coordinates_accepts_numbers() {
        let loc = parse_coordinates(" 52.52", "13.41 ").expect("valid");
        assert_eq!(loc.latitude, 52.52);
        assert_eq!(loc.longitude, 13.41);
        assert_eq!(loc.name, "52.5200, 13.4100");
    }

    #[test]
    fn parse_coordinates_rejects_garbage() {
        let err = parse_coordinates("north", "13.4").unwrap_err();
        assert!(matches!(err, WeatherError::InvalidInput(_)));
        assert!(err.to_string().contains("latitude"));

        let err = parse_coordinates("52.5", "").unwrap_err();
        assert!(err.to_string().contains("longitude"));
    }

    #[test]
    fn parse_coordinates_rejects_out_of_range() {
        assert!(parse_coordinates("91", "0").is_err());
        assert!(parse_coordinates("0", "-181").is_err());
        assert!(parse_coordinates("-90", "180").is_ok());
    }
}
