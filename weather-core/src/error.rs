use thiserror::Error;

/// Everything that can go wrong while answering a single forecast request.
///
/// None of these are fatal to the process: each renders to a message that is
/// shown to the user, after which the next request starts from scratch.
#[derive(Debug, Error)]
pub enum WeatherError {
    /// The city name is not in the location book.
    #[error("City '{query}' not found. Available cities: {}", available.join(", "))]
    NotFound {
        query: String,
        available: Vec<String>,
    },

    /// User-supplied input (coordinates, horizon) could not be accepted.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure, timeout or non-success HTTP status.
    #[error("Error fetching weather data: {0}")]
    Fetch(String),

    /// The response body did not match the expected forecast schema.
    #[error("Could not parse weather data: {0}")]
    Schema(String),

    /// Drawing or encoding a chart failed.
    #[error("Could not render chart: {0}")]
    Chart(String),
}

impl WeatherError {
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// True for errors the user can fix by changing their input.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
