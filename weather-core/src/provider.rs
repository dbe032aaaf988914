use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::Result,
    model::{ForecastRequest, ForecastResponse},
};

pub mod open_meteo;

pub use open_meteo::OpenMeteoProvider;

/// Source of raw forecast documents.
///
/// Implementations perform exactly one upstream request per call; nothing is
/// cached or retried.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, request: &ForecastRequest) -> Result<ForecastResponse>;
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
