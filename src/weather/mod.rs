//! Weather lookup
//!
//! Decides which provider endpoint answers a request for a given date and
//! normalizes the answer into a [`WeatherSnapshot`].

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::Result;
use crate::models::WeatherSnapshot;

pub mod weatherapi;

pub use weatherapi::WeatherApiClient;

/// Furthest day ahead the provider forecasts
pub const MAX_FORECAST_OFFSET: i64 = 14;

/// Source of weather for a location and date
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn fetch(&self, location: &str, date: NaiveDate) -> Result<WeatherSnapshot>;
}

/// Which provider call serves a requested date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherRequest {
    /// Current conditions for today
    Current,
    /// Forecast spanning `days` days, of which entry `offset` is wanted
    Forecast { days: u32, offset: usize },
    /// Past date or beyond the forecast window; current conditions stand in
    OutOfRange,
}

pub struct ForecastWindow;

impl ForecastWindow {
    /// Plan the request for `date` as seen from `today`
    #[must_use]
    pub fn plan(today: NaiveDate, date: NaiveDate) -> WeatherRequest {
        let offset = (date - today).num_days();
        match offset {
            0 => WeatherRequest::Current,
            1..=MAX_FORECAST_OFFSET => WeatherRequest::Forecast {
                days: offset as u32 + 1,
                offset: offset as usize,
            },
            _ => WeatherRequest::OutOfRange,
        }
    }
}
