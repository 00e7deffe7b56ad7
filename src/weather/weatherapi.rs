//! Weather API client for weatherapi.com
//!
//! One attempt per lookup. Timeouts, rejected locations and rejected keys
//! each surface as their own error.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::{Client, Response, StatusCode};
use tracing::{debug, error, info, instrument, warn};

use super::{ForecastWindow, WeatherProvider, WeatherRequest};
use crate::config::WeatherConfig;
use crate::models::WeatherSnapshot;
use crate::{EventWiseError, Result};

/// Weather API client for weatherapi.com
pub struct WeatherApiClient {
    /// HTTP client
    client: Client,
    api_key: String,
    base_url: String,
    /// Fixed "today" for deterministic lookups
    today: Option<NaiveDate>,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .user_agent(concat!("EventWise/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| EventWiseError::weather(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            today: None,
        })
    }

    pub fn from_config(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| EventWiseError::ConfigurationMissing {
                missing: vec!["WEATHER_API_KEY".to_string()],
            })?;

        Self::new(
            api_key,
            config.base_url.clone(),
            Duration::from_secs(config.timeout_seconds.into()),
        )
    }

    /// Pin the date treated as "today"
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// Get current conditions for a location
    #[instrument(skip(self))]
    pub async fn get_current(&self, location: &str) -> Result<WeatherSnapshot> {
        let response = self.make_request("current.json", location, &[]).await?;

        let current: api::CurrentResponse = response
            .json()
            .await
            .map_err(|e| self.decode_error(location, e))?;

        Ok(current.into())
    }

    /// Get the forecast for the day `offset` days ahead
    #[instrument(skip(self))]
    pub async fn get_forecast_day(
        &self,
        location: &str,
        days: u32,
        offset: usize,
    ) -> Result<WeatherSnapshot> {
        let days = days.to_string();
        let response = self
            .make_request("forecast.json", location, &[("days", days.as_str())])
            .await?;

        let forecast: api::ForecastResponse = response
            .json()
            .await
            .map_err(|e| self.decode_error(location, e))?;

        let returned = forecast.forecast.forecastday.len();
        forecast.into_day(offset).ok_or_else(|| {
            error!("Forecast has {} days, needed index {}", returned, offset);
            let message = format!("Forecast for {location} did not include day {offset}");
            EventWiseError::weather(message)
        })
    }

    /// Single GET against the provider, mapping status codes to errors
    async fn make_request(
        &self,
        endpoint: &str,
        location: &str,
        extra: &[(&str, &str)],
    ) -> Result<Response> {
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!("Weather API request: {} q={}", url, location);
        let start_time = Instant::now();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("key", self.api_key.as_str()),
                ("q", location),
                ("aqi", "no"),
            ])
            .query(extra)
            .send()
            .await
            .map_err(|e| self.transport_error(location, e))?;

        let status = response.status();
        debug!(
            "Weather API response {} in {:.3}s",
            status,
            start_time.elapsed().as_secs_f64()
        );

        if status.is_success() {
            return Ok(response);
        }

        match status {
            StatusCode::BAD_REQUEST => {
                warn!("Weather API rejected location '{}'", location);
                Err(EventWiseError::invalid_location(location))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("Weather API authentication failed (HTTP {})", status.as_u16());
                Err(EventWiseError::invalid_credentials("Weather"))
            }
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = api::error_message(&body).unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("Unknown error")
                        .to_string()
                });
                warn!("Weather API error {}: {}", status, message);
                let message = format!("HTTP {}: {message}", status.as_u16());
                Err(EventWiseError::weather(message))
            }
        }
    }

    fn transport_error(&self, location: &str, e: reqwest::Error) -> EventWiseError {
        if e.is_timeout() {
            warn!("Weather API timed out for '{}'", location);
            EventWiseError::transport_timeout(location)
        } else {
            warn!("Network error fetching weather: {}", e);
            EventWiseError::weather(format!("Network error fetching weather: {e}"))
        }
    }

    fn decode_error(&self, location: &str, e: reqwest::Error) -> EventWiseError {
        if e.is_timeout() {
            return EventWiseError::transport_timeout(location);
        }
        error!("Failed to parse weather response: {}", e);
        EventWiseError::weather(format!("Invalid weather data received: {e}"))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn fetch(&self, location: &str, date: NaiveDate) -> Result<WeatherSnapshot> {
        let today = self.today();
        let snapshot = match ForecastWindow::plan(today, date) {
            WeatherRequest::Current => self.get_current(location).await?,
            WeatherRequest::Forecast { days, offset } => {
                self.get_forecast_day(location, days, offset).await?
            }
            WeatherRequest::OutOfRange => {
                warn!(
                    "{} is outside the forecast window from {}, using current conditions",
                    date, today
                );
                self.get_current(location).await?.standing_in_for(date)
            }
        };

        info!(
            "Weather for {} on {}: {}",
            snapshot.location, date, snapshot.condition
        );
        Ok(snapshot)
    }
}

/// weatherapi.com response structures and conversion utilities
mod api {
    use serde::Deserialize;

    use crate::models::WeatherSnapshot;

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub location: ApiLocation,
        pub current: ApiCurrent,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub location: ApiLocation,
        pub forecast: ApiForecast,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiLocation {
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiCurrent {
        pub temp_c: f32,
        pub humidity: u8,
        pub condition: ApiCondition,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiCondition {
        pub text: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiForecast {
        pub forecastday: Vec<ForecastDay>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ForecastDay {
        pub day: ApiDay,
    }

    #[derive(Debug, Deserialize)]
    pub struct ApiDay {
        pub maxtemp_c: f32,
        pub mintemp_c: f32,
        pub avgtemp_c: f32,
        pub condition: ApiCondition,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorEnvelope {
        error: ErrorBody,
    }

    #[derive(Debug, Deserialize)]
    struct ErrorBody {
        message: String,
    }

    /// Extract `error.message` from a provider error body
    pub fn error_message(body: &str) -> Option<String> {
        serde_json::from_str::<ErrorEnvelope>(body)
            .ok()
            .map(|e| e.error.message)
    }

    impl From<CurrentResponse> for WeatherSnapshot {
        fn from(value: CurrentResponse) -> Self {
            WeatherSnapshot::point(
                value.location.name,
                value.current.condition.text,
                value.current.temp_c,
                value.current.humidity,
            )
        }
    }

    impl ForecastResponse {
        /// Repackage the entry at `offset` as a day-aggregate snapshot
        pub fn into_day(self, offset: usize) -> Option<WeatherSnapshot> {
            let location = self.location.name;
            self.forecast
                .forecastday
                .into_iter()
                .nth(offset)
                .map(|entry| {
                    WeatherSnapshot::day_aggregate(
                        location,
                        entry.day.condition.text,
                        entry.day.mintemp_c,
                        entry.day.maxtemp_c,
                        entry.day.avgtemp_c,
                    )
                })
        }
    }
}
