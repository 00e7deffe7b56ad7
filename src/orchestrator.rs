//! Recommendation pipeline: weather, then events, then the model

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::Result;
use crate::catalog::EventSource;
use crate::recommend::RecommendationGenerator;
use crate::weather::WeatherProvider;

/// One recommendation request
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub location: String,
    pub date: NaiveDate,
    /// `indoor` or `outdoor`; anything else is ignored by the catalog
    pub event_type: Option<String>,
}

impl RecommendationRequest {
    pub fn new(location: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            location: location.into(),
            date,
            event_type: None,
        }
    }

    #[must_use]
    pub fn with_event_type(mut self, event_type: Option<String>) -> Self {
        self.event_type = event_type.filter(|t| !t.trim().is_empty());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Recommended { event_count: usize },
    NoEvents,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub text: String,
    pub outcome: Outcome,
    /// Degradations the caller should know about, such as missing weather
    pub warnings: Vec<String>,
}

pub fn no_events_message(date: NaiveDate) -> String {
    format!("No events found for {date}.")
}

pub struct Orchestrator {
    weather: Arc<dyn WeatherProvider>,
    events: Arc<dyn EventSource>,
    generator: RecommendationGenerator,
}

impl Orchestrator {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        events: Arc<dyn EventSource>,
        generator: RecommendationGenerator,
    ) -> Self {
        Self {
            weather,
            events,
            generator,
        }
    }

    /// Run the pipeline once.
    ///
    /// A rejected location or key stops before the catalog is read. Other
    /// weather failures continue without weather and add a warning.
    #[instrument(skip(self, request), fields(location = %request.location, date = %request.date))]
    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<Recommendation> {
        let mut warnings = Vec::new();

        let weather = match self.weather.fetch(&request.location, request.date).await {
            Ok(snapshot) => {
                warnings.extend(snapshot.mismatch_warning());
                Some(snapshot)
            }
            Err(e) if e.is_fatal_for_weather() => return Err(e),
            Err(e) => {
                warn!("Continuing without weather: {}", e);
                warnings.push(format!("Weather data unavailable: {e}"));
                None
            }
        };

        let events = self
            .events
            .events_on(request.date, request.event_type.as_deref())
            .await?;

        if events.is_empty() {
            info!("No events on {}", request.date);
            return Ok(Recommendation {
                text: no_events_message(request.date),
                outcome: Outcome::NoEvents,
                warnings,
            });
        }

        let text = self.generator.recommend(weather.as_ref(), &events).await?;
        info!("Recommended from {} events", events.len());

        Ok(Recommendation {
            text,
            outcome: Outcome::Recommended {
                event_count: events.len(),
            },
            warnings,
        })
    }

    /// Text-only boundary: the recommendation, or `Error: <message>`
    pub async fn recommend_text(
        &self,
        location: &str,
        date: NaiveDate,
        event_type: Option<&str>,
    ) -> String {
        let request = RecommendationRequest::new(location, date)
            .with_event_type(event_type.map(str::to_string));

        match self.recommend(&request).await {
            Ok(recommendation) => recommendation.text,
            Err(e) => format!("Error: {e}"),
        }
    }
}
