//! Recommendation generation
//!
//! Turns a weather snapshot and a list of events into prose by asking a chat
//! model. The model sits behind [`ChatModel`] so the generator can be driven
//! by a fake in tests.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::models::{Event, WeatherSnapshot};
use crate::{EventWiseError, Result};

pub mod openai;
pub mod prompt;

pub use openai::OpenAiChatModel;
pub use prompt::{PromptBuilder, SYSTEM_INSTRUCTION};

/// A chat model answering one system + user exchange
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, system: &str, user: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct RecommendationGenerator {
    model: Arc<dyn ChatModel>,
}

impl RecommendationGenerator {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self { model }
    }

    /// Ask the model to rank `events` given `weather`.
    ///
    /// `None` weather is rendered as unavailable. An empty event list is
    /// refused before any model call.
    #[instrument(skip_all, fields(events = events.len()))]
    pub async fn recommend(
        &self,
        weather: Option<&WeatherSnapshot>,
        events: &[Event],
    ) -> Result<String> {
        if events.is_empty() {
            return Err(EventWiseError::EmptyEventList);
        }

        let prompt = PromptBuilder::build(weather, events);
        debug!("Prompt:\n{}", prompt);

        self.model.complete(SYSTEM_INSTRUCTION, &prompt).await
    }
}


#[cfg(test)]
mod tests {
    use super::testing::FakeChatModel;
    use super::*;
    use crate::models::EventType;
    use chrono::NaiveDate;

    fn event() -> Event {
        Event {
            id: 7,
            name: "Jazz Night".to_string(),
            event_type: EventType::Indoor,
            description: "Live jazz performance".to_string(),
            location: "Blue Note Club".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 10, 18).unwrap(),
            time: None,
            price_range: Some("$25-40".to_string()),
        }
    }

    #[tokio::test]
    async fn test_empty_events_never_reach_model() {
        let model = Arc::new(FakeChatModel::answering("unused"));
        let generator = RecommendationGenerator::new(model.clone());

        let err = generator.recommend(None, &[]).await.unwrap_err();
        assert!(matches!(err, EventWiseError::EmptyEventList));
        assert_eq!(model.calls(), 0);
    }

    #[tokio::test]
    async fn test_prompt_reaches_model() {
        let model = Arc::new(FakeChatModel::answering("Try Jazz Night."));
        let generator = RecommendationGenerator::new(model.clone());

        let text = generator.recommend(None, &[event()]).await.unwrap();
        assert_eq!(text, "Try Jazz Night.");
        assert_eq!(model.calls(), 1);

        let prompt = model.last_prompt().unwrap();
        assert!(prompt.contains("Weather: Data unavailable"));
        let line = "- Jazz Night (INDOOR): Live jazz performance \
            | Location: Blue Note Club ($25-40)";
        assert!(prompt.contains(line));
    }

    #[tokio::test]
    async fn test_model_errors_propagate() {
        let model = Arc::new(FakeChatModel::failing(|| EventWiseError::RateLimitExceeded));
        let generator = RecommendationGenerator::new(model);

        let err = generator.recommend(None, &[event()]).await.unwrap_err();
        assert!(matches!(err, EventWiseError::RateLimitExceeded));
    }
}
