//! End-to-end tests for the EventWise pipeline
//!
//! A seeded SQLite catalog on disk, with wiremock standing in for the weather
//! and model providers.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventwise::{
    AppState, EventCatalog, OpenAiChatModel, Orchestrator, RecommendationGenerator,
    WeatherApiClient, web,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
}

struct Harness {
    _dir: TempDir,
    catalog: EventCatalog,
    weather: MockServer,
    model: MockServer,
}

impl Harness {
    async fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let catalog = EventCatalog::new(dir.path().join("events.db"));
        catalog.seed_sample_events(base_date()).await.unwrap();

        Self {
            _dir: dir,
            catalog,
            weather: MockServer::start().await,
            model: MockServer::start().await,
        }
    }

    fn orchestrator(&self) -> Orchestrator {
        let weather = WeatherApiClient::new(
            "weather-key".into(),
            self.weather.uri(),
            Duration::from_secs(2),
        )
        .unwrap()
        .with_today(base_date());
        let model =
            OpenAiChatModel::new("openai-key".into(), self.model.uri(), "gpt-4".into()).unwrap();

        Orchestrator::new(
            Arc::new(weather),
            Arc::new(self.catalog.clone()),
            RecommendationGenerator::new(Arc::new(model)),
        )
    }

    async fn mount_sunny_weather(&self) {
        Mock::given(method("GET"))
            .and(path("/current.json"))
            .and(query_param("key", "weather-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "location": {"name": "Singapore", "country": "Singapore"},
                "current": {
                    "temp_c": 27.0,
                    "humidity": 70,
                    "condition": {"text": "Partly cloudy", "code": 1003}
                }
            })))
            .mount(&self.weather)
            .await;
    }

    async fn mount_completion(&self, text: &str) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "chatcmpl-test",
                "object": "chat.completion",
                "choices": [{
                    "index": 0,
                    "message": {"role": "assistant", "content": text},
                    "finish_reason": "stop"
                }]
            })))
            .mount(&self.model)
            .await;
    }
}

#[tokio::test]
async fn test_recommendation_for_today() {
    let harness = Harness::start().await;
    harness.mount_sunny_weather().await;

    let art_line = "Art Exhibition (INDOOR) at 10:00: Modern art showcase \
                    | Location: City Gallery ($15-25)";
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Partly cloudy"))
        .and(body_string_contains(art_line))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "The Summer Concert suits the weather."
                }
            }]
        })))
        .expect(1)
        .mount(&harness.model)
        .await;

    let text = harness
        .orchestrator()
        .recommend_text("Singapore", base_date(), None)
        .await;
    assert_eq!(text, "The Summer Concert suits the weather.");
}

#[tokio::test]
async fn test_unknown_location_never_reaches_model() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .and(path("/current.json"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 1006, "message": "No matching location found."}
        })))
        .mount(&harness.weather)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&harness.model)
        .await;

    let text = harness
        .orchestrator()
        .recommend_text("Atlantis", base_date(), None)
        .await;
    assert_eq!(text, "Error: Invalid location: Atlantis");
}

#[tokio::test]
async fn test_forecast_date_and_rate_limit() {
    let harness = Harness::start().await;

    Mock::given(method("GET"))
        .and(path("/forecast.json"))
        .and(query_param("days", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "location": {"name": "Singapore"},
            "forecast": {"forecastday": [
                {"date": "2025-10-15", "day": {
                    "maxtemp_c": 31.0, "mintemp_c": 25.0, "avgtemp_c": 28.0,
                    "condition": {"text": "Sunny"}
                }},
                {"date": "2025-10-16", "day": {
                    "maxtemp_c": 30.0, "mintemp_c": 24.0, "avgtemp_c": 27.0,
                    "condition": {"text": "Cloudy"}
                }},
                {"date": "2025-10-17", "day": {
                    "maxtemp_c": 29.0, "mintemp_c": 24.5, "avgtemp_c": 26.1,
                    "condition": {"text": "Heavy rain"}
                }}
            ]}
        })))
        .expect(1)
        .mount(&harness.weather)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("Weather Forecast: Heavy rain"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": {"message": "Rate limit reached"}
        })))
        .expect(1)
        .mount(&harness.model)
        .await;

    let date = NaiveDate::from_ymd_opt(2025, 10, 17).unwrap();
    let text = harness
        .orchestrator()
        .recommend_text("Singapore", date, None)
        .await;
    assert!(text.starts_with("Error: "));
    assert!(text.contains("rate limit exceeded"));
}

#[tokio::test]
async fn test_http_chat_round_trip() {
    let harness = Harness::start().await;
    harness.mount_sunny_weather().await;
    harness.mount_completion("  Jazz Night is a great pick.  ").await;

    let state = AppState {
        today: NaiveDate::from_ymd_opt(2025, 10, 18),
        ..AppState::new(
            Some(Arc::new(harness.orchestrator())),
            harness.catalog.clone(),
            "Singapore",
        )
    };
    let app = web::app(state, Duration::from_secs(10));

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/chat")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"message": "Plans for tonight?", "event_type": "indoor"}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "success");
    assert_eq!(body["response"], "Jazz Night is a great pick.");
    // forecast.json is not mocked
    assert_eq!(body["warnings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_date_returns_no_events_message() {
    let harness = Harness::start().await;
    harness.mount_sunny_weather().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&harness.model)
        .await;

    let past = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
    let text = harness
        .orchestrator()
        .recommend_text("Singapore", past, None)
        .await;
    assert_eq!(text, "No events found for 2025-09-01.");
}
