//! `EventWise` - Weather-aware local event recommendations
//!
//! This library looks up the weather for a location and date, reads the
//! events scheduled for that date, and asks a language model to recommend
//! which of them to attend.

pub mod api;
pub mod catalog;
pub mod config;
pub mod error;
pub mod itinerary;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod recommend;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use api::AppState;
pub use catalog::{EventCatalog, EventFilter, EventSource, TimePeriod};
pub use config::EventWiseConfig;
pub use error::EventWiseError;
pub use models::{Event, EventType, Reading, WeatherSnapshot};
pub use orchestrator::{Orchestrator, Outcome, Recommendation, RecommendationRequest};
pub use recommend::{ChatModel, OpenAiChatModel, RecommendationGenerator};
pub use weather::{WeatherApiClient, WeatherProvider};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, EventWiseError>;
