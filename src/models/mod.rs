//! Data models for the EventWise pipeline
//!
//! This module contains the core domain models organized by concern:
//! - Event: scheduled events read from the catalog
//! - Weather: normalized current or forecast snapshots

pub mod event;
pub mod weather;

// Re-export all public types for convenient access
pub use event::{Event, EventType};
pub use weather::{Reading, WeatherSnapshot};
