//! Weather snapshot model and display methods

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The two mutually exclusive shapes a snapshot can take
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reading {
    /// Single reading for "now"
    Point {
        /// Temperature in Celsius
        temperature_c: f32,
        /// Relative humidity percentage
        humidity: u8,
    },
    /// Aggregate for one forecasted day
    DayAggregate { min_c: f32, max_c: f32, avg_c: f32 },
}

/// Normalized weather for one location, built fresh per request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Location label as resolved by the provider
    pub location: String,
    /// Human-readable description of weather conditions
    pub condition: String,
    pub reading: Reading,
    /// Whether the data comes from the forecast endpoint
    pub is_forecast: bool,
    /// Set when the requested date lies outside the forecast window and
    /// current conditions were returned instead
    pub requested_date_mismatch: Option<NaiveDate>,
}

impl WeatherSnapshot {
    #[must_use]
    pub fn point(location: String, condition: String, temperature_c: f32, humidity: u8) -> Self {
        Self {
            location,
            condition,
            reading: Reading::Point {
                temperature_c,
                humidity,
            },
            is_forecast: false,
            requested_date_mismatch: None,
        }
    }

    #[must_use]
    pub fn day_aggregate(
        location: String,
        condition: String,
        min_c: f32,
        max_c: f32,
        avg_c: f32,
    ) -> Self {
        Self {
            location,
            condition,
            reading: Reading::DayAggregate {
                min_c,
                max_c,
                avg_c,
            },
            is_forecast: true,
            requested_date_mismatch: None,
        }
    }

    /// Mark a current-conditions snapshot as standing in for `date`
    #[must_use]
    pub fn standing_in_for(mut self, date: NaiveDate) -> Self {
        self.requested_date_mismatch = Some(date);
        self
    }

    /// Warning text for a date mismatch, if any
    #[must_use]
    pub fn mismatch_warning(&self) -> Option<String> {
        self.requested_date_mismatch.map(|date| {
            format!("No forecast available for {date}; showing current conditions instead")
        })
    }

    /// Format a temperature with unit
    #[must_use]
    pub fn format_temperature(celsius: f32) -> String {
        format!("{celsius:.1}°C")
    }
}
