//! Scheduled event model

use std::fmt::Display;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::EventWiseError;

/// Where an event takes place, as far as the weather is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventType {
    Indoor,
    Outdoor,
}

impl EventType {
    /// Value stored in the `type` column
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Indoor => "indoor",
            EventType::Outdoor => "outdoor",
        }
    }

    /// Upper-cased label used in prompts
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Indoor => "INDOOR",
            EventType::Outdoor => "OUTDOOR",
        }
    }
}

impl FromStr for EventType {
    type Err = EventWiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "indoor" => Ok(EventType::Indoor),
            "outdoor" => Ok(EventType::Outdoor),
            other => {
                let message = format!("Event type must be 'indoor' or 'outdoor', got '{other}'");
                Err(EventWiseError::validation(message))
            }
        }
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled event from the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub description: String,
    /// Free-text venue
    pub location: String,
    pub date: NaiveDate,
    /// Start time, when the event has one
    #[serde(with = "hhmm", default)]
    pub time: Option<NaiveTime>,
    /// Free-text price such as "Free" or "$15-25"
    pub price_range: Option<String>,
}

impl Event {
    /// Start time formatted as `HH:MM`
    #[must_use]
    pub fn time_label(&self) -> Option<String> {
        self.time.map(|t| t.format("%H:%M").to_string())
    }

    /// Lowest price mentioned in the price range.
    ///
    /// "Free" and "Free entry" count as 0. "$15-25" gives 15.
    #[must_use]
    pub fn min_price(&self) -> Option<f64> {
        let price = self.price_range.as_deref()?;
        if price.to_ascii_lowercase().contains("free") {
            return Some(0.0);
        }

        let number: String = price
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        number.parse().ok()
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.event_type)?;
        if let Some(time) = self.time_label() {
            write!(f, " {} {}", self.date, time)?;
        } else {
            write!(f, " {}", self.date)?;
        }
        write!(f, " @ {}", self.location)
    }
}

/// `Option<NaiveTime>` as `"HH:MM"`, the format used by the store
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(time: &Option<NaiveTime>, s: S) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => s.serialize_str(&t.format("%H:%M").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        raw.map(|s| NaiveTime::parse_from_str(&s, "%H:%M").map_err(serde::de::Error::custom))
            .transpose()
    }
}
