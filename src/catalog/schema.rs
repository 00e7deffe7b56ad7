//! Events table layout and sample data

use chrono::{Duration, NaiveDate, NaiveTime};
use rusqlite::{Connection, params};

use crate::Result;
use crate::models::EventType;

pub(crate) const CREATE_EVENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        type TEXT CHECK(type IN ('indoor', 'outdoor')),
        description TEXT,
        location TEXT,
        date TEXT NOT NULL,
        time TEXT,
        price_range TEXT
    )";

/// An event before the store assigns it an id
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub event_type: EventType,
    pub description: String,
    pub location: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub price_range: Option<String>,
}

impl NewEvent {
    #[must_use]
    pub fn new(
        name: &str,
        event_type: EventType,
        description: &str,
        location: &str,
        date: NaiveDate,
    ) -> Self {
        Self {
            name: name.to_string(),
            event_type,
            description: description.to_string(),
            location: location.to_string(),
            date,
            time: None,
            price_range: None,
        }
    }

    /// Set the start time from `HH:MM`; an unparseable value leaves it unset
    #[must_use]
    pub fn at(mut self, hhmm: &str) -> Self {
        self.time = NaiveTime::parse_from_str(hhmm, "%H:%M").ok();
        self
    }

    #[must_use]
    pub fn priced(mut self, price_range: &str) -> Self {
        self.price_range = Some(price_range.to_string());
        self
    }
}

pub(crate) fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_EVENTS_TABLE)?;
    Ok(())
}

pub(crate) fn insert_all(conn: &mut Connection, events: &[NewEvent]) -> Result<usize> {
    let tx = conn.transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO events (name, type, description, location, date, time, price_range)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )?;
        for event in events {
            stmt.execute(params![
                event.name,
                event.event_type.as_str(),
                event.description,
                event.location,
                event.date.format("%Y-%m-%d").to_string(),
                event.time.map(|t| t.format("%H:%M").to_string()),
                event.price_range,
            ])?;
        }
    }
    tx.commit()?;
    Ok(events.len())
}

/// Two events per day over four days starting at `base`
#[must_use]
pub fn sample_events(base: NaiveDate) -> Vec<NewEvent> {
    let day = |offset: i64| base + Duration::days(offset);
    vec![
        NewEvent::new(
            "Summer Concert",
            EventType::Outdoor,
            "Live music in the park",
            "Central Park",
            day(0),
        )
        .at("18:00")
        .priced("Free"),
        NewEvent::new(
            "Art Exhibition",
            EventType::Indoor,
            "Modern art showcase",
            "City Gallery",
            day(0),
        )
        .at("10:00")
        .priced("$15-25"),
        NewEvent::new(
            "Food Festival",
            EventType::Outdoor,
            "International cuisine",
            "Waterfront",
            day(1),
        )
        .at("11:00")
        .priced("$20-50"),
        NewEvent::new(
            "Theater Show",
            EventType::Indoor,
            "Classical drama",
            "Grand Theater",
            day(1),
        )
        .at("19:30")
        .priced("$30-80"),
        NewEvent::new(
            "Yoga in the Park",
            EventType::Outdoor,
            "Morning yoga session",
            "Botanical Gardens",
            day(2),
        )
        .at("07:00")
        .priced("Free"),
        NewEvent::new(
            "Museum Tour",
            EventType::Indoor,
            "Historical artifacts exhibition",
            "National Museum",
            day(2),
        )
        .at("14:00")
        .priced("$10-20"),
        NewEvent::new(
            "Night Market",
            EventType::Outdoor,
            "Street food and crafts",
            "Market Square",
            day(3),
        )
        .at("17:00")
        .priced("Free entry"),
        NewEvent::new(
            "Jazz Night",
            EventType::Indoor,
            "Live jazz performance",
            "Blue Note Club",
            day(3),
        )
        .at("20:00")
        .priced("$25-40"),
    ]
}
