//! Event catalog backed by SQLite
//!
//! Every operation opens its own connection on a blocking thread and closes it
//! before returning. Reads open the file read-only; only schema creation and
//! seeding write.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, OpenFlags, Row, params_from_iter};
use tokio::task;
use tracing::{debug, info, instrument};

use crate::models::{Event, EventType};
use crate::{EventWiseError, Result};

pub mod filter;
pub mod schema;
pub mod stats;

pub use filter::{EventFilter, TimePeriod};
pub use schema::NewEvent;
pub use stats::{CatalogSummary, LocationCount};

/// Capacity bound per day for [`EventCatalog::upcoming`]
pub const EVENTS_PER_DAY: usize = 10;

/// Source of events for a single date, the seam the orchestrator reads through
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Events on `date`, ascending by time. Unknown `event_type` values are ignored.
    async fn events_on(&self, date: NaiveDate, event_type: Option<&str>) -> Result<Vec<Event>>;
}

#[derive(Debug, Clone)]
pub struct EventCatalog {
    db_path: Arc<PathBuf>,
}

fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| EventWiseError::catalog(format!("invalid date '{value}': {e}")))
}

fn parse_time(value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|e| EventWiseError::catalog(format!("invalid time '{value}': {e}")))
}

fn open_error(path: &Path, e: rusqlite::Error) -> EventWiseError {
    EventWiseError::catalog(format!("cannot open {}: {e}", path.display()))
}

fn dir_error(dir: &Path, e: std::io::Error) -> EventWiseError {
    EventWiseError::catalog(format!("cannot create {}: {e}", dir.display()))
}

fn row_to_event(row: &Row) -> Result<Event> {
    let raw_type: String = row.get("type")?;
    let description: Option<String> = row.get("description")?;
    let location: Option<String> = row.get("location")?;
    let date: String = row.get("date")?;
    let time: Option<String> = row.get("time")?;

    let event_type = raw_type
        .parse::<EventType>()
        .map_err(|e| EventWiseError::catalog(e.to_string()))?;

    Ok(Event {
        id: row.get("id")?,
        name: row.get("name")?,
        event_type,
        description: description.unwrap_or_default(),
        location: location.unwrap_or_default(),
        date: parse_date(&date)?,
        time: time.as_deref().map(parse_time).transpose()?,
        price_range: row.get("price_range")?,
    })
}

impl EventCatalog {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on a fresh read-only connection
    async fn read<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            let conn = Connection::open_with_flags(path.as_path(), flags)
                .map_err(|e| open_error(&path, e))?;
            task(&conn)
        })
        .await
        .map_err(|e| EventWiseError::catalog(format!("catalog task failed: {e}")))?
    }

    /// Run `task` on a fresh read-write connection, creating the file if needed
    async fn write<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let path = self.db_path.clone();
        task::spawn_blocking(move || {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| dir_error(parent, e))?;
            }
            let mut conn = Connection::open(path.as_path())?;
            task(&mut conn)
        })
        .await
        .map_err(|e| EventWiseError::catalog(format!("catalog task failed: {e}")))?
    }

    /// Create the events table if it does not exist
    pub async fn initialize(&self) -> Result<()> {
        self.write(|conn| schema::create_tables(conn)).await?;
        info!("Event catalog ready at {}", self.db_path.display());
        Ok(())
    }

    /// Replace the catalog contents with the sample events around `base_date`
    pub async fn seed_sample_events(&self, base_date: NaiveDate) -> Result<usize> {
        let events = schema::sample_events(base_date);
        let count = self
            .write(move |conn| {
                schema::create_tables(conn)?;
                conn.execute("DELETE FROM events", [])?;
                schema::insert_all(conn, &events)
            })
            .await?;
        info!("Seeded {} sample events from {}", count, base_date);
        Ok(count)
    }

    /// Append events, creating the table if needed
    pub async fn insert_events(&self, events: Vec<NewEvent>) -> Result<usize> {
        self.write(move |conn| {
            schema::create_tables(conn)?;
            schema::insert_all(conn, &events)
        })
        .await
    }

    /// Events on `date`, optionally restricted to `indoor`/`outdoor`.
    ///
    /// A type value that is neither is ignored, not rejected.
    #[instrument(skip(self))]
    pub async fn query(&self, date: NaiveDate, event_type: Option<&str>) -> Result<Vec<Event>> {
        let event_type = event_type.and_then(|raw| match raw.parse::<EventType>() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                debug!("Ignoring unknown event type filter '{}'", raw);
                None
            }
        });

        self.search(&EventFilter::on(date).with_type(event_type))
            .await
    }

    /// Up to `days * 10` events from `today` onward
    pub async fn upcoming(&self, today: NaiveDate, days: u32) -> Result<Vec<Event>> {
        let days = usize::try_from(days).unwrap_or(usize::MAX);
        self.upcoming_with_limit(today, days.saturating_mul(EVENTS_PER_DAY))
            .await
    }

    pub async fn upcoming_with_limit(&self, today: NaiveDate, limit: usize) -> Result<Vec<Event>> {
        self.search(&EventFilter::from(today).limit(limit)).await
    }

    /// Run a structured filter, ordered by date then time
    #[instrument(skip(self))]
    pub async fn search(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let (sql, params) = filter.build_query();
        let events = self
            .read(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query(params_from_iter(params.iter()))?;
                let mut events = Vec::new();
                while let Some(row) = rows.next()? {
                    events.push(row_to_event(row)?);
                }
                Ok(events)
            })
            .await?;

        let events = filter.apply_post_filters(events);
        debug!("Catalog returned {} events", events.len());
        Ok(events)
    }

    pub async fn summary(&self, today: NaiveDate) -> Result<CatalogSummary> {
        self.read(move |conn| stats::summary(conn, today)).await
    }

    /// Locations hosting the most events, busiest first
    pub async fn popular_locations(&self, limit: usize) -> Result<Vec<LocationCount>> {
        self.read(move |conn| stats::popular_locations(conn, limit))
            .await
    }
}

#[async_trait]
impl EventSource for EventCatalog {
    async fn events_on(&self, date: NaiveDate, event_type: Option<&str>) -> Result<Vec<Event>> {
        self.query(date, event_type).await
    }
}
