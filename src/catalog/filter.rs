//! Structured event filter and the single query builder behind every catalog read

use std::fmt::Display;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

use crate::EventWiseError;
use crate::models::{Event, EventType};

pub(crate) const SELECT_EVENTS: &str =
    "SELECT id, name, type, description, location, date, time, price_range FROM events";

/// Part of the day an event starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimePeriod {
    /// Before 12:00
    Morning,
    /// 12:00 up to 17:00
    Afternoon,
    /// From 17:00
    Evening,
}

impl TimePeriod {
    pub const ALL: [TimePeriod; 3] = [
        TimePeriod::Morning,
        TimePeriod::Afternoon,
        TimePeriod::Evening,
    ];

    /// `time` is stored as zero-padded `HH:MM` text, so string comparison orders correctly
    fn sql_clause(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "time < '12:00'",
            TimePeriod::Afternoon => "time >= '12:00' AND time < '17:00'",
            TimePeriod::Evening => "time >= '17:00'",
        }
    }

    /// Whether an event starting at `time` falls in this period
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();
        let five = NaiveTime::from_hms_opt(17, 0, 0).unwrap_or_default();
        match self {
            TimePeriod::Morning => time < noon,
            TimePeriod::Afternoon => time >= noon && time < five,
            TimePeriod::Evening => time >= five,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TimePeriod::Morning => "morning",
            TimePeriod::Afternoon => "afternoon",
            TimePeriod::Evening => "evening",
        }
    }
}

impl FromStr for TimePeriod {
    type Err = EventWiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(TimePeriod::Morning),
            "afternoon" => Ok(TimePeriod::Afternoon),
            "evening" => Ok(TimePeriod::Evening),
            other => Err(EventWiseError::validation(format!(
                "Period must be 'morning', 'afternoon', or 'evening', got '{other}'"
            ))),
        }
    }
}

impl Display for TimePeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every way the catalog can be narrowed down. All criteria combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventFilter {
    /// Exact date
    pub date: Option<NaiveDate>,
    /// Earliest date, inclusive
    pub from_date: Option<NaiveDate>,
    pub event_type: Option<EventType>,
    pub period: Option<TimePeriod>,
    /// Substring of name or description
    pub keyword: Option<String>,
    /// Upper bound on [`Event::min_price`]
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

impl EventFilter {
    /// Events on exactly `date`
    #[must_use]
    pub fn on(date: NaiveDate) -> Self {
        Self {
            date: Some(date),
            ..Self::default()
        }
    }

    /// Events on or after `date`
    #[must_use]
    pub fn from(date: NaiveDate) -> Self {
        Self {
            from_date: Some(date),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, event_type: Option<EventType>) -> Self {
        self.event_type = event_type;
        self
    }

    #[must_use]
    pub fn in_period(mut self, period: TimePeriod) -> Self {
        self.period = Some(period);
        self
    }

    #[must_use]
    pub fn matching(mut self, keyword: impl Into<String>) -> Self {
        let keyword: String = keyword.into();
        let trimmed = keyword.trim();
        self.keyword = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    #[must_use]
    pub fn max_price(mut self, max_price: f64) -> Self {
        self.max_price = Some(max_price);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// SQL text and positional parameters for this filter.
    ///
    /// The price bound is not expressible over the free-text column, so when it
    /// is set the limit moves to [`EventFilter::apply_post_filters`] too.
    pub(crate) fn build_query(&self) -> (String, Vec<Value>) {
        let mut clauses: Vec<String> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(date) = self.date {
            clauses.push("date = ?".to_string());
            params.push(Value::Text(date.format("%Y-%m-%d").to_string()));
        }
        if let Some(from_date) = self.from_date {
            clauses.push("date >= ?".to_string());
            params.push(Value::Text(from_date.format("%Y-%m-%d").to_string()));
        }
        if let Some(event_type) = self.event_type {
            clauses.push("type = ?".to_string());
            params.push(Value::Text(event_type.as_str().to_string()));
        }
        if let Some(period) = self.period {
            clauses.push(format!("({})", period.sql_clause()));
        }
        if let Some(keyword) = &self.keyword {
            clauses.push("(name LIKE ? OR description LIKE ?)".to_string());
            let pattern = format!("%{keyword}%");
            params.push(Value::Text(pattern.clone()));
            params.push(Value::Text(pattern));
        }

        let mut sql = SELECT_EVENTS.to_string();
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY date, time");

        if let (Some(limit), None) = (self.limit, self.max_price) {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        (sql, params)
    }

    /// Criteria applied after the read
    pub(crate) fn apply_post_filters(&self, events: Vec<Event>) -> Vec<Event> {
        let Some(max_price) = self.max_price else {
            return events;
        };

        let affordable = events
            .into_iter()
            .filter(|event| event.min_price().is_some_and(|price| price <= max_price));

        match self.limit {
            Some(limit) => affordable.take(limit).collect(),
            None => affordable.collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 15).unwrap()
    }

    #[test]
    fn test_date_and_type_query() {
        let (sql, params) = EventFilter::on(date())
            .with_type(Some(EventType::Indoor))
            .build_query();
        assert_eq!(
            sql,
            format!("{SELECT_EVENTS} WHERE date = ? AND type = ? ORDER BY date, time")
        );
        assert_eq!(params.len(), 2);
        assert_eq!(params[0], Value::Text("2025-10-15".into()));
        assert_eq!(params[1], Value::Text("indoor".into()));
    }

    #[test]
    fn test_unfiltered_query() {
        let (sql, params) = EventFilter::default().build_query();
        assert_eq!(sql, format!("{SELECT_EVENTS} ORDER BY date, time"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_keyword_and_period() {
        let (sql, params) = EventFilter::on(date())
            .in_period(TimePeriod::Afternoon)
            .matching("music")
            .build_query();
        assert!(sql.contains("(time >= '12:00' AND time < '17:00')"));
        assert!(sql.contains("(name LIKE ? OR description LIKE ?)"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[1], Value::Text("%music%".into()));
    }

    #[test]
    fn test_blank_keyword_is_ignored() {
        assert_eq!(EventFilter::default().matching("  ").keyword, None);
    }

    #[test]
    fn test_limit_in_sql_without_price() {
        let (sql, params) = EventFilter::from(date()).limit(70).build_query();
        assert!(sql.ends_with("ORDER BY date, time LIMIT ?"));
        assert_eq!(params.last(), Some(&Value::Integer(70)));
    }

    #[test]
    fn test_limit_moves_after_price_filter() {
        let (sql, _) = EventFilter::from(date())
            .max_price(20.0)
            .limit(5)
            .build_query();
        assert!(!sql.contains("LIMIT"));
    }

    #[rstest]
    #[case(TimePeriod::Morning, 7, true)]
    #[case(TimePeriod::Morning, 12, false)]
    #[case(TimePeriod::Afternoon, 12, true)]
    #[case(TimePeriod::Afternoon, 17, false)]
    #[case(TimePeriod::Evening, 17, true)]
    #[case(TimePeriod::Evening, 16, false)]
    fn test_period_bounds(#[case] period: TimePeriod, #[case] hour: u32, #[case] expected: bool) {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        assert_eq!(period.contains(time), expected);
    }

    #[test]
    fn test_period_parsing() {
        let evening: TimePeriod = "Evening".parse().unwrap();
        assert_eq!(evening, TimePeriod::Evening);
        assert!("midnight".parse::<TimePeriod>().is_err());
    }
}
