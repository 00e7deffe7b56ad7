//! Aggregate counts over the catalog

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::{Connection, Params, params};
use serde::Serialize;

use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub total_events: u64,
    /// Counts keyed by `indoor`/`outdoor`
    pub by_type: BTreeMap<String, u64>,
    /// Counts keyed by `YYYY-MM-DD`, oldest first
    pub by_date: BTreeMap<String, u64>,
    /// Events on or after today
    pub upcoming_events: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub count: u64,
}

fn grouped_counts(conn: &Connection, sql: &str) -> Result<BTreeMap<String, u64>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;
    let mut counts = BTreeMap::new();
    while let Some(row) = rows.next()? {
        let key: Option<String> = row.get(0)?;
        let count: i64 = row.get(1)?;
        counts.insert(key.unwrap_or_default(), count.max(0) as u64);
    }
    Ok(counts)
}

fn count<P: Params>(conn: &Connection, sql: &str, params: P) -> Result<u64> {
    let count: i64 = conn.query_row(sql, params, |row| row.get(0))?;
    Ok(count.max(0) as u64)
}

pub(crate) fn summary(conn: &Connection, today: NaiveDate) -> Result<CatalogSummary> {
    let today = today.format("%Y-%m-%d").to_string();
    let total = count(conn, "SELECT COUNT(*) FROM events", [])?;
    let upcoming_sql = "SELECT COUNT(*) FROM events WHERE date >= ?1";
    let upcoming = count(conn, upcoming_sql, params![today])?;

    Ok(CatalogSummary {
        total_events: total,
        by_type: grouped_counts(conn, "SELECT type, COUNT(*) FROM events GROUP BY type")?,
        by_date: grouped_counts(
            conn,
            "SELECT date, COUNT(*) FROM events GROUP BY date ORDER BY date",
        )?,
        upcoming_events: upcoming,
    })
}

pub(crate) fn popular_locations(conn: &Connection, limit: usize) -> Result<Vec<LocationCount>> {
    let mut stmt = conn.prepare(
        "SELECT location, COUNT(*) AS count
         FROM events
         GROUP BY location
         ORDER BY count DESC, location ASC
         LIMIT ?1",
    )?;
    let mut rows = stmt.query(params![i64::try_from(limit).unwrap_or(i64::MAX)])?;

    let mut locations = Vec::new();
    while let Some(row) = rows.next()? {
        let location: Option<String> = row.get(0)?;
        let count: i64 = row.get(1)?;
        locations.push(LocationCount {
            location: location.unwrap_or_default(),
            count: count.max(0) as u64,
        });
    }
    Ok(locations)
}
