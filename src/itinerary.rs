//! Multi-day plans and daily schedules built on the pipeline and catalog

use chrono::{Duration, NaiveDate};
use serde::Serialize;
use tracing::info;

use crate::Result;
use crate::catalog::{EventCatalog, EventFilter, TimePeriod};
use crate::models::Event;
use crate::orchestrator::Orchestrator;

/// Days covered by a weekend plan, starting on the given day
pub const WEEKEND_DAYS: i64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayPlan {
    /// e.g. `Friday (2025-10-17)`
    pub label: String,
    pub date: NaiveDate,
    /// Recommendation text, or `Error: <message>` for that day
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailySchedule {
    pub date: Option<NaiveDate>,
    pub morning: Vec<Event>,
    pub afternoon: Vec<Event>,
    pub evening: Vec<Event>,
}

impl DailySchedule {
    #[must_use]
    pub fn period(&self, period: TimePeriod) -> &[Event] {
        match period {
            TimePeriod::Morning => &self.morning,
            TimePeriod::Afternoon => &self.afternoon,
            TimePeriod::Evening => &self.evening,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        TimePeriod::ALL.iter().all(|p| self.period(*p).is_empty())
    }
}

/// The upcoming Friday, a full week ahead when `today` is already Friday
#[must_use]
pub fn next_friday(today: NaiveDate) -> NaiveDate {
    use chrono::Datelike;
    let days = (4 + 7 - i64::from(today.weekday().num_days_from_monday())) % 7;
    today + Duration::days(if days == 0 { 7 } else { days })
}

/// Recommendations for three consecutive days from `start`.
///
/// A failing day carries its error text and does not abort the others.
pub async fn weekend_plan(
    orchestrator: &Orchestrator,
    location: &str,
    start: NaiveDate,
) -> Vec<DayPlan> {
    let mut plan = Vec::with_capacity(WEEKEND_DAYS as usize);

    for offset in 0..WEEKEND_DAYS {
        let date = start + Duration::days(offset);
        let recommendation = orchestrator.recommend_text(location, date, None).await;
        plan.push(DayPlan {
            label: format!("{} ({})", date.format("%A"), date),
            date,
            recommendation,
        });
    }

    info!("Built weekend plan for {} from {}", location, start);
    plan
}

/// Events on `date` bucketed into morning, afternoon and evening.
///
/// Events without a start time are left out.
pub async fn daily_schedule(catalog: &EventCatalog, date: NaiveDate) -> Result<DailySchedule> {
    let mut schedule = DailySchedule {
        date: Some(date),
        ..DailySchedule::default()
    };

    for event in catalog.search(&EventFilter::on(date)).await? {
        let Some(time) = event.time else {
            continue;
        };
        match TimePeriod::ALL.into_iter().find(|p| p.contains(time)) {
            Some(TimePeriod::Morning) => schedule.morning.push(event),
            Some(TimePeriod::Afternoon) => schedule.afternoon.push(event),
            Some(TimePeriod::Evening) => schedule.evening.push(event),
            None => {}
        }
    }

    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::NewEvent;
    use crate::models::EventType;
    use crate::orchestrator::testing::{FakeEvents, FakeWeather};
    use crate::recommend::RecommendationGenerator;
    use crate::recommend::testing::FakeChatModel;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 17).unwrap()
    }

    #[tokio::test]
    async fn test_weekend_plan_covers_three_days() {
        let catalog_events: Vec<Event> = (0..3)
            .map(|offset| Event {
                id: offset,
                name: format!("Event {offset}"),
                event_type: EventType::Outdoor,
                description: "Fun".into(),
                location: "Park".into(),
                date: friday() + Duration::days(offset),
                time: None,
                price_range: None,
            })
            .collect();

        let model = Arc::new(FakeChatModel::answering("Go outside."));
        let orchestrator = Orchestrator::new(
            Arc::new(FakeWeather::sunny()),
            Arc::new(FakeEvents::with(catalog_events)),
            RecommendationGenerator::new(model.clone()),
        );

        let plan = weekend_plan(&orchestrator, "Singapore", friday()).await;

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].label, "Friday (2025-10-17)");
        assert_eq!(plan[1].label, "Saturday (2025-10-18)");
        assert_eq!(plan[2].label, "Sunday (2025-10-19)");
        let consecutive = |w: &[DayPlan]| w[1].date == w[0].date + Duration::days(1);
        assert!(plan.windows(2).all(consecutive));
        assert!(plan.iter().all(|d| d.recommendation == "Go outside."));
        assert_eq!(model.calls(), 3);
    }

    #[tokio::test]
    async fn test_weekend_plan_keeps_going_after_a_failed_day() {
        let orchestrator = Orchestrator::new(
            Arc::new(FakeWeather::rejecting_location()),
            Arc::new(FakeEvents::default()),
            RecommendationGenerator::new(Arc::new(FakeChatModel::answering("unused"))),
        );

        let plan = weekend_plan(&orchestrator, "Atlantis", friday()).await;
        assert_eq!(plan.len(), 3);
        let failed = |d: &DayPlan| d.recommendation.starts_with("Error: Invalid location");
        assert!(plan.iter().all(failed));
    }

    #[test]
    fn test_next_friday() {
        let wednesday = NaiveDate::from_ymd_opt(2025, 10, 15).unwrap();
        assert_eq!(next_friday(wednesday), friday());
        assert_eq!(next_friday(friday()), friday() + Duration::days(7));
        assert_eq!(
            next_friday(friday() + Duration::days(1)),
            friday() + Duration::days(7)
        );
    }

    #[tokio::test]
    async fn test_daily_schedule_buckets() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = EventCatalog::new(dir.path().join("events.db"));
        let date = friday();
        let event = |name: &str, time: &str| {
            NewEvent::new(name, EventType::Indoor, "Details", "Hall", date).at(time)
        };
        let untimed = NewEvent::new("Untimed Fair", EventType::Outdoor, "Fair", "Square", date);
        let events = vec![
            event("Sunrise Run", "06:30"),
            event("Lunch Talk", "12:00"),
            event("Gallery Walk", "16:59"),
            event("Fireworks", "21:00"),
            event("Sunset Walk", "17:00"),
            untimed,
        ];
        catalog.insert_events(events).await.unwrap();

        let schedule = daily_schedule(&catalog, date).await.unwrap();
        let names = |events: &[Event]| events.iter().map(|e| e.name.clone()).collect::<Vec<_>>();

        assert_eq!(names(&schedule.morning), vec!["Sunrise Run"]);
        assert_eq!(names(&schedule.afternoon), ["Lunch Talk", "Gallery Walk"]);
        assert_eq!(names(&schedule.evening), ["Sunset Walk", "Fireworks"]);

        let tomorrow = date + Duration::days(1);
        let empty = daily_schedule(&catalog, tomorrow).await.unwrap();
        assert!(empty.is_empty());
    }
}
