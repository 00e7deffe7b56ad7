use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};

use crate::{
    EventWiseError,
    catalog::{CatalogSummary, EventCatalog, EventFilter, LocationCount, TimePeriod},
    itinerary::{self, DailySchedule, DayPlan},
    models::{Event, EventType},
    orchestrator::{Orchestrator, RecommendationRequest},
};

/// Default window for `/events/upcoming`
const DEFAULT_UPCOMING_DAYS: u32 = 7;
const POPULAR_LOCATIONS: usize = 5;

/// Shared handler state, built once at startup
#[derive(Clone)]
pub struct AppState {
    /// `None` until the pipeline is configured; chat answers 503 meanwhile
    pub orchestrator: Option<Arc<Orchestrator>>,
    pub catalog: EventCatalog,
    pub default_location: String,
    /// Fixed "today", used by tests
    pub today: Option<NaiveDate>,
}

impl AppState {
    pub fn new(
        orchestrator: Option<Arc<Orchestrator>>,
        catalog: EventCatalog,
        default_location: impl Into<String>,
    ) -> Self {
        Self {
            orchestrator,
            catalog,
            default_location: default_location.into(),
            today: None,
        }
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    fn orchestrator(&self) -> Result<&Orchestrator, ApiError> {
        self.orchestrator
            .as_deref()
            .ok_or(ApiError::NotInitialized)
    }
}

/// Error half of every handler result
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    NotInitialized,
    Pipeline(EventWiseError),
}

impl From<EventWiseError> for ApiError {
    fn from(err: EventWiseError) -> Self {
        match err {
            EventWiseError::Validation { message } => ApiError::BadRequest(message),
            other => ApiError::Pipeline(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                let body = json!({ "error": message });
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            ApiError::NotInitialized => {
                let body = json!({ "error": "System not initialized. Please check server logs." });
                (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response()
            }
            ApiError::Pipeline(err) => {
                error!("Request failed: {}", err);
                let body = json!({ "error": err.to_string(), "code": err.code() });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

fn parse_date(raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("Invalid date '{raw}', expected YYYY-MM-DD")))
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty());
    raw.map(parse_date).transpose()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/health", get(health))
        .route("/events", get(list_events))
        .route("/events/upcoming", get(upcoming_events))
        .route("/stats", get(stats))
        .route("/itinerary/weekend", get(weekend))
        .route("/itinerary/schedule", get(schedule))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    pub location: Option<String>,
    pub date: Option<String>,
    pub event_type: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub status: &'static str,
    pub warnings: Vec<String>,
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<ChatResponse> {
    let Json(payload) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let message = payload.message.as_deref().map(str::trim);
    if message.is_none_or(str::is_empty) {
        return Err(ApiError::BadRequest("Message is required".to_string()));
    }

    let orchestrator = state.orchestrator()?;
    let date = parse_optional_date(payload.date.as_deref())?
        .unwrap_or_else(|| state.today());
    let location = payload
        .location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.default_location.clone());

    info!("Chat request for {} on {}", location, date);
    let request = RecommendationRequest::new(location, date).with_event_type(payload.event_type);
    let recommendation = orchestrator.recommend(&request).await?;

    Ok(Json(ChatResponse {
        response: recommendation.text,
        status: "success",
        warnings: recommendation.warnings,
    }))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

#[derive(Debug, Default, Deserialize)]
pub struct EventsQuery {
    pub date: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub period: Option<String>,
    pub keyword: Option<String>,
    pub max_price: Option<f64>,
    pub limit: Option<usize>,
}

impl EventsQuery {
    /// Exact date when given, otherwise everything from `today` on
    fn to_filter(&self, today: NaiveDate) -> Result<EventFilter, ApiError> {
        let mut filter = match parse_optional_date(self.date.as_deref())? {
            Some(date) => EventFilter::on(date),
            None => EventFilter::from(today),
        };

        if let Some(raw) = self.event_type.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.with_type(Some(raw.parse::<EventType>()?));
        }
        if let Some(raw) = self.period.as_deref().filter(|s| !s.is_empty()) {
            filter = filter.in_period(raw.parse::<TimePeriod>()?);
        }
        if let Some(keyword) = &self.keyword {
            filter = filter.matching(keyword.as_str());
        }
        if let Some(max_price) = self.max_price {
            if max_price < 0.0 {
                let message = "max_price must not be negative".to_string();
                return Err(ApiError::BadRequest(message));
            }
            filter = filter.max_price(max_price);
        }
        if let Some(limit) = self.limit {
            filter = filter.limit(limit);
        }
        Ok(filter)
    }
}

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> ApiResult<Vec<Event>> {
    let filter = query.to_filter(state.today())?;
    Ok(Json(state.catalog.search(&filter).await?))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<u32>,
}

async fn upcoming_events(
    State(state): State<AppState>,
    Query(query): Query<UpcomingQuery>,
) -> ApiResult<Vec<Event>> {
    let days = query.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    Ok(Json(state.catalog.upcoming(state.today(), days).await?))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub summary: CatalogSummary,
    pub popular_locations: Vec<LocationCount>,
}

async fn stats(State(state): State<AppState>) -> ApiResult<StatsResponse> {
    let summary = state.catalog.summary(state.today()).await?;
    let popular_locations = state.catalog.popular_locations(POPULAR_LOCATIONS).await?;
    Ok(Json(StatsResponse {
        summary,
        popular_locations,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WeekendQuery {
    pub location: Option<String>,
    pub start: Option<String>,
}

async fn weekend(
    State(state): State<AppState>,
    Query(query): Query<WeekendQuery>,
) -> ApiResult<Vec<DayPlan>> {
    let orchestrator = state.orchestrator()?;
    let start = parse_optional_date(query.start.as_deref())?
        .unwrap_or_else(|| itinerary::next_friday(state.today()));
    let location = query
        .location
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.default_location.clone());

    Ok(Json(itinerary::weekend_plan(orchestrator, &location, start).await))
}

#[derive(Debug, Deserialize)]
pub struct ScheduleQuery {
    pub date: Option<String>,
}

async fn schedule(
    State(state): State<AppState>,
    Query(query): Query<ScheduleQuery>,
) -> ApiResult<DailySchedule> {
    let date = parse_optional_date(query.date.as_deref())?
        .unwrap_or_else(|| state.today());
    Ok(Json(itinerary::daily_schedule(&state.catalog, date).await?))
}
