//! Prompt assembly for the recommendation model

use crate::models::{Event, Reading, WeatherSnapshot};

/// Ranking policy sent as the system message
pub const SYSTEM_INSTRUCTION: &str = "You are an intelligent event recommendation assistant. \
Analyze weather conditions and available events to provide personalized recommendations.

Guidelines:
- Prioritize outdoor events for pleasant weather (20-28°C, clear/partly cloudy)
- Recommend indoor events for extreme temperatures, rain, or poor conditions
- Consider event timing with weather conditions
- Mention practical tips (bring umbrella, wear sunscreen, etc.)
- Be concise but informative (3-4 sentences per recommendation)
- If multiple suitable events exist, rank them with brief reasoning";

/// Builds the user message from weather and events. Output is deterministic.
pub struct PromptBuilder;

impl PromptBuilder {
    #[must_use]
    pub fn build(weather: Option<&WeatherSnapshot>, events: &[Event]) -> String {
        let mut lines = Self::weather_lines(weather);

        lines.push("\nAvailable Events:".to_string());
        lines.extend(events.iter().map(Self::event_line));

        lines.join("\n")
    }

    fn weather_lines(weather: Option<&WeatherSnapshot>) -> Vec<String> {
        let Some(snapshot) = weather else {
            return vec!["Weather: Data unavailable".to_string()];
        };

        let mut lines = match snapshot.reading {
            Reading::DayAggregate {
                min_c,
                max_c,
                avg_c,
            } => vec![
                format!("Weather Forecast: {}", snapshot.condition),
                format!(
                    "Temperature: {} - {} (avg: {})",
                    WeatherSnapshot::format_temperature(min_c),
                    WeatherSnapshot::format_temperature(max_c),
                    WeatherSnapshot::format_temperature(avg_c)
                ),
            ],
            Reading::Point {
                temperature_c,
                humidity,
            } => {
                let mut point = vec![
                    format!("Location: {}", snapshot.location),
                    format!("Weather: {}", snapshot.condition),
                    format!(
                        "Temperature: {}",
                        WeatherSnapshot::format_temperature(temperature_c)
                    ),
                    format!("Humidity: {humidity}%"),
                ];
                if snapshot.is_forecast {
                    point.push("(Forecast data)".to_string());
                }
                point
            }
        };

        if let Some(date) = snapshot.requested_date_mismatch {
            lines.push(format!(
                "Note: no forecast available for {date}; showing current conditions"
            ));
        }

        lines
    }

    /// `- <name> (<TYPE>)[ at HH:MM]: <description> | Location: <location>[ (<price>)]`
    pub fn event_line(event: &Event) -> String {
        let time = event
            .time_label()
            .map(|t| format!(" at {t}"))
            .unwrap_or_default();
        let price = event
            .price_range
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| format!(" ({p})"))
            .unwrap_or_default();

        format!(
            "- {} ({}){}: {} | Location: {}{}",
            event.name,
            event.event_type.label(),
            time,
            event.description,
            event.location,
            price
        )
    }
}
