use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use eventwise::catalog::{EventFilter, TimePeriod};
use eventwise::itinerary;
use eventwise::models::{Event, EventType};
use eventwise::{
    AppState, EventCatalog, EventWiseConfig, OpenAiChatModel, Orchestrator,
    RecommendationGenerator, RecommendationRequest, WeatherApiClient, logging, web,
};

#[derive(Parser)]
#[command(author, version, about = "Weather-aware local event recommendations")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Recreate the catalog with sample events starting at a date
    Seed {
        #[arg(long, value_parser = parse_date)]
        base_date: Option<NaiveDate>,
    },
    /// Recommend events for a location and date
    Recommend {
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        /// indoor or outdoor
        #[arg(short = 't', long = "type")]
        event_type: Option<String>,
    },
    /// Search the catalog
    Events {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
        #[arg(short = 't', long = "type")]
        event_type: Option<EventType>,
        #[arg(short, long)]
        period: Option<TimePeriod>,
        #[arg(short, long)]
        keyword: Option<String>,
        #[arg(long)]
        max_price: Option<f64>,
    },
    /// List events over the coming days
    Upcoming {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Catalog statistics
    Stats,
    /// Three days of recommendations starting on a date (next Friday by default)
    Weekend {
        #[arg(short, long)]
        location: Option<String>,
        #[arg(short, long, value_parser = parse_date)]
        start: Option<NaiveDate>,
    },
    /// Morning, afternoon and evening events for a date
    Schedule {
        #[arg(short, long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },
}

fn parse_date(raw: &str) -> std::result::Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Build the full pipeline. Fails when a provider key is missing.
fn build_orchestrator(config: &EventWiseConfig, catalog: &EventCatalog) -> Result<Orchestrator> {
    if let Err(e) = config.require_credentials() {
        let message = format!("Configuration error: {}", e.user_message());
        return Err(e).context(message);
    }

    let weather = WeatherApiClient::from_config(&config.weather)
        .context("Failed to create weather client")?;
    let model = OpenAiChatModel::from_config(&config.model)
        .context("Failed to create model client")?;

    Ok(Orchestrator::new(
        Arc::new(weather),
        Arc::new(catalog.clone()),
        RecommendationGenerator::new(Arc::new(model)),
    ))
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events found.");
        return;
    }
    for event in events {
        let price = event.price_range.as_deref().unwrap_or("-");
        println!("  {event} [{price}]");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = EventWiseConfig::load_from_path(cli.config)
        .context("Failed to load configuration")?;
    logging::init(&config.logging, cli.verbose);

    let catalog = EventCatalog::new(&config.catalog.database_path);

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let orchestrator = build_orchestrator(&config, &catalog)?;
            catalog
                .initialize()
                .await
                .context("Failed to open event catalog")?;
            let state = AppState::new(
                Some(Arc::new(orchestrator)),
                catalog,
                config.defaults.location.clone(),
            );
            web::run(&config.server, state).await?;
        }
        Command::Seed { base_date } => {
            let base_date = base_date.unwrap_or_else(today);
            let count = catalog
                .seed_sample_events(base_date)
                .await
                .context("Failed to seed catalog")?;
            println!("Seeded {count} events into {}", catalog.path().display());
        }
        Command::Recommend {
            location,
            date,
            event_type,
        } => {
            let orchestrator = build_orchestrator(&config, &catalog)?;
            let request = RecommendationRequest::new(
                location.unwrap_or_else(|| config.defaults.location.clone()),
                date.unwrap_or_else(today),
            )
            .with_event_type(event_type);

            match orchestrator.recommend(&request).await {
                Ok(recommendation) => {
                    for warning in &recommendation.warnings {
                        eprintln!("warning: {warning}");
                    }
                    println!("{}", recommendation.text);
                }
                Err(e) => {
                    eprintln!("Error: {}", e.user_message());
                    std::process::exit(1);
                }
            }
        }
        Command::Events {
            date,
            event_type,
            period,
            keyword,
            max_price,
        } => {
            let mut filter = match date {
                Some(date) => EventFilter::on(date),
                None => EventFilter::from(today()),
            }
            .with_type(event_type);
            if let Some(period) = period {
                filter = filter.in_period(period);
            }
            if let Some(keyword) = keyword {
                filter = filter.matching(keyword);
            }
            if let Some(max_price) = max_price {
                filter = filter.max_price(max_price);
            }

            print_events(&catalog.search(&filter).await?);
        }
        Command::Upcoming { days } => {
            print_events(&catalog.upcoming(today(), days).await?);
        }
        Command::Stats => {
            let summary = catalog.summary(today()).await?;
            println!("Total events: {}", summary.total_events);
            println!("Upcoming events: {}", summary.upcoming_events);
            println!("By type:");
            for (event_type, count) in &summary.by_type {
                println!("  {event_type}: {count}");
            }
            println!("By date:");
            for (date, count) in summary.by_date.iter().take(7) {
                println!("  {date}: {count} event(s)");
            }
            println!("Popular locations:");
            for (rank, top) in (1..).zip(catalog.popular_locations(5).await?) {
                println!("  {rank}. {} ({} events)", top.location, top.count);
            }
        }
        Command::Weekend { location, start } => {
            let orchestrator = build_orchestrator(&config, &catalog)?;
            let location = location.unwrap_or_else(|| config.defaults.location.clone());
            let start = start.unwrap_or_else(|| itinerary::next_friday(today()));

            for day in itinerary::weekend_plan(&orchestrator, &location, start).await {
                println!("\n{}:", day.label);
                println!("{}", day.recommendation);
            }
        }
        Command::Schedule { date } => {
            let date = date.unwrap_or_else(today);
            let schedule = itinerary::daily_schedule(&catalog, date).await?;
            for period in TimePeriod::ALL {
                println!("\n{}:", period.as_str().to_uppercase());
                let events = schedule.period(period);
                if events.is_empty() {
                    println!("  No {period} events scheduled");
                }
                for event in events {
                    println!(
                        "  {} - {} at {} ({})",
                        event.time_label().unwrap_or_default(),
                        event.name,
                        event.location,
                        event.event_type
                    );
                }
            }
        }
    }

    Ok(())
}
