//! Tracing subscriber setup

use crate::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

fn directives(level: &str) -> String {
    format!("eventwise={level},tower_http={level},warn")
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. `verbose` forces `debug`.
pub fn init(config: &LoggingConfig, verbose: bool) {
    let level = if verbose {
        "debug"
    } else {
        config.level.as_str()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directives(level)));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    // try_init: tests and repeated CLI setup may already have a subscriber
    let result = match config.format.as_str() {
        "json" => builder.json().try_init(),
        "pretty" => builder.pretty().try_init(),
        _ => builder.try_init(),
    };

    if let Err(e) = result {
        tracing::debug!("Tracing subscriber already installed: {}", e);
    }
}
