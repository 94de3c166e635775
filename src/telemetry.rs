//! Tracing subscriber setup shared by the server and the email worker

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` wins over the configured level,
/// which applies to every target in `targets`.
pub fn init(config: &LoggingConfig, targets: &[&str]) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let mut directives: Vec<String> = targets
            .iter()
            .map(|target| format!("{}={}", target, config.level))
            .collect();
        directives.push("tower_http=debug".to_string());
        directives.join(",").into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if config.format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
