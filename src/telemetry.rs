use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,sqlx=warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global JSON subscriber.
///
/// `RUST_LOG` overrides the default filter. Records emitted through the `log`
/// facade (actix-web's request logger) are bridged into the same output.
pub fn try_init_telemetry() -> Result<(), TryInitError> {
    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true)
        .json()
        .with_current_span(false)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(formatting_layer)
        .try_init()
}

/// Like [`try_init_telemetry`], but keeps an already-installed subscriber.
pub fn init_telemetry() {
    if let Err(e) = try_init_telemetry() {
        eprintln!("telemetry already initialised: {}", e);
    }
}
