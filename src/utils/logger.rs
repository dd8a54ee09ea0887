use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// RUST_LOG 優先，否則依 verbose 決定層級
fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose {
        "tariff_hunter=debug,tower_http=debug,info"
    } else {
        "tariff_hunter=info,warn"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Human-readable compact lines for interactive runs.
pub fn init_cli_logger(verbose: bool) {
    let layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact();
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .init();
}

/// JSON lines, for log shipping when the dashboard runs as a service.
pub fn init_json_logger(verbose: bool) {
    let layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .json()
        .with_current_span(false);
    tracing_subscriber::registry()
        .with(env_filter(verbose))
        .with(layer)
        .init();
}

pub fn init_logger(verbose: bool, json: bool) {
    if json {
        init_json_logger(verbose);
    } else {
        init_cli_logger(verbose);
    }
}
