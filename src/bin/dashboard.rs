use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tariff_hunter::config::ModelArgs;
use tariff_hunter::dashboard::{serve, ServeConfig};
use tariff_hunter::utils::{logger, validation::Validate};
use tariff_hunter::ProductAnalyzer;

#[derive(Parser, Debug)]
#[command(name = "dashboard")]
#[command(about = "Serve the TariffHunter dashboard over HTTP")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8501")]
    bind: SocketAddr,

    /// Classified products CSV to show at startup
    #[arg(long)]
    data: Option<PathBuf>,

    /// Allow binding to a non-loopback address
    #[arg(long)]
    allow_non_loopback: bool,

    #[arg(long, default_value = "10")]
    chunk_size: usize,

    #[arg(long, default_value = "5")]
    concurrent_requests: usize,

    /// Rows kept in memory before the oldest are dropped
    #[arg(long, default_value = "10000")]
    max_rows: usize,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(flatten)]
    model: ModelArgs,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    logger::init_logger(args.verbose, args.log_json);

    let result = async {
        args.model.validate()?;
        let analyzer = Arc::new(ProductAnalyzer::from_settings(&args.model.to_settings())?);
        let config = ServeConfig {
            bind: args.bind,
            data: args.data.clone(),
            allow_non_loopback: args.allow_non_loopback,
            chunk_size: args.chunk_size,
            concurrent_requests: args.concurrent_requests,
            max_rows: args.max_rows,
        };
        serve(config, analyzer).await
    }
    .await;

    if let Err(e) = result {
        tracing::error!(
            "❌ Dashboard failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
        std::process::exit(e.exit_code().max(1));
    }
}
