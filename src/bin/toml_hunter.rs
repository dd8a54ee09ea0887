use clap::Parser;
use std::sync::Arc;
use tariff_hunter::config::toml_config::HunterConfig;
use tariff_hunter::core::report::parse_products_csv;
use tariff_hunter::core::{ConfigProvider, OutputFormat};
use tariff_hunter::utils::{logger, validation::Validate};
use tariff_hunter::{CsvPipeline, HunterEngine, LocalStorage, ProductAnalyzer};

#[derive(Parser)]
#[command(name = "toml-hunter")]
#[command(about = "Batch product classification driven by a TOML configuration")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "tariff-hunter.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override monitoring setting from config
    #[arg(long)]
    monitor: Option<bool>,

    /// Override the input CSV from config
    #[arg(long)]
    input: Option<String>,

    /// Override max records from config
    #[arg(long)]
    max_records: Option<usize>,

    /// Override the estimator seed from config
    #[arg(long)]
    seed: Option<u64>,

    /// Dry run - show what would be processed without executing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // 載入 TOML 配置
    let mut config = match HunterConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose
        || config
            .monitoring
            .as_ref()
            .and_then(|m| m.log_level.as_deref())
            .is_some_and(|level| level.eq_ignore_ascii_case("debug"));
    logger::init_logger(verbose, config.log_json());

    tracing::info!("🚀 Starting TOML-based tariff hunter");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(input) = &args.input {
        config.input.path = input.clone();
        tracing::info!("🔧 Input overridden to: {}", input);
    }
    if let Some(max_records) = args.max_records {
        config.input.max_records = Some(max_records);
        tracing::info!("🔧 Max records overridden to: {}", max_records);
    }
    if let Some(seed) = args.seed {
        config.sales.seed = Some(seed);
        tracing::info!("🔧 Estimator seed overridden to: {}", seed);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(e.exit_code().max(1));
    }

    tracing::info!("✅ Configuration loaded and validated successfully");

    display_config_summary(&config, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - No actual processing will occur");
        perform_dry_run(&config).await?;
        return Ok(());
    }

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    let analyzer = match ProductAnalyzer::from_settings(&config.analyzer_settings()) {
        Ok(analyzer) => Arc::new(analyzer),
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
            std::process::exit(e.exit_code().max(1));
        }
    };

    let source = LocalStorage::new(".");
    let sink = LocalStorage::new(config.output_path().to_string());
    let pipeline = CsvPipeline::new(source, sink, config, analyzer);
    let engine = HunterEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Classification completed successfully!");
            println!("✅ Classification completed successfully!");
            println!("📁 Output saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!(
                "❌ Classification failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

            let exit_code = e.exit_code();
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

fn display_config_summary(config: &HunterConfig, args: &Args) {
    println!("📋 Configuration Summary:");
    println!("  Run: {}", config.run.name);
    if let Some(description) = &config.run.description {
        println!("  Description: {}", description);
    }
    println!("  Input: {}", config.input_path());
    println!("  Output: {}", config.output_path());
    println!("  Formats: {}", config.output.output_formats.join(", "));

    if let Some(max_records) = config.max_records() {
        println!("  Max Records: {}", max_records);
    }

    println!(
        "  Chunk Size: {} (Concurrent Requests: {})",
        config.chunk_size(),
        config.concurrent_requests()
    );

    if args.dry_run {
        println!("  🔍 DRY RUN MODE ENABLED");
    }

    println!();
}

async fn perform_dry_run(config: &HunterConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Dry Run Analysis:");
    println!();

    println!("📥 Input Analysis:");
    match tokio::fs::read(config.input_path()).await {
        Ok(data) => match parse_products_csv(&data, config.max_records()) {
            Ok(parsed) => {
                println!("  ✅ {} products ready", parsed.products.len());
                if parsed.skipped > 0 {
                    println!("  ⚠️ {} rows would be skipped", parsed.skipped);
                }
                let chunks = parsed.products.len().div_ceil(config.chunk_size());
                println!("  📦 {} chunks of up to {}", chunks, config.chunk_size());
            }
            Err(e) => println!("  ❌ {}", e.user_friendly_message()),
        },
        Err(e) => println!("  ❌ Cannot read {}: {}", config.input_path(), e),
    }

    println!();
    println!("🧠 Models:");
    println!(
        "  Embedding: {:?}{}",
        config.embedding.provider,
        config
            .embedding
            .endpoint
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default()
    );
    println!(
        "  Generator: {:?}{}",
        config.generator.provider,
        config
            .generator
            .endpoint
            .as_deref()
            .map(|e| format!(" ({})", e))
            .unwrap_or_default()
    );
    println!(
        "  Thresholds: Yes > {}, Unclear > {}",
        config.classifier.yes_threshold, config.classifier.unclear_threshold
    );
    println!(
        "  Sales: {}",
        if config.sales.scrape {
            "scrape product URLs, estimate otherwise"
        } else {
            "estimate only"
        }
    );
    println!(
        "  Sourcing profiles: {}",
        config
            .sourcing
            .profiles_path
            .as_deref()
            .unwrap_or("built-in")
    );

    println!();
    println!("💾 Output Configuration:");
    println!("  Path: {}", config.output_path());
    for raw in &config.output.output_formats {
        if let Some(format) = OutputFormat::parse(raw) {
            println!("  {} -> {}", raw, config.output_filename(format));
        }
    }
    if config.compression_enabled() {
        println!("  Compression: {} (ZIP)", config.archive_filename());
    }

    println!();
    println!("✅ Dry run analysis complete. Use --verbose for more details during actual run.");

    Ok(())
}
