use clap::Parser;
use std::sync::Arc;
use tariff_hunter::config::{AnalyzeArgs, Cli, Command, FilterArgs, SummaryArgs};
use tariff_hunter::core::report::{filter_rows, read_rows_csv, summarize, write_rows_csv, RowFilter};
use tariff_hunter::dashboard::render_product_report;
use tariff_hunter::domain::model::{Category, OriginDetails, Product, ProductAnalysis};
use tariff_hunter::utils::error::HunterError;
use tariff_hunter::utils::{logger, validation::Validate};
use tariff_hunter::{
    CliConfig, CsvPipeline, HunterEngine, IdeasPipeline, LocalStorage, ProductAnalyzer, Result,
};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // 初始化日誌
    logger::init_logger(cli.verbose, cli.log_json);
    tracing::debug!("CLI args: {:?}", cli);

    if let Err(e) = run(cli.command).await {
        // 記錄詳細錯誤信息
        tracing::error!(
            "❌ tariff-hunter failed: {} (Category: {:?}, Severity: {:?})",
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

async fn run(command: Command) -> Result<()> {
    match command {
        Command::Classify(config) => classify(config).await,
        Command::Ideas(config) => ideas(config).await,
        Command::Analyze(args) => analyze(args).await,
        Command::Filter(args) => filter(args).await,
        Command::Summary(args) => summary(args).await,
    }
}

fn build_analyzer(config: &CliConfig) -> Result<Arc<ProductAnalyzer>> {
    config.validate()?;
    if config.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }
    Ok(Arc::new(ProductAnalyzer::from_settings(
        &config.model.to_settings(),
    )?))
}

async fn classify(config: CliConfig) -> Result<()> {
    let analyzer = build_analyzer(&config)?;
    let monitor = config.monitor;

    let source = LocalStorage::new(".");
    let sink = LocalStorage::new(config.output_path.clone());
    let pipeline = CsvPipeline::new(source, sink, config, analyzer);

    let output_path = HunterEngine::new_with_monitoring(pipeline, monitor)
        .run()
        .await?;
    println!("✅ Classification complete!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

async fn ideas(config: CliConfig) -> Result<()> {
    let analyzer = build_analyzer(&config)?;
    let monitor = config.monitor;

    let text = match &config.input {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };

    let sink = LocalStorage::new(config.output_path.clone());
    let pipeline = IdeasPipeline::new(text, sink, config, analyzer);

    let output_path = HunterEngine::new_with_monitoring(pipeline, monitor)
        .run()
        .await?;
    println!("✅ Idea analysis complete!");
    println!("📁 Output saved to: {}", output_path);
    Ok(())
}

async fn analyze(args: AnalyzeArgs) -> Result<()> {
    args.model.validate()?;
    let analyzer = ProductAnalyzer::from_settings(&args.model.to_settings())?;

    let mut product = Product::new(args.title.clone(), args.description.clone(), args.price);
    if let Some(url) = &args.url {
        product = product.with_url(url.clone());
    }
    if let Some(label) = &args.category {
        let category = label
            .parse::<Category>()
            .map_err(|message| HunterError::ValidationError { message })?;
        product = product.with_category(category);
    }

    let analysis = analyzer.analyze(&product).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print_analysis(&analysis);
    }

    if let Some(path) = &args.report {
        tokio::fs::write(path, render_product_report(&analysis)).await?;
        println!("📄 Report saved to: {}", path);
    }
    Ok(())
}

fn print_analysis(analysis: &ProductAnalysis) {
    let origin = &analysis.origin;
    println!("📋 Analysis Report: {}", analysis.product.title);
    println!(
        "  Made in China: {} ({:.1}% confidence)",
        origin.made_in_china,
        origin.confidence * 100.0
    );
    println!("  Tariff vulnerability: {}", analysis.tariff_vulnerability);
    println!("  Likely origin: {}", origin.likely_origin());
    if let OriginDetails::China(details) = &origin.details {
        if let Some(phrases) = &details.origin_phrases {
            println!("  Origin phrases: {}", phrases);
        }
    }
    println!("  Production type: {}", origin.production_type());
    println!("  Supplier tier: {}", origin.supplier_tier());
    println!(
        "  Estimated monthly sales: {} (BSR {})",
        analysis.sales.estimated_monthly_sales, analysis.sales.best_seller_rank
    );
    println!(
        "  Alternative sourcing: {}",
        analysis.sourcing.alternatives.join(", ")
    );
    for comparison in &analysis.sourcing.country_comparisons {
        println!(
            "    {:<12} cost ${:>7.2}  landed ${:>7.2}  lead time {}",
            comparison.country,
            comparison.estimated_cost,
            comparison.landed_cost,
            comparison.lead_time
        );
    }
    if let Some(savings) = &analysis.sourcing.cost_savings {
        println!(
            "  Best alternative: {} (saves ${:.2}/unit, {:.1}%)",
            savings.best_alternative, savings.saving_per_unit, savings.potential_saving_pct
        );
    }
    for consideration in &analysis.sourcing.key_considerations {
        println!("  - {}", consideration);
    }
}

async fn filter(args: FilterArgs) -> Result<()> {
    let data = tokio::fs::read(&args.input).await?;
    let rows = read_rows_csv(&data)?;
    let filter = RowFilter::from_labels(Some(&args.made_in_china), Some(&args.vulnerability))?;

    let filtered = filter_rows(&rows, &filter);
    tracing::debug!("🔎 {} of {} products match", filtered.len(), rows.len());
    let csv = write_rows_csv(&filtered)?;

    match &args.output {
        Some(path) => {
            tokio::fs::write(path, csv).await?;
            println!("📁 Filtered CSV saved to: {}", path);
        }
        None => print!("{}", String::from_utf8_lossy(&csv)),
    }
    Ok(())
}

async fn summary(args: SummaryArgs) -> Result<()> {
    let data = tokio::fs::read(&args.input).await?;
    let rows = read_rows_csv(&data)?;
    let summary = summarize(&rows);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("📊 Analysis Summary");
    println!("  Total products: {}", summary.total_products);
    println!(
        "  China-sourced: {} ({:.1}%)",
        summary.china_sourced, summary.china_sourced_pct
    );
    match summary.high_risk_pct_of_china {
        Some(pct) => println!("  High tariff risk: {} ({:.1}%)", summary.high_risk, pct),
        None => println!("  High tariff risk: {} (N/A)", summary.high_risk),
    }
    println!("  Origin breakdown:");
    for (verdict, count) in &summary.origin_breakdown {
        println!("    {:<8} {}", verdict, count);
    }
    println!("  Risk profile:");
    for (risk, count) in &summary.risk_breakdown {
        println!("    {:<8} {}", risk, count);
    }
    Ok(())
}
