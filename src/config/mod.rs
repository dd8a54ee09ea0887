pub mod cli;
pub mod profiles;
pub mod toml_config;

use crate::core::analyzer::AnalyzerSettings;
use crate::core::embedding::EmbeddingProvider;
use crate::core::generator::GeneratorProvider;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{
    validate_output_formats, validate_path, validate_positive_number, Validate,
};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
#[derive(Debug, Parser)]
#[command(name = "tariff-hunter")]
#[command(about = "Classify products by China-sourcing tariff risk", version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[cfg(feature = "cli")]
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify every product in a CSV file
    Classify(CliConfig),
    /// Analyze one product in depth
    Analyze(AnalyzeArgs),
    /// Analyze product ideas, one per line ("title - description")
    Ideas(CliConfig),
    /// Filter a classified CSV by verdict and vulnerability
    Filter(FilterArgs),
    /// Summarize a classified CSV
    Summary(SummaryArgs),
}

/// Batch run settings. For `ideas`, `--input` names a text file and stdin is
/// read when it is omitted.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(Args))]
pub struct CliConfig {
    #[cfg_attr(feature = "cli", arg(short, long))]
    pub input: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = "./output"))]
    pub output_path: String,

    #[cfg_attr(feature = "cli", arg(long, value_delimiter = ',', default_value = "csv"))]
    pub output_formats: Vec<String>,

    /// Zip all outputs into one archive
    #[cfg_attr(feature = "cli", arg(long))]
    pub compress: bool,

    #[cfg_attr(feature = "cli", arg(long, default_value = "10"))]
    pub chunk_size: usize,

    #[cfg_attr(feature = "cli", arg(long, default_value = "5"))]
    pub concurrent_requests: usize,

    #[cfg_attr(feature = "cli", arg(long))]
    pub max_records: Option<usize>,

    /// Log CPU and memory usage per phase
    #[cfg_attr(feature = "cli", arg(long))]
    pub monitor: bool,

    #[cfg_attr(feature = "cli", command(flatten))]
    pub model: ModelArgs,
}

/// Model endpoints and analysis knobs shared by every subcommand that analyzes.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "cli", derive(Args))]
pub struct ModelArgs {
    /// OpenAI-compatible embeddings endpoint; the offline lexical embedder is used when unset
    #[cfg_attr(feature = "cli", arg(long))]
    pub embedding_endpoint: Option<String>,

    #[cfg_attr(
        feature = "cli",
        arg(long, default_value = "sentence-transformers/all-MiniLM-L6-v2")
    )]
    pub embedding_model: String,

    /// Text generation endpoint for sourcing suggestions
    #[cfg_attr(feature = "cli", arg(long))]
    pub generator_endpoint: Option<String>,

    #[cfg_attr(feature = "cli", arg(long))]
    pub generator_model: Option<String>,

    #[cfg_attr(
        feature = "cli",
        arg(long, env = "TARIFF_HUNTER_API_KEY", hide_env_values = true)
    )]
    pub api_key: Option<String>,

    #[cfg_attr(feature = "cli", arg(long, default_value = "100"))]
    pub max_new_tokens: u32,

    /// TOML file with industry and country sourcing profiles
    #[cfg_attr(feature = "cli", arg(long))]
    pub profiles: Option<String>,

    /// Seed for estimated sales metrics
    #[cfg_attr(feature = "cli", arg(long))]
    pub seed: Option<u64>,

    /// Never fetch product URLs
    #[cfg_attr(feature = "cli", arg(long))]
    pub no_scrape: bool,

    #[cfg_attr(feature = "cli", arg(long, default_value = "0.65"))]
    pub yes_threshold: f64,

    #[cfg_attr(feature = "cli", arg(long, default_value = "0.4"))]
    pub unclear_threshold: f64,

    #[cfg_attr(feature = "cli", arg(long, default_value = "0.25"))]
    pub china_tariff_rate: f64,
}

impl Default for ModelArgs {
    fn default() -> Self {
        let settings = AnalyzerSettings::default();
        Self {
            embedding_endpoint: None,
            embedding_model: settings.embedding.model,
            generator_endpoint: None,
            generator_model: None,
            api_key: None,
            max_new_tokens: settings.generator.max_new_tokens,
            profiles: None,
            seed: None,
            no_scrape: false,
            yes_threshold: settings.classifier.yes_threshold,
            unclear_threshold: settings.classifier.unclear_threshold,
            china_tariff_rate: settings.sourcing.china_tariff_rate,
        }
    }
}

impl ModelArgs {
    pub fn to_settings(&self) -> AnalyzerSettings {
        let mut settings = AnalyzerSettings::default();

        settings.classifier.yes_threshold = self.yes_threshold;
        settings.classifier.unclear_threshold = self.unclear_threshold;

        if let Some(endpoint) = &self.embedding_endpoint {
            settings.embedding.provider = EmbeddingProvider::Http;
            settings.embedding.endpoint = Some(endpoint.clone());
            settings.embedding.api_key = self.api_key.clone();
        }
        settings.embedding.model = self.embedding_model.clone();

        if let Some(endpoint) = &self.generator_endpoint {
            settings.generator.provider = GeneratorProvider::Http;
            settings.generator.endpoint = Some(endpoint.clone());
            settings.generator.api_key = self.api_key.clone();
        }
        settings.generator.model = self.generator_model.clone();
        settings.generator.max_new_tokens = self.max_new_tokens;

        settings.sales.scrape = !self.no_scrape;
        settings.sales.seed = self.seed;

        settings.sourcing.profiles_path = self.profiles.clone();
        settings.sourcing.china_tariff_rate = self.china_tariff_rate;
        settings
    }
}

impl Validate for ModelArgs {
    fn validate(&self) -> Result<()> {
        self.to_settings().validate()
    }
}

impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        self.input.as_deref().unwrap_or("products.csv")
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output_formats
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    fn max_records(&self) -> Option<usize> {
        self.max_records
    }

    fn compression_enabled(&self) -> bool {
        self.compress
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("output_path", &self.output_path)?;
        if let Some(input) = &self.input {
            validate_path("input", input)?;
        }
        validate_output_formats("output_formats", &self.output_formats)?;
        validate_positive_number("chunk_size", self.chunk_size, 1)?;
        validate_positive_number("concurrent_requests", self.concurrent_requests, 1)?;
        self.model.validate()
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct AnalyzeArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    #[arg(long, default_value = "14.99")]
    pub price: f64,

    /// Product page to scrape for live sales metrics
    #[arg(long)]
    pub url: Option<String>,

    /// electronics, apparel, home, toys or general
    #[arg(long)]
    pub category: Option<String>,

    /// Write an HTML report to this path
    #[arg(long)]
    pub report: Option<String>,

    /// Print the full analysis as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub model: ModelArgs,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    #[arg(short, long, default_value = "./output/classified_products.csv")]
    pub input: String,

    /// Yes, Unclear, No or All
    #[arg(long, default_value = "All")]
    pub made_in_china: String,

    /// High, Medium, Low or All
    #[arg(long, default_value = "All")]
    pub vulnerability: String,

    /// Write the filtered CSV here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Args)]
pub struct SummaryArgs {
    #[arg(short, long, default_value = "./output/classified_products.csv")]
    pub input: String,

    #[arg(long)]
    pub json: bool,
}
