use crate::core::analyzer::AnalyzerSettings;
use crate::core::embedding::EmbeddingSettings;
use crate::core::generator::GeneratorSettings;
use crate::core::origin::ClassifierSettings;
use crate::core::sales::SalesSettings;
use crate::core::sourcing::SourcingSettings;
use crate::core::{ConfigProvider, OutputFormat};
use crate::utils::error::{HunterError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("valid env var pattern"));

/// Batch classification run described by a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HunterConfig {
    #[serde(default)]
    pub run: RunConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub classifier: ClassifierSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
    #[serde(default)]
    pub sales: SalesSettings,
    #[serde(default)]
    pub sourcing: SourcingSettings,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub name: String,
    pub description: Option<String>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: "tariff-hunter".to_string(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub chunk_size: Option<usize>,
    pub concurrent_requests: Option<usize>,
    pub max_records: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
    pub filenames: Option<FilenameConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilenameConfig {
    pub csv: Option<String>,
    pub json: Option<String>,
    pub html: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
    pub log_json: Option<bool>,
}

impl HunterConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(HunterError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| HunterError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${API_KEY})，未設定的保持原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_path("input.path", &self.input.path)?;
        crate::utils::validation::validate_path("output.output_path", &self.output.output_path)?;

        if let Some(chunk_size) = self.input.chunk_size {
            crate::utils::validation::validate_positive_number("input.chunk_size", chunk_size, 1)?;
        }
        if let Some(concurrent) = self.input.concurrent_requests {
            crate::utils::validation::validate_positive_number(
                "input.concurrent_requests",
                concurrent,
                1,
            )?;
        }

        crate::utils::validation::validate_output_formats(
            "output.output_formats",
            &self.output.output_formats,
        )?;

        if let Some(key) = &self.embedding.api_key {
            if ENV_VAR.is_match(key) {
                tracing::warn!("⚠️ embedding.api_key references an unset environment variable");
            }
        }

        self.analyzer_settings().validate()
    }

    pub fn analyzer_settings(&self) -> AnalyzerSettings {
        AnalyzerSettings {
            classifier: self.classifier.clone(),
            embedding: self.embedding.clone(),
            generator: self.generator.clone(),
            sales: self.sales.clone(),
            sourcing: self.sourcing.clone(),
        }
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn log_json(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_json)
            .unwrap_or(false)
    }
}

impl ConfigProvider for HunterConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn output_path(&self) -> &str {
        &self.output.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.output.output_formats
    }

    fn chunk_size(&self) -> usize {
        self.input.chunk_size.unwrap_or(10)
    }

    fn concurrent_requests(&self) -> usize {
        self.input.concurrent_requests.unwrap_or(5)
    }

    fn max_records(&self) -> Option<usize> {
        self.input.max_records
    }

    fn compression_enabled(&self) -> bool {
        self.output
            .compression
            .as_ref()
            .map(|c| c.enabled)
            .unwrap_or(false)
    }

    fn archive_filename(&self) -> String {
        self.output
            .compression
            .as_ref()
            .and_then(|c| c.filename.clone())
            .unwrap_or_else(|| "tariffhunter_analysis.zip".to_string())
    }

    fn output_filename(&self, format: OutputFormat) -> String {
        let custom = self.output.filenames.as_ref().and_then(|f| match format {
            OutputFormat::Csv => f.csv.clone(),
            OutputFormat::Json => f.json.clone(),
            OutputFormat::Html => f.html.clone(),
        });
        custom.unwrap_or_else(|| format.default_filename().to_string())
    }
}

impl Validate for HunterConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::embedding::EmbeddingProvider;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[input]
path = "products.csv"

[output]
output_path = "./output"
output_formats = ["csv"]
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = HunterConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.run.name, "tariff-hunter");
        assert_eq!(config.chunk_size(), 10);
        assert_eq!(config.concurrent_requests(), 5);
        assert_eq!(config.classifier.yes_threshold, 0.65);
        assert_eq!(config.embedding.provider, EmbeddingProvider::Lexical);
        assert!(!config.compression_enabled());
        assert_eq!(config.output_filename(OutputFormat::Csv), "classified_products.csv");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r#"
[run]
name = "q3-catalog"

[input]
path = "catalog.csv"
chunk_size = 25
concurrent_requests = 3
max_records = 100

[classifier]
yes_threshold = 0.7
unclear_threshold = 0.45

[generator]
provider = "http"
endpoint = "http://localhost:8080/generate"
max_new_tokens = 80

[sales]
scrape = false
seed = 42

[output]
output_path = "./out"
output_formats = ["csv", "json", "html"]

[output.compression]
enabled = true
filename = "q3.zip"

[output.filenames]
csv = "q3.csv"

[monitoring]
enabled = true
"#;

        let config = HunterConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.run.name, "q3-catalog");
        assert_eq!(config.chunk_size(), 25);
        assert_eq!(config.max_records(), Some(100));
        assert_eq!(config.archive_filename(), "q3.zip");
        assert_eq!(config.output_filename(OutputFormat::Csv), "q3.csv");
        assert_eq!(config.output_filename(OutputFormat::Html), "dashboard.html");
        assert!(config.monitoring_enabled());

        let settings = config.analyzer_settings();
        assert_eq!(settings.sales.seed, Some(42));
        assert_eq!(settings.generator.max_new_tokens, 80);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TARIFF_HUNTER_TEST_INPUT", "from-env.csv");

        let toml_content = r#"
[input]
path = "${TARIFF_HUNTER_TEST_INPUT}"

[output]
output_path = "./output"
output_formats = ["csv"]
"#;

        let config = HunterConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "from-env.csv");

        std::env::remove_var("TARIFF_HUNTER_TEST_INPUT");
    }

    #[test]
    fn test_config_validation() {
        let toml_content = r#"
[input]
path = "products.csv"

[classifier]
yes_threshold = 0.3
unclear_threshold = 0.5

[output]
output_path = "./output"
output_formats = ["csv"]
"#;
        let config = HunterConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_err());

        let toml_content = MINIMAL.replace("[\"csv\"]", "[\"tsv\"]");
        let config = HunterConfig::from_toml_str(&toml_content).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_generator_requires_endpoint() {
        let toml_content = format!("{}\n[generator]\nprovider = \"http\"\n", MINIMAL);
        let config = HunterConfig::from_toml_str(&toml_content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(HunterError::MissingConfigError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = HunterConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.input.path, "products.csv");
    }
}
