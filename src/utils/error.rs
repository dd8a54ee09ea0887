use thiserror::Error;

#[derive(Error, Debug)]
pub enum HunterError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Model provider '{provider}' failed: {message}")]
    ModelError { provider: String, message: String },

    #[error("Failed to scrape {url}: {message}")]
    ScrapeError { url: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Model,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl HunterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            HunterError::ApiError(_) | HunterError::ScrapeError { .. } => ErrorCategory::Network,
            HunterError::ConfigError { .. }
            | HunterError::MissingConfigError { .. }
            | HunterError::InvalidConfigValueError { .. }
            | HunterError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            HunterError::CsvError(_)
            | HunterError::SerializationError(_)
            | HunterError::ProcessingError { .. }
            | HunterError::ValidationError { .. } => ErrorCategory::Data,
            HunterError::ModelError { .. } => ErrorCategory::Model,
            HunterError::IoError(_) | HunterError::ZipError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一商品的抓取失敗會退回估算資料
            HunterError::ScrapeError { .. } => ErrorSeverity::Low,
            HunterError::ApiError(_) | HunterError::ModelError { .. } => ErrorSeverity::Medium,
            HunterError::CsvError(_)
            | HunterError::SerializationError(_)
            | HunterError::ProcessingError { .. }
            | HunterError::ValidationError { .. }
            | HunterError::ConfigError { .. }
            | HunterError::MissingConfigError { .. }
            | HunterError::InvalidConfigValueError { .. }
            | HunterError::ConfigValidationError { .. } => ErrorSeverity::High,
            HunterError::IoError(_) | HunterError::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            HunterError::ApiError(_) => {
                "Check network connectivity and that the model endpoint is reachable".to_string()
            }
            HunterError::ScrapeError { url, .. } => {
                format!("Verify that {} is publicly reachable, or drop the url column", url)
            }
            HunterError::CsvError(_) => {
                "Make sure the input is a comma separated file with a header row".to_string()
            }
            HunterError::ValidationError { message } => validation_hint(message).to_string(),
            HunterError::MissingConfigError { field } => {
                format!("Add the '{}' setting to your configuration", field)
            }
            HunterError::InvalidConfigValueError { field, .. }
            | HunterError::ConfigValidationError { field, .. } => {
                format!("Fix the '{}' setting and try again", field)
            }
            HunterError::ConfigError { .. } => "Review the configuration file".to_string(),
            HunterError::ModelError { provider, .. } => format!(
                "Check the {} endpoint and API key, or switch the provider to the offline default",
                provider
            ),
            HunterError::IoError(_) => {
                "Check that the paths exist and are readable/writable".to_string()
            }
            HunterError::ZipError(_) => {
                "Disable compression or free up disk space in the output directory".to_string()
            }
            HunterError::SerializationError(_) | HunterError::ProcessingError { .. } => {
                "Re-run with --verbose to see which product failed".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Network problem: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Data => format!("Input data problem: {}", self),
            ErrorCategory::Model => format!("Language model problem: {}", self),
            ErrorCategory::System => format!("System problem: {}", self),
        }
    }

    /// Exit code used by the binaries.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, HunterError>;

fn validation_hint(message: &str) -> &'static str {
    if message.contains("column") {
        "Input CSV needs title, description and price columns"
    } else if message.starts_with("unknown origin verdict")
        || message.starts_with("unknown tariff vulnerability")
    {
        "Use All, Yes, Unclear or No for origin and All, High, Medium or Low for vulnerability"
    } else if message.starts_with("unknown category") {
        "Use Electronics, Apparel, Home, Toys, General or Auto-detect as the category"
    } else if message.contains("ideas") {
        "Give at least one non-empty line, formatted as 'Title - description'"
    } else if message.contains("title") || message.contains("price") {
        "Each product needs a non-blank title and a price of zero or more"
    } else {
        "Check the input data and try again"
    }
}
