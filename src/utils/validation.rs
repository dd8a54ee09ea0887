use crate::utils::error::{HunterError, Result};
use std::fmt::Display;
use std::ops::RangeInclusive;
use url::Url;

pub const OUTPUT_FORMATS: [&str; 3] = ["csv", "json", "html"];

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field: &str, value: impl Display, reason: impl Into<String>) -> HunterError {
    HunterError::InvalidConfigValueError {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// 只接受 http/https 且具主機名稱的 URL
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }
    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(()),
        "http" | "https" => Err(invalid(field_name, url_str, "URL has no host")),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

/// Model endpoints are mandatory once an HTTP provider is selected.
pub fn validate_endpoint(field_name: &str, endpoint: &Option<String>) -> Result<()> {
    let endpoint = validate_required_field(field_name, endpoint)?;
    validate_url(field_name, endpoint)
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path.escape_debug(), "Path contains null bytes"));
    }
    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be at least {}", min_value),
        ));
    }
    Ok(())
}

pub fn validate_range<T>(field_name: &str, value: T, range: RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + Display + Copy,
{
    if !range.contains(&value) {
        return Err(invalid(
            field_name,
            value,
            format!("Value must be between {} and {}", range.start(), range.end()),
        ));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| HunterError::MissingConfigError {
        field: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(invalid(field_name, value, "Value cannot be blank"));
    }
    Ok(())
}

pub fn validate_output_formats(field_name: &str, formats: &[String]) -> Result<()> {
    if formats.is_empty() {
        return Err(invalid(field_name, "", "At least one output format is required"));
    }
    if let Some(unknown) = formats
        .iter()
        .find(|f| !OUTPUT_FORMATS.contains(&f.to_ascii_lowercase().as_str()))
    {
        return Err(invalid(
            field_name,
            unknown,
            format!("Unsupported format. Valid formats: {}", OUTPUT_FORMATS.join(", ")),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    if let Some(repeated) = formats.iter().find(|f| !seen.insert(f.to_ascii_lowercase())) {
        return Err(invalid(field_name, repeated, "Format listed more than once"));
    }
    Ok(())
}

/// 分類門檻必須 0 <= unclear < yes <= 1
pub fn validate_thresholds(yes_threshold: f64, unclear_threshold: f64) -> Result<()> {
    validate_range("classifier.yes_threshold", yes_threshold, 0.0..=1.0)?;
    validate_range("classifier.unclear_threshold", unclear_threshold, 0.0..=1.0)?;
    if unclear_threshold >= yes_threshold {
        return Err(HunterError::ConfigValidationError {
            field: "classifier.unclear_threshold".to_string(),
            message: format!(
                "unclear_threshold ({}) must be below yes_threshold ({})",
                unclear_threshold, yes_threshold
            ),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("generator.endpoint", "https://api.example.com/generate").is_ok());
        assert!(validate_url("generator.endpoint", "http://localhost:8080").is_ok());
        assert!(validate_url("generator.endpoint", "").is_err());
        assert!(validate_url("generator.endpoint", "ftp://example.com").is_err());
        assert!(validate_url("generator.endpoint", "not a url").is_err());
        assert!(validate_url("generator.endpoint", "http:///generate").is_err());
    }

    #[test]
    fn test_validate_endpoint() {
        let missing: Option<String> = None;
        assert!(matches!(
            validate_endpoint("embedding.endpoint", &missing),
            Err(HunterError::MissingConfigError { .. })
        ));
        let present = Some("http://127.0.0.1:8080/embed".to_string());
        assert!(validate_endpoint("embedding.endpoint", &present).is_ok());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output.output_path", "./output").is_ok());
        assert!(validate_path("output.output_path", "").is_err());
        assert!(validate_path("output.output_path", "out\0put").is_err());
    }

    #[test]
    fn test_validate_output_formats() {
        let formats = vec!["csv".to_string(), "HTML".to_string()];
        assert!(validate_output_formats("output.output_formats", &formats).is_ok());

        let formats = vec!["xlsx".to_string()];
        assert!(validate_output_formats("output.output_formats", &formats).is_err());
        assert!(validate_output_formats("output.output_formats", &[]).is_err());

        let formats = vec!["csv".to_string(), "json".to_string(), "CSV".to_string()];
        assert!(validate_output_formats("output.output_formats", &formats).is_err());
    }

    #[test]
    fn test_validate_thresholds() {
        assert!(validate_thresholds(0.65, 0.4).is_ok());
        assert!(validate_thresholds(0.4, 0.65).is_err());
        assert!(validate_thresholds(1.5, 0.4).is_err());
    }

    #[test]
    fn test_validate_positive_number_and_strings() {
        assert!(validate_positive_number("input.chunk_size", 10, 1).is_ok());
        assert!(validate_positive_number("input.chunk_size", 0, 1).is_err());
        assert!(validate_non_empty_string("title", "  ").is_err());
    }
}
