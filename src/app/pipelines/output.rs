use crate::core::report::{write_rows_csv, RowFilter};
use crate::dashboard::render::render_dashboard;
use crate::domain::model::{AnalysisBatch, AnalysisSummary, ProductAnalysis};
use crate::domain::ports::{ConfigProvider, OutputFormat, Storage};
use crate::utils::error::{HunterError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

/// Layout of the JSON output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub generated_at: DateTime<Utc>,
    pub summary: AnalysisSummary,
    pub skipped_products: usize,
    pub products: Vec<ProductAnalysis>,
}

fn render_artifact<C: ConfigProvider>(
    config: &C,
    format: OutputFormat,
    batch: &AnalysisBatch,
) -> Result<(String, Vec<u8>)> {
    let data = match format {
        OutputFormat::Csv => write_rows_csv(&batch.rows)?,
        OutputFormat::Json => serde_json::to_vec_pretty(&JsonReport {
            generated_at: Utc::now(),
            summary: batch.summary.clone(),
            skipped_products: batch.skipped_products,
            products: batch.analyses.clone(),
        })?,
        OutputFormat::Html => {
            render_dashboard(&batch.rows, &batch.summary, &RowFilter::default()).into_bytes()
        }
    };
    Ok((config.output_filename(format), data))
}

/// Write every configured format, zipped into one archive when compression
/// is on. Returns the path of the archive or of the first file written.
pub async fn write_outputs<S: Storage, C: ConfigProvider>(
    storage: &S,
    config: &C,
    batch: &AnalysisBatch,
) -> Result<String> {
    let mut formats: Vec<OutputFormat> = Vec::new();
    for raw in config.output_formats() {
        let format = OutputFormat::parse(raw).ok_or_else(|| HunterError::InvalidConfigValueError {
            field: "output_formats".to_string(),
            value: raw.clone(),
            reason: "Unsupported format. Valid formats: csv, json, html".to_string(),
        })?;
        // 重複的格式只輸出一次
        if !formats.contains(&format) {
            formats.push(format);
        }
    }

    let mut artifacts: Vec<(String, Vec<u8>)> = Vec::new();
    for format in formats {
        let (name, data) = render_artifact(config, format, batch)?;
        if artifacts.iter().any(|(existing, _)| *existing == name) {
            return Err(HunterError::ConfigValidationError {
                field: "output.filenames".to_string(),
                message: format!("two output formats share the file name '{}'", name),
            });
        }
        artifacts.push((name, data));
    }
    if artifacts.is_empty() {
        return Err(HunterError::ConfigError {
            message: "no output formats configured".to_string(),
        });
    }

    let primary = if config.compression_enabled() {
        tracing::debug!("Creating ZIP file with {} files", artifacts.len());
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            for (name, data) in &artifacts {
                zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
                zip.write_all(data)?;
            }
            zip.finish()?.into_inner()
        };

        let archive = config.archive_filename();
        tracing::debug!("Writing ZIP file ({} bytes) to storage", zip_data.len());
        storage.write_file(&archive, &zip_data).await?;
        archive
    } else {
        for (name, data) in &artifacts {
            tracing::debug!("Writing {} ({} bytes)", name, data.len());
            storage.write_file(name, data).await?;
        }
        artifacts[0].0.clone()
    };

    Ok(Path::new(config.output_path())
        .join(primary)
        .display()
        .to_string())
}
