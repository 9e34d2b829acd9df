use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::image_pipeline::common::error::{AnalysisError, Result};
use crate::image_pipeline::export::report::ImageReport;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    #[default]
    Json,
    #[value(alias = "yml")]
    Yaml,
}

pub trait ReportWriter {
    /// File extension without the leading dot.
    fn extension(&self) -> &'static str;

    fn write_report(&self, report: &ImageReport, path: &Path) -> Result<()>;
}

fn export_error(path: &Path, reason: impl ToString) -> AnalysisError {
    AnalysisError::Export {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}

/// Pretty-printed JSON. NaN statistics are written as `null`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonReportWriter;

impl ReportWriter for JsonReportWriter {
    fn extension(&self) -> &'static str {
        "json"
    }

    fn write_report(&self, report: &ImageReport, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| export_error(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), report).map_err(|e| export_error(path, e))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct YamlReportWriter;

impl ReportWriter for YamlReportWriter {
    fn extension(&self) -> &'static str {
        "yaml"
    }

    fn write_report(&self, report: &ImageReport, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| export_error(path, e))?;
        serde_yaml::to_writer(BufWriter::new(file), report).map_err(|e| export_error(path, e))
    }
}

impl ReportWriter for ReportFormat {
    fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Json => JsonReportWriter.extension(),
            ReportFormat::Yaml => YamlReportWriter.extension(),
        }
    }

    fn write_report(&self, report: &ImageReport, path: &Path) -> Result<()> {
        match self {
            ReportFormat::Json => JsonReportWriter.write_report(report, path),
            ReportFormat::Yaml => YamlReportWriter.write_report(report, path),
        }
    }
}
