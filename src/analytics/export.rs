//! Report export formats and utilities

use crate::analytics::engine::AnalyticsReport;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::metrics::ChangeUnit;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use strum::{Display, EnumString};
use tokio::fs;

/// Export format for reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }

    /// Get MIME type for this format
    pub fn mime_type(&self) -> &str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }
}

/// Report exporter
pub struct ReportExporter;

impl ReportExporter {
    /// Export a report to a file, returning the written bytes
    pub async fn export(
        report: &AnalyticsReport,
        format: ExportFormat,
        output_path: &Path,
    ) -> AnalyticsResult<Vec<u8>> {
        let bytes = Self::export_to_bytes(report, format)?;

        fs::write(output_path, &bytes).await.map_err(|e| {
            AnalyticsError::ExportFailed(format!(
                "Failed to write {} file {}: {}",
                format,
                output_path.display(),
                e
            ))
        })?;

        tracing::info!(path = %output_path.display(), %format, bytes = bytes.len(), "Report exported");

        Ok(bytes)
    }

    /// Export report to bytes without writing to file
    pub fn export_to_bytes(report: &AnalyticsReport, format: ExportFormat) -> AnalyticsResult<Vec<u8>> {
        match format {
            ExportFormat::Json => {
                let json = serde_json::to_string_pretty(report).map_err(|e| {
                    AnalyticsError::ExportFailed(format!("JSON serialization failed: {}", e))
                })?;
                Ok(json.into_bytes())
            }
            ExportFormat::Csv => Self::to_csv(report)
                .map(String::into_bytes)
                .map_err(|e| AnalyticsError::ExportFailed(format!("CSV rendering failed: {}", e))),
        }
    }

    /// Render every section as a block of CSV, separated by blank lines
    fn to_csv(report: &AnalyticsReport) -> Result<String, std::fmt::Error> {
        let mut out = String::new();
        let periods = &report.periods;

        writeln!(out, "Window,Generated At,Current Start,Current End,Previous Start,Previous End")?;
        writeln!(
            out,
            "\"{}\",{},{},{},{},{}",
            Self::escape_csv(&report.window.to_string()),
            report.generated_at.to_rfc3339(),
            periods.current.start.to_rfc3339(),
            periods.current.end.to_rfc3339(),
            periods.previous.start.to_rfc3339(),
            periods.previous.end.to_rfc3339(),
        )?;
        out.push('\n');

        writeln!(out, "Metric,Current,Previous,Change,Unit")?;
        for m in &report.metrics {
            writeln!(
                out,
                "\"{}\",{},{},{:.2},{}",
                Self::escape_csv(&m.label),
                m.current,
                m.previous,
                m.change,
                match m.change_unit {
                    ChangeUnit::Percent => "percent",
                    ChangeUnit::PercentagePoints => "points",
                }
            )?;
        }
        out.push('\n');

        writeln!(out, "Day,Minutes Current,Minutes Previous,Calls Current,Calls Previous")?;
        let series = &report.time_series;
        for (minutes, counts) in series.minutes.iter().zip(&series.counts) {
            writeln!(
                out,
                "{},{},{},{},{}",
                minutes.label, minutes.current, minutes.previous, counts.current, counts.previous
            )?;
        }
        out.push('\n');

        writeln!(out, "Duration Bin,Calls")?;
        for bin in &report.duration_histogram {
            writeln!(out, "{},{}", bin.label, bin.count)?;
        }
        out.push('\n');

        writeln!(out, "End Reason,Calls,Rank")?;
        for group in &report.end_reason_breakdown {
            writeln!(out, "\"{}\",{},{}", Self::escape_csv(&group.label), group.count, group.rank)?;
        }
        out.push('\n');

        writeln!(out, "Direction,Calls,Rank")?;
        for group in &report.direction_split {
            writeln!(out, "\"{}\",{},{}", Self::escape_csv(&group.label), group.count, group.rank)?;
        }
        out.push('\n');

        // Sparse: only cells with activity
        writeln!(out, "Day Of Week,Hour,Calls")?;
        for cell in report.heatmap.grid.iter().flatten().filter(|c| c.count > 0) {
            writeln!(out, "{},{},{}", cell.day, cell.hour, cell.count)?;
        }

        Ok(out)
    }

    /// Escape CSV special characters
    fn escape_csv(s: &str) -> String {
        s.replace('"', "\"\"")
    }
}
