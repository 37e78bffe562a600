//! Result records and their two serializations.

use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::{
    cli::OutputFormat,
    scan::{ColumnCounts, TableCounts},
    schema::TablePatterns,
};

pub const TSV_HEADERS: [&str; 8] = [
    "dataset",
    "table",
    "column",
    "total_non_empty",
    "matches",
    "mismatches",
    "hit_rate",
    "pattern",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnReport {
    pub dataset: String,
    pub table: String,
    pub column: String,
    pub total_non_empty: u64,
    pub matches: u64,
    pub mismatches: u64,
    pub hit_rate: f64,
    pub pattern: String,
}

impl ColumnReport {
    pub fn new(
        dataset: &str,
        table: &str,
        column: &str,
        counts: &ColumnCounts,
        pattern: &str,
    ) -> Self {
        Self {
            dataset: dataset.to_string(),
            table: table.to_string(),
            column: column.to_string(),
            total_non_empty: counts.total_non_empty,
            matches: counts.matches,
            mismatches: counts.mismatches,
            hit_rate: counts.hit_rate(),
            pattern: pattern.to_string(),
        }
    }
}

/// Builds one record per declared pattern column, following the table's column order.
pub fn table_reports(
    dataset: &str,
    patterns: &TablePatterns,
    counts: &TableCounts,
) -> Vec<ColumnReport> {
    patterns
        .columns
        .iter()
        .map(|(column, pattern)| {
            let column_counts = counts.get(column).copied().unwrap_or_default();
            ColumnReport::new(
                dataset,
                &patterns.table,
                column,
                &column_counts,
                pattern.source(),
            )
        })
        .collect()
}

pub fn render_tsv(reports: &[ColumnReport]) -> String {
    let mut output = TSV_HEADERS.join("\t");
    output.push('\n');
    for report in reports {
        let line = [
            report.dataset.clone(),
            report.table.clone(),
            report.column.clone(),
            report.total_non_empty.to_string(),
            report.matches.to_string(),
            report.mismatches.to_string(),
            format!("{:.6}", report.hit_rate),
            report.pattern.clone(),
        ]
        .join("\t");
        output.push_str(&line);
        output.push('\n');
    }
    output
}

/// Single-line JSON with a space after every `,` and `:`.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }
}

pub fn render_json(reports: &[ColumnReport]) -> Result<String> {
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, SpacedFormatter);
    reports
        .serialize(&mut serializer)
        .context("Serializing report to JSON")?;
    let mut output = String::from_utf8(buffer).context("Report JSON is not UTF-8")?;
    output.push('\n');
    Ok(output)
}

pub fn render(reports: &[ColumnReport], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Tsv => Ok(render_tsv(reports)),
        OutputFormat::Json => render_json(reports),
    }
}

pub fn write_report<W: Write + ?Sized>(
    writer: &mut W,
    reports: &[ColumnReport],
    format: OutputFormat,
) -> Result<()> {
    let rendered = render(reports, format)?;
    writer
        .write_all(rendered.as_bytes())
        .context("Writing report")?;
    writer.flush().context("Flushing report output")
}
