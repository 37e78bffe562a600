use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

pub const DEFAULT_SCHEMA_ROOT: &str = "derived";
pub const DEFAULT_DATASET_ROOT: &str = "datasets";
pub const SCHEMA_FILE_NAME: &str = "SCHEMA.json";

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Report regex hit rates for dataset columns declared in SCHEMA.json",
    long_about = None
)]
pub struct Cli {
    /// Dataset identifier (e.g. MIMIC_5.3); resolves default schema and dataset paths
    pub dataset_id: String,
    /// Path to SCHEMA.json (default: <schema-root>/<dataset_id>/SCHEMA.json)
    #[arg(long)]
    pub schema: Option<PathBuf>,
    /// Directory holding the dataset's CSV files (default: <dataset-root>/<dataset_id>)
    #[arg(long = "dataset-path")]
    pub dataset_path: Option<PathBuf>,
    /// Root directory used to resolve the default schema path
    #[arg(long = "schema-root", default_value = DEFAULT_SCHEMA_ROOT)]
    pub schema_root: PathBuf,
    /// Root directory used to resolve the default dataset path
    #[arg(long = "dataset-root", default_value = DEFAULT_DATASET_ROOT)]
    pub dataset_root: PathBuf,
    /// Output format
    #[arg(long, value_enum, default_value = "tsv")]
    pub format: OutputFormat,
    /// Treat NULL/NA/NAN/NONE (case-insensitive) as nulls
    #[arg(long = "strict-nulls")]
    pub strict_nulls: bool,
    /// Additional case-insensitive null spellings (repeatable or comma-separated)
    #[arg(long = "null-token", value_delimiter = ',', action = clap::ArgAction::Append)]
    pub null_tokens: Vec<String>,
    /// CSV delimiter character for data files (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the data files (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Maximum data rows scanned per table (0 = all)
    #[arg(long, default_value_t = 0)]
    pub limit: usize,
    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

impl Cli {
    pub fn resolved_schema_path(&self) -> PathBuf {
        self.schema.clone().unwrap_or_else(|| {
            self.schema_root
                .join(&self.dataset_id)
                .join(SCHEMA_FILE_NAME)
        })
    }

    pub fn resolved_dataset_path(&self) -> PathBuf {
        self.dataset_path
            .clone()
            .unwrap_or_else(|| self.dataset_root.join(&self.dataset_id))
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_deref()
    }
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Tsv,
    Json,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
