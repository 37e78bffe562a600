pub mod cli;
pub mod error;
pub mod io_utils;
pub mod nulls;
pub mod report;
pub mod rows;
pub mod scan;
pub mod schema;

use std::{env, path::Path, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};

use crate::{
    cli::Cli,
    error::ConfigError,
    nulls::NullPolicy,
    report::ColumnReport,
    scan::ScanOptions,
    schema::{CompiledSchema, Schema},
};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("pattern_audit", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    execute(&cli)
}

pub fn execute(cli: &Cli) -> Result<()> {
    let schema_path = cli.resolved_schema_path();
    let dataset_path = cli.resolved_dataset_path();
    if !schema_path.exists() {
        return Err(ConfigError::SchemaNotFound(schema_path).into());
    }
    if !dataset_path.is_dir() {
        return Err(ConfigError::DatasetNotFound(dataset_path).into());
    }

    let encoding = io_utils::resolve_encoding(cli.input_encoding.as_deref())?;
    let nulls = NullPolicy::new(cli.strict_nulls)
        .with_extra_tokens(&cli.null_tokens);
    debug!(
        "Null policy: strict sentinels {}, {} extra token(s)",
        if nulls.is_strict() { "on" } else { "off" },
        cli.null_tokens.len()
    );

    let schema = Schema::load(&schema_path)
        .with_context(|| format!("Loading schema from {schema_path:?}"))?;
    let compiled = schema::compile_patterns(&schema);
    for diagnostic in &compiled.diagnostics {
        warn!("{diagnostic}");
    }
    info!(
        "Auditing {} pattern column(s) across {} table(s) of dataset '{}'",
        compiled.column_count(),
        compiled.tables.len(),
        cli.dataset_id
    );

    let options = ScanOptions {
        delimiter: cli.delimiter.unwrap_or(io_utils::DEFAULT_CSV_DELIMITER),
        encoding,
        nulls: &nulls,
        row_limit: (cli.limit > 0).then_some(cli.limit),
    };
    let reports = audit_dataset(&cli.dataset_id, &dataset_path, &compiled, &options)?;

    let mut writer = io_utils::open_output(cli.output_path())?;
    report::write_report(&mut writer, &reports, cli.format)?;
    info!("Reported {} column(s)", reports.len());
    Ok(())
}

/// Scans every table in `compiled`, in order, and collects one record per pattern column.
pub fn audit_dataset(
    dataset_id: &str,
    dataset_path: &Path,
    compiled: &CompiledSchema,
    options: &ScanOptions<'_>,
) -> Result<Vec<ColumnReport>> {
    let mut reports = Vec::with_capacity(compiled.column_count());
    for patterns in &compiled.tables {
        let data_path = io_utils::table_data_path(dataset_path, &patterns.table);
        debug!(
            "Scanning table '{}' from {:?} with delimiter '{}'",
            patterns.table,
            data_path,
            printable_delimiter(options.delimiter)
        );
        let counts = scan::scan_table(&data_path, patterns, options)
            .with_context(|| format!("Scanning table '{}'", patterns.table))?;
        reports.extend(report::table_reports(dataset_id, patterns, &counts));
    }
    Ok(reports)
}

/// Convenience for library callers that only need the default UTF-8 comma setup.
pub fn default_scan_options(nulls: &NullPolicy) -> ScanOptions<'_> {
    ScanOptions {
        delimiter: io_utils::DEFAULT_CSV_DELIMITER,
        encoding: encoding_rs::UTF_8,
        nulls,
        row_limit: None,
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
