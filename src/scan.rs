//! Table scanning: stream one data file and count pattern hits per column.

use std::{collections::HashMap, io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::debug;

use crate::{
    nulls::NullPolicy,
    rows::RowStream,
    schema::{ColumnPattern, TablePatterns},
};

/// Per-column tallies. `total_non_empty` always equals `matches + mismatches`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnCounts {
    pub total_non_empty: u64,
    pub matches: u64,
    pub mismatches: u64,
}

impl ColumnCounts {
    pub fn record(&mut self, matched: bool) {
        self.total_non_empty += 1;
        if matched {
            self.matches += 1;
        } else {
            self.mismatches += 1;
        }
    }

    pub fn hit_rate(&self) -> f64 {
        if self.total_non_empty == 0 {
            0.0
        } else {
            self.matches as f64 / self.total_non_empty as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScanOptions<'a> {
    pub delimiter: u8,
    pub encoding: &'static Encoding,
    pub nulls: &'a NullPolicy,
    /// Maximum data rows to read; `None` scans the whole file.
    pub row_limit: Option<usize>,
}

/// Counters for every column of a table, in pattern declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCounts {
    pub columns: Vec<(String, ColumnCounts)>,
    pub rows_scanned: usize,
}

impl TableCounts {
    fn zeroed(patterns: &TablePatterns) -> Self {
        Self {
            columns: patterns
                .column_names()
                .map(|name| (name.to_string(), ColumnCounts::default()))
                .collect(),
            rows_scanned: 0,
        }
    }

    pub fn get(&self, column: &str) -> Option<&ColumnCounts> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, counts)| counts)
    }
}

struct ActiveColumn<'p> {
    slot: usize,
    index: usize,
    pattern: &'p ColumnPattern,
}

/// Scans `path` for one table. A missing file yields all-zero counters.
pub fn scan_table(
    path: &Path,
    patterns: &TablePatterns,
    options: &ScanOptions<'_>,
) -> Result<TableCounts> {
    if !path.exists() {
        debug!(
            "Data file {:?} for table '{}' not found; reporting zero counts",
            path, patterns.table
        );
        return Ok(TableCounts::zeroed(patterns));
    }
    let rows = RowStream::open(path, options.delimiter, options.encoding)?;
    let counts =
        scan_rows(rows, patterns, options).with_context(|| format!("Scanning {path:?}"))?;
    debug!(
        "Scanned {} row(s) from {:?} for table '{}'",
        counts.rows_scanned, path, patterns.table
    );
    Ok(counts)
}

/// Consumes `rows` once, counting matches for the pattern columns present in its header.
pub fn scan_rows<R: Read>(
    mut rows: RowStream<R>,
    patterns: &TablePatterns,
    options: &ScanOptions<'_>,
) -> Result<TableCounts> {
    let mut counts = TableCounts::zeroed(patterns);

    let header_positions: HashMap<&str, usize> = rows
        .headers()
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.as_str(), idx))
        .collect();
    let active = patterns
        .columns
        .iter()
        .enumerate()
        .filter_map(|(slot, (name, pattern))| {
            let index = *header_positions.get(name.as_str())?;
            Some(ActiveColumn {
                slot,
                index,
                pattern,
            })
        })
        .collect::<Vec<_>>();
    drop(header_positions);

    if active.is_empty() {
        debug!(
            "No pattern columns of table '{}' appear in the header",
            patterns.table
        );
        return Ok(counts);
    }

    for (row_idx, row) in rows.by_ref().enumerate() {
        if let Some(limit) = options.row_limit
            && row_idx >= limit
        {
            break;
        }
        let row = row?;
        counts.rows_scanned += 1;
        for column in &active {
            let Some(raw) = row.get(column.index) else {
                continue;
            };
            let value = raw.trim();
            if options.nulls.is_null(value) {
                continue;
            }
            counts.columns[column.slot]
                .1
                .record(column.pattern.is_full_match(value));
        }
    }
    debug!(
        "Table '{}' stopped after record {}",
        patterns.table,
        rows.row_number()
    );
    Ok(counts)
}
