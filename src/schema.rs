//! Dataset schema model and column pattern compilation.
//!
//! A schema is a JSON document of the form
//! `{"tables": [{"name": ..., "columns": [{"name": ..., "pattern": ...}]}]}`.
//! Only the fields needed for auditing are modelled; everything else in the
//! document is ignored. [`compile_patterns`] turns the declared patterns into
//! full-match regexes, collecting unusable declarations as
//! [`PatternDiagnostic`] values instead of failing.

use std::{fmt, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use fancy_regex::Regex;
use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Schema {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableSpec {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ColumnSpec {
    #[serde(default)]
    pub name: Option<String>,
    /// Kept loosely typed: a non-string pattern is treated as absent.
    #[serde(default)]
    pub pattern: Option<serde_json::Value>,
}

impl TableSpec {
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }
}

impl ColumnSpec {
    pub fn name_str(&self) -> Option<&str> {
        self.name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn pattern_str(&self) -> Option<&str> {
        self.pattern
            .as_ref()
            .and_then(|value| value.as_str())
            .filter(|pattern| !pattern.is_empty())
    }
}

impl Schema {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening schema file {path:?}"))?;
        let reader = BufReader::new(file);
        let schema = serde_json::from_reader(reader)
            .with_context(|| format!("Parsing schema JSON {path:?}"))?;
        Ok(schema)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("Parsing schema JSON")
    }
}

/// A declared pattern compiled for full-value matching.
#[derive(Debug, Clone)]
pub struct ColumnPattern {
    source: String,
    matcher: Regex,
}

impl ColumnPattern {
    pub fn compile(source: &str) -> Result<Self, fancy_regex::Error> {
        // Validate the pattern on its own first so a stray `)` cannot pair with the anchor group.
        Regex::new(source)?;
        let matcher = Regex::new(&format!("^(?:{source})$"))?;
        Ok(Self {
            source: source.to_string(),
            matcher,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// A value that exhausts the backtracking budget is treated as a mismatch.
    pub fn is_full_match(&self, value: &str) -> bool {
        match self.matcher.is_match(value) {
            Ok(matched) => matched,
            Err(err) => {
                debug!("Pattern {:?} gave up on {value:?}: {err}", self.source);
                false
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct TablePatterns {
    pub table: String,
    pub columns: Vec<(String, ColumnPattern)>,
}

impl TablePatterns {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            columns: Vec::new(),
        }
    }

    fn upsert(&mut self, column: &str, pattern: ColumnPattern) {
        match self.columns.iter_mut().find(|(name, _)| name == column) {
            Some(slot) => slot.1 = pattern,
            None => self.columns.push((column.to_string(), pattern)),
        }
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternDiagnostic {
    InvalidRegex {
        table: String,
        column: String,
        pattern: String,
        message: String,
    },
    UnnamedTable {
        position: usize,
    },
    UnnamedColumn {
        table: String,
        position: usize,
        pattern: String,
    },
}

impl fmt::Display for PatternDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternDiagnostic::InvalidRegex {
                table,
                column,
                pattern,
                message,
            } => write!(
                f,
                "invalid regex for {table}.{column}: {pattern:?} ({})",
                message.lines().last().unwrap_or(message.as_str()).trim()
            ),
            PatternDiagnostic::UnnamedTable { position } => {
                write!(f, "table #{} has no name; skipping", position + 1)
            }
            PatternDiagnostic::UnnamedColumn {
                table,
                position,
                pattern,
            } => write!(
                f,
                "column #{} of {table} declares pattern {pattern:?} but has no name; skipping",
                position + 1
            ),
        }
    }
}

/// Compiled patterns for every table that has at least one usable column, in schema order.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    pub tables: Vec<TablePatterns>,
    pub diagnostics: Vec<PatternDiagnostic>,
}

impl CompiledSchema {
    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|table| table.columns.len()).sum()
    }
}

pub fn compile_patterns(schema: &Schema) -> CompiledSchema {
    let mut compiled = CompiledSchema::default();
    for (table_pos, table) in schema.tables.iter().enumerate() {
        let Some(table_name) = table.name_str() else {
            if table.columns.iter().any(|c| c.pattern_str().is_some()) {
                compiled.diagnostics.push(PatternDiagnostic::UnnamedTable {
                    position: table_pos,
                });
            }
            continue;
        };
        let mut patterns = TablePatterns::new(table_name);
        for (column_pos, column) in table.columns.iter().enumerate() {
            let Some(source) = column.pattern_str() else {
                continue;
            };
            let Some(column_name) = column.name_str() else {
                compiled.diagnostics.push(PatternDiagnostic::UnnamedColumn {
                    table: table_name.to_string(),
                    position: column_pos,
                    pattern: source.to_string(),
                });
                continue;
            };
            match ColumnPattern::compile(source) {
                Ok(pattern) => patterns.upsert(column_name, pattern),
                Err(err) => compiled.diagnostics.push(PatternDiagnostic::InvalidRegex {
                    table: table_name.to_string(),
                    column: column_name.to_string(),
                    pattern: source.to_string(),
                    message: err.to_string(),
                }),
            }
        }
        if patterns.columns.is_empty() {
            continue;
        }
        match compiled.tables.iter_mut().find(|t| t.table == table_name) {
            Some(existing) => *existing = patterns,
            None => compiled.tables.push(patterns),
        }
    }
    compiled
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(raw: &str) -> Schema {
        Schema::from_json_str(raw).expect("schema parses")
    }

    fn find_table<'a>(compiled: &'a CompiledSchema, name: &str) -> Option<&'a TablePatterns> {
        compiled.tables.iter().find(|table| table.table == name)
    }

    #[test]
    fn patterns_use_full_match_semantics() {
        let pattern = ColumnPattern::compile("[0-9]+").expect("compiles");
        assert!(pattern.is_full_match("12"));
        assert!(!pattern.is_full_match("12a"));
        assert!(!pattern.is_full_match("a12"));
        let anchored = ColumnPattern::compile("^[0-9]+$").expect("compiles");
        assert!(anchored.is_full_match("12"));
        assert!(!anchored.is_full_match("12a"));
        let alternation = ColumnPattern::compile("a|bc").expect("compiles");
        assert!(alternation.is_full_match("a"));
        assert!(!alternation.is_full_match("abc"));
    }

    #[test]
    fn lookaround_and_backreferences_are_supported() {
        let not_zeros = ColumnPattern::compile(r"^(?!0000)\d{4}$").expect("compiles");
        assert!(not_zeros.is_full_match("1234"));
        assert!(!not_zeros.is_full_match("0000"));
        assert!(!not_zeros.is_full_match("12345"));
        let behind = ColumnPattern::compile(r"[A-Z]+(?<=X)").expect("compiles");
        assert!(behind.is_full_match("ABX"));
        assert!(!behind.is_full_match("ABC"));
        let doubled = ColumnPattern::compile(r"(\w)\1").expect("compiles");
        assert!(doubled.is_full_match("aa"));
        assert!(!doubled.is_full_match("ab"));
    }

    #[test]
    fn lookahead_column_is_compiled_not_diagnosed() {
        let schema = schema(
            r#"{"tables": [{"name": "T", "columns": [
                {"name": "id", "pattern": "^(?!0000)\\d{4}$"},
                {"name": "x", "pattern": "x"}
            ]}]}"#,
        );
        let compiled = compile_patterns(&schema);
        assert!(compiled.diagnostics.is_empty());
        let t = find_table(&compiled, "T").expect("T present");
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["id", "x"]);
    }

    #[test]
    fn unbalanced_group_is_rejected_before_anchoring() {
        assert!(ColumnPattern::compile("a)(?:b").is_err());
    }

    #[test]
    fn invalid_pattern_is_diagnosed_and_siblings_survive() {
        let schema = schema(
            r#"{"tables": [
                {"name": "T", "columns": [
                    {"name": "bad", "pattern": "([0-9"},
                    {"name": "good", "pattern": "^x$"}
                ]},
                {"name": "U", "columns": [{"name": "id", "pattern": "[a-z]+"}]}
            ]}"#,
        );
        let compiled = compile_patterns(&schema);
        assert_eq!(compiled.tables.len(), 2);
        let t = find_table(&compiled, "T").expect("T present");
        assert_eq!(t.column_names().collect::<Vec<_>>(), vec!["good"]);
        assert!(find_table(&compiled, "U").is_some());
        assert_eq!(compiled.diagnostics.len(), 1);
        match &compiled.diagnostics[0] {
            PatternDiagnostic::InvalidRegex {
                table,
                column,
                pattern,
                ..
            } => {
                assert_eq!(table, "T");
                assert_eq!(column, "bad");
                assert_eq!(pattern, "([0-9");
            }
            other => panic!("unexpected diagnostic {other:?}"),
        }
        assert!(compiled.diagnostics[0].to_string().contains("T.bad"));
    }

    #[test]
    fn tables_without_usable_patterns_are_omitted() {
        let schema = schema(
            r#"{"tables": [
                {"name": "plain", "columns": [{"name": "a"}, {"name": "b", "pattern": ""}]},
                {"name": "odd", "columns": [{"name": "c", "pattern": 42}]},
                {"columns": [{"name": "d", "pattern": "x"}]},
                {"name": "kept", "columns": [{"pattern": "y"}, {"name": "e", "pattern": "z"}]}
            ], "version": 3}"#,
        );
        let compiled = compile_patterns(&schema);
        let names: Vec<&str> = compiled.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["kept"]);
        assert_eq!(compiled.column_count(), 1);
        assert_eq!(
            compiled.diagnostics,
            vec![
                PatternDiagnostic::UnnamedTable { position: 2 },
                PatternDiagnostic::UnnamedColumn {
                    table: "kept".to_string(),
                    position: 0,
                    pattern: "y".to_string(),
                },
            ]
        );
    }

    #[test]
    fn duplicate_declarations_keep_first_position() {
        let schema = schema(
            r#"{"tables": [
                {"name": "A", "columns": [{"name": "x", "pattern": "1"}, {"name": "y", "pattern": "2"}, {"name": "x", "pattern": "3"}]},
                {"name": "B", "columns": [{"name": "z", "pattern": "4"}]},
                {"name": "A", "columns": [{"name": "w", "pattern": "5"}]}
            ]}"#,
        );
        let compiled = compile_patterns(&schema);
        let names: Vec<&str> = compiled.tables.iter().map(|t| t.table.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
        let a = find_table(&compiled, "A").expect("A present");
        assert_eq!(a.column_names().collect::<Vec<_>>(), vec!["w"]);
    }

    #[test]
    fn duplicate_columns_take_last_pattern() {
        let schema = schema(
            r#"{"tables": [{"name": "A", "columns": [
                {"name": "x", "pattern": "1"}, {"name": "y", "pattern": "2"}, {"name": "x", "pattern": "3"}
            ]}]}"#,
        );
        let compiled = compile_patterns(&schema);
        let a = find_table(&compiled, "A").expect("A present");
        assert_eq!(a.column_names().collect::<Vec<_>>(), vec!["x", "y"]);
        assert_eq!(a.columns[0].1.source(), "3");
    }

    #[test]
    fn missing_tables_key_yields_empty_schema() {
        let compiled = compile_patterns(&schema("{}"));
        assert!(compiled.tables.is_empty());
        assert!(compiled.diagnostics.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Schema::from_json_str("{\"tables\": [").is_err());
    }
}
