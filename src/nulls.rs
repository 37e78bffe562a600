//! Null classification for trimmed cell values.
//!
//! An empty value is always null. Strict mode adds the sentinel spellings in
//! [`STRICT_NULL_TOKENS`]; callers may extend the set further through
//! [`NullPolicy::with_extra_tokens`].

use std::collections::HashSet;

/// Sentinel spellings treated as null under `--strict-nulls`, compared case-insensitively.
pub const STRICT_NULL_TOKENS: &[&str] = &["NULL", "NA", "NAN", "NONE"];

/// Returns true when `value` (already trimmed) counts as absent.
pub fn is_effectively_null(value: &str, strict_nulls: bool) -> bool {
    if value.is_empty() {
        return true;
    }
    strict_nulls
        && STRICT_NULL_TOKENS
            .iter()
            .any(|token| value.eq_ignore_ascii_case(token))
}

#[derive(Debug, Clone, Default)]
pub struct NullPolicy {
    strict: bool,
    extra_tokens: HashSet<String>,
}

impl NullPolicy {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            extra_tokens: HashSet::new(),
        }
    }

    /// Adds caller-supplied null spellings. Blank tokens are ignored.
    pub fn with_extra_tokens<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extra_tokens.extend(
            tokens
                .into_iter()
                .map(|token| token.as_ref().trim().to_uppercase())
                .filter(|token| !token.is_empty()),
        );
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn is_null(&self, value: &str) -> bool {
        if is_effectively_null(value, self.strict) {
            return true;
        }
        !self.extra_tokens.is_empty() && self.extra_tokens.contains(&value.to_uppercase())
    }
}
