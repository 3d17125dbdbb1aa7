use std::borrow::Cow;
use std::collections::BTreeMap;

use regex::{NoExpand, Regex};

use crate::errors::{ManifestError, Result};

/// One compiled substitution applied to a masked column value.
///
/// Application replaces the first match of the pattern with the literal
/// replacement text. The replacement is never expanded, so `$1`-style
/// capture references in manifest data stay inert.
#[derive(Debug, Clone)]
pub struct MaskRule {
    pattern: Regex,
    replacement: String,
}

impl MaskRule {
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    /// Replace the first match of the pattern in `value`.
    pub fn apply<'a>(&self, value: &'a str) -> Cow<'a, str> {
        self.pattern.replace(value, NoExpand(&self.replacement))
    }
}

/// Compiled mask rules for one table, keyed by column name.
#[derive(Debug, Clone, Default)]
pub struct TableMask {
    columns: BTreeMap<String, Vec<MaskRule>>,
}

impl TableMask {
    /// Compile raw `(pattern, replacement)` pairs per column.
    ///
    /// Pairs with an empty pattern or empty replacement are dropped; they
    /// are specified as no-ops. Rule order within a column is preserved.
    pub(crate) fn compile(
        table: &str,
        raw: BTreeMap<String, Vec<(String, String)>>,
    ) -> Result<Self> {
        let mut columns = BTreeMap::new();

        for (column, pairs) in raw {
            let mut rules = Vec::new();
            for (pattern, replacement) in pairs {
                if pattern.is_empty() || replacement.is_empty() {
                    continue;
                }
                let pattern = Regex::new(&pattern).map_err(|source| {
                    ManifestError::InvalidMaskPattern {
                        table: table.to_string(),
                        column: column.clone(),
                        source: Box::new(source),
                    }
                })?;
                rules.push(MaskRule {
                    pattern,
                    replacement,
                });
            }
            if !rules.is_empty() {
                columns.insert(column, rules);
            }
        }

        Ok(Self { columns })
    }

    /// Rules configured for `column`, in manifest order.
    pub fn rules_for(&self, column: &str) -> Option<&[MaskRule]> {
        self.columns.get(column).map(Vec::as_slice)
    }

    /// True when no column carries a usable rule.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Column names with at least one rule.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }
}
