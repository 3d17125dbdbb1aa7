use pgcarve_manifest::TableMask;

use crate::errors::{DumpError, Result};
use crate::formats::{RowFormat, quoted_column_list};

/// Renders each extracted row as a standalone `INSERT` statement.
///
/// No header or footer: the statements replay anywhere, at the cost of
/// per-row overhead on load.
#[derive(Debug)]
pub struct InsertFormat {
    table: String,
    columns: Vec<String>,
}

impl InsertFormat {
    pub fn new(table: impl Into<String>, columns: &[String]) -> Self {
        Self {
            table: table.into(),
            columns: columns.to_vec(),
        }
    }
}

impl RowFormat for InsertFormat {
    fn dump_row(&self, row: &str, _mask: Option<&TableMask>) -> Result<String> {
        let fields: Vec<&str> = row.split('\t').collect();
        if fields.len() != self.columns.len() {
            return Err(DumpError::FieldCountMismatch {
                table: self.table.clone(),
                expected: self.columns.len(),
                actual: fields.len(),
            });
        }

        let values = fields
            .iter()
            .map(|field| render_literal(decode_copy_field(field)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!(
            "INSERT INTO {} ({}) VALUES ({});\n",
            self.table,
            quoted_column_list(&self.columns),
            values
        ))
    }
}

/// Decode one COPY text field; `\N` is the null sentinel.
fn decode_copy_field(field: &str) -> Option<String> {
    if field == "\\N" {
        return None;
    }

    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('v') => out.push('\u{b}'),
            Some('\\') => out.push('\\'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    Some(out)
}

/// Render a decoded value as a SQL literal. The preamble sets
/// `standard_conforming_strings = on`, so only quotes need doubling.
fn render_literal(value: Option<String>) -> String {
    match value {
        None => "NULL".to_string(),
        Some(text) => format!("'{}'", text.replace('\'', "''")),
    }
}
