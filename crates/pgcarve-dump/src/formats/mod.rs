use std::fmt;
use std::str::FromStr;

use pgcarve_catalog::quote_ident;
use pgcarve_manifest::TableMask;

use crate::errors::{DumpError, Result};

mod copy;
mod insert;
mod masked;

pub use copy::CopyFormat;
pub use insert::InsertFormat;
pub use masked::MaskedCopyFormat;

/// Wire-level transfer encoding requested from the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferFormat {
    #[default]
    Text,
    Binary,
}

/// The closed set of output formats.
///
/// An unrecognized key is rejected up front: silently substituting a
/// format could drop masking intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatKind {
    #[default]
    Copy,
    Insert,
    CopyWithMask,
}

impl FormatKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FormatKind::Copy => "copy",
            FormatKind::Insert => "insert",
            FormatKind::CopyWithMask => "copy_with_mask",
        }
    }

    /// Build the formatter for one table, given its ordered column list.
    pub fn formatter(self, table: &str, columns: &[String]) -> Box<dyn RowFormat> {
        match self {
            FormatKind::Copy => Box::new(CopyFormat::new(table, columns)),
            FormatKind::Insert => Box::new(InsertFormat::new(table, columns)),
            FormatKind::CopyWithMask => Box::new(MaskedCopyFormat::new(table, columns)),
        }
    }
}

impl fmt::Display for FormatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatKind {
    type Err = DumpError;

    fn from_str(input: &str) -> Result<Self> {
        match input {
            "copy" => Ok(FormatKind::Copy),
            "insert" => Ok(FormatKind::Insert),
            "copy_with_mask" => Ok(FormatKind::CopyWithMask),
            other => Err(DumpError::UnknownFormat(other.to_string())),
        }
    }
}

/// Encodes extracted rows (and the surrounding block) into dump text.
pub trait RowFormat {
    /// Preamble lines for the table's block, without trailing newlines.
    fn header(&self) -> Vec<String> {
        Vec::new()
    }

    /// Postamble lines for the table's block, without trailing newlines.
    fn footer(&self) -> Vec<String> {
        Vec::new()
    }

    fn transfer(&self) -> TransferFormat {
        TransferFormat::Text
    }

    /// Encode one raw extracted row into the exact text to append to the
    /// output, including the row terminator.
    fn dump_row(&self, row: &str, mask: Option<&TableMask>) -> Result<String>;
}

pub(crate) fn quoted_column_list(columns: &[String]) -> String {
    columns
        .iter()
        .map(|column| quote_ident(column))
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn copy_header(table: &str, columns: &[String]) -> Vec<String> {
    vec![format!(
        "COPY {table} ({}) FROM STDIN;",
        quoted_column_list(columns)
    )]
}

pub(crate) fn copy_footer() -> Vec<String> {
    vec!["\\.".to_string(), String::new()]
}
