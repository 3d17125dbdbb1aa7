use pgcarve_manifest::TableMask;

use crate::errors::Result;
use crate::formats::{RowFormat, copy_footer, copy_header};

/// Pass-through COPY block: rows are appended exactly as extracted, inside
/// a `COPY ... FROM STDIN` statement that replays directly.
#[derive(Debug)]
pub struct CopyFormat {
    table: String,
    columns: Vec<String>,
}

impl CopyFormat {
    pub fn new(table: impl Into<String>, columns: &[String]) -> Self {
        Self {
            table: table.into(),
            columns: columns.to_vec(),
        }
    }
}

impl RowFormat for CopyFormat {
    fn header(&self) -> Vec<String> {
        copy_header(&self.table, &self.columns)
    }

    fn footer(&self) -> Vec<String> {
        copy_footer()
    }

    fn dump_row(&self, row: &str, _mask: Option<&TableMask>) -> Result<String> {
        Ok(format!("{row}\n"))
    }
}
