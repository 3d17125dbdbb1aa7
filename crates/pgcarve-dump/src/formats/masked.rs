use std::borrow::Cow;

use pgcarve_manifest::TableMask;

use crate::errors::{DumpError, Result};
use crate::formats::{RowFormat, copy_footer, copy_header};

/// COPY block with per-column masking applied to each row.
///
/// The row is split on the tab delimiter before any pattern runs, so a
/// substitution can only ever rewrite the inside of one field: masking can
/// never touch a delimiter and break the row structure downstream. That is
/// this format's core correctness property.
#[derive(Debug)]
pub struct MaskedCopyFormat {
    table: String,
    columns: Vec<String>,
}

impl MaskedCopyFormat {
    pub fn new(table: impl Into<String>, columns: &[String]) -> Self {
        Self {
            table: table.into(),
            columns: columns.to_vec(),
        }
    }
}

impl RowFormat for MaskedCopyFormat {
    fn header(&self) -> Vec<String> {
        copy_header(&self.table, &self.columns)
    }

    fn footer(&self) -> Vec<String> {
        copy_footer()
    }

    fn dump_row(&self, row: &str, mask: Option<&TableMask>) -> Result<String> {
        // Masking is opt-in per table; without a configuration the row
        // passes through untouched.
        let Some(mask) = mask else {
            return Ok(format!("{row}\n"));
        };

        let mut fields: Vec<Cow<'_, str>> = row.split('\t').map(Cow::Borrowed).collect();
        if fields.len() != self.columns.len() {
            // An embedded, unescaped delimiter or a stale schema cache.
            // Unrecoverable on purpose: silently truncating data would be
            // worse than failing the run.
            return Err(DumpError::FieldCountMismatch {
                table: self.table.clone(),
                expected: self.columns.len(),
                actual: fields.len(),
            });
        }

        for (idx, column) in self.columns.iter().enumerate() {
            let Some(rules) = mask.rules_for(column) else {
                continue;
            };
            let mut value = fields[idx].to_string();
            for rule in rules {
                value = rule.apply(&value).into_owned();
            }
            fields[idx] = Cow::Owned(value);
        }

        Ok(format!("{}\n", fields.join("\t")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgcarve_manifest::Manifest;

    fn format() -> MaskedCopyFormat {
        MaskedCopyFormat::new(
            "users",
            &["id".to_string(), "email".to_string(), "age".to_string()],
        )
    }

    fn mask(yaml_rules: &str) -> TableMask {
        let yaml = format!(
            "tables:\n  - table: users\n    mask_columns:\n      email:\n{yaml_rules}"
        );
        Manifest::parse(&yaml)
            .expect("parse manifest")
            .table("users")
            .unwrap()
            .mask()
            .cloned()
            .expect("mask")
    }

    #[test]
    fn emits_copy_header_and_terminator() {
        assert_eq!(
            format().header(),
            ["COPY users (\"id\", \"email\", \"age\") FROM STDIN;"]
        );
        assert_eq!(format().footer(), ["\\.", ""]);
    }

    #[test]
    fn without_mask_the_row_is_unchanged() {
        let row = "1\talice@example.com\t42";
        assert_eq!(format().dump_row(row, None).unwrap(), "1\talice@example.com\t42\n");
    }

    #[test]
    fn masks_only_the_configured_column() {
        let mask = mask("        \"@example\\\\.com$\": \"@masked.test\"\n");
        let out = format()
            .dump_row("1\talice@example.com\t42", Some(&mask))
            .unwrap();
        assert_eq!(out, "1\talice@masked.test\t42\n");
    }

    #[test]
    fn unmatched_rows_pass_through_byte_identical() {
        let mask = mask("        \"@example\\\\.com$\": \"@masked.test\"\n");
        let row = "2\tbob@other.net\t7";
        assert_eq!(format().dump_row(row, Some(&mask)).unwrap(), format!("{row}\n"));
    }

    #[test]
    fn rules_apply_in_order_each_on_the_previous_result() {
        let mask = mask(
            "        \"alice\": \"carol\"\n        \"carol@\": \"masked@\"\n",
        );
        let out = format()
            .dump_row("1\talice@example.com\t42", Some(&mask))
            .unwrap();
        assert_eq!(out, "1\tmasked@example.com\t42\n");
    }

    #[test]
    fn replaces_only_the_first_match() {
        let mask = mask("        \"a\": \"X\"\n");
        let out = format().dump_row("1\taaa\t42", Some(&mask)).unwrap();
        assert_eq!(out, "1\tXaa\t42\n");
    }

    #[test]
    fn patterns_containing_the_delimiter_never_match() {
        let mask = mask("        \"com\\\\t42\": \"gone\"\n");
        let row = "1\talice@example.com\t42";
        assert_eq!(format().dump_row(row, Some(&mask)).unwrap(), format!("{row}\n"));
    }

    #[test]
    fn field_count_mismatch_is_fatal() {
        let mask = mask("        \"@example\\\\.com$\": \"@masked.test\"\n");
        let err = format().dump_row("1\talice@example.com", Some(&mask)).unwrap_err();
        assert!(matches!(
            err,
            DumpError::FieldCountMismatch { ref table, expected: 3, actual: 2 } if table == "users"
        ));
    }
}
