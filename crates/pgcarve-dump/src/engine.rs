use std::fs::{File, OpenOptions, create_dir_all, remove_file};
use std::path::PathBuf;

use serde::Serialize;
use sqlx::PgPool;
use sqlx::postgres::PgPoolCopyExt;
use tracing::info;

use pgcarve_catalog::{ConstraintRegistry, SchemaCache, SerialSequence, queries};
use pgcarve_manifest::Manifest;

use crate::buffer::DumpBuffer;
use crate::errors::{DumpError, Result};
use crate::formats::FormatKind;
use crate::records::{Associations, RecordSet};
use crate::stream::CopyRowStream;

/// Options for one dump run.
#[derive(Debug, Clone)]
pub struct DumpOptions {
    /// Target file; deleted first if it already exists.
    pub output: PathBuf,
    /// Output format applied to every table.
    pub format: FormatKind,
}

/// Per-table outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct TableDumpReport {
    pub table: String,
    pub rows: u64,
}

/// Outcome of a whole run, in export order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DumpReport {
    pub tables: Vec<TableDumpReport>,
}

/// Drives the whole dump: preamble, constraint deferral, per-table
/// streaming through the configured format, and post-load fixups.
///
/// Tables are processed sequentially over the one pool; the generated
/// script wraps all data loads in a single transaction, and constraints
/// are switched DEFERRABLE for every table before any data so forward
/// foreign-key references survive until commit.
#[derive(Debug, Clone)]
pub struct DumpEngine {
    options: DumpOptions,
}

impl DumpEngine {
    pub fn new(options: DumpOptions) -> Self {
        Self { options }
    }

    pub async fn run(&self, pool: &PgPool, manifest: &Manifest) -> Result<DumpReport> {
        let mut file = self.prepare_target()?;

        let foreign_keys = queries::list_foreign_keys(pool).await?;
        let associations = Associations::new(foreign_keys, manifest.foreign_keys());
        let records = RecordSet::resolve(manifest, &associations)?;
        let schema = SchemaCache::load(pool, records.names()).await?;
        let constraints = ConstraintRegistry::load(pool, records.names()).await?;

        info!(
            tables = records.len(),
            format = %self.options.format,
            output = %self.options.output.display(),
            "dump started"
        );

        let mut buffer = DumpBuffer::new();
        buffer.push(preamble());
        push_lines(
            &mut buffer,
            &deferrability_statements(&records, &constraints, Deferrability::Deferrable),
        );

        let mut report = DumpReport::default();

        for record in records.iter() {
            push_lines(&mut buffer, &defer_statements(record.name(), &constraints));
            push_lines(&mut buffer, &data_comment(record.name()));

            let columns = schema
                .columns(record.name())
                .ok_or_else(|| pgcarve_catalog::CatalogError::UnknownTable(record.name().to_string()))
                .map_err(DumpError::Catalog)?;
            let formatter = self.options.format.formatter(record.name(), columns);
            let mask = manifest.table(record.name()).and_then(|entry| entry.mask());

            push_lines(&mut buffer, &formatter.header());

            let statement = record.copy_statement(formatter.transfer());
            let mut rows = CopyRowStream::new(pool.copy_out_raw(&statement).await?);
            let mut count = 0u64;
            while let Some(row) = rows.next_row().await? {
                buffer.push(formatter.dump_row(&row, mask)?);
                count += 1;
            }
            buffer.flush(&mut file)?;

            push_lines(&mut buffer, &formatter.footer());

            info!(table = %record.name(), rows = count, "table dumped");
            report.tables.push(TableDumpReport {
                table: record.name().to_string(),
                rows: count,
            });
        }

        buffer.push_line("COMMIT;");
        buffer.push_line("");

        for view in queries::list_materialized_views(pool).await? {
            buffer.push_line(format!("refresh materialized view {view};"));
        }
        buffer.push_line("");

        for sequence in queries::list_serial_sequences(pool).await? {
            if records.contains(&sequence.table) {
                buffer.push_line(sequence_reset(&sequence));
            }
        }
        buffer.push_line("");

        push_lines(
            &mut buffer,
            &deferrability_statements(&records, &constraints, Deferrability::NotDeferrable),
        );
        buffer.flush(&mut file)?;

        info!(tables = report.tables.len(), "dump finished");
        Ok(report)
    }

    /// Delete a stale target and open a fresh one for appending.
    fn prepare_target(&self) -> Result<File> {
        let output = &self.options.output;
        if output.exists() {
            remove_file(output)?;
        }
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        Ok(OpenOptions::new().create(true).append(true).open(output)?)
    }
}

/// Whether constraint enforcement is being loosened or restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferrability {
    Deferrable,
    NotDeferrable,
}

impl Deferrability {
    fn as_sql(self) -> &'static str {
        match self {
            Deferrability::Deferrable => "DEFERRABLE",
            Deferrability::NotDeferrable => "NOT DEFERRABLE",
        }
    }
}

/// Fixed transactional header: open the transaction, disable timeouts, pin
/// encoding and search path so the script replays identically anywhere.
pub fn preamble() -> String {
    "BEGIN;\n\
     \n\
     SET statement_timeout = 0;\n\
     SET lock_timeout = 0;\n\
     SET client_encoding = 'UTF8';\n\
     SET standard_conforming_strings = on;\n\
     SET check_function_bodies = false;\n\
     SET client_min_messages = warning;\n\
     \n\
     SET search_path = public, pg_catalog;\n\
     \n"
        .to_string()
}

/// `ALTER TABLE ... ALTER CONSTRAINT ...` lines for every table in the set.
///
/// Emitted once with DEFERRABLE before any data and once with NOT
/// DEFERRABLE after everything else, restoring normal enforcement.
pub fn deferrability_statements(
    records: &RecordSet,
    constraints: &ConstraintRegistry,
    keyword: Deferrability,
) -> Vec<String> {
    let mut lines = Vec::new();
    for name in records.names() {
        lines.push("--".to_string());
        lines.push(format!(
            "-- Alter Constraints for Name: {name}; Type: {}",
            keyword.as_sql()
        ));
        lines.push("--".to_string());
        lines.push(String::new());
        for constraint in constraints.names(name) {
            lines.push(format!(
                "ALTER TABLE {name} ALTER CONSTRAINT {constraint} {};",
                keyword.as_sql()
            ));
        }
    }
    lines
}

/// `SET CONSTRAINTS ... DEFERRED;` lines for one table.
pub fn defer_statements(table: &str, constraints: &ConstraintRegistry) -> Vec<String> {
    let mut lines = vec![
        "--".to_string(),
        format!("-- Set Constraints for Name: {table}; Type: DEFERRED"),
        "--".to_string(),
        String::new(),
    ];
    for constraint in constraints.names(table) {
        lines.push(format!("SET CONSTRAINTS {constraint} DEFERRED;"));
    }
    lines
}

fn data_comment(table: &str) -> Vec<String> {
    vec![
        "--".to_string(),
        format!("-- Data for Name: {table}; Type: TABLE DATA"),
        "--".to_string(),
        String::new(),
    ]
}

/// Resynchronize a serial sequence with the dumped data so future inserts
/// do not collide with exported values.
pub fn sequence_reset(sequence: &SerialSequence) -> String {
    format!(
        "select setval('{}', (select max({}) from {}), true);",
        sequence.sequence, sequence.column, sequence.table
    )
}

fn push_lines(buffer: &mut DumpBuffer, lines: &[String]) {
    for line in lines {
        buffer.push_line(line);
    }
}
