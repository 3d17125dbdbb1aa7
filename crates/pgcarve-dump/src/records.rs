use std::collections::{BTreeMap, BTreeSet};

use pgcarve_catalog::ForeignKeyEdge;
use pgcarve_manifest::{ForeignKeyHint, Manifest};

use crate::errors::{DumpError, Result};
use crate::formats::TransferFormat;

/// How a child table references its parent.
#[derive(Debug, Clone)]
pub struct AssociationEdge {
    /// Referencing column on the child table.
    pub column: String,
    /// Referenced column on the parent table.
    pub referenced_column: String,
}

/// Child-to-parent foreign-key edges used to cascade row selection.
///
/// Catalog foreign keys are merged with manifest hints; a hint wins when
/// both declare an edge between the same pair. Hints reference the
/// conventional `id` primary key.
#[derive(Debug, Clone, Default)]
pub struct Associations {
    edges: BTreeMap<String, BTreeMap<String, AssociationEdge>>,
}

impl Associations {
    pub fn new(foreign_keys: Vec<ForeignKeyEdge>, hints: &[ForeignKeyHint]) -> Self {
        let mut edges: BTreeMap<String, BTreeMap<String, AssociationEdge>> = BTreeMap::new();

        for fk in foreign_keys {
            edges.entry(fk.table).or_default().insert(
                fk.referenced_table,
                AssociationEdge {
                    column: fk.column,
                    referenced_column: fk.referenced_column,
                },
            );
        }

        for hint in hints {
            edges.entry(hint.table.clone()).or_default().insert(
                hint.references.clone(),
                AssociationEdge {
                    column: hint.column.clone(),
                    referenced_column: "id".to_string(),
                },
            );
        }

        Self { edges }
    }

    /// The edge from `child` to `parent`, if one is known.
    pub fn edge(&self, child: &str, parent: &str) -> Option<&AssociationEdge> {
        self.edges.get(child).and_then(|parents| parents.get(parent))
    }
}

/// A resolved extraction descriptor: one table and the `SELECT` producing
/// its rows.
#[derive(Debug, Clone)]
pub struct ExtractRecord {
    name: String,
    select: String,
}

impl ExtractRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn select(&self) -> &str {
        &self.select
    }

    /// The COPY statement streaming this record's rows out of the server.
    pub fn copy_statement(&self, transfer: TransferFormat) -> String {
        match transfer {
            TransferFormat::Text => format!("COPY ({}) TO STDOUT", self.select),
            TransferFormat::Binary => {
                format!("COPY ({}) TO STDOUT (FORMAT binary)", self.select)
            }
        }
    }
}

/// The ordered set of extraction descriptors for one run.
///
/// Insertion order is export order. Callers are responsible for listing
/// parents before (or alongside) referrers; constraint deferral tolerates
/// forward references within the enclosing transaction, so no topological
/// sort happens here.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<ExtractRecord>,
    seen: BTreeSet<String>,
}

impl RecordSet {
    /// Resolve the manifest into concrete per-table extraction queries.
    ///
    /// Each entry contributes its own record, then its has-many children
    /// depth-first: a child selects the rows referencing any row the parent
    /// selected. A table reached twice keeps its first record.
    pub fn resolve(manifest: &Manifest, associations: &Associations) -> Result<Self> {
        let mut set = Self::default();
        for entry in manifest.tables() {
            let select = entry
                .query()
                .map(str::to_string)
                .unwrap_or_else(|| format!("select * from {}", entry.name()));
            set.add(manifest, associations, entry.name(), select)?;
        }
        Ok(set)
    }

    fn add(
        &mut self,
        manifest: &Manifest,
        associations: &Associations,
        name: &str,
        select: String,
    ) -> Result<()> {
        if !self.seen.insert(name.to_string()) {
            return Ok(());
        }
        self.records.push(ExtractRecord {
            name: name.to_string(),
            select: select.clone(),
        });

        let children = manifest
            .table(name)
            .map(|entry| entry.has_many())
            .unwrap_or_default();

        for child in children {
            if self.seen.contains(child) {
                continue;
            }
            let edge =
                associations
                    .edge(child, name)
                    .ok_or_else(|| DumpError::UnknownAssociation {
                        child: child.clone(),
                        parent: name.to_string(),
                    })?;
            let child_select = format!(
                "select * from {child} where {column} in (select {referenced} from ({select}) as parent_rows)",
                column = edge.column,
                referenced = edge.referenced_column,
            );
            self.add(manifest, associations, child, child_select)?;
        }

        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|record| record.name.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
