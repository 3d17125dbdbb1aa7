use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::errors::Result;
use crate::queries;

/// Foreign-key constraint names per table, queried fresh per run.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    names: BTreeMap<String, Vec<String>>,
}

impl ConstraintRegistry {
    /// Load constraint names for `tables` from the database.
    pub async fn load<'a, I>(pool: &PgPool, tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut names = BTreeMap::new();
        for table in tables {
            names.insert(
                table.to_string(),
                queries::list_constraint_names(pool, table).await?,
            );
        }
        Ok(Self { names })
    }

    /// Build a registry from already-known constraint names.
    pub fn from_names(names: BTreeMap<String, Vec<String>>) -> Self {
        Self { names }
    }

    /// Constraint names on `table`; empty when the table has none.
    pub fn names(&self, table: &str) -> &[String] {
        self.names.get(table).map_or(&[], Vec::as_slice)
    }
}
