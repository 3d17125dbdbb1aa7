use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::errors::{CatalogError, Result};
use crate::queries;

/// Ordered column lists for the tables of one run.
///
/// Loaded once up front so formatters can validate row shapes without
/// touching the connection again. Constructible from plain data for tests.
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    columns: BTreeMap<String, Vec<String>>,
}

impl SchemaCache {
    /// Load column lists for `tables` from the database.
    ///
    /// A table with no catalog columns does not exist; that is a
    /// configuration problem surfaced before any data is streamed.
    pub async fn load<'a, I>(pool: &PgPool, tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut columns = BTreeMap::new();
        for table in tables {
            let names = queries::list_columns(pool, table).await?;
            if names.is_empty() {
                return Err(CatalogError::UnknownTable(table.to_string()));
            }
            columns.insert(table.to_string(), names);
        }
        Ok(Self { columns })
    }

    /// Build a cache from already-known column lists.
    pub fn from_columns(columns: BTreeMap<String, Vec<String>>) -> Self {
        Self { columns }
    }

    /// Ordered column names for `table`.
    pub fn columns(&self, table: &str) -> Option<&[String]> {
        self.columns.get(table).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_columns_in_insertion_order() {
        let mut columns = BTreeMap::new();
        columns.insert(
            "users".to_string(),
            vec!["id".to_string(), "email".to_string()],
        );
        let cache = SchemaCache::from_columns(columns);

        assert_eq!(cache.columns("users"), Some(&["id".to_string(), "email".to_string()][..]));
        assert!(cache.columns("missing").is_none());
    }
}
