use sqlx::PgPool;

use crate::errors::Result;

/// Ordered column names of a table, by attribute number.
pub async fn list_columns(pool: &PgPool, table: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        select a.attname
        from pg_attribute a
        join pg_class c on c.oid = a.attrelid
        join pg_namespace n on n.oid = c.relnamespace
        where n.nspname = 'public'
          and c.relname = $1
          and a.attnum > 0
          and not a.attisdropped
        order by a.attnum
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// Foreign-key constraint names on a table, ordered by name.
pub async fn list_constraint_names(pool: &PgPool, table: &str) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        select con.conname
        from pg_constraint con
        join pg_class rel on rel.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = rel.relnamespace
        where nsp.nspname = 'public'
          and rel.relname = $1
          and con.contype = 'f'
        order by con.conname
        "#,
    )
    .bind(table)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// A single-column foreign-key edge between two tables.
#[derive(Debug, Clone)]
pub struct ForeignKeyEdge {
    pub table: String,
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// All single-column foreign keys in the public schema.
///
/// Multi-column keys are not usable for has-many cascades and are left out.
pub async fn list_foreign_keys(pool: &PgPool) -> Result<Vec<ForeignKeyEdge>> {
    let rows: Vec<(String, String, String, String)> = sqlx::query_as(
        r#"
        select
          src.relname,
          src_att.attname,
          ref.relname,
          ref_att.attname
        from pg_constraint con
        join pg_class src on src.oid = con.conrelid
        join pg_namespace nsp on nsp.oid = src.relnamespace
        join pg_class ref on ref.oid = con.confrelid
        join pg_attribute src_att
          on src_att.attrelid = src.oid and src_att.attnum = con.conkey[1]
        join pg_attribute ref_att
          on ref_att.attrelid = ref.oid and ref_att.attnum = con.confkey[1]
        where nsp.nspname = 'public'
          and con.contype = 'f'
          and array_length(con.conkey, 1) = 1
        order by src.relname, con.conname
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(table, column, referenced_table, referenced_column)| ForeignKeyEdge {
            table,
            column,
            referenced_table,
            referenced_column,
        })
        .collect())
}

/// Materialized view names in the public schema, ordered by name.
pub async fn list_materialized_views(pool: &PgPool) -> Result<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as(
        r#"
        select matviewname
        from pg_matviews
        where schemaname = 'public'
        order by matviewname
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|(name,)| name).collect())
}

/// A sequence owned by a table column (serial or identity).
#[derive(Debug, Clone)]
pub struct SerialSequence {
    pub table: String,
    pub sequence: String,
    pub column: String,
}

/// Sequences owned by table columns in the public schema.
pub async fn list_serial_sequences(pool: &PgPool) -> Result<Vec<SerialSequence>> {
    let rows: Vec<(String, String, String)> = sqlx::query_as(
        r#"
        select t.relname, s.relname, a.attname
        from pg_class s
        join pg_namespace n on n.oid = s.relnamespace
        join pg_depend d on d.objid = s.oid and d.deptype = 'a'
        join pg_class t on t.oid = d.refobjid
        join pg_attribute a on a.attrelid = d.refobjid and a.attnum = d.refobjsubid
        where s.relkind = 'S'
          and n.nspname = 'public'
        order by t.relname, s.relname
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(table, sequence, column)| SerialSequence {
            table,
            sequence,
            column,
        })
        .collect())
}
