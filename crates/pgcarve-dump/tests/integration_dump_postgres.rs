//! End-to-end dump against a live PostgreSQL instance.
//!
//! Requires `TEST_DATABASE_URL` (or `DATABASE_URL`) pointing at a database
//! that may be freely written to; the test is skipped when neither is set.

use std::env;

use anyhow::{Context, Result};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use pgcarve_dump::{DumpEngine, DumpOptions, FormatKind};
use pgcarve_manifest::Manifest;

const SCHEMA: &str = r#"
drop table if exists orders;
drop table if exists users;
create table users (
    id serial primary key,
    email text not null,
    age integer
);
create table orders (
    id serial primary key,
    user_id integer not null references users (id),
    total integer not null
);
insert into users (email, age) values ('alice@example.com', 42), ('bob@other.net', 7);
insert into orders (user_id, total) values (1, 100), (2, 250);
"#;

const MANIFEST: &str = r#"
tables:
  - table: users
    has_many:
      - orders
    mask_columns:
      email:
        "@example\\.com$": "@masked.test"
"#;

fn database_url() -> Option<String> {
    env::var("TEST_DATABASE_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .ok()
}

async fn connect(url: &str) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(10))
        .connect(url)
        .await
        .context("connecting to Postgres")
}

async fn load_fixture(pool: &PgPool) -> Result<()> {
    for statement in SCHEMA.split(';') {
        let sql = statement.trim();
        if sql.is_empty() {
            continue;
        }
        sqlx::query(sql)
            .execute(pool)
            .await
            .with_context(|| format!("executing fixture statement: {sql}"))?;
    }
    Ok(())
}

#[tokio::test]
async fn dumps_a_masked_subset() -> Result<()> {
    let Some(url) = database_url() else {
        eprintln!("skipping: set TEST_DATABASE_URL to run the dump integration test");
        return Ok(());
    };

    let pool = connect(&url).await?;
    load_fixture(&pool).await?;

    let manifest = Manifest::parse(MANIFEST)?;
    let output = std::env::temp_dir().join("pgcarve_integration_dump.sql");
    let engine = DumpEngine::new(DumpOptions {
        output: output.clone(),
        format: FormatKind::CopyWithMask,
    });

    let report = engine.run(&pool, &manifest).await?;
    assert_eq!(report.tables.len(), 2);
    assert_eq!(report.tables[0].table, "users");
    assert_eq!(report.tables[0].rows, 2);
    assert_eq!(report.tables[1].table, "orders");
    assert_eq!(report.tables[1].rows, 2);

    let dump = std::fs::read_to_string(&output)?;
    assert!(dump.starts_with("BEGIN;\n"));
    assert!(dump.contains("COPY users (\"id\", \"email\", \"age\") FROM STDIN;"));
    assert!(dump.contains("alice@masked.test"));
    assert!(!dump.contains("alice@example.com"));
    assert!(dump.contains("bob@other.net"));
    assert!(dump.contains("COMMIT;"));
    assert!(dump.contains("select setval('users_id_seq', (select max(id) from users), true);"));
    assert!(dump.contains("ALTER TABLE orders ALTER CONSTRAINT"));
    assert!(dump.contains("NOT DEFERRABLE;"));

    std::fs::remove_file(&output).ok();
    Ok(())
}
