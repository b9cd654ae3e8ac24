//! Version-tracked database migrations for the libSQL backend.
//!
//! Each migration has a version number and SQL. `run_migrations()` checks
//! the current version and applies only the new ones sequentially.

use libsql::Connection;

use crate::error::DatabaseError;

/// A single migration step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: r#"
        CREATE TABLE IF NOT EXISTS items (
            id TEXT PRIMARY KEY,
            external_id TEXT NOT NULL UNIQUE,
            source_name TEXT NOT NULL,
            sender_name TEXT NOT NULL,
            raw_text TEXT NOT NULL,
            rewritten_text TEXT,
            media_kind TEXT NOT NULL DEFAULT 'none',
            media_ref TEXT,
            classification TEXT NOT NULL DEFAULT 'unclassified',
            quality_score REAL NOT NULL DEFAULT 0,
            bias_score REAL NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'pending',
            content_fingerprint TEXT NOT NULL,
            similarity_fingerprint TEXT NOT NULL,
            priority INTEGER NOT NULL DEFAULT 1,
            source_url TEXT,
            external_publish_url TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            posted_at TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_items_status ON items(status);
        CREATE INDEX IF NOT EXISTS idx_items_created ON items(created_at);
        CREATE INDEX IF NOT EXISTS idx_items_source ON items(source_name);
        CREATE INDEX IF NOT EXISTS idx_items_fingerprint ON items(content_fingerprint);

        CREATE TABLE IF NOT EXISTS item_actions (
            id TEXT PRIMARY KEY,
            item_id TEXT NOT NULL REFERENCES items(id),
            action_type TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_item_actions_item ON item_actions(item_id);
    "#,
}];

/// Apply any migrations newer than the recorded schema version.
pub async fn run_migrations(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| DatabaseError::Migration(format!("create _migrations: {e}")))?;

    let current = current_version(conn).await?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.sql)
            .await
            .map_err(|e| {
                DatabaseError::Migration(format!("apply {} (v{}): {e}", migration.name, migration.version))
            })?;
        conn.execute(
            "INSERT INTO _migrations (version, name) VALUES (?1, ?2)",
            libsql::params![migration.version, migration.name],
        )
        .await
        .map_err(|e| DatabaseError::Migration(format!("record v{}: {e}", migration.version)))?;
        tracing::info!(version = migration.version, name = migration.name, "Migration applied");
    }

    Ok(())
}

async fn current_version(conn: &Connection) -> Result<i64, DatabaseError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(|e| DatabaseError::Migration(format!("read version: {e}")))?;

    match rows
        .next()
        .await
        .map_err(|e| DatabaseError::Migration(format!("read version row: {e}")))?
    {
        Some(row) => row
            .get::<i64>(0)
            .map_err(|e| DatabaseError::Migration(format!("decode version: {e}"))),
        None => Ok(0),
    }
}
