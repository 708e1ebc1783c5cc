use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: u32 = 2;

pub fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        ",
    )?;
    Ok(())
}

pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_migrations (
            version    INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS recipes (
            id           TEXT PRIMARY KEY,
            user_id      TEXT,
            title        TEXT NOT NULL,
            description  TEXT,
            ingredients  TEXT NOT NULL DEFAULT '[]',
            instructions TEXT NOT NULL DEFAULT '[]',
            cooking_time INTEGER,
            servings     INTEGER,
            source       TEXT,
            dietary      TEXT NOT NULL DEFAULT '{}',
            created_at   TEXT NOT NULL,
            updated_at   TEXT NOT NULL,
            deleted_at   TEXT
        );
        ",
    )?;
    Ok(())
}

pub fn create_indexes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_recipes_user_id    ON recipes(user_id);
        CREATE INDEX IF NOT EXISTS idx_recipes_deleted_at ON recipes(deleted_at);
        CREATE INDEX IF NOT EXISTS idx_recipes_title      ON recipes(title);
        ",
    )?;
    Ok(())
}

/// Source lookups arrived after v1; kept separate so the v2 migration
/// can apply it to existing databases.
pub fn create_source_index(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_recipes_source ON recipes(source);",
    )?;
    Ok(())
}
