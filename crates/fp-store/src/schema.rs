use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA_VERSION: i64 = 1;

pub fn initialize(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    conn.pragma_update(None, "busy_timeout", 5000)?;
    conn.pragma_update(None, "wal_autocheckpoint", 100)?;

    // Fails on in-memory databases; not fatal.
    if conn
        .execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")
        .is_ok()
    {
        tracing::info!("startup WAL checkpoint complete");
    }

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
            key   TEXT PRIMARY KEY,
            value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS results (
            n              TEXT PRIMARY KEY,
            residue        INTEGER NOT NULL,
            page           TEXT NOT NULL,
            page_offset    INTEGER NOT NULL,
            factors        TEXT NOT NULL,
            method         TEXT NOT NULL,
            iterations     INTEGER NOT NULL,
            confidence     REAL NOT NULL,
            exact          INTEGER NOT NULL DEFAULT 0,
            max_iterations INTEGER NOT NULL,
            deadline_ms    INTEGER,
            recorded_at    INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_results_method ON results(method);
        CREATE INDEX IF NOT EXISTS idx_results_residue ON results(residue);
        CREATE INDEX IF NOT EXISTS idx_results_exact ON results(exact);
        ",
    )?;

    conn.execute(
        "INSERT OR REPLACE INTO metadata (key, value) VALUES ('schema_version', ?1)",
        [SCHEMA_VERSION.to_string()],
    )?;

    tracing::info!(version = SCHEMA_VERSION, "schema initialized");
    Ok(())
}

pub fn get_schema_version(conn: &Connection) -> Result<i64> {
    let version: String = conn.query_row(
        "SELECT value FROM metadata WHERE key = 'schema_version'",
        [],
        |row| row.get(0),
    )?;
    Ok(version.parse().unwrap_or(0))
}
