use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open the database at its default location.
pub fn init_db() -> Result<Connection> {
    let db_path = crate::global::db_file()?;
    open(&db_path)
}

pub fn open(db_path: &Path) -> Result<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create database directory")?;
    }

    let conn = Connection::open(db_path).context("Failed to open database connection")?;

    migrate(&conn)?;

    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id TEXT NOT NULL,
            platform TEXT NOT NULL,
            meeting_url TEXT NOT NULL,
            connection_id TEXT,
            exit_code INTEGER NOT NULL,
            reason TEXT NOT NULL,
            error_context TEXT,
            error_message TEXT,
            ended_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )
    .context("Failed to create sessions table")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_ended_at ON sessions(ended_at DESC)",
        [],
    )
    .context("Failed to create sessions ended_at index")?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_sessions_reason ON sessions(reason)",
        [],
    )
    .context("Failed to create sessions reason index")?;

    Ok(())
}
