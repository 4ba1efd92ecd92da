//! Session exit records.
//!
//! One row per terminated session. Raw SQL with rusqlite, no ORM.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, Row};

use crate::session::{SessionConfig, SessionOutcome};

const COLUMNS: &str = "id, session_id, platform, meeting_url, connection_id, exit_code, \
                       reason, error_context, error_message, ended_at";

/// An exit record from the database.
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub id: i64,
    pub session_id: String,
    pub platform: String,
    pub meeting_url: String,
    pub connection_id: Option<String>,
    pub exit_code: i32,
    pub reason: String,
    pub error_context: Option<String>,
    pub error_message: Option<String>,
    pub ended_at: String,
}

impl SessionRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            platform: row.get(2)?,
            meeting_url: row.get(3)?,
            connection_id: row.get(4)?,
            exit_code: row.get(5)?,
            reason: row.get(6)?,
            error_context: row.get(7)?,
            error_message: row.get(8)?,
            ended_at: row.get(9)?,
        })
    }
}

pub struct SessionRepository;

impl SessionRepository {
    /// Insert the exit record of a finished session. Returns the row ID.
    pub fn insert(conn: &Connection, config: &SessionConfig, outcome: &SessionOutcome) -> Result<i64> {
        conn.execute(
            "INSERT INTO sessions (session_id, platform, meeting_url, connection_id, exit_code, \
             reason, error_context, error_message) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                config.session_id.to_string(),
                config.platform.as_str(),
                config.meeting_url,
                config.connection_id,
                outcome.exit_code(),
                outcome.reason.as_str(),
                outcome.error.as_ref().map(|e| e.context.as_str()),
                outcome.error.as_ref().map(|e| e.message.as_str()),
            ],
        )
        .context("Failed to insert session exit record")?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, session_id: &str) -> Result<Option<SessionRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM sessions WHERE session_id = ?1 ORDER BY id DESC LIMIT 1"
            ))
            .context("Failed to prepare session query")?;

        let mut rows = stmt
            .query_map(params![session_id], SessionRecord::from_row)
            .context("Failed to query session")?;

        match rows.next() {
            Some(Ok(record)) => Ok(Some(record)),
            Some(Err(e)) => Err(e.into()),
            None => Ok(None),
        }
    }

    /// List exit records, newest first.
    pub fn list(conn: &Connection, limit: usize) -> Result<Vec<SessionRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {COLUMNS} FROM sessions ORDER BY ended_at DESC, id DESC LIMIT ?1"
            ))
            .context("Failed to prepare sessions list query")?;

        let records = stmt
            .query_map(params![limit as i64], SessionRecord::from_row)
            .context("Failed to list sessions")?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;
    use crate::platform::{PlatformError, PlatformId};
    use crate::session::{ErrorContext, ErrorDetail, LeaveReason};

    fn setup_test_db() -> Result<Connection> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(conn)
    }

    #[test]
    fn test_migrate_creates_table() {
        let conn = setup_test_db().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='sessions'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_migrate_is_idempotent() {
        let conn = setup_test_db().unwrap();
        migrate(&conn).unwrap();
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup_test_db().unwrap();
        let config = SessionConfig::new(PlatformId::Zoom, "https://zoom.us/j/1")
            .with_connection_id(Some("abc".to_string()));

        let id = SessionRepository::insert(
            &conn,
            &config,
            &SessionOutcome::success(LeaveReason::Custom("admin_said_no".to_string())),
        )
        .unwrap();
        assert!(id > 0);

        let record = SessionRepository::get(&conn, &config.session_id.to_string())
            .unwrap()
            .unwrap();
        assert_eq!(record.platform, "zoom");
        assert_eq!(record.connection_id.as_deref(), Some("abc"));
        assert_eq!(record.exit_code, 0);
        assert_eq!(record.reason, "admin_said_no");
        assert!(record.error_context.is_none());
    }

    #[test]
    fn test_get_missing() {
        let conn = setup_test_db().unwrap();
        assert!(SessionRepository::get(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_insert_failure_with_detail() {
        let conn = setup_test_db().unwrap();
        let config = SessionConfig::new(PlatformId::GoogleMeet, "https://meet.google.com/x");
        let err = PlatformError::failed("Error", "join button not found");
        let detail = ErrorDetail::from_error(&err, ErrorContext::JoinMeetingError, config.platform);

        SessionRepository::insert(
            &conn,
            &config,
            &SessionOutcome::failure(LeaveReason::JoinMeetingError, Some(detail)),
        )
        .unwrap();

        let records = SessionRepository::list(&conn, 5).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].exit_code, 1);
        assert_eq!(records[0].error_context.as_deref(), Some("join_meeting_error"));
        assert_eq!(records[0].error_message.as_deref(), Some("join button not found"));
    }

    #[test]
    fn test_list_newest_first_with_limit() {
        let conn = setup_test_db().unwrap();
        let config = SessionConfig::new(PlatformId::Teams, "https://teams.microsoft.com/l/1");
        for reason in [
            LeaveReason::AdmissionTimeout,
            LeaveReason::NormalCompletion,
            LeaveReason::RemovedByAdmin,
        ] {
            SessionRepository::insert(&conn, &config, &SessionOutcome::success(reason)).unwrap();
        }

        let records = SessionRepository::list(&conn, 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].reason, "removed_by_admin");
        assert_eq!(records[1].reason, "normal_completion");
    }
}
