use anyhow::Result;

use crate::db::{self, SessionRepository};

use super::args::SessionsCliArgs;

pub fn handle_sessions_command(args: SessionsCliArgs) -> Result<()> {
    let conn = db::init_db()?;

    let sessions: Vec<_> = SessionRepository::list(&conn, args.limit)?
        .into_iter()
        .filter(|s| !args.failed || s.exit_code != 0)
        .collect();

    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        return Ok(());
    }

    for session in sessions {
        println!(
            "#{} {} [{}] exit={} {} - {}",
            session.id,
            session.platform,
            session.reason,
            session.exit_code,
            session.meeting_url,
            session.ended_at
        );

        if let Some(message) = &session.error_message {
            println!(
                "    {}: {}",
                session.error_context.as_deref().unwrap_or("error"),
                message
            );
        }
    }

    Ok(())
}
