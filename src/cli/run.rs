//! `meeting-bot run`: one session with the scripted platform driver.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::api::ApiServer;
use crate::callback::CallbackClient;
use crate::config::Config;
use crate::global;
use crate::platform::{ScriptedPage, ScriptedPlatform, SessionScript};
use crate::session::{SessionConfig, SessionOrchestrator, SessionOutcome, SessionStatusHandle};
use crate::terminate::{GracefulLeave, PostSessionHook, ShellCommandHook};

use super::args::RunCliArgs;

pub async fn handle_run_command(args: RunCliArgs) -> Result<SessionOutcome> {
    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    apply_overrides(&mut config, &args);

    let session = config.session_config();
    let script = match &args.script {
        Some(path) => SessionScript::load(path)?,
        None => {
            info!("No session script given, using the default script");
            SessionScript::default()
        }
    };

    let callback = CallbackClient::new(
        config.callback.url.clone(),
        Duration::from_secs(config.callback.timeout_seconds),
    )?;
    let notifier = callback.clone();

    let hook = ShellCommandHook::from_command(&config.hook.post_command, config.hook.timeout_seconds)
        .map(|hook| Box::new(hook) as Box<dyn PostSessionHook>);

    let platform = Arc::new(ScriptedPlatform::new(session.platform, script));
    let terminator = GracefulLeave::new(Arc::clone(&platform), session.clone(), callback)
        .with_db_path(global::db_file().context("No location for the session database")?)
        .with_hook(hook);

    let status = SessionStatusHandle::default();
    let stop = CancellationToken::new();
    spawn_stop_on_ctrl_c(stop.clone());

    if args.api || config.api.enabled {
        let server = ApiServer::new(config.api.port, status.clone(), stop.clone());
        tokio::spawn(async move {
            if let Err(e) = server.start().await {
                error!("API server failed: {}", e);
            }
        });
    }

    log_session(&session);

    let orchestrator = SessionOrchestrator::new(
        platform,
        Arc::new(ScriptedPage),
        session,
        Box::new(terminator),
        Arc::new(notifier),
        status,
    );

    Ok(orchestrator.run(stop).await)
}

fn apply_overrides(config: &mut Config, args: &RunCliArgs) {
    if let Some(platform) = args.platform {
        config.bot.platform = platform;
    }
    if let Some(url) = &args.meeting_url {
        config.bot.meeting_url = Some(url.clone());
    }
    if let Some(name) = &args.bot_name {
        config.bot.bot_name = name.clone();
    }
    if let Some(timeout) = args.waiting_room_timeout_ms {
        config.automatic_leave.waiting_room_timeout_ms = timeout;
    }
}

fn spawn_stop_on_ctrl_c(stop: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, requesting stop");
                stop.cancel();
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });
}

fn log_session(session: &SessionConfig) {
    info!(
        "Session {}: platform={}, bot_name={}, waiting_room_timeout={}ms",
        session.session_id,
        session.platform,
        session.bot_name,
        session.waiting_room_timeout().as_millis()
    );
    if let Ok(path) = global::db_file() {
        info!("Session exits are recorded in {:?}", path);
    }
}
