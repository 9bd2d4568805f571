use std::{process, sync::Arc, time::Duration};

use quire::{
    application::{error::AppError, session::SessionStore},
    config,
    infra::{
        api::BlogApiClient,
        error::InfraError,
        http::{self, AppState},
        telemetry,
    },
};
use tokio::{net::TcpListener, sync::watch};
use tracing::{Dispatch, Level, debug, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => serve(settings).await,
    }
}

async fn serve(settings: config::Settings) -> Result<(), AppError> {
    let client = BlogApiClient::new(&settings.api).map_err(AppError::from)?;
    let state = AppState::new(client, &settings.api, &settings.session, &settings.uploads);
    let (stop_tx, stop_rx) = watch::channel(false);
    let sweeper = tokio::spawn(sweep_sessions(state.sessions.clone(), stop_rx));
    let router = http::build_router(state);

    let listener = TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;
    info!(
        target = "quire::serve",
        addr = %settings.server.addr,
        api = %settings.api.base_url,
        "console listening"
    );

    let grace = settings.server.graceful_shutdown;
    let server = axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal());
    let result = server.await;

    let _ = stop_tx.send(true);
    if tokio::time::timeout(grace, sweeper).await.is_err() {
        warn!(
            target = "quire::serve",
            grace_secs = grace.as_secs(),
            "session sweeper did not stop in time"
        );
    }

    result.map_err(|err| AppError::unexpected(format!("server error: {err}")))?;
    info!(target = "quire::serve", "console stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "quire::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
    info!(target = "quire::serve", "shutdown requested");
}

/// Drop idle sessions until told to stop.
async fn sweep_sessions(sessions: Arc<SessionStore>, mut stop: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = sessions.purge_expired();
                if removed > 0 {
                    debug!(
                        target = "quire::serve",
                        removed,
                        active = sessions.len(),
                        "expired sessions removed"
                    );
                }
            }
            _ = stop.changed() => break,
        }
    }
}
