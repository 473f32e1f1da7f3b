//! Meetbridge server binary.
//!
//! Wires the SQLite store, the Graph client, and the core services, then
//! serves the webhook and admin routes. The renewal scheduler runs alongside
//! the server and is stopped on shutdown.

mod routes;
mod state;

use std::sync::Arc;

use anyhow::Context;
use meetbridge_core::{MeetingService, RsvpReconciler, SubscriptionManager};
use meetbridge_infra::config::loader;
use meetbridge_infra::{
    DbManager, GraphClient, RenewalScheduler, SettingsTokenProvider,
    SqliteMeetingRecordRepository, SqliteSettingsStore, SqliteUserLinkRepository,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = loader::load().context("loading configuration")?;

    let db = Arc::new(
        DbManager::new(&config.database.path, config.database.pool_size)
            .context("opening database")?,
    );
    db.run_migrations().context("running migrations")?;

    let records = Arc::new(SqliteMeetingRecordRepository::new(db.clone()));
    let settings = Arc::new(SqliteSettingsStore::new(db.clone()));
    let links = Arc::new(SqliteUserLinkRepository::new(db));

    let auth = Arc::new(
        SettingsTokenProvider::new(settings.clone(), config.graph.clone())
            .context("building token provider")?,
    );
    let api =
        Arc::new(GraphClient::new(config.graph.api_base.clone()).context("building Graph client")?);

    let reconciler = Arc::new(RsvpReconciler::new(
        auth.clone(),
        api.clone(),
        records.clone(),
        config.graph.api_base.clone(),
    ));
    let subscriptions = Arc::new(SubscriptionManager::new(
        auth.clone(),
        api.clone(),
        settings,
        config.webhook.notification_url(),
    ));
    let meetings = Arc::new(MeetingService::new(auth.clone(), api, records, links));

    let mut scheduler = if config.renewal.enabled {
        let mut scheduler =
            RenewalScheduler::new(config.renewal.cron_expression.clone(), subscriptions.clone());
        scheduler.start().await.context("starting renewal scheduler")?;
        info!(cron = %config.renewal.cron_expression, "subscription renewal scheduled");
        Some(scheduler)
    } else {
        warn!("subscription renewal disabled; the change feed will lapse without manual renewal");
        None
    };

    let state = AppState { reconciler, subscriptions, meetings, auth };
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&config.webhook.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.webhook.bind_addr))?;
    info!(addr = %config.webhook.bind_addr, "meetbridge server listening");

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    if let Some(scheduler) = scheduler.as_mut() {
        if let Err(err) = scheduler.stop().await {
            warn!(error = %err, "renewal scheduler did not stop cleanly");
        }
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => warn!(error = %err, "failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received ctrl-c"),
        () = terminate => info!("received terminate signal"),
    }
}
