use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

use homeroom_core::config::HomeroomConfig;
use homeroom_core::reminder::FiredReminder;
use homeroom_core::types::UserRole;
use homeroom_notify::{Notifier, WebhookSender};
use homeroom_scheduler::{ReminderExecutor, ReminderScheduler};
use homeroom_store::Store;
use homeroom_users::UserDirectory;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "homeroom=info,homeroomd=info".into()),
        )
        .init();

    // load config: explicit path via HOMEROOM_CONFIG > ~/.homeroom/homeroom.toml
    let config_path = std::env::var("HOMEROOM_CONFIG").ok();
    let config = HomeroomConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        HomeroomConfig::default()
    });

    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    // One file, one connection per subsystem. Each constructor runs its own
    // idempotent migrations.
    let store = Store::open(&db_path)?;
    let users = Arc::new(UserDirectory::new(rusqlite::Connection::open(&db_path)?)?);
    info!("database migrations complete");

    // Bootstrap configured global admins as active accounts.
    for admin_id in &config.authorization.global_admins {
        users.upsert_account(*admin_id, None, UserRole::GlobalAdmin, true)?;
    }

    // Fired-reminder channel: executor tick loop → delivery task.
    let (fired_tx, mut fired_rx) = mpsc::channel::<FiredReminder>(256);
    let executor = ReminderExecutor::new(fired_tx);
    let scheduler = Arc::new(ReminderScheduler::new(store.clone(), executor.clone()));

    // Rehydrate before the executor loop starts and before any intake:
    // persisted future jobs get re-armed, jobs missed while the process was
    // down stay dropped.
    scheduler.rehydrate()?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(executor.clone().run(shutdown_rx.clone()));

    // Delivery task: fired reminders → notifier fan-out through the gateway.
    let sender = WebhookSender::new(&config.gateway);
    let notifier = Notifier::with_timeout(
        store.clone(),
        sender,
        Duration::from_secs(config.gateway.send_timeout_secs),
    );
    tokio::spawn(async move {
        while let Some(fired) = fired_rx.recv().await {
            if let Err(e) = notifier.deliver(fired.assignment_id, fired.label).await {
                error!(
                    assignment_id = %fired.assignment_id,
                    label = %fired.label,
                    "reminder delivery failed: {e}"
                );
            }
        }
        info!("delivery task exiting (channel closed)");
    });

    // Retention sweep: drop assignments long past their deadline.
    let purge_store = store.clone();
    let purge_after = chrono::Duration::hours(config.retention.purge_after_hours as i64);
    let purge_every = Duration::from_secs(config.retention.purge_interval_secs);
    let mut purge_shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_every);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    match purge_store.purge_expired(chrono::Utc::now() - purge_after) {
                        Ok(titles) if !titles.is_empty() => {
                            info!(titles = ?titles, "expired assignments purged");
                        }
                        Ok(_) => {}
                        Err(e) => error!("retention purge failed: {e}"),
                    }
                }
                _ = purge_shutdown.changed() => {
                    if *purge_shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    });

    info!("homeroomd running — Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    let _ = shutdown_tx.send(true);
    Ok(())
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
