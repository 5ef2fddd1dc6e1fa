use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use std::sync::Arc;

use healthtrack::core::{Config, SystemClock};
use healthtrack::database::{ReminderStore, SqliteReminderStore};
use healthtrack::features::notifications::{
    Capability, LogChannel, NotificationChannel, PermissionGate, WebhookChannel,
};
use healthtrack::features::reminders::ReminderScheduler;

fn build_channel(config: &Config) -> Result<Arc<dyn NotificationChannel>> {
    let channel: Arc<dyn NotificationChannel> = match &config.webhook_url {
        Some(url) => {
            info!("Delivering reminders to webhook {url}");
            Arc::new(PermissionGate::new(
                WebhookChannel::new(url.clone())?,
                config.notify_permission,
            ))
        }
        None => {
            info!("No NOTIFY_WEBHOOK_URL set, delivering reminders to the log");
            Arc::new(PermissionGate::new(LogChannel::new(), config.notify_permission))
        }
    };
    Ok(channel)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting reminder daemon...");

    let store: Arc<dyn ReminderStore> = match SqliteReminderStore::open(&config.database_path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!("Failed to open database {}: {e:#}", config.database_path);
            return Err(e);
        }
    };

    let channel = build_channel(&config)?;
    if config.notify_permission != Capability::Granted {
        warn!(
            "Notification permission is {}; due reminders will not be delivered",
            config.notify_permission
        );
    }

    let scheduler = Arc::new(ReminderScheduler::new(
        store,
        channel,
        Arc::new(SystemClock),
        config.scheduler_config(),
    ));
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested, waiting for the current check to finish...");
    handle.shutdown().await?;

    info!("Reminder daemon stopped");
    Ok(())
}
