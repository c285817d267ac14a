//! # tempod — tempo daemon
//!
//! Composition root that wires the store and sink together and runs the
//! dispatcher.
//!
//! ## Responsibilities
//! - Parse configuration (TOML file, env var overrides)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Connect the MQTT sink and start its event-loop driver
//! - Construct the dispatcher, injecting store and sink via port traits
//! - Start the change watcher and the minute sweep
//! - Handle graceful shutdown (SIGINT): stop accepting new triggers, let
//!   in-flight publish/delete operations finish
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use tempo_adapter_mqtt::MqttCommandSink;
use tempo_adapter_storage_sqlite_sqlx::{Config as StorageConfig, SqliteAutomationStore};
use tempo_app::dispatcher::Dispatcher;
use tempo_app::ports::AutomationStore;
use tempo_app::sweep::SweepScheduler;
use tempo_app::watcher::ChangeWatcher;

use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter)),
        )
        .init();

    // Database
    let db = StorageConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await
    .context("failed to initialize database")?;
    let store = SqliteAutomationStore::new(db.pool().clone());

    // MQTT sink + event-loop driver
    let (sink, _mqtt_driver) = MqttCommandSink::connect(&config.mqtt);

    // Dispatch core
    let dispatcher = Arc::new(Dispatcher::new(store.clone(), sink));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let watcher = ChangeWatcher::start(
        Arc::clone(&dispatcher),
        store.subscribe(),
        shutdown_rx.clone(),
    );
    let sweeper = SweepScheduler::start(Arc::clone(&dispatcher), shutdown_rx);

    tracing::info!("watching automation record changes");
    tracing::info!("sweeping all automations at every minute boundary");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    tracing::info!("shutdown signal received");

    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(watcher, sweeper);

    Ok(())
}
