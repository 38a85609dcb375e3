// Main entry point for the submission bot server

use anyhow::{Context, Result};
use server_core::domains::publishing::PublishCoordinator;
use server_core::kernel::{
    event_channel, start_scheduler, BotSettings, DiscordAdapter, InstagramPublisher,
    LocalMediaStore, PostgresSubmissionRepository, ServerDeps, DEFAULT_QUEUE_CAPACITY,
};
use server_core::server::{build_app, AppState};
use server_core::Config;
use sqlx::postgres::PgPoolOptions;
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,server_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting submission bot server");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    let media_root = PathBuf::from(&config.media_root);
    tokio::fs::create_dir_all(&media_root)
        .await
        .with_context(|| format!("Failed to create media root {}", media_root.display()))?;

    let discord = Arc::new(discord::DiscordClient::new(config.discord_bot_token.clone()));
    let instagram = Arc::new(instagram::InstagramClient::new(
        config.instagram_access_token.clone(),
        config.instagram_user_id.clone(),
    ));

    let server_deps = ServerDeps::new(
        Arc::new(PostgresSubmissionRepository::new(pool.clone())),
        Arc::new(LocalMediaStore::new(media_root.clone())),
        Arc::new(DiscordAdapter::new(discord, config.discord_guild_id)),
        Arc::new(InstagramPublisher::new(
            instagram,
            config.media_public_url.clone(),
        )),
        BotSettings::from_config(&config),
    );

    // Event worker
    let shutdown = CancellationToken::new();
    let (events, worker) = event_channel(DEFAULT_QUEUE_CAPACITY, server_deps.clone());
    let worker_handle = tokio::spawn(worker.run(shutdown.clone()));

    // Scheduled sweeps share the coordinator (and its lock) with the manual command
    let coordinator = PublishCoordinator::new(server_deps.clone());
    let mut scheduler = start_scheduler(
        coordinator.clone(),
        &config.publish_schedule,
        config.publish_timezone,
    )
    .await
    .context("Failed to start scheduler")?;

    let app = build_app(
        AppState {
            db_pool: pool,
            server_deps,
            events,
            coordinator,
        },
        &media_root,
        config.ingress_token.clone(),
    );

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
        })
        .await
        .context("Server error")?;

    shutdown.cancel();
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler shutdown failed");
    }
    if let Err(e) = worker_handle.await {
        tracing::warn!(error = %e, "Event worker task failed");
    }

    Ok(())
}
