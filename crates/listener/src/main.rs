//! PushBridge entrypoint: keepalive server + change listener.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use pushbridge_common::config::AppConfig;
use pushbridge_common::db::create_pool;
use pushbridge_common::types::PENDING_TABLE;
use pushbridge_engine::dispatcher::NotificationDispatcher;
use pushbridge_engine::registry::PgDeviceRegistry;
use pushbridge_listener::feed::PgChangeFeed;
use pushbridge_listener::listener::ChangeListener;
use pushbridge_notifier::Messaging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "pushbridge=info,pushbridge_listener=info,pushbridge_engine=info,pushbridge_notifier=info,tower_http=info",
            )
        }))
        .json()
        .init();

    tracing::info!("PushBridge starting...");

    // Load configuration
    let config = AppConfig::from_env()?;

    // Start keepalive server
    let mut keepalive = tokio::spawn(pushbridge_api::serve(config.port));

    // Missing credentials disable sends but keep the bridge running
    let messaging = Messaging::initialize(&config);

    // Connect to database
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;

    // Run migrations (tables + insert trigger)
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let dispatcher = NotificationDispatcher::new(
        Arc::new(PgDeviceRegistry::new(pool.clone())),
        Arc::new(messaging),
    );

    let feed = PgChangeFeed::connect(&pool).await?;
    let listener = ChangeListener::new(dispatcher);

    tracing::info!(
        channel = %feed.channel(),
        table = PENDING_TABLE,
        "Notification bot (multi-device) listening..."
    );

    tokio::select! {
        result = listener.run(feed) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "Change listener exited with error");
                return Err(e);
            }
        }
        result = &mut keepalive => {
            match result {
                Ok(Ok(())) => tracing::warn!("Keepalive server stopped"),
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "Keepalive server failed");
                    return Err(e);
                }
                Err(e) => return Err(e.into()),
            }
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received shutdown signal, stopping gracefully...");
        }
    }

    keepalive.abort();
    tracing::info!("PushBridge stopped.");
    Ok(())
}
