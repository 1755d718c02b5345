//! OpenSASE Marketplace Insights - review and export service

use std::sync::Arc;

use anyhow::Result;
use opensase_marketplace::{
    api::{build_router, AppState},
    config::AppConfig,
    messaging::EventPublisher,
    service::ReviewService,
    store::{memory::InMemoryStore, postgres::PgStore, ReviewStore},
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.as_str().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store: Arc<dyn ReviewStore> = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(config.db_max_connections).connect(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("connected to PostgreSQL, migrations applied");
            Arc::new(PgStore::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, reviews are kept in memory");
            Arc::new(InMemoryStore::new())
        }
    };
    let publisher = EventPublisher::connect(config.nats_url.as_deref(), &config.nats_subject_prefix).await;
    let reviews = ReviewService::new(store, config.review_policy, publisher.clone());
    let app = build_router(AppState::new(reviews, publisher));

    let addr = config.addr();
    tracing::info!(policy = ?config.review_policy, "OpenSASE Marketplace listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(&addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
