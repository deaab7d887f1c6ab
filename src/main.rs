use std::sync::Arc;

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::EnvFilter;
use anyhow::Result;

mod config;
mod engine;
mod error;
mod models;
mod routes;
mod service;
mod store;

use config::Config;
use service::PredictionStore;
use store::{MemoryStore, PgStore, Store};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await?;
            let store = PgStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("⚠️ DATABASE_URL not set, keeping everything in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let service = PredictionStore::new(store, config.alert_policy.build(), config.advice_job.clone());
    let app = routes::app(Arc::new(service));

    tracing::info!("🧠 Server running at {}", config.bind_addr);

    axum::serve(
        tokio::net::TcpListener::bind(config.bind_addr).await?,
        app.into_make_service(),
    )
    .await?;

    Ok(())
}
