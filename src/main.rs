//! Storefront Payments - PayHere and Koko gateway service

use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use storefront_payments::config::{AppConfig, StoreBackend};
use storefront_payments::http::{router, AppState};
use storefront_payments::messaging::EventPublisher;
use storefront_payments::store::{InMemoryOrderStore, OrderPaymentStore, PgOrderStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let config = AppConfig::from_env()?;

    let store: Arc<dyn OrderPaymentStore> = match &config.store {
        StoreBackend::Postgres { database_url } => {
            let db = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            Arc::new(PgOrderStore::new(db))
        }
        StoreBackend::Memory => {
            tracing::warn!("STORE=memory: order payment state is not persisted");
            Arc::new(InMemoryOrderStore::new())
        }
    };
    let publisher = EventPublisher::connect(config.nats_url.as_deref()).await;

    let port = config.port;
    let app = router(AppState::new(config, store, publisher)?);

    tracing::info!("🚀 Storefront payments listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
