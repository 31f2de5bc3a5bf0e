//! HTTP surface: gateway webhooks and authenticated checkout initiation.

pub mod error;
pub mod initiate;
pub mod notify;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use secrecy::ExposeSecret;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::gateways::koko::{KokoSigner, KokoVerifier};
use crate::gateways::{KOKO_NOTIFY_PATH, PAYHERE_NOTIFY_PATH};
use crate::messaging::EventPublisher;
use crate::reconcile::PaymentReconciler;
use crate::store::OrderPaymentStore;
use crate::Result;

pub const SERVICE_NAME: &str = "storefront-payments";

/// Handler dependencies, built once at startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub reconciler: PaymentReconciler,
    pub koko_verifier: Arc<KokoVerifier>,
    pub koko_signer: Arc<KokoSigner>,
}

impl AppState {
    /// Parses the Koko key pair; a bad key fails startup rather than the
    /// first webhook.
    pub fn new(config: AppConfig, store: Arc<dyn OrderPaymentStore>, publisher: EventPublisher) -> Result<Self> {
        let koko_verifier = Arc::new(KokoVerifier::from_pem(&config.koko.public_key_pem)?);
        let koko_signer = Arc::new(KokoSigner::from_pem(config.koko.private_key_pem.expose_secret())?);
        Ok(Self { config: Arc::new(config), reconciler: PaymentReconciler::new(store, publisher), koko_verifier, koko_signer })
    }
}

pub fn router(state: AppState) -> Router {
    let initiate = Router::new()
        .route("/api/v1/payments/payhere/initiate", post(initiate::payhere_initiate))
        .route("/api/v1/payments/koko/initiate", post(initiate::koko_initiate))
        .route_layer(middleware::from_fn_with_state(state.clone(), initiate::require_bearer));

    Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": SERVICE_NAME})) }))
        .route(PAYHERE_NOTIFY_PATH, post(notify::payhere_notify))
        .route(KOKO_NOTIFY_PATH, post(notify::koko_notify))
        .merge(initiate)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
        .with_state(state)
}
