//! Checkout initiation handlers.
//!
//! The storefront calls these after placing an order and posts the returned
//! fields straight to the gateway.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, instrument};
use validator::{Validate, ValidationError};

use super::AppState;
use crate::domain::value_objects::{Amount, Currency, OrderId};
use crate::gateways::koko::KokoCheckout;
use crate::gateways::payhere::PayHereCheckout;
use crate::gateways::CheckoutRequest;
use crate::{PaymentError, Result};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Text(String),
    Number(serde_json::Number),
}

impl AmountInput {
    fn parse(&self) -> Result<Amount> {
        match self {
            Self::Text(raw) => Amount::parse(raw),
            Self::Number(n) => Amount::parse(&n.to_string()),
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InitiateRequest {
    #[validate(length(min = 1, max = 64), custom = "validate_order_id")]
    pub order_id: String,
    pub amount: AmountInput,
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Line-item summary shown on the gateway page.
    pub items: Option<String>,
}

/// Order ids end up in callback URL paths.
fn validate_order_id(order_id: &str) -> std::result::Result<(), ValidationError> {
    if order_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        Ok(())
    } else {
        Err(ValidationError::new("order_id_charset"))
    }
}

impl InitiateRequest {
    pub fn into_checkout(self) -> Result<CheckoutRequest> {
        self.validate().map_err(|e| PaymentError::Validation(e.to_string()))?;
        let order_id = OrderId::new(self.order_id)?;
        let amount = self.amount.parse()?;
        let description = self.items.filter(|s| !s.trim().is_empty()).unwrap_or_else(|| format!("Order {order_id}"));
        Ok(CheckoutRequest {
            order_id,
            amount,
            currency: Currency::LKR,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            description,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse<T> {
    /// Form action the browser posts the payload to.
    pub action_url: String,
    #[serde(flatten)]
    pub payload: T,
}

fn parse_body(body: std::result::Result<Json<InitiateRequest>, JsonRejection>) -> Result<CheckoutRequest> {
    let Json(request) = body.map_err(|e| PaymentError::InvalidForm(e.body_text()))?;
    request.into_checkout()
}

/// `POST /api/v1/payments/payhere/initiate`
#[instrument(skip_all)]
pub async fn payhere_initiate(State(state): State<AppState>, body: std::result::Result<Json<InitiateRequest>, JsonRejection>) -> Result<Json<CheckoutResponse<PayHereCheckout>>> {
    let request = parse_body(body)?;
    let payload = PayHereCheckout::build(&state.config, &request);
    info!(order_id = %request.order_id, amount = %payload.amount, "PayHere checkout prepared");
    Ok(Json(CheckoutResponse { action_url: state.config.payhere.checkout_url.clone(), payload }))
}

/// `POST /api/v1/payments/koko/initiate`
#[instrument(skip_all)]
pub async fn koko_initiate(State(state): State<AppState>, body: std::result::Result<Json<InitiateRequest>, JsonRejection>) -> Result<Json<CheckoutResponse<KokoCheckout>>> {
    let request = parse_body(body)?;
    let payload = KokoCheckout::build(&state.config, &state.koko_signer, &request);
    info!(order_id = %request.order_id, amount = %payload.amount, "Koko checkout prepared");
    Ok(Json(CheckoutResponse { action_url: state.config.koko.checkout_url.clone(), payload }))
}

/// Bearer-token guard for the initiate routes.
pub async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Result<Response> {
    let supplied = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .unwrap_or_default();
    let expected = state.config.initiate_api_token.expose_secret();
    let authorized = !supplied.is_empty() && bool::from(supplied.as_bytes().ct_eq(expected.as_bytes()));
    if !authorized {
        return Err(PaymentError::Unauthorized);
    }
    Ok(next.run(request).await)
}
