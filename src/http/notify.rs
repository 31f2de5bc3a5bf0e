//! Gateway notify (webhook) handlers.

use std::collections::HashMap;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use secrecy::ExposeSecret;
use serde_json::{json, Value};
use tracing::{info, instrument, warn, Span};

use super::AppState;
use crate::gateways::koko::KokoNotification;
use crate::gateways::payhere::PayHereNotification;
use crate::gateways::FormFields;
use crate::{Gateway, PaymentError, PaymentOutcome, Result};

type Ack = (StatusCode, Json<Value>);

/// `POST /api/v1/payments/payhere/notify`
///
/// 200 when paid, 400 when the gateway reports a failed payment (after
/// recording it), 401 on signature mismatch.
#[instrument(skip_all, fields(order_id = tracing::field::Empty))]
pub async fn payhere_notify(State(state): State<AppState>, form: std::result::Result<Form<HashMap<String, String>>, FormRejection>) -> Result<Ack> {
    let Form(fields) = form.map_err(|e| PaymentError::InvalidForm(e.body_text()))?;
    let notification = PayHereNotification::from_fields(&FormFields::from(fields))?;
    Span::current().record("order_id", notification.order_id.as_str());

    let secret = state.config.payhere.merchant_secret.expose_secret();
    if !notification.verify(secret) {
        warn!(
            expected = %notification.expected_signature(secret),
            supplied = %notification.md5sig,
            payment_id = %notification.payment_id,
            "PayHere signature mismatch"
        );
        return Err(PaymentError::SignatureMismatch { gateway: Gateway::PayHere });
    }

    let outcome = PaymentOutcome::new(notification.order_id.clone(), notification.payment_id.clone(), Gateway::PayHere, notification.status())?;
    state.reconciler.reconcile(&outcome).await?;

    if outcome.is_paid() {
        info!(method = notification.method.as_deref().unwrap_or("unknown"), "PayHere payment confirmed");
        Ok((StatusCode::OK, Json(json!({ "message": "Payment successful" }))))
    } else {
        info!(status_code = %notification.status_code, status_message = notification.status_message.as_deref().unwrap_or(""), "PayHere payment not completed");
        Ok((StatusCode::BAD_REQUEST, Json(json!({ "message": "Payment failed" }))))
    }
}

/// `POST /api/v1/payments/koko/notify`
///
/// 200 once processed whatever the payment outcome, 401 on signature
/// mismatch, 400 on missing fields.
#[instrument(skip_all, fields(order_id = tracing::field::Empty))]
pub async fn koko_notify(State(state): State<AppState>, multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Ack> {
    let multipart = multipart.map_err(|e| PaymentError::InvalidForm(e.body_text()))?;
    let notification = KokoNotification::from_fields(&read_multipart(multipart).await?)?;
    Span::current().record("order_id", notification.order_id.as_str());

    if !notification.verify(&state.koko_verifier) {
        warn!(
            signed_data = %notification.signed_data(),
            supplied = %notification.signature,
            "Koko signature mismatch"
        );
        return Err(PaymentError::SignatureMismatch { gateway: Gateway::Koko });
    }

    let status = notification.payment_status();
    let outcome = PaymentOutcome::new(notification.order_id.clone(), notification.transaction_id.clone(), Gateway::Koko, status)?;
    state.reconciler.reconcile(&outcome).await?;
    info!(koko_status = %notification.status, desc = notification.description.as_deref().unwrap_or(""), "Koko notification processed");

    Ok((StatusCode::OK, Json(json!({ "message": "Notification processed", "status": status }))))
}

async fn read_multipart(mut multipart: Multipart) -> Result<FormFields> {
    let mut fields = FormFields::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| PaymentError::InvalidForm(e.body_text()))? {
        let Some(name) = field.name().map(str::to_string) else { continue };
        let value = field.text().await.map_err(|e| PaymentError::InvalidForm(e.body_text()))?;
        fields.insert(name, value);
    }
    Ok(fields)
}
