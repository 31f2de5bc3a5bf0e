//! HTTP mapping of `PaymentError`.
//!
//! Gateways only ever see a generic message; details stay in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::error;

use crate::PaymentError;

impl PaymentError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingField(_) | Self::InvalidForm(_) | Self::InvalidAmount(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::SignatureMismatch { .. } | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::OrderNotFound(_) => StatusCode::NOT_FOUND,
            Self::Config(_) | Self::Key(_) | Self::Store(_) | Self::Messaging(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::SignatureMismatch { .. } => "Signature verification failed".into(),
            Self::Unauthorized => "Unauthorized".into(),
            Self::Config(_) | Self::Key(_) => "Payment gateway is not configured".into(),
            Self::Store(_) | Self::Messaging(_) => "Failed to update order".into(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigError, Gateway};

    #[test]
    fn test_taxonomy() {
        assert_eq!(PaymentError::MissingField("trnId").status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(PaymentError::SignatureMismatch { gateway: Gateway::Koko }.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(PaymentError::Config(ConfigError::Missing("KOKO_API_KEY")).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(PaymentError::Store("timeout".into()).status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(PaymentError::OrderNotFound("X".into()).status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let msg = PaymentError::Config(ConfigError::Missing("PAYHERE_MERCHANT_SECRET")).public_message();
        assert!(!msg.contains("PAYHERE"));
        assert_eq!(PaymentError::Store("connection reset".into()).public_message(), "Failed to update order");
    }
}
