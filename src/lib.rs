//! Storefront Payments
//!
//! Payment gateway service for the footwear storefront.
//!
//! ## Features
//! - PayHere checkout signing and notify verification (MD5)
//! - Koko checkout signing and notify verification (RSA-SHA256)
//! - Order payment status reconciliation
//! - Payment domain events over NATS

pub mod config;
pub mod domain;
pub mod gateways;
pub mod http;
pub mod messaging;
pub mod reconcile;
pub mod store;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use config::{AppConfig, ConfigError};
pub use domain::value_objects::{Amount, OrderId};

// =============================================================================
// Core Types
// =============================================================================

/// Payment status as stored on the order document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Paid => "Paid",
            Self::Failed => "Failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gateway {
    PayHere,
    Koko,
}

impl Gateway {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PayHere => "payhere",
            Self::Koko => "koko",
        }
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A verified gateway verdict for one order, ready to be written.
///
/// Only `Paid` and `Failed` can be carried; a notification never moves an
/// order back to `Pending`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentOutcome {
    order_id: OrderId,
    transaction_id: String,
    gateway: Gateway,
    status: PaymentStatus,
}

impl PaymentOutcome {
    pub fn new(order_id: OrderId, transaction_id: impl Into<String>, gateway: Gateway, status: PaymentStatus) -> Result<Self> {
        if status == PaymentStatus::Pending {
            return Err(PaymentError::Validation("a payment outcome must be Paid or Failed".into()));
        }
        Ok(Self { order_id, transaction_id: transaction_id.into(), gateway, status })
    }

    pub fn order_id(&self) -> &OrderId { &self.order_id }
    pub fn transaction_id(&self) -> &str { &self.transaction_id }
    pub fn gateway(&self) -> Gateway { self.gateway }
    pub fn status(&self) -> PaymentStatus { self.status }
    pub fn is_paid(&self) -> bool { self.status == PaymentStatus::Paid }
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("malformed request body: {0}")]
    InvalidForm(String),

    #[error("{gateway} signature verification failed")]
    SignatureMismatch { gateway: Gateway },

    #[error("missing or invalid bearer token")]
    Unauthorized,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid key material: {0}")]
    Key(String),

    #[error("order {0} not found")]
    OrderNotFound(String),

    #[error("order store error: {0}")]
    Store(String),

    #[error("messaging error: {0}")]
    Messaging(String),
}

impl From<sqlx::Error> for PaymentError {
    fn from(e: sqlx::Error) -> Self { Self::Store(e.to_string()) }
}

pub type Result<T> = std::result::Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_rejects_pending() {
        let err = PaymentOutcome::new(OrderId::new("ORD1").unwrap(), "TXN1", Gateway::Koko, PaymentStatus::Pending).unwrap_err();
        assert!(matches!(err, PaymentError::Validation(_)));
    }

    #[test]
    fn test_status_text() {
        assert_eq!(PaymentStatus::Failed.to_string(), "Failed");
        assert_eq!(serde_json::to_string(&PaymentStatus::Paid).unwrap(), "\"Paid\"");
        assert_eq!(serde_json::to_string(&Gateway::PayHere).unwrap(), "\"payhere\"");
    }
}
