//! Payment gateway adapters.
//!
//! Each gateway module owns its wire format: the typed notification parsed
//! from the webhook body, the signature scheme, and the checkout payload the
//! browser posts to start a session. The signed strings are gateway-mandated
//! and must stay byte-for-byte identical (field order, no delimiters).

pub mod koko;
pub mod payhere;

use std::collections::HashMap;
use subtle::ConstantTimeEq;

use crate::domain::value_objects::{Amount, Currency, OrderId};
use crate::{PaymentError, Result};

/// Storefront paths the gateways send the customer and their webhooks to.
pub const SUCCESS_PATH: &str = "/checkout/success";
pub const CANCEL_PATH: &str = "/checkout/cancel";
pub const PAYHERE_NOTIFY_PATH: &str = "/api/v1/payments/payhere/notify";
pub const KOKO_NOTIFY_PATH: &str = "/api/v1/payments/koko/notify";

/// A validated request to open a gateway checkout session.
#[derive(Clone, Debug)]
pub struct CheckoutRequest {
    pub order_id: OrderId,
    pub amount: Amount,
    pub currency: Currency,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub description: String,
}

/// Decoded key/value pairs of a webhook body.
#[derive(Clone, Debug, Default)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    /// Value of `name` exactly as received; absent and blank are both missing.
    pub fn require(&self, name: &'static str) -> Result<String> {
        self.optional(name).ok_or(PaymentError::MissingField(name))
    }

    pub fn optional(&self, name: &str) -> Option<String> {
        self.0.get(name).filter(|v| !v.trim().is_empty()).cloned()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }
}

impl From<HashMap<String, String>> for FormFields {
    fn from(fields: HashMap<String, String>) -> Self { Self(fields) }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Exact equality without an early exit. Empty input never matches.
pub(crate) fn signatures_match(expected: &str, supplied: &str) -> bool {
    if expected.is_empty() || supplied.is_empty() { return false; }
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_treats_blank_as_missing() {
        let fields: FormFields = [("order_id", "ORDER123"), ("md5sig", "  ")].into_iter().collect();
        assert_eq!(fields.require("order_id").unwrap(), "ORDER123");
        assert!(matches!(fields.require("md5sig"), Err(PaymentError::MissingField("md5sig"))));
        assert!(matches!(fields.require("status_code"), Err(PaymentError::MissingField("status_code"))));
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let fields: FormFields = [("order_id", " ORDER123 ")].into_iter().collect();
        assert_eq!(fields.require("order_id").unwrap(), " ORDER123 ");
        assert_eq!(fields.optional("order_id").as_deref(), Some(" ORDER123 "));
    }

    #[test]
    fn test_signatures_match() {
        assert!(signatures_match("ABC", "ABC"));
        assert!(!signatures_match("ABC", "abc"));
        assert!(!signatures_match("ABC", "ABCD"));
        assert!(!signatures_match("", ""));
    }
}
