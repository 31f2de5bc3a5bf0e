//! PayHere IPG.
//!
//! Both directions use the same MD5 scheme:
//! `upper(md5(merchant_id + order_id + amount + currency [+ status_code] + upper(md5(secret))))`.
//! Checkout omits the status code; the notify callback includes it.

use md5::{Digest, Md5};
use secrecy::ExposeSecret;
use serde::Serialize;

use super::{signatures_match, CheckoutRequest, FormFields, CANCEL_PATH, PAYHERE_NOTIFY_PATH, SUCCESS_PATH};
use crate::config::AppConfig;
use crate::domain::value_objects::OrderId;
use crate::{PaymentStatus, Result};

/// `status_code` value PayHere sends for a successful payment.
pub const STATUS_SUCCESS: &str = "2";
pub const COUNTRY: &str = "Sri Lanka";

fn md5_upper(input: &str) -> String {
    hex::encode_upper(Md5::digest(input.as_bytes()))
}

pub fn hashed_secret(merchant_secret: &str) -> String {
    md5_upper(merchant_secret)
}

/// Signature PayHere puts in `md5sig` for a notification.
pub fn notification_signature(merchant_id: &str, order_id: &str, amount: &str, currency: &str, status_code: &str, merchant_secret: &str) -> String {
    md5_upper(&format!("{merchant_id}{order_id}{amount}{currency}{status_code}{}", hashed_secret(merchant_secret)))
}

/// `hash` field of the checkout form.
pub fn checkout_hash(merchant_id: &str, order_id: &str, amount: &str, currency: &str, merchant_secret: &str) -> String {
    md5_upper(&format!("{merchant_id}{order_id}{amount}{currency}{}", hashed_secret(merchant_secret)))
}

/// `"2"` is the only success code; everything else (0 pending, -1 cancelled,
/// -2 failed, -3 chargeback) is recorded as a failed payment.
pub fn status_from_code(status_code: &str) -> PaymentStatus {
    if status_code == STATUS_SUCCESS { PaymentStatus::Paid } else { PaymentStatus::Failed }
}

/// Body of `POST /notify`, form-urlencoded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PayHereNotification {
    pub merchant_id: String,
    pub order_id: OrderId,
    pub payment_id: String,
    pub amount: String,
    pub currency: String,
    pub status_code: String,
    pub md5sig: String,
    pub method: Option<String>,
    pub status_message: Option<String>,
}

impl PayHereNotification {
    pub fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            merchant_id: fields.require("merchant_id")?,
            order_id: OrderId::new(fields.require("order_id")?)?,
            payment_id: fields.require("payment_id")?,
            amount: fields.require("payhere_amount")?,
            currency: fields.require("payhere_currency")?,
            status_code: fields.require("status_code")?,
            md5sig: fields.require("md5sig")?,
            method: fields.optional("method"),
            status_message: fields.optional("status_message"),
        })
    }

    pub fn expected_signature(&self, merchant_secret: &str) -> String {
        notification_signature(&self.merchant_id, self.order_id.as_str(), &self.amount, &self.currency, &self.status_code, merchant_secret)
    }

    pub fn verify(&self, merchant_secret: &str) -> bool {
        signatures_match(&self.expected_signature(merchant_secret), &self.md5sig)
    }

    pub fn status(&self) -> PaymentStatus { status_from_code(&self.status_code) }
}

/// Fields the browser posts to the PayHere checkout form.
#[derive(Clone, Debug, Serialize)]
pub struct PayHereCheckout {
    pub merchant_id: String,
    pub return_url: String,
    pub cancel_url: String,
    pub notify_url: String,
    pub order_id: String,
    pub items: String,
    pub currency: String,
    pub amount: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub hash: String,
}

impl PayHereCheckout {
    pub fn build(config: &AppConfig, request: &CheckoutRequest) -> Self {
        let merchant_id = config.payhere.merchant_id.clone();
        let order_id = request.order_id.to_string();
        let amount = request.amount.to_gateway_string();
        let currency = request.currency.code().to_string();
        let hash = checkout_hash(&merchant_id, &order_id, &amount, &currency, config.payhere.merchant_secret.expose_secret());
        Self {
            return_url: config.callback_url(&format!("{SUCCESS_PATH}/{order_id}")),
            cancel_url: config.callback_url(&format!("{CANCEL_PATH}/{order_id}")),
            notify_url: config.callback_url(PAYHERE_NOTIFY_PATH),
            items: request.description.clone(),
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            phone: request.phone.clone().unwrap_or_default(),
            address: request.address.clone().unwrap_or_default(),
            city: request.city.clone().unwrap_or_default(),
            country: COUNTRY.to_string(),
            merchant_id,
            order_id,
            currency,
            amount,
            hash,
        }
    }
}
