//! Koko BNPL gateway.
//!
//! Koko signs its notify callback with RSA-SHA256 (PKCS#1 v1.5) over
//! `orderId + trnId + status`, and expects the merchant to sign the checkout
//! data string the same way with its own private key.

use base64::engine::general_purpose::{STANDARD as BASE64_STANDARD, STANDARD_NO_PAD as BASE64_STANDARD_NO_PAD};
use base64::Engine;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use secrecy::ExposeSecret;
use serde::Serialize;
use sha2::Sha256;
use std::fmt;
use tracing::debug;

use super::{CheckoutRequest, FormFields, CANCEL_PATH, KOKO_NOTIFY_PATH, SUCCESS_PATH};
use crate::config::AppConfig;
use crate::domain::value_objects::OrderId;
use crate::{PaymentError, PaymentStatus, Result};

pub const STATUS_SUCCESS: &str = "SUCCESS";
pub const PLUGIN_NAME: &str = "customapi";
pub const PLUGIN_VERSION: &str = "1.0.1";

/// Undoes the flattening hosting dashboards apply to multi-line env values:
/// surrounding quotes and literal `\n` escapes.
pub fn normalize_pem(raw: &str) -> String {
    let trimmed = raw.trim();
    let unquoted = trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed);
    unquoted.replace("\\r\\n", "\n").replace("\\n", "\n").trim().to_string()
}

pub fn status_from_str(status: &str) -> PaymentStatus {
    if status == STATUS_SUCCESS { PaymentStatus::Paid } else { PaymentStatus::Failed }
}

/// Lenient base64: line breaks, missing padding and the URL-safe alphabet
/// are all accepted.
fn decode_signature(encoded: &str) -> Option<Vec<u8>> {
    let canonical: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let canonical = canonical.trim_end_matches('=');
    if canonical.is_empty() { return None; }
    BASE64_STANDARD_NO_PAD.decode(canonical).ok()
}

/// Verifies notify signatures with the gateway's public key.
#[derive(Clone)]
pub struct KokoVerifier {
    key: VerifyingKey<Sha256>,
}

impl KokoVerifier {
    /// Accepts SPKI (`BEGIN PUBLIC KEY`) or PKCS#1 (`BEGIN RSA PUBLIC KEY`).
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = normalize_pem(pem);
        let key = RsaPublicKey::from_public_key_pem(&pem)
            .or_else(|_| RsaPublicKey::from_pkcs1_pem(&pem))
            .map_err(|e| PaymentError::Key(format!("koko public key: {e}")))?;
        Ok(Self { key: VerifyingKey::new(key) })
    }

    /// `false` for anything that is not a valid signature over `data`,
    /// including empty or non-base64 input.
    pub fn verify(&self, data: &str, signature_b64: &str) -> bool {
        let Some(raw) = decode_signature(signature_b64) else {
            debug!("koko signature is not valid base64");
            return false;
        };
        let Ok(signature) = Signature::try_from(raw.as_slice()) else { return false; };
        self.key.verify(data.as_bytes(), &signature).is_ok()
    }
}

impl fmt::Debug for KokoVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("KokoVerifier") }
}

/// Signs checkout data strings with the merchant's private key.
#[derive(Clone)]
pub struct KokoSigner {
    key: SigningKey<Sha256>,
}

impl KokoSigner {
    /// Accepts PKCS#8 (`BEGIN PRIVATE KEY`) or PKCS#1 (`BEGIN RSA PRIVATE KEY`).
    pub fn from_pem(pem: &str) -> Result<Self> {
        let pem = normalize_pem(pem);
        let key = RsaPrivateKey::from_pkcs8_pem(&pem)
            .or_else(|_| RsaPrivateKey::from_pkcs1_pem(&pem))
            .map_err(|e| PaymentError::Key(format!("koko private key: {e}")))?;
        Ok(Self { key: SigningKey::new(key) })
    }

    /// Base64 RSA-SHA256 signature of `data`.
    pub fn sign(&self, data: &str) -> String {
        BASE64_STANDARD.encode(self.key.sign(data.as_bytes()).to_bytes())
    }
}

impl fmt::Debug for KokoSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str("KokoSigner(***)") }
}

/// Body of `POST /notify`, multipart.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KokoNotification {
    pub order_id: OrderId,
    pub transaction_id: String,
    pub status: String,
    pub signature: String,
    pub description: Option<String>,
}

impl KokoNotification {
    pub fn from_fields(fields: &FormFields) -> Result<Self> {
        Ok(Self {
            order_id: OrderId::new(fields.require("orderId")?)?,
            transaction_id: fields.require("trnId")?,
            status: fields.require("status")?,
            signature: fields.require("signature")?,
            description: fields.optional("desc"),
        })
    }

    /// The string Koko signed: no delimiters.
    pub fn signed_data(&self) -> String {
        format!("{}{}{}", self.order_id, self.transaction_id, self.status)
    }

    pub fn verify(&self, verifier: &KokoVerifier) -> bool {
        verifier.verify(&self.signed_data(), &self.signature)
    }

    pub fn payment_status(&self) -> PaymentStatus { status_from_str(&self.status) }
}

/// Fields the browser posts to Koko's order-create endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct KokoCheckout {
    #[serde(rename = "_mId")]
    pub merchant_id: String,
    #[serde(rename = "_amount")]
    pub amount: String,
    #[serde(rename = "_currency")]
    pub currency: String,
    #[serde(rename = "_pluginName")]
    pub plugin_name: String,
    #[serde(rename = "_pluginVersion")]
    pub plugin_version: String,
    #[serde(rename = "_returnUrl")]
    pub return_url: String,
    #[serde(rename = "_cancelUrl")]
    pub cancel_url: String,
    #[serde(rename = "_orderId")]
    pub order_id: String,
    #[serde(rename = "_reference")]
    pub reference: String,
    #[serde(rename = "_firstName")]
    pub first_name: String,
    #[serde(rename = "_lastName")]
    pub last_name: String,
    #[serde(rename = "_email")]
    pub email: String,
    #[serde(rename = "_description")]
    pub description: String,
    pub api_key: String,
    #[serde(rename = "_responseUrl")]
    pub response_url: String,
    #[serde(rename = "dataString")]
    pub data_string: String,
    pub signature: String,
}

impl KokoCheckout {
    pub fn build(config: &AppConfig, signer: &KokoSigner, request: &CheckoutRequest) -> Self {
        let order_id = request.order_id.to_string();
        let mut checkout = Self {
            merchant_id: config.koko.merchant_id.clone(),
            amount: request.amount.to_gateway_string(),
            currency: request.currency.code().to_string(),
            plugin_name: PLUGIN_NAME.to_string(),
            plugin_version: PLUGIN_VERSION.to_string(),
            return_url: config.callback_url(&format!("{SUCCESS_PATH}/{order_id}")),
            cancel_url: config.callback_url(&format!("{CANCEL_PATH}/{order_id}")),
            reference: order_id.clone(),
            order_id,
            first_name: request.first_name.clone(),
            last_name: request.last_name.clone(),
            email: request.email.clone(),
            description: request.description.clone(),
            api_key: config.koko.api_key.expose_secret().to_string(),
            response_url: config.callback_url(KOKO_NOTIFY_PATH),
            data_string: String::new(),
            signature: String::new(),
        };
        checkout.data_string = checkout.signed_data();
        checkout.signature = signer.sign(&checkout.data_string);
        checkout
    }

    fn signed_data(&self) -> String {
        [
            &self.merchant_id,
            &self.amount,
            &self.currency,
            &self.plugin_name,
            &self.plugin_version,
            &self.return_url,
            &self.cancel_url,
            &self.order_id,
            &self.reference,
            &self.first_name,
            &self.last_name,
            &self.email,
            &self.description,
            &self.api_key,
            &self.response_url,
        ]
        .iter()
        .map(|s| s.as_str())
        .collect()
    }
}
