//! Environment configuration.
//!
//! Every gateway credential is required. A missing variable is reported by
//! name and aborts startup; nothing falls back to a baked-in secret.

use secrecy::SecretString;
use thiserror::Error;

use crate::gateways::koko::normalize_pem;

pub const DEFAULT_PORT: u16 = 8083;
pub const PAYHERE_SANDBOX_CHECKOUT_URL: &str = "https://sandbox.payhere.lk/pay/checkout";
pub const KOKO_DEFAULT_CHECKOUT_URL: &str = "https://prodapi.paykoko.com/api/merchants/orderCreate";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug)]
pub struct PayHereConfig {
    pub merchant_id: String,
    pub merchant_secret: SecretString,
    pub checkout_url: String,
}

#[derive(Debug)]
pub struct KokoConfig {
    pub merchant_id: String,
    pub api_key: SecretString,
    /// Gateway public key, PEM with real newlines.
    pub public_key_pem: String,
    /// Merchant private key, PEM with real newlines.
    pub private_key_pem: SecretString,
    pub checkout_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { database_url: String },
    Memory,
}

#[derive(Debug)]
pub struct AppConfig {
    pub port: u16,
    pub public_base_url: String,
    pub store: StoreBackend,
    pub nats_url: Option<String>,
    pub initiate_api_token: SecretString,
    pub payhere: PayHereConfig,
    pub koko: KokoConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &'static str| optional(name).ok_or(ConfigError::Missing(name));

        let port = match optional("PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid { name: "PORT", reason: format!("`{raw}` is not a port") })?,
            None => DEFAULT_PORT,
        };

        let store = match optional("STORE").as_deref() {
            Some("memory") => StoreBackend::Memory,
            Some("postgres") | None => StoreBackend::Postgres { database_url: required("DATABASE_URL")? },
            Some(other) => return Err(ConfigError::Invalid { name: "STORE", reason: format!("unknown backend `{other}`") }),
        };

        let public_base_url = required("PUBLIC_BASE_URL")?.trim_end_matches('/').to_string();
        if !public_base_url.starts_with("http://") && !public_base_url.starts_with("https://") {
            return Err(ConfigError::Invalid { name: "PUBLIC_BASE_URL", reason: "must be an absolute http(s) URL".into() });
        }

        let payhere = PayHereConfig {
            merchant_id: required("PAYHERE_MERCHANT_ID")?,
            merchant_secret: SecretString::from(required("PAYHERE_MERCHANT_SECRET")?),
            checkout_url: optional("PAYHERE_CHECKOUT_URL").unwrap_or_else(|| PAYHERE_SANDBOX_CHECKOUT_URL.to_string()),
        };

        let koko = KokoConfig {
            merchant_id: required("KOKO_MERCHANT_ID")?,
            api_key: SecretString::from(required("KOKO_API_KEY")?),
            public_key_pem: normalize_pem(&required("KOKO_PUBLIC_KEY")?),
            private_key_pem: SecretString::from(normalize_pem(&required("KOKO_PRIVATE_KEY")?)),
            checkout_url: optional("KOKO_CHECKOUT_URL").unwrap_or_else(|| KOKO_DEFAULT_CHECKOUT_URL.to_string()),
        };

        Ok(Self {
            port,
            public_base_url,
            store,
            nats_url: optional("NATS_URL"),
            initiate_api_token: SecretString::from(required("INITIATE_API_TOKEN")?),
            payhere,
            koko,
        })
    }

    /// Absolute URL on this storefront for a callback path.
    pub fn callback_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashMap;

    pub const KOKO_PUBLIC_PEM: &str = include_str!("../testdata/koko_gateway_public.pem");
    pub const KOKO_PRIVATE_PEM: &str = include_str!("../testdata/koko_merchant_private.pem");

    pub fn env() -> HashMap<&'static str, String> {
        HashMap::from([
            ("STORE", "memory".to_string()),
            ("PUBLIC_BASE_URL", "https://shop.example.lk/".to_string()),
            ("PAYHERE_MERCHANT_ID", "121xxxx".to_string()),
            ("PAYHERE_MERCHANT_SECRET", "SECRET".to_string()),
            ("KOKO_MERCHANT_ID", "KOKO-MERCHANT".to_string()),
            ("KOKO_API_KEY", "koko-api-key".to_string()),
            // Stored the way hosting dashboards flatten multi-line values.
            ("KOKO_PUBLIC_KEY", KOKO_PUBLIC_PEM.trim().replace('\n', "\\n")),
            ("KOKO_PRIVATE_KEY", KOKO_PRIVATE_PEM.to_string()),
            ("INITIATE_API_TOKEN", "initiate-token".to_string()),
        ])
    }

    pub fn config() -> super::AppConfig {
        let vars = env();
        super::AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{env, KOKO_PUBLIC_PEM};
    use super::*;

    #[test]
    fn test_loads_full_config() {
        let cfg = test_support::config();
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.store, StoreBackend::Memory);
        assert_eq!(cfg.public_base_url, "https://shop.example.lk");
        assert_eq!(cfg.payhere.checkout_url, PAYHERE_SANDBOX_CHECKOUT_URL);
        assert_eq!(cfg.koko.public_key_pem, KOKO_PUBLIC_PEM.trim());
        assert_eq!(cfg.callback_url("/api/v1/payments/koko/notify"), "https://shop.example.lk/api/v1/payments/koko/notify");
    }

    #[test]
    fn test_reports_missing_variable_by_name() {
        for name in ["PAYHERE_MERCHANT_SECRET", "KOKO_PUBLIC_KEY", "PUBLIC_BASE_URL", "INITIATE_API_TOKEN"] {
            let mut vars = env();
            vars.remove(name);
            let err = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
            assert_eq!(err, ConfigError::Missing(name));
        }
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let mut vars = env();
        vars.insert("KOKO_API_KEY", "   ".into());
        assert_eq!(AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err(), ConfigError::Missing("KOKO_API_KEY"));
    }

    #[test]
    fn test_postgres_requires_database_url() {
        let mut vars = env();
        vars.remove("STORE");
        assert_eq!(AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err(), ConfigError::Missing("DATABASE_URL"));
        vars.insert("DATABASE_URL", "postgres://localhost/shop".into());
        let cfg = AppConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();
        assert_eq!(cfg.store, StoreBackend::Postgres { database_url: "postgres://localhost/shop".into() });
    }

    #[test]
    fn test_secrets_are_redacted() {
        let cfg = test_support::config();
        let rendered = format!("{:?}", cfg.payhere);
        assert!(!rendered.contains("\"SECRET\""));
        assert!(rendered.contains("REDACTED"));
    }
}
