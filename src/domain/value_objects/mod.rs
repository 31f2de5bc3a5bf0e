//! Value Objects for payments

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::{PaymentError, Result};

/// Merchant order identifier, as echoed back by the gateways.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OrderId(String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() { return Err(PaymentError::Validation("order id is empty".into())); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for OrderId {
    type Error = PaymentError;
    fn try_from(value: String) -> Result<Self> { Self::new(value) }
}

impl From<OrderId> for String {
    fn from(id: OrderId) -> Self { id.0 }
}

/// Checkout amount. Gateways sign the two-decimal rendering, so that string
/// is the only one that may be fed into a hash.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Amount(Decimal);

impl Amount {
    /// Parses storefront input such as `"1,250"` or `"99.9"`.
    pub fn parse(raw: &str) -> Result<Self> {
        let cleaned: String = raw.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
        if cleaned.is_empty() { return Err(PaymentError::InvalidAmount("amount is empty".into())); }
        let value = Decimal::from_str(&cleaned).map_err(|_| PaymentError::InvalidAmount(raw.to_string()))?;
        if value.is_sign_negative() { return Err(PaymentError::InvalidAmount(raw.to_string())); }
        Ok(Self(value))
    }

    pub fn to_gateway_string(&self) -> String {
        format!("{:.2}", self.0.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.to_gateway_string()) }
}

/// Settlement currency. The storefront only charges in rupees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    LKR,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self { Self::LKR => "LKR" }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.code()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_id_keeps_bytes() {
        assert_eq!(OrderId::new(" ORDER123 ").unwrap().as_str(), " ORDER123 ");
        assert!(OrderId::new("   ").is_err());
    }

    #[test]
    fn test_amount_two_decimals() {
        assert_eq!(Amount::parse("1000").unwrap().to_gateway_string(), "1000.00");
        assert_eq!(Amount::parse("1,234.5").unwrap().to_gateway_string(), "1234.50");
        assert_eq!(Amount::parse("12,500.005").unwrap().to_gateway_string(), "12500.01");
        assert_eq!(Amount::parse(" 0.1 ").unwrap().to_gateway_string(), "0.10");
    }

    #[test]
    fn test_amount_rejects_garbage() {
        assert!(matches!(Amount::parse(""), Err(PaymentError::InvalidAmount(_))));
        assert!(matches!(Amount::parse("abc"), Err(PaymentError::InvalidAmount(_))));
        assert!(matches!(Amount::parse("-5.00"), Err(PaymentError::InvalidAmount(_))));
    }
}
