//! Domain events
use crate::{Gateway, PaymentStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OrderEvent {
    PaymentRecorded {
        /// Lets consumers drop redeliveries.
        event_id: Uuid,
        order_id: String,
        transaction_id: String,
        gateway: Gateway,
        status: PaymentStatus,
        recorded_at: DateTime<Utc>,
    },
}

impl OrderEvent {
    pub fn subject(&self) -> &'static str {
        match self {
            Self::PaymentRecorded { status: PaymentStatus::Paid, .. } => "orders.payment.paid",
            Self::PaymentRecorded { status: PaymentStatus::Failed, .. } => "orders.payment.failed",
            Self::PaymentRecorded { status: PaymentStatus::Pending, .. } => "orders.payment.pending",
        }
    }

    pub fn order_id(&self) -> &str {
        match self { Self::PaymentRecorded { order_id, .. } => order_id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_shape() {
        let event = OrderEvent::PaymentRecorded {
            event_id: Uuid::nil(),
            order_id: "ORD1".into(),
            transaction_id: "TXN1".into(),
            gateway: Gateway::Koko,
            status: PaymentStatus::Failed,
            recorded_at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "payment_recorded");
        assert_eq!(json["gateway"], "koko");
        assert_eq!(json["status"], "Failed");
        assert_eq!(event.subject(), "orders.payment.failed");
        assert_eq!(event.order_id(), "ORD1");
    }
}
