//! Order Aggregate (payment view)

use chrono::{DateTime, Utc};
use uuid::Uuid;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::OrderId;
use crate::{Gateway, PaymentOutcome, PaymentStatus};

#[derive(Clone, Debug)]
pub struct Order {
    id: OrderId,
    payment: PaymentStatus,
    gateway: Option<Gateway>,
    transaction_id: Option<String>,
    updated_at: DateTime<Utc>,
    events: Vec<OrderEvent>,
}

impl Order {
    pub fn place(id: OrderId) -> Self {
        let now = Utc::now();
        Self { id, payment: PaymentStatus::Pending, gateway: None, transaction_id: None, updated_at: now, events: vec![] }
    }

    pub fn id(&self) -> &OrderId { &self.id }
    pub fn payment_status(&self) -> PaymentStatus { self.payment }
    pub fn transaction_id(&self) -> Option<&str> { self.transaction_id.as_deref() }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }

    /// Overwrites the payment fields with the gateway verdict.
    ///
    /// Returns whether anything changed. Replaying the same outcome is a
    /// no-op and raises no event; a different outcome always wins.
    pub fn record_payment(&mut self, outcome: &PaymentOutcome) -> bool {
        let unchanged = self.payment == outcome.status()
            && self.gateway == Some(outcome.gateway())
            && self.transaction_id.as_deref() == Some(outcome.transaction_id());
        if unchanged { return false; }

        self.payment = outcome.status();
        self.gateway = Some(outcome.gateway());
        self.transaction_id = Some(outcome.transaction_id().to_string());
        self.touch();
        self.raise_event(payment_recorded(outcome, self.updated_at));
        true
    }

    pub fn take_events(&mut self) -> Vec<OrderEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: OrderEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

pub(crate) fn payment_recorded(outcome: &PaymentOutcome, at: DateTime<Utc>) -> OrderEvent {
    OrderEvent::PaymentRecorded {
        event_id: Uuid::now_v7(),
        order_id: outcome.order_id().to_string(),
        transaction_id: outcome.transaction_id().to_string(),
        gateway: outcome.gateway(),
        status: outcome.status(),
        recorded_at: at,
    }
}
