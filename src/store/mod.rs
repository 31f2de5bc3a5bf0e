//! Order payment store.
//!
//! The only write this service makes against orders is "set the payment
//! fields". Implementations must give it set semantics: replaying an
//! identical outcome converges to the same row.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::domain::events::OrderEvent;
use crate::{PaymentOutcome, Result};

pub use memory::InMemoryOrderStore;
pub use postgres::PgOrderStore;

#[async_trait]
pub trait OrderPaymentStore: Send + Sync {
    /// Writes status, gateway and transaction id. Yields the resulting event
    /// when the stored values changed, `None` for a replay, and
    /// `Err(OrderNotFound)` for an unknown order.
    async fn set_payment_status(&self, outcome: &PaymentOutcome) -> Result<Option<OrderEvent>>;
}
