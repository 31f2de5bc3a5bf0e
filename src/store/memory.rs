//! In-memory order store, for tests and `STORE=memory` local runs.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::OrderPaymentStore;
use crate::domain::aggregates::Order;
use crate::domain::events::OrderEvent;
use crate::domain::value_objects::OrderId;
use crate::{PaymentError, PaymentOutcome, Result};

#[derive(Clone, Debug, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self { Self::default() }

    /// Registers a pending order, as checkout would.
    pub async fn place(&self, order_id: OrderId) {
        let mut orders = self.orders.write().await;
        if !orders.contains_key(&order_id) {
            let order = Order::place(order_id);
            orders.insert(order.id().clone(), order);
        }
    }

    pub async fn get(&self, order_id: &OrderId) -> Option<Order> {
        self.orders.read().await.get(order_id).cloned()
    }
}

#[async_trait]
impl OrderPaymentStore for InMemoryOrderStore {
    async fn set_payment_status(&self, outcome: &PaymentOutcome) -> Result<Option<OrderEvent>> {
        let mut orders = self.orders.write().await;
        let order = orders
            .get_mut(outcome.order_id())
            .ok_or_else(|| PaymentError::OrderNotFound(outcome.order_id().to_string()))?;
        order.record_payment(outcome);
        Ok(order.take_events().pop())
    }
}
