//! Payment status reconciliation: the single write path from a verified
//! notification to the order store.

use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::messaging::EventPublisher;
use crate::store::OrderPaymentStore;
use crate::{PaymentOutcome, Result};

#[derive(Clone)]
pub struct PaymentReconciler {
    store: Arc<dyn OrderPaymentStore>,
    publisher: EventPublisher,
}

impl PaymentReconciler {
    pub fn new(store: Arc<dyn OrderPaymentStore>, publisher: EventPublisher) -> Self {
        Self { store, publisher }
    }

    /// One store write, no local retry. The gateway redelivers on error.
    ///
    /// Notifications are applied in arrival order: a late `Failed` replaces
    /// an earlier `Paid`.
    #[instrument(skip(self, outcome), fields(order_id = %outcome.order_id(), gateway = %outcome.gateway(), status = %outcome.status()))]
    pub async fn reconcile(&self, outcome: &PaymentOutcome) -> Result<()> {
        match self.store.set_payment_status(outcome).await? {
            Some(event) => {
                info!(transaction_id = outcome.transaction_id(), "payment status recorded");
                if let Err(e) = self.publisher.publish(&event).await {
                    warn!(error = %e, "failed to publish payment event");
                }
            }
            None => info!("duplicate notification, payment status unchanged"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryOrderStore;
    use crate::{Gateway, OrderId, PaymentError, PaymentStatus};

    #[tokio::test]
    async fn test_reconcile_twice_converges() {
        let store = InMemoryOrderStore::new();
        let id = OrderId::new("ORDER123").unwrap();
        store.place(id.clone()).await;
        let reconciler = PaymentReconciler::new(Arc::new(store.clone()), EventPublisher::disabled());
        let outcome = PaymentOutcome::new(id.clone(), "320025071234", Gateway::PayHere, PaymentStatus::Paid).unwrap();

        reconciler.reconcile(&outcome).await.unwrap();
        let once = store.get(&id).await.unwrap();
        reconciler.reconcile(&outcome).await.unwrap();
        let twice = store.get(&id).await.unwrap();

        assert_eq!(twice.payment_status(), PaymentStatus::Paid);
        assert_eq!(once.transaction_id(), twice.transaction_id());
        assert_eq!(once.updated_at(), twice.updated_at());
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let reconciler = PaymentReconciler::new(Arc::new(InMemoryOrderStore::new()), EventPublisher::disabled());
        let outcome = PaymentOutcome::new(OrderId::new("GHOST").unwrap(), "T", Gateway::Koko, PaymentStatus::Failed).unwrap();
        assert!(matches!(reconciler.reconcile(&outcome).await, Err(PaymentError::OrderNotFound(_))));
    }
}
