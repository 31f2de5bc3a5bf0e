//! Postgres order store (sqlx).

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::debug;

use super::OrderPaymentStore;
use crate::domain::aggregates::order::payment_recorded;
use crate::domain::events::OrderEvent;
use crate::{PaymentError, PaymentOutcome, Result};

#[derive(Clone, Debug)]
pub struct PgOrderStore {
    db: PgPool,
}

impl PgOrderStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

#[async_trait]
impl OrderPaymentStore for PgOrderStore {
    async fn set_payment_status(&self, outcome: &PaymentOutcome) -> Result<Option<OrderEvent>> {
        let updated = sqlx::query(
            "UPDATE orders SET payment_status = $2, payment_gateway = $3, payment_transaction_id = $4, updated_at = NOW() \
             WHERE id = $1 AND (payment_status, payment_gateway, payment_transaction_id) IS DISTINCT FROM ($2, $3, $4)",
        )
        .bind(outcome.order_id().as_str())
        .bind(outcome.status().as_str())
        .bind(outcome.gateway().as_str())
        .bind(outcome.transaction_id())
        .execute(&self.db)
        .await?
        .rows_affected();
        if updated > 0 { return Ok(Some(payment_recorded(outcome, Utc::now()))); }

        // Nothing changed: either a replay or an order we never issued.
        let exists: Option<(String,)> = sqlx::query_as("SELECT id FROM orders WHERE id = $1")
            .bind(outcome.order_id().as_str())
            .fetch_optional(&self.db)
            .await?;
        match exists {
            Some(_) => {
                debug!(order_id = %outcome.order_id(), "payment status already current");
                Ok(None)
            }
            None => Err(PaymentError::OrderNotFound(outcome.order_id().to_string())),
        }
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Gateway, OrderId, PaymentStatus};
    use chrono::{DateTime, Utc};

    fn outcome(id: &str, txn: &str, status: PaymentStatus) -> PaymentOutcome {
        PaymentOutcome::new(OrderId::new(id).unwrap(), txn, Gateway::PayHere, status).unwrap()
    }

    async fn place(pool: &PgPool, id: &str) {
        sqlx::query("INSERT INTO orders (id) VALUES ($1)").bind(id).execute(pool).await.unwrap();
    }

    async fn row(pool: &PgPool, id: &str) -> (String, Option<String>, DateTime<Utc>) {
        sqlx::query_as("SELECT payment_status, payment_transaction_id, updated_at FROM orders WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires a Postgres DATABASE_URL"]
    async fn test_replay_leaves_row_untouched(pool: PgPool) {
        place(&pool, "ORDER123").await;
        let store = PgOrderStore::new(pool.clone());
        let paid = outcome("ORDER123", "320025071234", PaymentStatus::Paid);

        let event = store.set_payment_status(&paid).await.unwrap();
        assert_eq!(event.map(|e| e.subject()), Some("orders.payment.paid"));
        let first = row(&pool, "ORDER123").await;
        assert_eq!((first.0.as_str(), first.1.as_deref()), ("Paid", Some("320025071234")));

        assert!(store.set_payment_status(&paid).await.unwrap().is_none());
        assert_eq!(row(&pool, "ORDER123").await, first);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires a Postgres DATABASE_URL"]
    async fn test_unknown_order_is_not_found(pool: PgPool) {
        let store = PgOrderStore::new(pool.clone());
        let err = store.set_payment_status(&outcome("GHOST", "T1", PaymentStatus::Paid)).await.unwrap_err();
        assert!(matches!(err, PaymentError::OrderNotFound(id) if id == "GHOST"));
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders").fetch_one(&pool).await.unwrap();
        assert_eq!(count.0, 0);
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "Requires a Postgres DATABASE_URL"]
    async fn test_late_failure_overwrites_paid(pool: PgPool) {
        place(&pool, "ORDER123").await;
        let store = PgOrderStore::new(pool.clone());
        store.set_payment_status(&outcome("ORDER123", "320025071234", PaymentStatus::Paid)).await.unwrap();

        let event = store.set_payment_status(&outcome("ORDER123", "320025071234", PaymentStatus::Failed)).await.unwrap();
        assert_eq!(event.map(|e| e.subject()), Some("orders.payment.failed"));
        assert_eq!(row(&pool, "ORDER123").await.0, "Failed");
    }
}
