//! Order event publication over NATS.

use tracing::{debug, warn};

use crate::domain::events::OrderEvent;
use crate::{PaymentError, Result};

#[derive(Clone, Debug, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub async fn connect(url: Option<&str>) -> Self {
        let Some(url) = url else { return Self::disabled() };
        match async_nats::connect(url).await {
            Ok(client) => Self::new(Some(client)),
            Err(e) => {
                warn!(error = %e, "NATS unavailable, order events will not be published");
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool { self.nats.is_some() }

    pub async fn publish(&self, event: &OrderEvent) -> Result<()> {
        let Some(nats) = &self.nats else {
            debug!(subject = event.subject(), "event publishing disabled");
            return Ok(());
        };
        let payload = serde_json::to_vec(event).map_err(|e| PaymentError::Messaging(e.to_string()))?;
        nats.publish(event.subject().to_string(), payload.into())
            .await
            .map_err(|e| PaymentError::Messaging(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::order::payment_recorded;
    use crate::{Gateway, OrderId, PaymentOutcome, PaymentStatus};
    use chrono::Utc;

    #[tokio::test]
    async fn test_disabled_publisher_is_a_noop() {
        let publisher = EventPublisher::connect(None).await;
        assert!(!publisher.is_enabled());
        let outcome = PaymentOutcome::new(OrderId::new("ORD1").unwrap(), "TXN1", Gateway::Koko, PaymentStatus::Paid).unwrap();
        publisher.publish(&payment_recorded(&outcome, Utc::now())).await.unwrap();
    }
}
