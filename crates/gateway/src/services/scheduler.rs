//! Review request scheduling.
//!
//! The webhook receiver turns fulfilled orders into [`ReviewRequest`]s and
//! hands them to a [`ReviewScheduler`]. The shipped scheduler only logs;
//! a job queue slots in behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use thiserror::Error;
use trustloop_core::{FulfilledOrder, ProductId, ShopDomain};

/// Errors a scheduler may report. The receiver logs them and still
/// acknowledges the webhook.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Review request rejected: {0}")]
    Rejected(String),
}

/// A review request due at `send_at`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReviewRequest {
    pub shop: ShopDomain,
    pub order: FulfilledOrder,
    pub product_ids: Vec<ProductId>,
    pub send_at: DateTime<Utc>,
}

impl ReviewRequest {
    /// Schedule a request `delay` after the order was fulfilled.
    ///
    /// A delay past the end of representable time saturates to
    /// `DateTime::<Utc>::MAX_UTC`; schedulers reject such requests.
    #[must_use]
    pub fn for_order(shop: ShopDomain, order: FulfilledOrder, delay: Duration) -> Self {
        let send_at = order
            .fulfilled_at
            .checked_add_signed(delay)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let product_ids = order.product_ids();

        Self {
            shop,
            order,
            product_ids,
            send_at,
        }
    }

    /// Whether the send time saturated while adding the delay.
    #[must_use]
    pub fn send_at_overflowed(&self) -> bool {
        self.send_at == DateTime::<Utc>::MAX_UTC
    }
}

/// Accepts review requests for later delivery.
#[async_trait]
pub trait ReviewScheduler: Send + Sync {
    /// Queue a review request.
    async fn schedule(&self, request: ReviewRequest) -> Result<(), SchedulerError>;
}

/// Scheduler that records the request in the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingScheduler;

#[async_trait]
impl ReviewScheduler for LoggingScheduler {
    async fn schedule(&self, request: ReviewRequest) -> Result<(), SchedulerError> {
        if request.send_at_overflowed() {
            return Err(SchedulerError::Rejected(format!(
                "send time for order {} is out of range",
                request.order.id
            )));
        }

        tracing::info!(
            shop = %request.shop,
            order_id = %request.order.id,
            customer = request.order.customer.email.as_deref().unwrap_or("-"),
            products = ?request.product_ids,
            send_at = %request.send_at,
            "Scheduling review request email"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use trustloop_core::{OrderCustomer, OrderLineItem};

    use super::*;

    fn order() -> FulfilledOrder {
        FulfilledOrder {
            id: "1001".to_string(),
            customer: OrderCustomer::default(),
            line_items: vec![
                OrderLineItem {
                    product_id: Some(ProductId::new(7)),
                    ..OrderLineItem::default()
                },
                OrderLineItem::default(),
            ],
            fulfilled_at: Utc.with_ymd_and_hms(2024, 2, 10, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_for_order_adds_delay() {
        let request = ReviewRequest::for_order(
            ShopDomain::normalize("demo"),
            order(),
            Duration::days(7),
        );

        assert_eq!(
            request.send_at,
            Utc.with_ymd_and_hms(2024, 2, 17, 14, 30, 0).unwrap()
        );
        assert_eq!(request.product_ids, vec![ProductId::new(7)]);
    }

    #[tokio::test]
    async fn test_logging_scheduler_accepts() {
        let request =
            ReviewRequest::for_order(ShopDomain::normalize("demo"), order(), Duration::zero());
        assert!(LoggingScheduler.schedule(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_logging_scheduler_rejects_overflowed_send_time() {
        let request = ReviewRequest::for_order(
            ShopDomain::normalize("demo"),
            order(),
            Duration::weeks(52 * 300_000),
        );
        assert!(request.send_at_overflowed());

        let err = LoggingScheduler.schedule(request).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Review request rejected: send time for order 1001 is out of range"
        );
    }
}
