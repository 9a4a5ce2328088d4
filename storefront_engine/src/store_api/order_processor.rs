//! Places orders atomically and answers questions about them.
use std::fmt::Debug;

use log::*;

use crate::{
    db::traits::{OrderManagement, OrderReceipt},
    db_types::{validate_order_lines, Order, OrderId, OrderLineRequest, OrderQueryFilter, UserId},
    store_api::{
        errors::OrderProcessorError,
        order_objects::{OrderDetails, RetryPolicy},
    },
};

/// `OrderProcessor` turns a buyer's list of `{product, quantity}` lines into a committed order.
///
/// Each call is one all-or-nothing unit of work in the backend. A call that loses a lock race is retried according to
/// the [`RetryPolicy`]. Every other failure is returned straight away.
pub struct OrderProcessor<B> {
    db: B,
    retry_policy: RetryPolicy,
}

impl<B: Debug> Debug for OrderProcessor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderProcessor ({:?}, {:?})", self.db, self.retry_policy)
    }
}

impl<B> OrderProcessor<B> {
    pub fn new(db: B) -> Self {
        Self { db, retry_policy: RetryPolicy::default() }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderProcessor<B>
where
    B: OrderManagement,
    OrderProcessorError: From<B::Error>,
{
    /// Places an order for `user_id`.
    ///
    /// On success the new order id and its total are returned. On failure, no product, order, order item or audit
    /// row has changed. Malformed requests (no lines, or a non-positive quantity) are rejected before the store is
    /// touched.
    pub async fn process_order(
        &self,
        user_id: UserId,
        lines: &[OrderLineRequest],
    ) -> Result<OrderReceipt, OrderProcessorError> {
        validate_order_lines(lines)?;
        let mut attempt = 0u32;
        loop {
            match self.db.process_order(user_id, lines).await.map_err(OrderProcessorError::from) {
                Ok(receipt) => {
                    info!("📦️ Order {} placed for user {user_id}. Total: {}", receipt.order_id, receipt.total);
                    return Ok(receipt);
                },
                Err(e) if e.is_retryable() && attempt < self.retry_policy.max_retries => {
                    attempt += 1;
                    let delay = self.retry_policy.delay_for(attempt);
                    warn!("📦️ Order for user {user_id} failed ({e}). Retry {attempt} in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                },
                Err(e) => {
                    debug!("📦️ Order for user {user_id} rejected. {e}");
                    return Err(e);
                },
            }
        }
    }

    /// Fetches an order and its line items. Returns `None` if the order does not exist.
    pub async fn order_details(&self, order_id: OrderId) -> Result<Option<OrderDetails>, OrderProcessorError> {
        let Some(order) = self.db.order_by_id(order_id).await? else {
            return Ok(None);
        };
        let items = self.db.order_items(order_id).await?;
        Ok(Some(OrderDetails { order, items }))
    }

    pub async fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderProcessorError> {
        let orders = self.db.fetch_orders(OrderQueryFilter::default().with_user_id(user_id)).await?;
        trace!("📦️ {} orders for user {user_id}", orders.len());
        Ok(orders)
    }

    pub async fn search_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, OrderProcessorError> {
        let orders = self.db.fetch_orders(filter).await?;
        Ok(orders)
    }
}

#[cfg(test)]
mod test {
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    use super::*;
    use crate::db_types::{Cents, OrderItem, ProductId};

    /// Fails the first `failures` calls with `error`, then succeeds.
    struct FlakyBackend {
        failures: u32,
        error: OrderProcessorError,
        calls: AtomicU32,
    }

    impl FlakyBackend {
        fn new(failures: u32, error: OrderProcessorError) -> Self {
            Self { failures, error, calls: AtomicU32::new(0) }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl OrderManagement for FlakyBackend {
        type Error = OrderProcessorError;

        async fn process_order(&self, _: UserId, _: &[OrderLineRequest]) -> Result<OrderReceipt, Self::Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(self.error.clone())
            } else {
                Ok(OrderReceipt { order_id: OrderId(1), total: Cents::from(1000) })
            }
        }

        async fn order_by_id(&self, _: OrderId) -> Result<Option<Order>, Self::Error> {
            Ok(None)
        }

        async fn order_items(&self, _: OrderId) -> Result<Vec<OrderItem>, Self::Error> {
            Ok(vec![])
        }

        async fn fetch_orders(&self, _: OrderQueryFilter) -> Result<Vec<Order>, Self::Error> {
            Ok(vec![])
        }
    }

    fn fast_retries(n: u32) -> RetryPolicy {
        RetryPolicy::new(n, Duration::from_millis(1))
    }

    fn busy() -> OrderProcessorError {
        OrderProcessorError::transaction_failure("database is locked", true)
    }

    #[tokio::test]
    async fn malformed_requests_never_reach_the_backend() {
        let api = OrderProcessor::new(FlakyBackend::new(0, busy()));
        let err = api.process_order(UserId(1), &[]).await.unwrap_err();
        assert!(matches!(err, OrderProcessorError::InvalidRequest(_)));
        let err = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(1), 0)]).await.unwrap_err();
        assert!(matches!(err, OrderProcessorError::InvalidRequest(_)));
        assert_eq!(api.db().calls(), 0);
    }

    #[tokio::test]
    async fn lock_conflicts_are_retried() {
        let api = OrderProcessor::new(FlakyBackend::new(2, busy())).with_retry_policy(fast_retries(3));
        let receipt = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(1), 1)]).await.unwrap();
        assert_eq!(receipt.order_id, OrderId(1));
        assert_eq!(api.db().calls(), 3);
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let api = OrderProcessor::new(FlakyBackend::new(10, busy())).with_retry_policy(fast_retries(2));
        let err = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(1), 1)]).await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(api.db().calls(), 3);
    }

    #[tokio::test]
    async fn permanent_transaction_failures_are_not_retried() {
        let failure = OrderProcessorError::transaction_failure("unknown buyer", false);
        let api = OrderProcessor::new(FlakyBackend::new(1, failure.clone())).with_retry_policy(fast_retries(3));
        let err = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(1), 1)]).await.unwrap_err();
        assert_eq!(err, failure);
        assert_eq!(api.db().calls(), 1);
    }

    #[tokio::test]
    async fn business_failures_are_not_retried() {
        let api = OrderProcessor::new(FlakyBackend::new(1, OrderProcessorError::ProductNotFound(ProductId(9))))
            .with_retry_policy(fast_retries(3));
        let err = api.process_order(UserId(1), &[OrderLineRequest::new(ProductId(9), 1)]).await.unwrap_err();
        assert_eq!(err, OrderProcessorError::ProductNotFound(ProductId(9)));
        assert_eq!(api.db().calls(), 1);
    }
}
