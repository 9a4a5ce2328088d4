use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::db_types::{Cents, Order, OrderItem};

/// A committed order together with its line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

impl OrderDetails {
    /// The sum of the line totals. For any committed order this equals `order.total_amount`.
    pub fn items_total(&self) -> Cents {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// How often, and how patiently, a failed order transaction is retried.
///
/// The n-th retry waits `n × backoff` before starting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self { max_retries, backoff }
    }

    /// Never retry.
    pub fn none() -> Self {
        Self { max_retries: 0, backoff: Duration::ZERO }
    }

    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_retries: 3, backoff: Duration::from_millis(25) }
    }
}
