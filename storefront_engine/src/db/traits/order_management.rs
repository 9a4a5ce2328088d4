use crate::{
    db::traits::OrderReceipt,
    db_types::{Order, OrderId, OrderItem, OrderLineRequest, OrderQueryFilter, UserId},
};

/// The `OrderManagement` trait defines atomic order placement and the queries over committed orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    type Error: std::error::Error;

    /// Places an order for `user_id` in a single atomic transaction:
    /// * claims stock for every line, in the given order, capturing each product's current price,
    /// * inserts the order with the computed total, and one order item per line,
    /// * writes an audit entry and marks the order `completed`.
    ///
    /// If any step fails, the transaction is rolled back and no product, order, order item or audit row changes.
    async fn process_order(&self, user_id: UserId, lines: &[OrderLineRequest]) -> Result<OrderReceipt, Self::Error>;

    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<Order>, Self::Error>;

    /// The order's line items, in the order they were requested.
    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, Self::Error>;

    async fn fetch_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, Self::Error>;
}
