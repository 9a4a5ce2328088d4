use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db::sqlite::{products, SqliteDatabaseError},
    db_types::{
        Cents,
        ClaimedLine,
        Order,
        OrderId,
        OrderItem,
        OrderLineRequest,
        OrderQueryFilter,
        OrderStatusType,
        UserId,
    },
};

/// Claims `line.quantity` units of stock and returns the unit price the buyer pays.
///
/// The check and the decrement are a single conditional `UPDATE`, so the stock level can never be observed by another
/// writer between the two. The statement also takes the database write lock for the enclosing transaction. Call this
/// inside a transaction (pass `&mut tx`) so that a later failure returns the stock.
pub async fn claim_stock(
    line: &OrderLineRequest,
    conn: &mut SqliteConnection,
) -> Result<ClaimedLine, SqliteDatabaseError> {
    let price = sqlx::query_scalar::<_, Cents>(
        "UPDATE products SET stock = stock - $1 WHERE id = $2 AND stock >= $1 RETURNING price",
    )
    .bind(line.quantity)
    .bind(line.product_id)
    .fetch_optional(&mut *conn)
    .await?;
    match price {
        Some(unit_price) => {
            trace!("📦️ Claimed {} x product {} at {unit_price}", line.quantity, line.product_id);
            Ok(ClaimedLine { product_id: line.product_id, quantity: line.quantity, unit_price })
        },
        None => match products::stock_level(line.product_id, conn).await? {
            None => Err(SqliteDatabaseError::ProductNotFound(line.product_id)),
            Some(available) => Err(SqliteDatabaseError::InsufficientStock {
                product_id: line.product_id,
                requested: line.quantity,
                available,
            }),
        },
    }
}

/// The sum of quantity × unit price over all claimed lines, or `None` if it overflows.
pub fn order_total(lines: &[ClaimedLine]) -> Option<Cents> {
    lines.iter().try_fold(Cents::default(), |total, line| {
        line.unit_price.checked_mul(line.quantity).and_then(|amount| total.checked_add(amount))
    })
}

/// Inserts a new order row with `pending` status. This is not atomic on its own; embed the call in a transaction.
pub async fn insert_order(
    user_id: UserId,
    total: Cents,
    conn: &mut SqliteConnection,
) -> Result<OrderId, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, OrderId>(
        "INSERT INTO orders (user_id, total_amount, status) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(total)
    .bind(OrderStatusType::Pending)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub async fn insert_order_item(
    order_id: OrderId,
    line: &ClaimedLine,
    conn: &mut SqliteConnection,
) -> Result<i64, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO order_items (order_id, product_id, quantity, price) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(order_id)
    .bind(line.product_id)
    .bind(line.quantity)
    .bind(line.unit_price)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

pub(crate) async fn update_order_status(
    order_id: OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), SqliteDatabaseError> {
    let _ = sqlx::query("UPDATE orders SET status = $1 WHERE id = $2").bind(status).bind(order_id).execute(conn).await?;
    Ok(())
}

pub async fn fetch_order(order_id: OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, SqliteDatabaseError> {
    let order = sqlx::query_as::<_, Order>(
        "SELECT id, user_id, total_amount, order_date, status FROM orders WHERE id = $1",
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    Ok(order)
}

/// Returns the lines of an order in insertion order.
pub async fn fetch_order_items(
    order_id: OrderId,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, SqliteDatabaseError> {
    let items = sqlx::query_as::<_, OrderItem>(
        "SELECT id, order_id, product_id, quantity, price FROM order_items WHERE order_id = $1 ORDER BY id ASC",
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

pub async fn count_orders(conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM orders").fetch_one(conn).await?;
    Ok(count)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `id` in ascending order
pub async fn fetch_orders(
    query: OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, SqliteDatabaseError> {
    let mut builder = QueryBuilder::new("SELECT id, user_id, total_amount, order_date, status FROM orders ");
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(product_id) = query.product_id {
        where_clause.push("id IN (SELECT order_id FROM order_items WHERE product_id = ");
        where_clause.push_bind_unseparated(product_id);
        where_clause.push_unseparated(")");
    }
    if !query.statuses.is_empty() {
        where_clause.push("status IN (");
        for (i, status) in query.statuses.into_iter().enumerate() {
            if i > 0 {
                where_clause.push_unseparated(", ");
            }
            where_clause.push_bind_unseparated(status);
        }
        where_clause.push_unseparated(")");
    }
    builder.push(" ORDER BY id ASC");

    trace!("📦️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    trace!("📦️ Result of fetch_orders: {}", orders.len());
    Ok(orders)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::db_types::ProductId;

    fn line(product: i64, quantity: i64, price: i64) -> ClaimedLine {
        ClaimedLine { product_id: ProductId(product), quantity, unit_price: Cents::from(price) }
    }

    #[test]
    fn totals() {
        assert_eq!(order_total(&[line(1, 3, 1000)]), Some(Cents::from(3000)));
        assert_eq!(order_total(&[line(1, 2, 500), line(2, 1, 2000)]), Some(Cents::from(3000)));
        assert_eq!(order_total(&[]), Some(Cents::default()));
        assert_eq!(order_total(&[line(1, 2, i64::MAX)]), None);
        assert_eq!(order_total(&[line(1, 1, i64::MAX), line(2, 1, 1)]), None);
    }
}
