//! Read-only reporting queries. None of these take a write lock, so they can run alongside order processing and will
//! only ever see committed orders.
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{
        CategoryStats,
        ColumnInfo,
        SalesStatistics,
        SchemaObject,
        TableDocumentation,
        TopCustomer,
        UserId,
        UserOrderSummary,
    },
};

pub async fn category_stats(conn: &mut SqliteConnection) -> Result<Vec<CategoryStats>, SqliteDatabaseError> {
    let stats = sqlx::query_as::<_, CategoryStats>(
        r#"
        SELECT
            category,
            COUNT(*) AS product_count,
            CAST(ROUND(AVG(price)) AS INTEGER) AS avg_price,
            MIN(price) AS min_price,
            MAX(price) AS max_price,
            COALESCE(SUM(stock), 0) AS total_stock
        FROM products
        GROUP BY category
        ORDER BY product_count DESC, avg_price DESC, category ASC
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(stats)
}

pub async fn sales_statistics(conn: &mut SqliteConnection) -> Result<SalesStatistics, SqliteDatabaseError> {
    let stats = sqlx::query_as::<_, SalesStatistics>(
        r#"
        SELECT
            COUNT(*) AS total_orders,
            COUNT(DISTINCT user_id) AS unique_customers,
            COALESCE(SUM(total_amount), 0) AS total_revenue,
            COALESCE(CAST(ROUND(AVG(total_amount)) AS INTEGER), 0) AS avg_order_value,
            COALESCE(MIN(total_amount), 0) AS min_order,
            COALESCE(MAX(total_amount), 0) AS max_order,
            COUNT(CASE WHEN status = 'completed' THEN 1 END) AS completed_orders,
            COUNT(CASE WHEN status = 'pending' THEN 1 END) AS pending_orders,
            COUNT(CASE WHEN status = 'cancelled' THEN 1 END) AS cancelled_orders
        FROM orders
        "#,
    )
    .fetch_one(conn)
    .await?;
    Ok(stats)
}

/// Order totals for a single user. Each aggregate runs over its own sub-select so that joining order lines does not
/// count an order's total once per line.
pub async fn user_order_summary(
    user_id: UserId,
    conn: &mut SqliteConnection,
) -> Result<Option<UserOrderSummary>, SqliteDatabaseError> {
    let summary = sqlx::query_as::<_, UserOrderSummary>(
        r#"
        SELECT
            u.id,
            u.username,
            u.email,
            (SELECT COUNT(*) FROM orders o WHERE o.user_id = u.id) AS order_count,
            (SELECT COALESCE(SUM(o.total_amount), 0) FROM orders o WHERE o.user_id = u.id) AS total_spent,
            (SELECT COALESCE(CAST(ROUND(AVG(o.total_amount)) AS INTEGER), 0) FROM orders o WHERE o.user_id = u.id)
                AS avg_order_value,
            (SELECT MAX(o.order_date) FROM orders o WHERE o.user_id = u.id) AS last_order_date,
            (
                SELECT COUNT(DISTINCT oi.product_id)
                FROM order_items oi INNER JOIN orders o ON o.id = oi.order_id
                WHERE o.user_id = u.id
            ) AS unique_products_purchased
        FROM users u
        WHERE u.id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    Ok(summary)
}

/// Active users ranked by what they spent on completed orders.
pub async fn top_customers(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<TopCustomer>, SqliteDatabaseError> {
    let customers = sqlx::query_as::<_, TopCustomer>(
        r#"
        WITH customer_stats AS (
            SELECT
                o.user_id,
                COUNT(*) AS order_count,
                SUM(o.total_amount) AS total_spent
            FROM orders o
            WHERE o.status = 'completed'
            GROUP BY o.user_id
        )
        SELECT
            u.id,
            u.username,
            u.email,
            cs.order_count,
            cs.total_spent
        FROM users u
        INNER JOIN customer_stats cs ON u.id = cs.user_id
        WHERE u.status = 'active'
        ORDER BY cs.total_spent DESC, u.id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(customers)
}

/// Tables, indexes, views and triggers defined in the database, excluding SQLite and migration bookkeeping.
pub async fn schema_objects(conn: &mut SqliteConnection) -> Result<Vec<SchemaObject>, SqliteDatabaseError> {
    let objects = sqlx::query_as::<_, SchemaObject>(
        r#"
        SELECT type, name, tbl_name AS table_name, sql
        FROM sqlite_master
        WHERE name NOT LIKE 'sqlite_%' AND name <> '_sqlx_migrations'
        ORDER BY type, name
        "#,
    )
    .fetch_all(conn)
    .await?;
    Ok(objects)
}

/// Columns and row counts of every storefront table, in name order.
pub async fn table_documentation(
    conn: &mut SqliteConnection,
) -> Result<Vec<TableDocumentation>, SqliteDatabaseError> {
    let tables = sqlx::query_scalar::<_, String>(
        r#"
        SELECT name
        FROM sqlite_master
        WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name <> '_sqlx_migrations'
        ORDER BY name
        "#,
    )
    .fetch_all(&mut *conn)
    .await?;
    let mut docs = Vec::with_capacity(tables.len());
    for name in tables {
        let columns = sqlx::query_as::<_, ColumnInfo>(
            r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info($1) ORDER BY cid"#,
        )
        .bind(&name)
        .fetch_all(&mut *conn)
        .await?;
        // Table names come from sqlite_master, so quoting is enough here.
        let row_count =
            sqlx::query_scalar::<_, i64>(&format!(r#"SELECT COUNT(*) FROM "{name}""#)).fetch_one(&mut *conn).await?;
        docs.push(TableDocumentation { name, row_count, columns });
    }
    Ok(docs)
}
