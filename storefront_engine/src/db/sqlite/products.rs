use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{Cents, NewProduct, Product, ProductId},
};

pub async fn insert_product(
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<ProductId, SqliteDatabaseError> {
    let id = sqlx::query_scalar::<_, ProductId>(
        "INSERT INTO products (name, category, price, stock) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&product.name)
    .bind(&product.category)
    .bind(product.price)
    .bind(product.stock)
    .fetch_one(conn)
    .await?;
    debug!("🛒️ Product {id} ({}) added with {} units at {}", product.name, product.stock, product.price);
    Ok(id)
}

pub async fn fetch_product(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<Product>, SqliteDatabaseError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, created_at FROM products WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_products_in_category(
    category: &str,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, SqliteDatabaseError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, created_at FROM products WHERE category = $1 ORDER BY id ASC",
    )
    .bind(category)
    .fetch_all(conn)
    .await?;
    Ok(products)
}

/// Products holding more than `min_stock` units, lowest id first.
pub async fn fetch_products_in_stock(
    min_stock: i64,
    limit: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, SqliteDatabaseError> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, name, category, price, stock, created_at FROM products WHERE stock > $1 ORDER BY id ASC LIMIT $2",
    )
    .bind(min_stock)
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(products)
}

/// Returns the current stock of the product, or `None` if the product does not exist.
pub async fn stock_level(id: ProductId, conn: &mut SqliteConnection) -> Result<Option<i64>, SqliteDatabaseError> {
    let stock =
        sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(stock)
}

/// Adds `quantity` units to the product's stock and returns the new level, or `None` if the product does not exist.
///
/// `quantity` must be positive. The update only applies while the new level still fits in an `i64`; otherwise SQLite
/// would store the sum as a REAL.
pub async fn restock(
    id: ProductId,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<i64>, SqliteDatabaseError> {
    let stock = sqlx::query_scalar::<_, i64>(
        "UPDATE products SET stock = stock + $1 WHERE id = $2 AND stock <= 9223372036854775807 - $1 RETURNING stock",
    )
    .bind(quantity)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    match stock {
        Some(level) => {
            trace!("🛒️ Product {id} restocked by {quantity}. New level: {level}");
            Ok(Some(level))
        },
        None => match stock_level(id, conn).await? {
            None => Ok(None),
            Some(_) => Err(SqliteDatabaseError::StockOverflow { product_id: id, quantity }),
        },
    }
}

/// Sets a new list price. Lines of orders that were already placed keep the price they were bought at.
pub async fn update_price(
    id: ProductId,
    price: Cents,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE products SET price = $1 WHERE id = $2").bind(price).bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
