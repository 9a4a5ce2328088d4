#![allow(dead_code)]

use storefront_engine::{
    db_types::{Cents, NewProduct, NewUser, ProductId, Secret, UserId},
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CatalogApi,
    SqliteDatabase,
};

/// A fresh, migrated database with no rows.
pub async fn new_store() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await
}

pub async fn add_buyer(db: &SqliteDatabase, name: &str) -> UserId {
    let user = NewUser::new(name.to_string(), format!("{name}@example.com"), Secret::from("password"));
    CatalogApi::new(db.clone()).create_user(user).await.expect("Error creating buyer")
}

pub async fn add_product(db: &SqliteDatabase, name: &str, category: &str, price: i64, stock: i64) -> ProductId {
    let product = NewProduct::new(name, category, Cents::from(price), stock);
    CatalogApi::new(db.clone()).add_product(product).await.expect("Error adding product")
}

pub async fn stock_of(db: &SqliteDatabase, product_id: ProductId) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT stock FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(db.pool())
        .await
        .expect("Error reading stock")
}

/// Everything an order could have touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub stocks: Vec<(i64, i64)>,
    pub orders: i64,
    pub order_items: i64,
    pub audit_entries: i64,
}

pub async fn snapshot(db: &SqliteDatabase) -> StoreSnapshot {
    let pool = db.pool();
    let stocks = sqlx::query_as::<_, (i64, i64)>("SELECT id, stock FROM products ORDER BY id")
        .fetch_all(pool)
        .await
        .expect("Error reading stock levels");
    let count = |table: &str| format!("SELECT COUNT(*) FROM {table}");
    let orders = sqlx::query_scalar::<_, i64>(&count("orders")).fetch_one(pool).await.expect("Error counting orders");
    let order_items =
        sqlx::query_scalar::<_, i64>(&count("order_items")).fetch_one(pool).await.expect("Error counting items");
    let audit_entries =
        sqlx::query_scalar::<_, i64>(&count("audit_log")).fetch_one(pool).await.expect("Error counting audit rows");
    StoreSnapshot { stocks, orders, order_items, audit_entries }
}
