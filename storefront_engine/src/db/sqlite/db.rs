use std::{fmt::Debug, path::Path};

use log::*;
use serde_json::json;
use sqlx::{migrate, SqlitePool};

use super::{audit, backup, maintenance, new_pool, orders, products, reports, users, PoolSettings, SqliteDatabaseError};
use crate::{
    db::traits::{BackupManagement, CatalogManagement, OrderManagement, OrderReceipt, Reporting},
    db_types::{
        validate_order_lines,
        AuditEntry,
        CategoryStats,
        Cents,
        MaintenanceReport,
        NewAuditEntry,
        NewProduct,
        NewUser,
        Order,
        OrderId,
        OrderItem,
        OrderLineRequest,
        OrderQueryFilter,
        OrderStatusType,
        Product,
        ProductId,
        SalesStatistics,
        SchemaObject,
        TableDocumentation,
        TopCustomer,
        User,
        UserId,
        UserOrderSummary,
        UserRole,
        UserStatus,
    },
};

/// A pooled SQLite backend. Cloning is cheap and clones share the pool.
///
/// Every call acquires its own connection from the pool, so concurrent orders never share a session. Every write runs
/// in a transaction that has committed by the time the call returns.
#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, settings: PoolSettings) -> Result<Self, SqliteDatabaseError> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, &settings).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Migrations complete for {}", self.url);
        Ok(())
    }

    /// The URL of the database
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count_orders(&self) -> Result<i64, SqliteDatabaseError> {
        let mut conn = self.pool.acquire().await?;
        orders::count_orders(&mut conn).await
    }
}

impl OrderManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn process_order(&self, user_id: UserId, lines: &[OrderLineRequest]) -> Result<OrderReceipt, Self::Error> {
        validate_order_lines(lines)?;
        // Dropping `tx` on any early return rolls back every statement below.
        let mut tx = self.pool.begin().await?;
        let mut claimed = Vec::with_capacity(lines.len());
        for line in lines {
            claimed.push(orders::claim_stock(line, &mut tx).await?);
        }
        let total = orders::order_total(&claimed).ok_or(SqliteDatabaseError::TotalOverflow)?;
        let order_id = orders::insert_order(user_id, total, &mut tx).await?;
        for line in &claimed {
            orders::insert_order_item(order_id, line, &mut tx).await?;
        }
        let details = json!({ "order_id": order_id, "total": total, "lines": claimed.len() });
        let entry = NewAuditEntry::new("orders", "CREATE", Some(user_id.value()), details);
        audit::insert_audit_entry(entry, &mut tx).await?;
        orders::update_order_status(order_id, OrderStatusType::Completed, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} for user {user_id} committed with {} lines. Total {total}", claimed.len());
        Ok(OrderReceipt { order_id, total })
    }

    async fn order_by_id(&self, order_id: OrderId) -> Result<Option<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn order_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_items(order_id, &mut conn).await
    }

    async fn fetch_orders(&self, filter: OrderQueryFilter) -> Result<Vec<Order>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_orders(filter, &mut conn).await
    }
}

impl CatalogManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn create_user(&self, user: NewUser) -> Result<UserId, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let id = users::insert_user(user, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn fetch_user(&self, user_id: UserId) -> Result<Option<User>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_user(user_id, &mut conn).await
    }

    async fn set_user_status(&self, user_id: UserId, status: UserStatus) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let updated = users::update_user_status(user_id, status, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn record_login(&self, user_id: UserId) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let updated = users::record_login(user_id, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }

    async fn assign_role(&self, user_id: UserId, role: UserRole) -> Result<(), Self::Error> {
        let mut tx = self.pool.begin().await?;
        users::assign_role(user_id, role, &mut tx).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn fetch_roles(&self, user_id: UserId) -> Result<Vec<UserRole>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_roles(user_id, &mut conn).await
    }

    async fn add_product(&self, product: NewProduct) -> Result<ProductId, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let id = products::insert_product(product, &mut tx).await?;
        tx.commit().await?;
        Ok(id)
    }

    async fn fetch_product(&self, product_id: ProductId) -> Result<Option<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_product(product_id, &mut conn).await
    }

    async fn products_in_category(&self, category: &str) -> Result<Vec<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products_in_category(category, &mut conn).await
    }

    async fn products_in_stock(&self, min_stock: i64, limit: i64) -> Result<Vec<Product>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        products::fetch_products_in_stock(min_stock, limit, &mut conn).await
    }

    async fn restock(&self, product_id: ProductId, quantity: i64) -> Result<Option<i64>, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let stock = products::restock(product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(stock)
    }

    async fn update_price(&self, product_id: ProductId, price: Cents) -> Result<bool, Self::Error> {
        let mut tx = self.pool.begin().await?;
        let updated = products::update_price(product_id, price, &mut tx).await?;
        tx.commit().await?;
        Ok(updated)
    }
}

impl Reporting for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn active_users(&self, limit: i64) -> Result<Vec<User>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        users::fetch_active_users(limit, &mut conn).await
    }

    async fn category_stats(&self) -> Result<Vec<CategoryStats>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::category_stats(&mut conn).await
    }

    async fn sales_statistics(&self) -> Result<SalesStatistics, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::sales_statistics(&mut conn).await
    }

    async fn user_order_summary(&self, user_id: UserId) -> Result<Option<UserOrderSummary>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::user_order_summary(user_id, &mut conn).await
    }

    async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomer>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::top_customers(limit, &mut conn).await
    }

    async fn audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        audit::fetch_audit_log(limit, &mut conn).await
    }

    async fn schema_objects(&self) -> Result<Vec<SchemaObject>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::schema_objects(&mut conn).await
    }

    async fn table_documentation(&self) -> Result<Vec<TableDocumentation>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        reports::table_documentation(&mut conn).await
    }

    async fn order_count_plan(&self) -> Result<Vec<String>, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        maintenance::order_count_plan(&mut conn).await
    }
}

impl BackupManagement for SqliteDatabase {
    type Error = SqliteDatabaseError;

    async fn backup_to(&self, path: &Path) -> Result<(), Self::Error> {
        let mut conn = self.pool.acquire().await?;
        backup::backup_to(path, &mut conn).await
    }

    async fn restore_from(&self, path: &Path) -> Result<u64, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        backup::restore_from(path, &mut conn).await
    }

    async fn optimize(&self) -> Result<MaintenanceReport, Self::Error> {
        let mut conn = self.pool.acquire().await?;
        maintenance::optimize(&mut conn).await
    }
}
