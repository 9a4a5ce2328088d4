use std::fmt::Debug;

use crate::{
    db::traits::Reporting,
    db_types::{
        AuditEntry,
        CategoryStats,
        SalesStatistics,
        SchemaObject,
        TableDocumentation,
        TopCustomer,
        User,
        UserId,
        UserOrderSummary,
    },
    store_api::errors::ReportsApiError,
};

/// Read-only views over the store. Nothing here takes the write lock.
pub struct ReportsApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReportsApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportsApi ({:?})", self.db)
    }
}

fn db_error<E: std::error::Error>(e: E) -> ReportsApiError {
    ReportsApiError::DatabaseError(e.to_string())
}

impl<B> ReportsApi<B>
where B: Reporting
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Active users in the order they registered.
    pub async fn active_users(&self, limit: i64) -> Result<Vec<User>, ReportsApiError> {
        self.db.active_users(limit).await.map_err(db_error)
    }

    /// Product count, price spread and total stock per category. Largest categories first.
    pub async fn category_stats(&self) -> Result<Vec<CategoryStats>, ReportsApiError> {
        self.db.category_stats().await.map_err(db_error)
    }

    pub async fn sales_statistics(&self) -> Result<SalesStatistics, ReportsApiError> {
        self.db.sales_statistics().await.map_err(db_error)
    }

    pub async fn user_order_summary(&self, user_id: UserId) -> Result<Option<UserOrderSummary>, ReportsApiError> {
        self.db.user_order_summary(user_id).await.map_err(db_error)
    }

    /// Active users ranked by what they have spent on completed orders.
    pub async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomer>, ReportsApiError> {
        self.db.top_customers(limit).await.map_err(db_error)
    }

    pub async fn audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>, ReportsApiError> {
        self.db.audit_log(limit).await.map_err(db_error)
    }

    pub async fn schema_objects(&self) -> Result<Vec<SchemaObject>, ReportsApiError> {
        self.db.schema_objects().await.map_err(db_error)
    }

    /// Every table with its columns and current row count.
    pub async fn table_documentation(&self) -> Result<Vec<TableDocumentation>, ReportsApiError> {
        self.db.table_documentation().await.map_err(db_error)
    }

    pub async fn order_count_plan(&self) -> Result<Vec<String>, ReportsApiError> {
        self.db.order_count_plan().await.map_err(db_error)
    }
}
