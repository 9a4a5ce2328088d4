use crate::db_types::{
    AuditEntry,
    CategoryStats,
    SalesStatistics,
    SchemaObject,
    TableDocumentation,
    TopCustomer,
    User,
    UserId,
    UserOrderSummary,
};

/// Read-only aggregate queries over the store.
#[allow(async_fn_in_trait)]
pub trait Reporting {
    type Error: std::error::Error;

    async fn active_users(&self, limit: i64) -> Result<Vec<User>, Self::Error>;

    async fn category_stats(&self) -> Result<Vec<CategoryStats>, Self::Error>;

    async fn sales_statistics(&self) -> Result<SalesStatistics, Self::Error>;

    async fn user_order_summary(&self, user_id: UserId) -> Result<Option<UserOrderSummary>, Self::Error>;

    async fn top_customers(&self, limit: i64) -> Result<Vec<TopCustomer>, Self::Error>;

    async fn audit_log(&self, limit: i64) -> Result<Vec<AuditEntry>, Self::Error>;

    async fn schema_objects(&self) -> Result<Vec<SchemaObject>, Self::Error>;

    /// Columns and row counts for every table.
    async fn table_documentation(&self) -> Result<Vec<TableDocumentation>, Self::Error>;

    /// The query plan SQLite chooses for counting orders per user.
    async fn order_count_plan(&self) -> Result<Vec<String>, Self::Error>;
}
