use std::path::PathBuf;

use thiserror::Error;

#[cfg(feature = "sqlite")]
use crate::db::sqlite::SqliteDatabaseError;
use crate::db_types::{Cents, InvalidOrderRequest, ProductId, UserId};

/// The ways an order can fail. In every case the store is left exactly as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderProcessorError {
    #[error("Invalid order request: {0}")]
    InvalidRequest(String),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    /// The transaction could not commit. `retryable` is set only when the cause was lock contention.
    #[error("The order transaction failed: {reason}")]
    TransactionFailure { reason: String, retryable: bool },
}

impl OrderProcessorError {
    /// A failed transaction caused by a busy or locked database, which could succeed if tried again. Every other
    /// failure will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransactionFailure { retryable: true, .. })
    }

    pub fn transaction_failure<S: Into<String>>(reason: S, retryable: bool) -> Self {
        Self::TransactionFailure { reason: reason.into(), retryable }
    }
}

impl From<InvalidOrderRequest> for OrderProcessorError {
    fn from(e: InvalidOrderRequest) -> Self {
        Self::InvalidRequest(e.0)
    }
}

#[cfg(feature = "sqlite")]
impl From<SqliteDatabaseError> for OrderProcessorError {
    fn from(e: SqliteDatabaseError) -> Self {
        match e {
            SqliteDatabaseError::InvalidRequest(e) => e.into(),
            SqliteDatabaseError::TotalOverflow => Self::InvalidRequest("the order total is too large".to_string()),
            SqliteDatabaseError::ProductNotFound(id) => Self::ProductNotFound(id),
            SqliteDatabaseError::InsufficientStock { product_id, requested, available } => {
                Self::InsufficientStock { product_id, requested, available }
            },
            e if e.is_foreign_key_violation() => Self::transaction_failure(format!("unknown buyer. {e}"), false),
            e => {
                let retryable = e.is_lock_conflict();
                Self::transaction_failure(e.to_string(), retryable)
            },
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Restock quantity must be positive, got {0}")]
    InvalidQuantity(i64),
    #[error("Price cannot be negative, got {0}")]
    InvalidPrice(Cents),
    #[error("Invalid product: {0}")]
    InvalidProduct(String),
    #[error("Adding {quantity} units to product {product_id} would overflow its stock count")]
    StockOverflow { product_id: ProductId, quantity: i64 },
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("User {0} does not exist")]
    UserNotFound(UserId),
}

#[derive(Debug, Clone, Error)]
pub enum ReportsApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

#[derive(Debug, Clone, Error)]
pub enum BackupApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Backup file {0:?} already exists")]
    BackupExists(PathBuf),
    #[error("Backup file {0:?} does not exist")]
    BackupNotFound(PathBuf),
}

#[cfg(all(test, feature = "sqlite"))]
mod test {
    use super::*;

    #[test]
    fn storage_errors_map_onto_the_order_taxonomy() {
        let e: OrderProcessorError = SqliteDatabaseError::ProductNotFound(ProductId(7)).into();
        assert_eq!(e, OrderProcessorError::ProductNotFound(ProductId(7)));
        assert!(!e.is_retryable());

        let e: OrderProcessorError =
            SqliteDatabaseError::InsufficientStock { product_id: ProductId(1), requested: 3, available: 2 }.into();
        assert_eq!(e, OrderProcessorError::InsufficientStock { product_id: ProductId(1), requested: 3, available: 2 });

        let e: OrderProcessorError = SqliteDatabaseError::TotalOverflow.into();
        assert!(matches!(e, OrderProcessorError::InvalidRequest(_)));

        let e: OrderProcessorError = SqliteDatabaseError::InvalidRequest(InvalidOrderRequest("empty".into())).into();
        assert_eq!(e, OrderProcessorError::InvalidRequest("empty".into()));

        let e: OrderProcessorError = SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut).into();
        assert!(e.is_retryable());

        let e: OrderProcessorError = SqliteDatabaseError::BackupError("disk full".into()).into();
        assert!(matches!(e, OrderProcessorError::TransactionFailure { retryable: false, .. }));
        assert!(!e.is_retryable());
    }
}
