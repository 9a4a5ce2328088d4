use sqlx::migrate::MigrateError;
use thiserror::Error;

use crate::db_types::{InvalidOrderRequest, ProductId};

#[derive(Debug, Error)]
pub enum SqliteDatabaseError {
    #[error("Database connection error: {0}")]
    DriverError(#[from] sqlx::Error),
    #[error("Database migration error: {0}")]
    MigrationError(#[from] MigrateError),
    #[error(transparent)]
    InvalidRequest(#[from] InvalidOrderRequest),
    #[error("Product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, requested: i64, available: i64 },
    #[error("The order total cannot be represented")]
    TotalOverflow,
    #[error("Adding {quantity} units to product {product_id} would overflow its stock count")]
    StockOverflow { product_id: ProductId, quantity: i64 },
    #[error("Backup error: {0}")]
    BackupError(String),
}

// SQLite primary result codes. Extended codes carry the primary code in the low byte.
const SQLITE_BUSY: i32 = 5;
const SQLITE_LOCKED: i32 = 6;

impl SqliteDatabaseError {
    /// True when the failure came from lock contention, and the same request could succeed if tried again.
    pub fn is_lock_conflict(&self) -> bool {
        match self {
            Self::DriverError(sqlx::Error::PoolTimedOut) => true,
            Self::DriverError(sqlx::Error::Database(e)) => e
                .code()
                .and_then(|c| c.parse::<i32>().ok())
                .map(|c| matches!(c & 0xff, SQLITE_BUSY | SQLITE_LOCKED))
                .unwrap_or(false),
            _ => false,
        }
    }

    /// True when the buyer of an order does not exist.
    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(self, Self::DriverError(sqlx::Error::Database(e)) if e.is_foreign_key_violation())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pool_timeouts_are_lock_conflicts() {
        assert!(SqliteDatabaseError::DriverError(sqlx::Error::PoolTimedOut).is_lock_conflict());
        assert!(!SqliteDatabaseError::ProductNotFound(ProductId(1)).is_lock_conflict());
        assert!(!SqliteDatabaseError::DriverError(sqlx::Error::RowNotFound).is_foreign_key_violation());
    }
}
