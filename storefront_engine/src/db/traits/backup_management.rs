use std::path::Path;

use crate::db_types::MaintenanceReport;

/// Whole-database operations: copies of the store and housekeeping.
#[allow(async_fn_in_trait)]
pub trait BackupManagement {
    type Error: std::error::Error;

    /// Writes a full copy of the store to `path`, which must not exist yet.
    async fn backup_to(&self, path: &Path) -> Result<(), Self::Error>;

    /// Replaces the store's contents with the backup at `path` in one transaction. Returns the number of rows copied.
    async fn restore_from(&self, path: &Path) -> Result<u64, Self::Error>;

    /// Refreshes planner statistics and compacts the database file.
    async fn optimize(&self) -> Result<MaintenanceReport, Self::Error>;
}
