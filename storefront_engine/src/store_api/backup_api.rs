use std::{fmt::Debug, path::Path};

use log::*;

use crate::{db::traits::BackupManagement, db_types::MaintenanceReport, store_api::errors::BackupApiError};

pub struct BackupApi<B> {
    db: B,
}

impl<B: Debug> Debug for BackupApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BackupApi ({:?})", self.db)
    }
}

impl<B> BackupApi<B>
where B: BackupManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Writes a consistent copy of the whole store to `path`. An existing file is never overwritten.
    pub async fn backup_to<P: AsRef<Path>>(&self, path: P) -> Result<(), BackupApiError> {
        let path = path.as_ref();
        if path.exists() {
            return Err(BackupApiError::BackupExists(path.to_path_buf()));
        }
        self.db.backup_to(path).await.map_err(|e| BackupApiError::DatabaseError(e.to_string()))?;
        info!("💾️ Backup written to {}", path.display());
        Ok(())
    }

    /// Replaces every table's contents with those in the backup at `path`. Returns the number of rows restored.
    pub async fn restore_from<P: AsRef<Path>>(&self, path: P) -> Result<u64, BackupApiError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(BackupApiError::BackupNotFound(path.to_path_buf()));
        }
        let rows = self.db.restore_from(path).await.map_err(|e| BackupApiError::DatabaseError(e.to_string()))?;
        info!("💾️ Restored {rows} rows from {}", path.display());
        Ok(rows)
    }

    /// Runs `ANALYZE` and `VACUUM`. Row contents are untouched.
    pub async fn optimize(&self) -> Result<MaintenanceReport, BackupApiError> {
        self.db.optimize().await.map_err(|e| BackupApiError::DatabaseError(e.to_string()))
    }
}
