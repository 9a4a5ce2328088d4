use std::path::Path;

use log::{debug, info};
use sqlx::{Connection, SqliteConnection};

use crate::db::sqlite::SqliteDatabaseError;

/// Tables copied by a restore, in foreign-key order. They are cleared in the reverse order.
const RESTORE_TABLES: [&str; 6] = ["users", "user_roles", "products", "orders", "order_items", "audit_log"];

fn path_str(path: &Path) -> Result<&str, SqliteDatabaseError> {
    path.to_str()
        .ok_or_else(|| SqliteDatabaseError::BackupError(format!("{} is not a valid UTF-8 path", path.display())))
}

/// Writes a consistent, compacted copy of the whole database to `path`. The file must not exist yet.
pub async fn backup_to(path: &Path, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    if path.exists() {
        return Err(SqliteDatabaseError::BackupError(format!("{} already exists", path.display())));
    }
    let target = path_str(path)?;
    sqlx::query("VACUUM INTO $1").bind(target).execute(conn).await?;
    info!("💾️ Database backup written to {target}");
    Ok(())
}

/// Replaces the contents of every storefront table with the contents of the backup at `path`.
///
/// The copy runs in a single transaction: either every table is restored or nothing changes. Returns the number of
/// rows copied.
pub async fn restore_from(path: &Path, conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    if !path.exists() {
        return Err(SqliteDatabaseError::BackupError(format!("{} does not exist", path.display())));
    }
    let source = path_str(path)?;
    sqlx::query("ATTACH DATABASE $1 AS backup").bind(source).execute(&mut *conn).await?;
    let copied = copy_from_backup(conn).await;
    // Detach on every path; ATTACH is per connection and this one goes back to the pool.
    let detached = sqlx::query("DETACH DATABASE backup").execute(&mut *conn).await;
    let rows = copied?;
    detached?;
    info!("💾️ Restored {rows} rows from {source}");
    Ok(rows)
}

async fn copy_from_backup(conn: &mut SqliteConnection) -> Result<u64, SqliteDatabaseError> {
    let mut tx = conn.begin().await?;
    for table in RESTORE_TABLES.iter().rev() {
        sqlx::query(&format!("DELETE FROM main.{table}")).execute(&mut *tx).await?;
    }
    let mut rows = 0;
    for table in RESTORE_TABLES {
        let result =
            sqlx::query(&format!("INSERT INTO main.{table} SELECT * FROM backup.{table}")).execute(&mut *tx).await?;
        debug!("💾️ Restored {} rows into {table}", result.rows_affected());
        rows += result.rows_affected();
    }
    tx.commit().await?;
    Ok(rows)
}
