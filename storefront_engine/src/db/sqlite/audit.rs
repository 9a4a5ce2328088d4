use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{AuditEntry, NewAuditEntry},
};

pub async fn insert_audit_entry(entry: NewAuditEntry, conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let details = entry.details.to_string();
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO audit_log (table_name, action, user_id, details) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(entry.table_name)
    .bind(entry.action)
    .bind(entry.user_id)
    .bind(details)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// The most recent audit entries, newest first.
pub async fn fetch_audit_log(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<AuditEntry>, SqliteDatabaseError> {
    let entries = sqlx::query_as::<_, AuditEntry>(
        "SELECT id, table_name, action, user_id, timestamp, details FROM audit_log ORDER BY id DESC LIMIT $1",
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(entries)
}
