//! Housekeeping that rewrites statistics or the database file. None of this changes a row.
use log::info;
use sqlx::{Row, SqliteConnection};

use crate::{db::sqlite::SqliteDatabaseError, db_types::MaintenanceReport};

const ORDER_COUNT_QUERY: &str = r#"
    SELECT u.username, COUNT(o.id) AS order_count
    FROM users u
    LEFT JOIN orders o ON u.id = o.user_id
    GROUP BY u.id
"#;

async fn page_count(conn: &mut SqliteConnection) -> Result<i64, SqliteDatabaseError> {
    let pages = sqlx::query_scalar::<_, i64>("PRAGMA page_count").fetch_one(conn).await?;
    Ok(pages)
}

/// The steps SQLite takes to run the per-user order count, one line per step.
pub async fn order_count_plan(conn: &mut SqliteConnection) -> Result<Vec<String>, SqliteDatabaseError> {
    let rows = sqlx::query(&format!("EXPLAIN QUERY PLAN {ORDER_COUNT_QUERY}")).fetch_all(conn).await?;
    let plan = rows.iter().map(|row| row.try_get::<String, _>("detail")).collect::<Result<Vec<_>, _>>()?;
    Ok(plan)
}

/// Refreshes planner statistics, captures the plan of the per-user order count and compacts the file.
///
/// `VACUUM` cannot run inside a transaction, so `conn` must be a plain pooled connection.
pub async fn optimize(conn: &mut SqliteConnection) -> Result<MaintenanceReport, SqliteDatabaseError> {
    let page_count_before = page_count(&mut *conn).await?;
    sqlx::query("ANALYZE").execute(&mut *conn).await?;
    let query_plan = order_count_plan(&mut *conn).await?;
    sqlx::query("VACUUM").execute(&mut *conn).await?;
    let page_count_after = page_count(conn).await?;
    info!("🧹️ Database optimised. Pages: {page_count_before} -> {page_count_after}");
    Ok(MaintenanceReport { query_plan, page_count_before, page_count_after })
}
