use log::debug;
use sha2::{Digest, Sha256};
use sqlx::SqliteConnection;

use crate::{
    db::sqlite::SqliteDatabaseError,
    db_types::{NewUser, Secret, User, UserId, UserRole, UserStatus},
};

/// Hex-encoded SHA-256 digest of the password.
pub fn hash_password(password: &Secret<String>) -> String {
    let digest = Sha256::digest(password.reveal().as_bytes());
    format!("{digest:x}")
}

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<UserId, SqliteDatabaseError> {
    let password_hash = hash_password(&user.password);
    let id = sqlx::query_scalar::<_, UserId>(
        "INSERT INTO users (username, email, password_hash, status) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.status)
    .fetch_one(conn)
    .await?;
    debug!("🧑️ User {id} ({}) created", user.username);
    Ok(id)
}

pub async fn fetch_user(id: UserId, conn: &mut SqliteConnection) -> Result<Option<User>, SqliteDatabaseError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, email, password_hash, created_at, status, last_login FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}

/// Changes the user's status. The `audit_user_status_changes` trigger records the transition in the audit log.
pub async fn update_user_status(
    id: UserId,
    status: UserStatus,
    conn: &mut SqliteConnection,
) -> Result<bool, SqliteDatabaseError> {
    let result = sqlx::query("UPDATE users SET status = $1 WHERE id = $2").bind(status).bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Stamps `last_login` with the current time. Returns false if the user does not exist.
pub async fn record_login(id: UserId, conn: &mut SqliteConnection) -> Result<bool, SqliteDatabaseError> {
    let result =
        sqlx::query("UPDATE users SET last_login = CURRENT_TIMESTAMP WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

/// Grants `role` to the user. Granting a role the user already holds is a no-op.
pub async fn assign_role(id: UserId, role: UserRole, conn: &mut SqliteConnection) -> Result<(), SqliteDatabaseError> {
    sqlx::query("INSERT INTO user_roles (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING")
        .bind(id)
        .bind(role)
        .execute(conn)
        .await?;
    debug!("🧑️ User {id} has role {role}");
    Ok(())
}

pub async fn fetch_roles(id: UserId, conn: &mut SqliteConnection) -> Result<Vec<UserRole>, SqliteDatabaseError> {
    let roles = sqlx::query_scalar::<_, UserRole>("SELECT role FROM user_roles WHERE user_id = $1 ORDER BY role")
        .bind(id)
        .fetch_all(conn)
        .await?;
    Ok(roles)
}

pub async fn fetch_active_users(limit: i64, conn: &mut SqliteConnection) -> Result<Vec<User>, SqliteDatabaseError> {
    let users = sqlx::query_as::<_, User>(
        r#"
        SELECT id, username, email, password_hash, created_at, status, last_login
        FROM users
        WHERE status = 'active'
        ORDER BY id ASC
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(conn)
    .await?;
    Ok(users)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn password_digest() {
        let hash = hash_password(&Secret::from("password"));
        assert_eq!(hash, "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8");
        assert_eq!(hash_password(&Secret::from("")).len(), 64);
    }
}
