use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use apex_utils::errors::AppError;

use crate::role::Role;

pub const USER_NOT_FOUND_MESSAGE: &str = "User is not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub fullname: Option<String>,
    pub email: String,
    pub avatar: String,
    pub karma: i32,
    pub role: Role,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Default for User {
    fn default() -> Self {
        Self {
            id: String::default(),
            username: String::default(),
            fullname: None,
            email: String::default(),
            avatar: String::default(),
            karma: 1,
            role: Role::Member,
            created_at: chrono::DateTime::default(),
            updated_at: chrono::DateTime::default(),
            deleted_at: None,
        }
    }
}

/// Loads a user that has not been soft deleted.
pub async fn get_user_by_id(user_id: &str, db_pool: &PgPool) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL"
    )
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?;

    user.ok_or_else(|| AppError::not_found(USER_NOT_FOUND_MESSAGE))
}

pub async fn get_user_by_username(username: &str, db_pool: &PgPool) -> Result<User, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE username = $1 AND deleted_at IS NULL"
    )
        .bind(username)
        .fetch_optional(db_pool)
        .await?;

    user.ok_or_else(|| AppError::not_found(USER_NOT_FOUND_MESSAGE))
}

pub async fn create_user(
    username: &str,
    fullname: Option<&str>,
    email: &str,
    db_pool: &PgPool,
) -> Result<User, AppError> {
    log::debug!("Create user {username}");
    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (username, fullname, email) VALUES ($1, $2, $3) RETURNING *"
    )
        .bind(username)
        .bind(fullname)
        .bind(email)
        .fetch_one(db_pool)
        .await?;

    Ok(user)
}

pub async fn set_user_role(user_id: &str, role: Role, db_pool: &PgPool) -> Result<User, AppError> {
    if role == Role::Guest {
        return Err(AppError::new("Guest role cannot be stored."));
    }
    log::info!("Set role of user {user_id} to {role}");
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 RETURNING *"
    )
        .bind(role)
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;

    Ok(user)
}

pub async fn soft_delete_user(user_id: &str, db_pool: &PgPool) -> Result<(), AppError> {
    sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL")
        .bind(user_id)
        .execute(db_pool)
        .await?;

    Ok(())
}
