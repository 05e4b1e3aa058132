use std::collections::HashSet;

use serde::Deserialize;
use sqlx::PgPool;

use apex_utils::errors::AppError;

use crate::user::{get_user_by_id, User};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BlockForm {
    #[serde(rename = "blockedID", default)]
    pub blocked_id: Option<String>,
}

/// Returns the ids of the users `user_id` blocked together with the ids of the users who blocked `user_id`.
pub async fn get_block_set(user_id: &str, db_pool: &PgPool) -> Result<HashSet<String>, AppError> {
    let user_id_vec = sqlx::query_scalar::<_, String>(
        "SELECT blocked_id FROM blocks WHERE blocker_id = $1
        UNION
        SELECT blocker_id FROM blocks WHERE blocked_id = $1"
    )
        .bind(user_id)
        .fetch_all(db_pool)
        .await?;

    Ok(user_id_vec.into_iter().collect())
}

pub async fn is_blocked_either_way(
    user_id: &str,
    other_user_id: &str,
    db_pool: &PgPool,
) -> Result<bool, AppError> {
    let is_blocked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM blocks
            WHERE
                (blocker_id = $1 AND blocked_id = $2) OR
                (blocker_id = $2 AND blocked_id = $1)
        )"
    )
        .bind(user_id)
        .bind(other_user_id)
        .fetch_one(db_pool)
        .await?;

    Ok(is_blocked)
}

/// Users `user` blocked, ordered by username.
pub async fn get_blocked_user_vec(user: &User, db_pool: &PgPool) -> Result<Vec<User>, AppError> {
    let user_vec = sqlx::query_as::<_, User>(
        "SELECT u.* FROM blocks b
        JOIN users u ON u.id = b.blocked_id
        WHERE b.blocker_id = $1 AND u.deleted_at IS NULL
        ORDER BY u.username"
    )
        .bind(&user.id)
        .fetch_all(db_pool)
        .await?;

    Ok(user_vec)
}

pub async fn block_user(blocker: &User, blocked_id: &str, db_pool: &PgPool) -> Result<(), AppError> {
    if blocker.id == blocked_id {
        return Err(AppError::invalid_field("blockedID", "You cannot block yourself."));
    }
    get_user_by_id(blocked_id, db_pool).await?;

    log::debug!("User {} blocks user {blocked_id}", blocker.id);
    sqlx::query(
        "INSERT INTO blocks (blocker_id, blocked_id) VALUES ($1, $2)
        ON CONFLICT DO NOTHING"
    )
        .bind(&blocker.id)
        .bind(blocked_id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn unblock_user(blocker: &User, blocked_id: &str, db_pool: &PgPool) -> Result<(), AppError> {
    log::debug!("User {} unblocks user {blocked_id}", blocker.id);
    sqlx::query("DELETE FROM blocks WHERE blocker_id = $1 AND blocked_id = $2")
        .bind(&blocker.id)
        .bind(blocked_id)
        .execute(db_pool)
        .await?;

    Ok(())
}
