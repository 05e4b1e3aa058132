use serde::Deserialize;
use sqlx::PgPool;

use apex_auth::user::User;
use apex_utils::checks::require_field;
use apex_utils::errors::AppError;

use crate::post::{get_post_by_id, Post};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HideForm {
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn hide_post(form: HideForm, user: &User, db_pool: &PgPool) -> Result<(), AppError> {
    let post_id = require_field(form.name, "name")?;
    get_post_by_id(&post_id, db_pool).await?;

    sqlx::query(
        "INSERT INTO hiddens (post_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    )
        .bind(&post_id)
        .bind(&user.id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn unhide_post(form: HideForm, user: &User, db_pool: &PgPool) -> Result<(), AppError> {
    let post_id = require_field(form.name, "name")?;

    sqlx::query("DELETE FROM hiddens WHERE post_id = $1 AND user_id = $2")
        .bind(&post_id)
        .bind(&user.id)
        .execute(db_pool)
        .await?;

    Ok(())
}

/// Posts hidden by `user`, most recently hidden first.
pub async fn get_hidden_posts(user: &User, db_pool: &PgPool) -> Result<Vec<Post>, AppError> {
    let post_vec = sqlx::query_as::<_, Post>(
        "SELECT p.* FROM hiddens h
        JOIN posts p ON p.id = h.post_id
        WHERE h.user_id = $1
        ORDER BY h.created_at DESC, split_part(p.id, '_', 2)::BIGINT DESC"
    )
        .bind(&user.id)
        .fetch_all(db_pool)
        .await?;

    Ok(post_vec)
}
