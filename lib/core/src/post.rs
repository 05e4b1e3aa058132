use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use apex_auth::user::User;
use apex_utils::checks::{check_not_blank, require_field};
use apex_utils::constants::{MAX_CONTENT_LENGTH, MAX_TITLE_LENGTH};
use apex_utils::errors::AppError;

use crate::apex::{check_apex_exists, is_blocked_from_apex};
use crate::filter::AuthoredContent;

pub const POST_NOT_FOUND_MESSAGE: &str = "Post is not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,
    pub posted_by: String,
    pub apex_id: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SubmitPostForm {
    #[serde(rename = "apexComID", default)]
    pub apex_com_id: Option<String>,
    #[validate(
        required(message = "The title field is required."),
        custom(function = "check_not_blank"),
        length(max = MAX_TITLE_LENGTH, message = "The title is too long."),
    )]
    pub title: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_CONTENT_LENGTH, message = "The content is too long."))]
    pub content: Option<String>,
}

impl AuthoredContent for Post {
    fn author_id(&self) -> &str {
        &self.posted_by
    }
}

pub async fn get_post_by_id(post_id: &str, db_pool: &PgPool) -> Result<Post, AppError> {
    let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
        .bind(post_id)
        .fetch_optional(db_pool)
        .await?;

    post.ok_or_else(|| AppError::not_found(POST_NOT_FOUND_MESSAGE))
}

pub async fn submit_post(
    form: SubmitPostForm,
    user: &User,
    db_pool: &PgPool,
) -> Result<Post, AppError> {
    user.role.check_authenticated()?;
    form.validate()?;
    let apex_id = require_field(form.apex_com_id, "apexComID")?;
    let title = require_field(form.title, "title")?;

    check_apex_exists(&apex_id, db_pool).await?;
    let is_blocked = is_blocked_from_apex(&apex_id, &user.id, db_pool).await?;
    user.role.check_can_publish_in_apex(is_blocked)?;

    log::debug!("User {} submits post in apex {apex_id}", user.id);
    let post = sqlx::query_as::<_, Post>(
        "INSERT INTO posts (title, content, posted_by, apex_id)
        VALUES ($1, $2, $3, $4)
        RETURNING *"
    )
        .bind(title)
        .bind(form.content.unwrap_or_default())
        .bind(&user.id)
        .bind(&apex_id)
        .fetch_one(db_pool)
        .await?;

    Ok(post)
}
