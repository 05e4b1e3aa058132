use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use apex_auth::user::User;
use apex_utils::checks::{check_content_name, check_not_blank, require_field, ContentName};
use apex_utils::constants::MAX_CONTENT_LENGTH;
use apex_utils::errors::AppError;

use crate::apex::is_blocked_from_apex;
use crate::post::get_post_by_id;

pub const COMMENT_NOT_FOUND_MESSAGE: &str = "Comment is not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub commented_by: String,
    pub root: String,
    pub parent: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    pub parent: Option<String>,
    #[validate(
        required(message = "The content field is required."),
        custom(function = "check_not_blank"),
        length(max = MAX_CONTENT_LENGTH, message = "The content is too long."),
    )]
    pub content: Option<String>,
}

pub async fn get_comment_by_id(comment_id: &str, db_pool: &PgPool) -> Result<Comment, AppError> {
    let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = $1")
        .bind(comment_id)
        .fetch_optional(db_pool)
        .await?;

    comment.ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND_MESSAGE))
}

/// Adds a comment under a post or as a reply to another comment. Replies inherit the root post of their parent.
pub async fn add_comment(
    form: CommentForm,
    user: &User,
    db_pool: &PgPool,
) -> Result<Comment, AppError> {
    user.role.check_authenticated()?;
    form.validate()?;
    let parent = require_field(form.parent, "parent")?;
    let content = require_field(form.content, "content")?;

    let (root, parent_comment_id) = match check_content_name(&parent, "parent")? {
        ContentName::Post(post_id) => (post_id, None),
        ContentName::Comment(comment_id) => {
            let parent_comment = get_comment_by_id(&comment_id, db_pool).await?;
            (parent_comment.root, Some(comment_id))
        },
    };

    let post = get_post_by_id(&root, db_pool).await?;
    let is_blocked = is_blocked_from_apex(&post.apex_id, &user.id, db_pool).await?;
    user.role.check_can_publish_in_apex(is_blocked)?;

    let comment = sqlx::query_as::<_, Comment>(
        "INSERT INTO comments (content, commented_by, root, parent)
        VALUES ($1, $2, $3, $4)
        RETURNING *"
    )
        .bind(content)
        .bind(&user.id)
        .bind(&root)
        .bind(parent_comment_id)
        .fetch_one(db_pool)
        .await?;

    Ok(comment)
}
