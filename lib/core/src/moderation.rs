use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use apex_auth::role::ContentRelation;
use apex_auth::user::{get_user_by_id, User};
use apex_utils::checks::{check_content_name, check_not_blank, require_field, ContentName};
use apex_utils::constants::MAX_REPORT_LENGTH;
use apex_utils::errors::AppError;

use crate::apex::{check_apex_exists, is_apex_moderator, ApexForm};
use crate::comment::COMMENT_NOT_FOUND_MESSAGE;
use crate::post::get_post_by_id;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Report {
    pub report_id: i64,
    pub reporter_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    pub apex_id: String,
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ReportForm {
    #[serde(default)]
    pub name: Option<String>,
    #[validate(
        required(message = "The content field is required."),
        custom(function = "check_not_blank"),
        length(max = MAX_REPORT_LENGTH, message = "The content is too long."),
    )]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApexBlockForm {
    #[serde(rename = "ApexCommID", default)]
    pub apex_comm_id: Option<String>,
    #[serde(rename = "blockedID", default)]
    pub blocked_id: Option<String>,
}

/// Post or comment targeted by a report, with the users and apex it is linked to.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
struct ReportTarget {
    author_id: String,
    post_author_id: String,
    apex_id: String,
}

async fn get_report_target(content_name: &ContentName, db_pool: &PgPool) -> Result<ReportTarget, AppError> {
    match content_name {
        ContentName::Post(post_id) => {
            let post = get_post_by_id(post_id, db_pool).await?;
            Ok(ReportTarget {
                author_id: post.posted_by.clone(),
                post_author_id: post.posted_by,
                apex_id: post.apex_id,
            })
        },
        ContentName::Comment(comment_id) => {
            let target = sqlx::query_as::<_, ReportTarget>(
                "SELECT c.commented_by AS author_id, p.posted_by AS post_author_id, p.apex_id
                FROM comments c
                JOIN posts p ON p.id = c.root
                WHERE c.id = $1"
            )
                .bind(comment_id)
                .fetch_optional(db_pool)
                .await?;
            target.ok_or_else(|| AppError::not_found(COMMENT_NOT_FOUND_MESSAGE))
        },
    }
}

/// Reports a post or a comment. Admins, moderators of the apex and authors involved with the content cannot report it.
pub async fn report_content(
    form: ReportForm,
    user: &User,
    db_pool: &PgPool,
) -> Result<Report, AppError> {
    user.role.check_authenticated()?;
    form.validate()?;
    let content_name = check_content_name(&require_field(form.name, "name")?, "name")?;
    let content = require_field(form.content, "content")?;

    let target = get_report_target(&content_name, db_pool).await?;
    let relation = ContentRelation {
        is_author: target.author_id == user.id,
        is_post_author: target.post_author_id == user.id,
        is_apex_moderator: is_apex_moderator(&target.apex_id, &user.id, db_pool).await?,
    };
    user.role.check_can_report(relation)?;

    let (post_id, comment_id) = match &content_name {
        ContentName::Post(post_id) => (Some(post_id.as_str()), None),
        ContentName::Comment(comment_id) => (None, Some(comment_id.as_str())),
    };

    log::info!("User {} reports {}", user.id, content_name.id());
    let report = sqlx::query_as::<_, Report>(
        "INSERT INTO reports (reporter_id, post_id, comment_id, apex_id, content)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"
    )
        .bind(&user.id)
        .bind(post_id)
        .bind(comment_id)
        .bind(&target.apex_id)
        .bind(content)
        .fetch_one(db_pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::invalid_field("name", "You have already reported this content.")
            },
            error => AppError::from(error),
        })?;

    Ok(report)
}

pub async fn get_apex_reports(form: ApexForm, user: &User, db_pool: &PgPool) -> Result<Vec<Report>, AppError> {
    let apex_id = form.apex_comm_id.unwrap_or_default();
    check_apex_exists(&apex_id, db_pool).await?;
    let is_moderator = is_apex_moderator(&apex_id, &user.id, db_pool).await?;
    user.role.check_can_moderate_apex(is_moderator)?;

    let report_vec = sqlx::query_as::<_, Report>(
        "SELECT * FROM reports WHERE apex_id = $1 ORDER BY created_at DESC, report_id DESC"
    )
        .bind(&apex_id)
        .fetch_all(db_pool)
        .await?;

    Ok(report_vec)
}

async fn check_apex_block_form(
    form: ApexBlockForm,
    moderator: &User,
    db_pool: &PgPool,
) -> Result<(String, String), AppError> {
    let apex_id = form.apex_comm_id.unwrap_or_default();
    let blocked_id = require_field(form.blocked_id, "blockedID")?;
    check_apex_exists(&apex_id, db_pool).await?;
    let is_moderator = is_apex_moderator(&apex_id, &moderator.id, db_pool).await?;
    moderator.role.check_can_moderate_apex(is_moderator)?;
    get_user_by_id(&blocked_id, db_pool).await?;
    Ok((apex_id, blocked_id))
}

pub async fn block_from_apex(
    form: ApexBlockForm,
    moderator: &User,
    db_pool: &PgPool,
) -> Result<(), AppError> {
    let (apex_id, blocked_id) = check_apex_block_form(form, moderator, db_pool).await?;
    if blocked_id == moderator.id {
        return Err(AppError::invalid_field("blockedID", "You cannot block yourself."));
    }

    log::info!("User {} blocks user {blocked_id} from apex {apex_id}", moderator.id);
    sqlx::query(
        "INSERT INTO apex_blocks (apex_id, blocked_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    )
        .bind(&apex_id)
        .bind(&blocked_id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn unblock_from_apex(
    form: ApexBlockForm,
    moderator: &User,
    db_pool: &PgPool,
) -> Result<(), AppError> {
    let (apex_id, blocked_id) = check_apex_block_form(form, moderator, db_pool).await?;

    log::info!("User {} unblocks user {blocked_id} from apex {apex_id}", moderator.id);
    sqlx::query("DELETE FROM apex_blocks WHERE apex_id = $1 AND blocked_id = $2")
        .bind(&apex_id)
        .bind(&blocked_id)
        .execute(db_pool)
        .await?;

    Ok(())
}
