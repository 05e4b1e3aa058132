use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use strum_macros::{Display, EnumIter, EnumString};

use apex_auth::user::User;
use apex_utils::checks::{check_content_name, non_empty, require_field, ContentName};
use apex_utils::constants::{COMMENTS_ORDER_BY_CODE, DATE_ORDER_BY_CODE, VOTES_ORDER_BY_CODE};
use apex_utils::errors::AppError;

use crate::apex::check_apex_exists;
use crate::comment::COMMENT_NOT_FOUND_MESSAGE;
use crate::filter::{filter_blocked_posts, AuthoredContent, PostCollection};
use crate::post::{Post, POST_NOT_FOUND_MESSAGE};

#[derive(Clone, Copy, Debug, Default, Display, EnumIter, EnumString, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum SortingParam {
    #[default]
    Date,
    Votes,
    Comments,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize, sqlx::Type)]
#[serde(into = "i16", try_from = "i16")]
#[repr(i16)]
pub enum VoteDirection {
    Up = 1,
    None = 0,
    Down = -1,
}

/// Post annotated with the sum of its votes and its number of comments.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PostWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub post: Post,
    pub votes: i64,
    pub comments_num: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct SortForm {
    #[serde(rename = "apexComID", default)]
    pub apex_com_id: Option<String>,
    #[serde(rename = "sortingParam", default)]
    pub sorting_param: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SortResult {
    pub posts: Vec<PostWithCounts>,
    #[serde(rename = "sortingParam")]
    pub sorting_param: SortingParam,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct VoteForm {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub dir: Option<i16>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VoteScore {
    pub votes: i64,
}

impl SortingParam {
    /// Parses a sort key, falling back to `Date` when it is absent or unknown.
    pub fn from_input(input: Option<&str>) -> Self {
        input
            .and_then(|value| SortingParam::from_str(value.trim()).ok())
            .unwrap_or_default()
    }

    pub fn to_order_by_code(self) -> &'static str {
        match self {
            SortingParam::Date => DATE_ORDER_BY_CODE,
            SortingParam::Votes => VOTES_ORDER_BY_CODE,
            SortingParam::Comments => COMMENTS_ORDER_BY_CODE,
        }
    }
}

impl From<VoteDirection> for i16 {
    fn from(value: VoteDirection) -> i16 {
        value as i16
    }
}

impl TryFrom<i16> for VoteDirection {
    type Error = AppError;

    fn try_from(value: i16) -> Result<VoteDirection, AppError> {
        match value {
            1 => Ok(VoteDirection::Up),
            0 => Ok(VoteDirection::None),
            -1 => Ok(VoteDirection::Down),
            _ => Err(AppError::invalid_field("dir", "The dir must be -1, 0 or 1.")),
        }
    }
}

impl AuthoredContent for PostWithCounts {
    fn author_id(&self) -> &str {
        &self.post.posted_by
    }
}

impl PostCollection for SortResult {
    type Post = PostWithCounts;

    fn posts_mut(&mut self) -> &mut Vec<PostWithCounts> {
        &mut self.posts
    }
}

pub async fn get_sorted_post_vec(
    apex_id: Option<&str>,
    sorting_param: SortingParam,
    db_pool: &PgPool,
) -> Result<Vec<PostWithCounts>, AppError> {
    let query = format!(
        "SELECT p.*,
            COALESCE(v.votes, 0)::BIGINT AS votes,
            COALESCE(c.comments_num, 0)::BIGINT AS comments_num
        FROM posts p
        LEFT JOIN (
            SELECT post_id, SUM(dir)::BIGINT AS votes FROM votes GROUP BY post_id
        ) v ON v.post_id = p.id
        LEFT JOIN (
            SELECT root, COUNT(*) AS comments_num FROM comments GROUP BY root
        ) c ON c.root = p.id
        WHERE ($1::TEXT IS NULL OR p.apex_id = $1)
        ORDER BY {}",
        sorting_param.to_order_by_code(),
    );
    let post_vec = sqlx::query_as::<_, PostWithCounts>(&query)
        .bind(apex_id)
        .fetch_all(db_pool)
        .await?;

    Ok(post_vec)
}

/// Ranks the posts of an apex, or of every apex when none is given.
pub async fn sort_posts(form: SortForm, db_pool: &PgPool) -> Result<SortResult, AppError> {
    let sorting_param = SortingParam::from_input(form.sorting_param.as_deref());
    let apex_id = non_empty(form.apex_com_id);
    if let Some(apex_id) = &apex_id {
        check_apex_exists(apex_id, db_pool).await?;
    }

    let posts = get_sorted_post_vec(apex_id.as_deref(), sorting_param, db_pool).await?;
    Ok(SortResult { posts, sorting_param })
}

pub async fn user_sort_posts(form: SortForm, user: &User, db_pool: &PgPool) -> Result<SortResult, AppError> {
    let result = sort_posts(form, db_pool).await?;
    filter_blocked_posts(result, &user.id, db_pool).await
}

static POST_VOTE_QUERIES: VoteQueries = VoteQueries {
    lock_author: "SELECT posted_by FROM posts WHERE id = $1 FOR NO KEY UPDATE",
    previous_dir: "SELECT dir FROM votes WHERE post_id = $1 AND user_id = $2",
    upsert: "INSERT INTO votes (post_id, user_id, dir) VALUES ($1, $2, $3)
        ON CONFLICT (post_id, user_id) DO UPDATE SET dir = EXCLUDED.dir",
    vote_sum: "SELECT COALESCE(SUM(dir), 0)::BIGINT FROM votes WHERE post_id = $1",
    not_found_message: POST_NOT_FOUND_MESSAGE,
};

static COMMENT_VOTE_QUERIES: VoteQueries = VoteQueries {
    lock_author: "SELECT commented_by FROM comments WHERE id = $1 FOR NO KEY UPDATE",
    previous_dir: "SELECT dir FROM comment_votes WHERE comment_id = $1 AND user_id = $2",
    upsert: "INSERT INTO comment_votes (comment_id, user_id, dir) VALUES ($1, $2, $3)
        ON CONFLICT (comment_id, user_id) DO UPDATE SET dir = EXCLUDED.dir",
    vote_sum: "SELECT COALESCE(SUM(dir), 0)::BIGINT FROM comment_votes WHERE comment_id = $1",
    not_found_message: COMMENT_NOT_FOUND_MESSAGE,
};

/// Statements of a vote on one kind of content, all bound with the content id first.
struct VoteQueries {
    /// Locks the voted post or comment until the end of the transaction and returns its author.
    lock_author: &'static str,
    previous_dir: &'static str,
    upsert: &'static str,
    vote_sum: &'static str,
    not_found_message: &'static str,
}

impl VoteQueries {
    fn for_content(content: &ContentName) -> &'static VoteQueries {
        match content {
            ContentName::Post(_) => &POST_VOTE_QUERIES,
            ContentName::Comment(_) => &COMMENT_VOTE_QUERIES,
        }
    }
}

/// Sets the vote of `user` on a post or comment and moves the karma of its author by the change in direction.
pub async fn vote_on_content(form: VoteForm, user: &User, db_pool: &PgPool) -> Result<VoteScore, AppError> {
    user.role.check_authenticated()?;
    let name = require_field(form.name, "name")?;
    let content = check_content_name(&name, "name")?;
    let direction = match form.dir {
        Some(dir) => VoteDirection::try_from(dir)?,
        None => return Err(AppError::invalid_field("dir", "The dir field is required.")),
    };
    let queries = VoteQueries::for_content(&content);
    let content_id = content.id();

    let mut tx = db_pool.begin().await?;

    // concurrent votes on the same content wait here, the previous direction is read after the lock
    let author_id = sqlx::query_scalar::<_, String>(queries.lock_author)
        .bind(content_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::not_found(queries.not_found_message))?;

    let previous_direction = sqlx::query_scalar::<_, VoteDirection>(queries.previous_dir)
        .bind(content_id)
        .bind(&user.id)
        .fetch_optional(&mut *tx)
        .await?
        .unwrap_or(VoteDirection::None);

    log::debug!("User {} votes {direction:?} on {content_id}, previous vote {previous_direction:?}", user.id);
    sqlx::query(queries.upsert)
        .bind(content_id)
        .bind(&user.id)
        .bind(direction)
        .execute(&mut *tx)
        .await?;

    let karma_delta = get_karma_delta(direction, previous_direction);
    if karma_delta != 0 && author_id != user.id {
        sqlx::query("UPDATE users SET karma = karma + $1 WHERE id = $2")
            .bind(karma_delta)
            .bind(&author_id)
            .execute(&mut *tx)
            .await?;
    }

    let votes = sqlx::query_scalar::<_, i64>(queries.vote_sum)
        .bind(content_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(VoteScore { votes })
}

fn get_karma_delta(direction: VoteDirection, previous_direction: VoteDirection) -> i32 {
    (direction as i32) - (previous_direction as i32)
}
