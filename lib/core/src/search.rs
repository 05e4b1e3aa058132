use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use apex_auth::user::User;
use apex_utils::constants::MIN_SEARCH_QUERY_LENGTH;
use apex_utils::errors::AppError;

use crate::apex::ApexCom;
use crate::filter::{filter_blocked_posts, PostCollection};
use crate::post::Post;

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct SearchForm {
    #[validate(
        required(message = "The query field is required."),
        length(min = MIN_SEARCH_QUERY_LENGTH, message = "The query must be at least 3 characters."),
    )]
    pub query: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SearchResult {
    pub posts: Vec<Post>,
    #[serde(rename = "apexComs")]
    pub apex_coms: Vec<ApexCom>,
    pub users: Vec<User>,
}

impl SearchForm {
    /// Trims the query and checks it, returning the query to search for.
    pub fn validated_query(self) -> Result<String, AppError> {
        let form = SearchForm { query: self.query.map(|query| query.trim().to_string()) };
        form.validate()?;
        Ok(form.query.unwrap_or_default())
    }
}

impl PostCollection for SearchResult {
    type Post = Post;

    fn posts_mut(&mut self) -> &mut Vec<Post> {
        &mut self.posts
    }
}

/// # Builds a `LIKE` pattern matching `query` anywhere, with its wildcard characters escaped
///
/// ```
/// use apex_core::search::to_like_pattern;
///
/// assert_eq!(to_like_pattern("rust"), "%rust%");
/// assert_eq!(to_like_pattern("100%_\\"), "%100\\%\\_\\\\%");
/// ```
pub fn to_like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub async fn search_apex_coms(pattern: &str, db_pool: &PgPool) -> Result<Vec<ApexCom>, AppError> {
    let apex_vec = sqlx::query_as::<_, ApexCom>(
        "SELECT * FROM apex_coms
        WHERE name ILIKE $1 ESCAPE '\\' OR description ILIKE $1 ESCAPE '\\'
        ORDER BY name"
    )
        .bind(pattern)
        .fetch_all(db_pool)
        .await?;

    Ok(apex_vec)
}

pub async fn search_users(pattern: &str, db_pool: &PgPool) -> Result<Vec<User>, AppError> {
    let user_vec = sqlx::query_as::<_, User>(
        "SELECT * FROM users
        WHERE
            deleted_at IS NULL AND
            (fullname ILIKE $1 ESCAPE '\\' OR username ILIKE $1 ESCAPE '\\')
        ORDER BY username"
    )
        .bind(pattern)
        .fetch_all(db_pool)
        .await?;

    Ok(user_vec)
}

pub async fn search_posts(pattern: &str, db_pool: &PgPool) -> Result<Vec<Post>, AppError> {
    let post_vec = sqlx::query_as::<_, Post>(
        "SELECT * FROM posts
        WHERE title ILIKE $1 ESCAPE '\\' OR content ILIKE $1 ESCAPE '\\'
        ORDER BY created_at DESC, split_part(id, '_', 2)::BIGINT DESC"
    )
        .bind(pattern)
        .fetch_all(db_pool)
        .await?;

    Ok(post_vec)
}

pub async fn guest_search(form: SearchForm, db_pool: &PgPool) -> Result<SearchResult, AppError> {
    let query = form.validated_query()?;
    log::debug!("Search for '{query}'");
    let pattern = to_like_pattern(&query);

    Ok(SearchResult {
        apex_coms: search_apex_coms(&pattern, db_pool).await?,
        users: search_users(&pattern, db_pool).await?,
        posts: search_posts(&pattern, db_pool).await?,
    })
}

/// Same as [`guest_search`] without the posts written by users in a block relation with `user`.
pub async fn user_search(form: SearchForm, user: &User, db_pool: &PgPool) -> Result<SearchResult, AppError> {
    let result = guest_search(form, db_pool).await?;
    filter_blocked_posts(result, &user.id, db_pool).await
}
