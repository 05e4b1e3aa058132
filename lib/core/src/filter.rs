use std::collections::HashSet;

use sqlx::PgPool;

use apex_auth::block::get_block_set;
use apex_utils::errors::AppError;

/// Content written by a single user.
pub trait AuthoredContent {
    fn author_id(&self) -> &str;
}

/// Result set carrying a collection of posts that can be filtered.
pub trait PostCollection {
    type Post: AuthoredContent;

    fn posts_mut(&mut self) -> &mut Vec<Self::Post>;
}

impl<T: AuthoredContent> PostCollection for Vec<T> {
    type Post = T;

    fn posts_mut(&mut self) -> &mut Vec<T> {
        self
    }
}

/// Removes every post whose author is in `block_set`, keeping the order of the remaining posts.
pub fn remove_blocked_posts<C: PostCollection>(result: &mut C, block_set: &HashSet<String>) {
    if block_set.is_empty() {
        return;
    }
    result.posts_mut().retain(|post| !block_set.contains(post.author_id()));
}

/// Drops the posts written by users that `user_id` blocked or that blocked `user_id`.
/// A failing block lookup fails the whole call, unfiltered content is never returned.
pub async fn filter_blocked_posts<C: PostCollection>(
    mut result: C,
    user_id: &str,
    db_pool: &PgPool,
) -> Result<C, AppError> {
    let block_set = get_block_set(user_id, db_pool).await.map_err(|error| {
        log::error!("Cannot load block set of user {user_id}: {error}");
        match error {
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => error,
            error => AppError::new(error.to_string()),
        }
    })?;
    remove_blocked_posts(&mut result, &block_set);
    Ok(result)
}
