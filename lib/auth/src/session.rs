use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};

use apex_utils::errors::AppError;

use crate::user::User;

pub const DB_URL_ENV: &str = "DATABASE_URL";

/// Resolves an opaque session token into the user it was issued to.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<User, AppError>;
}

/// Resolves tokens through the `user_sessions` table.
#[derive(Clone, Debug)]
pub struct SessionTokenResolver {
    db_pool: PgPool,
}

impl SessionTokenResolver {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl IdentityResolver for SessionTokenResolver {
    async fn resolve(&self, token: &str) -> Result<User, AppError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::NotAuthenticated);
        }
        let user = sqlx::query_as::<_, User>(
            "SELECT u.* FROM user_sessions s
            JOIN users u ON u.id = s.user_id
            WHERE
                s.token = $1 AND
                s.expires_at > NOW() AND
                u.deleted_at IS NULL"
        )
            .bind(token)
            .fetch_optional(&self.db_pool)
            .await?;

        user.ok_or_else(|| AppError::AuthenticationError(String::from("Unknown or expired session token.")))
    }
}

/// Resolves the user of a request, failing when no token was provided.
pub async fn check_user(
    identity_resolver: &dyn IdentityResolver,
    token: Option<&str>,
) -> Result<User, AppError> {
    match token {
        Some(token) if !token.trim().is_empty() => identity_resolver.resolve(token).await,
        _ => Err(AppError::NotAuthenticated),
    }
}

pub async fn create_db_pool(
    database_url: &str,
    max_connections: u32,
    acquire_timeout: Duration,
) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .connect(database_url)
        .await
        .with_context(|| "Failed to connect to DB")
}
