use std::sync::Arc;

use sqlx::PgPool;

use apex_auth::session::IdentityResolver;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub identity_resolver: Arc<dyn IdentityResolver>,
}
