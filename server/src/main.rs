use std::sync::Arc;

use anyhow::Context;
use backoff::ExponentialBackoff;
use sqlx::PgPool;

use apex_auth::session::{create_db_pool, SessionTokenResolver};
use server::build_router;
use server::config::{get_log_level, ServerConfig};
use server::state::AppState;

async fn create_db_pool_with_backoff(config: &ServerConfig) -> anyhow::Result<PgPool> {
    let backoff_params = ExponentialBackoff {
        max_elapsed_time: Some(config.db_connect_retry),
        ..Default::default()
    };
    backoff::future::retry(backoff_params, || async move {
        create_db_pool(&config.database_url, config.db_max_connections, config.db_acquire_timeout)
            .await
            .map_err(|e| {
                log::warn!("Could not connect to DB, retry: {e:#}");
                backoff::Error::transient(e)
            })
    }).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    simple_logger::init_with_level(get_log_level()).context("Should be able to initialize logging.")?;

    let config = ServerConfig::from_env()?;

    let subscriber = tracing_subscriber::fmt().with_max_level(config.tracing_level).finish();
    tracing::subscriber::set_global_default(subscriber).context("Setting tracing default failed")?;

    let db_pool = create_db_pool_with_backoff(&config).await?;

    sqlx::migrate!("../migrations/")
        .run(&db_pool)
        .await
        .context("Should be able to run SQLx migrations.")?;

    let app_state = AppState {
        db_pool: db_pool.clone(),
        identity_resolver: Arc::new(SessionTokenResolver::new(db_pool)),
    };
    let app = build_router(app_state);

    log::info!("listening on http://{}", &config.server_addr);
    let listener = tokio::net::TcpListener::bind(&config.server_addr)
        .await
        .with_context(|| format!("Could not bind {}", config.server_addr))?;
    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")
}
