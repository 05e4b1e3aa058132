#![allow(dead_code)]

use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use apex_auth::role::Role;
use apex_auth::user::{create_user, set_user_role, User};

/// Server address ending with '/', the name of each test database is appended to it.
pub const TEST_DB_URL_ENV: &str = "TEST_DATABASE_URL";
static DB_NUM: AtomicUsize = AtomicUsize::new(0);

async fn get_main_db_pool(test_db_url: &str) -> PgPool {
    PgPoolOptions::new()
        .max_connections(1)
        .connect(&format!("{test_db_url}postgres"))
        .await
        .expect("Failed to connect to test DB")
}

/// Creates a fresh database with the migrations applied, or returns `None` when no test DB is configured.
pub async fn get_db_pool() -> Option<PgPool> {
    let Ok(test_db_url) = env::var(TEST_DB_URL_ENV) else {
        println!("{TEST_DB_URL_ENV} is not set, skip test.");
        return None;
    };
    let db_num = DB_NUM.fetch_add(1, Ordering::SeqCst);
    let db_name = format!("apex_test_{}_{db_num}", std::process::id());
    let main_db_pool = get_main_db_pool(&test_db_url).await;
    println!("Setup database: {db_name}");

    sqlx::query(format!("DROP DATABASE IF EXISTS {db_name}").as_str())
        .execute(&main_db_pool)
        .await
        .unwrap_or_else(|_| panic!("Could not delete database: {db_name}"));

    sqlx::query(format!("CREATE DATABASE {db_name}").as_str())
        .execute(&main_db_pool)
        .await
        .expect("Could not create database");

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&format!("{test_db_url}{db_name}"))
        .await
        .expect("Failed to connect to test DB");

    sqlx::migrate!("../../migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations");

    Some(db_pool)
}

pub async fn create_test_user(db_pool: &PgPool) -> User {
    create_named_user("test", db_pool).await
}

pub async fn create_named_user(username: &str, db_pool: &PgPool) -> User {
    create_user(username, Some(&format!("{username} fullname")), &format!("{username}@test.com"), db_pool)
        .await
        .expect("Could not create test user.")
}

pub async fn create_user_with_role(username: &str, role: Role, db_pool: &PgPool) -> User {
    let user = create_named_user(username, db_pool).await;
    set_user_role(&user.id, role, db_pool).await.expect("Could not set user role.")
}
