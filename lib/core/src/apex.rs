use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use validator::Validate;

use apex_auth::role::Role;
use apex_auth::user::User;
use apex_utils::checks::{check_apex_name, require_field};
use apex_utils::constants::MAX_APEX_DESCRIPTION_LENGTH;
use apex_utils::errors::AppError;

pub const APEX_NOT_FOUND_MESSAGE: &str = "ApexCom is not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApexCom {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApexName {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct CreateApexForm {
    #[validate(required(message = "The name field is required."), custom(function = "check_apex_name"))]
    pub name: Option<String>,
    #[serde(default)]
    #[validate(length(max = MAX_APEX_DESCRIPTION_LENGTH, message = "The description is too long."))]
    pub description: Option<String>,
}

/// Input naming an apex, shared by the subscription and subscriber routes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ApexForm {
    #[serde(rename = "ApexCommID", default)]
    pub apex_comm_id: Option<String>,
}

/// Fails with [`AppError::NotFound`] when no apex has the id `apex_id`.
pub async fn check_apex_exists(apex_id: &str, db_pool: &PgPool) -> Result<(), AppError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM apex_coms WHERE id = $1)"
    )
        .bind(apex_id)
        .fetch_one(db_pool)
        .await?;

    match exists {
        true => Ok(()),
        false => Err(AppError::not_found(APEX_NOT_FOUND_MESSAGE)),
    }
}

pub async fn get_apex_names(db_pool: &PgPool) -> Result<Vec<ApexName>, AppError> {
    let apex_name_vec = sqlx::query_as::<_, ApexName>(
        "SELECT id, name FROM apex_coms ORDER BY name"
    )
        .fetch_all(db_pool)
        .await?;

    Ok(apex_name_vec)
}

pub async fn is_apex_moderator(apex_id: &str, user_id: &str, db_pool: &PgPool) -> Result<bool, AppError> {
    let is_moderator = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM moderators WHERE apex_id = $1 AND user_id = $2)"
    )
        .bind(apex_id)
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;

    Ok(is_moderator)
}

pub async fn is_blocked_from_apex(apex_id: &str, user_id: &str, db_pool: &PgPool) -> Result<bool, AppError> {
    let is_blocked = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM apex_blocks WHERE apex_id = $1 AND blocked_id = $2)"
    )
        .bind(apex_id)
        .bind(user_id)
        .fetch_one(db_pool)
        .await?;

    Ok(is_blocked)
}

pub async fn create_apex(
    form: CreateApexForm,
    user: &User,
    db_pool: &PgPool,
) -> Result<ApexCom, AppError> {
    user.role.check_can_create_apex()?;
    form.validate()?;
    let name = require_field(form.name, "name")?;

    let mut tx = db_pool.begin().await?;

    let apex = sqlx::query_as::<_, ApexCom>(
        "INSERT INTO apex_coms (name, description) VALUES ($1, $2) RETURNING *"
    )
        .bind(&name)
        .bind(form.description.unwrap_or_default())
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::invalid_field("name", "The name has already been taken.")
            },
            error => AppError::from(error),
        })?;

    add_moderator(&apex.id, &user.id, &mut tx).await?;
    tx.commit().await?;

    log::info!("User {} created apex {} ({name})", user.id, apex.id);
    Ok(apex)
}

/// Adds `user_id` to the moderators of `apex_id`, raising members to the moderator role.
pub async fn add_moderator(apex_id: &str, user_id: &str, db_conn: &mut PgConnection) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO moderators (apex_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    )
        .bind(apex_id)
        .bind(user_id)
        .execute(&mut *db_conn)
        .await?;

    sqlx::query(
        "UPDATE users SET role = $1, updated_at = NOW() WHERE id = $2 AND role < $1"
    )
        .bind(Role::Moderator)
        .bind(user_id)
        .execute(&mut *db_conn)
        .await?;

    Ok(())
}

pub async fn subscribe(form: ApexForm, user: &User, db_pool: &PgPool) -> Result<(), AppError> {
    let apex_id = form.apex_comm_id.unwrap_or_default();
    check_apex_exists(&apex_id, db_pool).await?;
    let is_blocked = is_blocked_from_apex(&apex_id, &user.id, db_pool).await?;
    user.role.check_can_publish_in_apex(is_blocked)?;

    sqlx::query(
        "INSERT INTO subscribers (apex_id, user_id) VALUES ($1, $2) ON CONFLICT DO NOTHING"
    )
        .bind(&apex_id)
        .bind(&user.id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn unsubscribe(form: ApexForm, user: &User, db_pool: &PgPool) -> Result<(), AppError> {
    let apex_id = form.apex_comm_id.unwrap_or_default();
    check_apex_exists(&apex_id, db_pool).await?;

    sqlx::query("DELETE FROM subscribers WHERE apex_id = $1 AND user_id = $2")
        .bind(&apex_id)
        .bind(&user.id)
        .execute(db_pool)
        .await?;

    Ok(())
}
