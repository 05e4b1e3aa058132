use serde::Serialize;
use sqlx::PgPool;

use apex_auth::role::Requester;
use apex_auth::user::User;
use apex_utils::errors::AppError;

use crate::apex::{check_apex_exists, is_blocked_from_apex, ApexForm};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SubscriberList {
    pub subscribers: Vec<User>,
}

pub async fn get_subscriber_vec(apex_id: &str, db_pool: &PgPool) -> Result<Vec<User>, AppError> {
    let user_vec = sqlx::query_as::<_, User>(
        "SELECT u.* FROM subscribers s
        JOIN users u ON u.id = s.user_id
        WHERE s.apex_id = $1 AND u.deleted_at IS NULL
        ORDER BY u.username"
    )
        .bind(apex_id)
        .fetch_all(db_pool)
        .await?;

    Ok(user_vec)
}

/// Lists the subscribers of an apex. Authenticated requesters blocked from the apex are refused,
/// guests are not checked against apex blocks.
pub async fn get_subscribers(
    form: ApexForm,
    requester: &Requester,
    db_pool: &PgPool,
) -> Result<SubscriberList, AppError> {
    let apex_id = form.apex_comm_id.unwrap_or_default();
    check_apex_exists(&apex_id, db_pool).await?;

    let is_blocked = match requester.user() {
        Some(user) => is_blocked_from_apex(&apex_id, &user.id, db_pool).await?,
        None => false,
    };
    requester.role().check_can_view_subscribers(is_blocked)?;

    Ok(SubscriberList { subscribers: get_subscriber_vec(&apex_id, db_pool).await? })
}
