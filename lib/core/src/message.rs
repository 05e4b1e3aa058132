use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use apex_auth::block::is_blocked_either_way;
use apex_auth::user::{get_user_by_username, User};
use apex_utils::checks::{check_not_blank, non_empty, require_field};
use apex_utils::constants::{MAX_MESSAGE_LENGTH, MAX_SUBJECT_LENGTH};
use apex_utils::errors::AppError;

pub const MESSAGE_NOT_FOUND_MESSAGE: &str = "Message is not found.";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
    pub id: String,
    pub subject: String,
    pub content: String,
    pub parent: Option<String>,
    pub sender: String,
    pub receiver: String,
    pub received: bool,
    pub del_send: bool,
    pub del_receive: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct ComposeForm {
    #[validate(required(message = "The receiver field is required."))]
    pub receiver: Option<String>,
    #[validate(
        required(message = "The subject field is required."),
        custom(function = "check_not_blank"),
        length(max = MAX_SUBJECT_LENGTH, message = "The subject is too long."),
    )]
    pub subject: Option<String>,
    #[validate(
        required(message = "The content field is required."),
        custom(function = "check_not_blank"),
        length(max = MAX_MESSAGE_LENGTH, message = "The content is too long."),
    )]
    pub content: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub id: Option<String>,
}

impl Message {
    pub fn is_participant(&self, user_id: &str) -> bool {
        self.sender == user_id || self.receiver == user_id
    }

    /// Whether the message is still visible in the mailbox of `user_id`.
    pub fn is_visible_to(&self, user_id: &str) -> bool {
        (self.sender == user_id && !self.del_send) || (self.receiver == user_id && !self.del_receive)
    }
}

async fn get_message_by_id(message_id: &str, db_pool: &PgPool) -> Result<Message, AppError> {
    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
        .bind(message_id)
        .fetch_optional(db_pool)
        .await?;

    message.ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND_MESSAGE))
}

pub async fn compose_message(form: ComposeForm, sender: &User, db_pool: &PgPool) -> Result<Message, AppError> {
    sender.role.check_authenticated()?;
    form.validate()?;
    let receiver_name = require_field(form.receiver, "receiver")?;
    let subject = require_field(form.subject, "subject")?;
    let content = require_field(form.content, "content")?;

    let receiver = get_user_by_username(&receiver_name, db_pool).await?;
    if receiver.id == sender.id {
        return Err(AppError::invalid_field("receiver", "You cannot send a message to yourself."));
    }
    if is_blocked_either_way(&sender.id, &receiver.id, db_pool).await? {
        return Err(AppError::BlockedUser);
    }

    let parent = non_empty(form.parent);
    if let Some(parent_id) = &parent {
        let parent_message = get_message_by_id(parent_id, db_pool).await?;
        if !parent_message.is_participant(&sender.id) {
            return Err(AppError::not_found(MESSAGE_NOT_FOUND_MESSAGE));
        }
    }

    log::debug!("User {} sends a message to user {}", sender.id, receiver.id);
    let message = sqlx::query_as::<_, Message>(
        "INSERT INTO messages (subject, content, parent, sender, receiver)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *"
    )
        .bind(subject)
        .bind(content)
        .bind(parent)
        .bind(&sender.id)
        .bind(&receiver.id)
        .fetch_one(db_pool)
        .await?;

    Ok(message)
}

/// Received messages still in the inbox of `user`, except those sent by users in a block relation with them.
pub async fn get_inbox(user: &User, db_pool: &PgPool) -> Result<Vec<Message>, AppError> {
    let message_vec = sqlx::query_as::<_, Message>(
        "SELECT m.* FROM messages m
        WHERE
            m.receiver = $1 AND
            NOT m.del_receive AND
            NOT EXISTS (
                SELECT 1 FROM blocks b
                WHERE
                    (b.blocker_id = $1 AND b.blocked_id = m.sender) OR
                    (b.blocker_id = m.sender AND b.blocked_id = $1)
            )
        ORDER BY m.created_at DESC, split_part(m.id, '_', 2)::BIGINT DESC"
    )
        .bind(&user.id)
        .fetch_all(db_pool)
        .await?;

    Ok(message_vec)
}

pub async fn get_sent(user: &User, db_pool: &PgPool) -> Result<Vec<Message>, AppError> {
    let message_vec = sqlx::query_as::<_, Message>(
        "SELECT * FROM messages
        WHERE sender = $1 AND NOT del_send
        ORDER BY created_at DESC, split_part(id, '_', 2)::BIGINT DESC"
    )
        .bind(&user.id)
        .fetch_all(db_pool)
        .await?;

    Ok(message_vec)
}

/// Returns a message of the user's mailbox, marking it as read when the user received it.
pub async fn read_message(form: MessageForm, user: &User, db_pool: &PgPool) -> Result<Message, AppError> {
    let message_id = require_field(form.id, "id")?;
    let message = get_message_by_id(&message_id, db_pool).await?;
    if !message.is_visible_to(&user.id) {
        return Err(AppError::not_found(MESSAGE_NOT_FOUND_MESSAGE));
    }
    if message.receiver != user.id || message.received {
        return Ok(message);
    }

    let message = sqlx::query_as::<_, Message>(
        "UPDATE messages SET received = TRUE WHERE id = $1 RETURNING *"
    )
        .bind(&message_id)
        .fetch_one(db_pool)
        .await?;

    Ok(message)
}

/// Removes a message from the user's mailbox. The message is deleted once both participants removed it.
pub async fn delete_message(form: MessageForm, user: &User, db_pool: &PgPool) -> Result<(), AppError> {
    let message_id = require_field(form.id, "id")?;
    let mut tx = db_pool.begin().await?;

    let message = sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1 FOR UPDATE")
        .bind(&message_id)
        .fetch_optional(&mut *tx)
        .await?
        .filter(|message| message.is_visible_to(&user.id))
        .ok_or_else(|| AppError::not_found(MESSAGE_NOT_FOUND_MESSAGE))?;

    let del_send = message.del_send || message.sender == user.id;
    let del_receive = message.del_receive || message.receiver == user.id;

    if del_send && del_receive {
        log::debug!("Delete message {message_id}");
        sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(&message_id)
            .execute(&mut *tx)
            .await?;
    } else {
        sqlx::query("UPDATE messages SET del_send = $1, del_receive = $2 WHERE id = $3")
            .bind(del_send)
            .bind(del_receive)
            .bind(&message_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(())
}
