pub mod apex;
pub mod comment;
pub mod filter;
pub mod hidden;
pub mod message;
pub mod moderation;
pub mod post;
pub mod ranking;
pub mod search;
pub mod subscriber;
