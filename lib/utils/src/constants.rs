use const_format::formatcp;

pub const COMMENT_PREFIX: &str = "t1_";
pub const POST_PREFIX: &str = "t3_";

/// Newest first. Ids share a prefix, so posts created at the same time are ordered by the number after it.
pub const DATE_ORDER_BY_CODE: &str = "p.created_at DESC, split_part(p.id, '_', 2)::BIGINT DESC";
pub const VOTES_ORDER_BY_CODE: &str = formatcp!("votes DESC, {DATE_ORDER_BY_CODE}");
pub const COMMENTS_ORDER_BY_CODE: &str = formatcp!("comments_num DESC, {DATE_ORDER_BY_CODE}");


pub const MIN_SEARCH_QUERY_LENGTH: u64 = 3;
pub const MAX_APEX_NAME_LENGTH: u64 = 50;
pub const MAX_APEX_DESCRIPTION_LENGTH: u64 = 1000;
pub const MAX_TITLE_LENGTH: u64 = 300;
pub const MAX_CONTENT_LENGTH: u64 = 20000;
pub const MAX_REPORT_LENGTH: u64 = 2000;
pub const MAX_SUBJECT_LENGTH: u64 = 300;
pub const MAX_MESSAGE_LENGTH: u64 = 10000;
