use apex_auth::block::block_user;
use apex_auth::user::{get_user_by_id, User};
use apex_core::ranking::{sort_posts, user_sort_posts, vote_on_content, SortForm, SortingParam, VoteForm, VoteScore};
use apex_utils::errors::AppError;
use sqlx::PgPool;

use crate::common::*;
use crate::data_factory::{create_apex_for_test, create_comment, create_post};

mod common;
mod data_factory;

fn sort_form(apex_id: Option<&str>, sorting_param: Option<&str>) -> SortForm {
    SortForm {
        apex_com_id: apex_id.map(String::from),
        sorting_param: sorting_param.map(String::from),
    }
}

async fn vote(content_id: &str, dir: i16, user: &User, db_pool: &PgPool) -> Result<VoteScore, AppError> {
    vote_on_content(VoteForm { name: Some(content_id.to_string()), dir: Some(dir) }, user, db_pool).await
}

async fn create_voters(num_voters: usize, db_pool: &PgPool) -> Vec<User> {
    let mut voter_vec = Vec::with_capacity(num_voters);
    for i in 0..num_voters {
        voter_vec.push(create_named_user(&format!("voter{i}"), db_pool).await);
    }
    voter_vec
}

#[tokio::test]
async fn test_sort_posts_by_votes() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;
    let voter_vec = create_voters(5, &db_pool).await;
    let apex = create_apex_for_test("ranked", &db_pool).await;

    let post_1 = create_post(&apex.id, "five", "body", &user, &db_pool).await;
    let post_2 = create_post(&apex.id, "minus two", "body", &user, &db_pool).await;
    let post_3 = create_post(&apex.id, "zero", "body", &user, &db_pool).await;

    for voter in &voter_vec {
        vote(&post_1.id, 1, voter, &db_pool).await?;
    }
    vote(&post_2.id, -1, &voter_vec[0], &db_pool).await?;
    vote(&post_2.id, -1, &voter_vec[1], &db_pool).await?;
    vote(&post_3.id, 1, &voter_vec[2], &db_pool).await?;
    vote(&post_3.id, -1, &voter_vec[3], &db_pool).await?;

    let result = sort_posts(sort_form(Some(&apex.id), Some("votes")), &db_pool).await?;
    assert_eq!(result.sorting_param, SortingParam::Votes);
    assert_eq!(
        result.posts.iter().map(|post| (post.post.id.clone(), post.votes)).collect::<Vec<(String, i64)>>(),
        vec![(post_1.id.clone(), 5), (post_3.id.clone(), 0), (post_2.id.clone(), -2)],
    );

    Ok(())
}

#[tokio::test]
async fn test_sort_posts_by_comments() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;
    let apex = create_apex_for_test("discussed", &db_pool).await;

    let quiet_post = create_post(&apex.id, "quiet", "body", &user, &db_pool).await;
    let busy_post = create_post(&apex.id, "busy", "body", &user, &db_pool).await;
    let medium_post = create_post(&apex.id, "medium", "body", &user, &db_pool).await;

    let comment = create_comment(&busy_post.id, "first", &user, &db_pool).await;
    // replies count for the root post
    let reply = create_comment(&comment.id, "reply", &user, &db_pool).await;
    assert_eq!(reply.root, busy_post.id);
    assert_eq!(reply.parent.as_deref(), Some(comment.id.as_str()));
    create_comment(&reply.id, "nested reply", &user, &db_pool).await;
    create_comment(&medium_post.id, "only one", &user, &db_pool).await;

    let result = sort_posts(sort_form(Some(&apex.id), Some("comments")), &db_pool).await?;
    assert_eq!(
        result.posts.iter().map(|post| (post.post.id.clone(), post.comments_num)).collect::<Vec<(String, i64)>>(),
        vec![(busy_post.id.clone(), 3), (medium_post.id.clone(), 1), (quiet_post.id.clone(), 0)],
    );

    Ok(())
}

#[tokio::test]
async fn test_sort_posts_by_date() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;
    let apex = create_apex_for_test("dated", &db_pool).await;
    let other_apex = create_apex_for_test("other", &db_pool).await;

    let old_post = create_post(&apex.id, "old", "body", &user, &db_pool).await;
    let new_post = create_post(&apex.id, "new", "body", &user, &db_pool).await;
    let other_post = create_post(&other_apex.id, "elsewhere", "body", &user, &db_pool).await;

    for sorting_param in [None, Some(""), Some("date"), Some("unknown")] {
        let result = sort_posts(sort_form(Some(&apex.id), sorting_param), &db_pool).await?;
        assert_eq!(result.sorting_param, SortingParam::Date);
        assert_eq!(
            result.posts.iter().map(|post| post.post.clone()).collect::<Vec<_>>(),
            vec![new_post.clone(), old_post.clone()],
        );
    }

    // without apex, every post is ranked
    let result = sort_posts(sort_form(None, None), &db_pool).await?;
    assert_eq!(
        result.posts.iter().map(|post| post.post.id.clone()).collect::<Vec<String>>(),
        vec![other_post.id.clone(), new_post.id.clone(), old_post.id.clone()],
    );
    let result = sort_posts(sort_form(Some(""), None), &db_pool).await?;
    assert_eq!(result.posts.len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_sort_posts_by_date_with_equal_timestamps() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;
    let apex = create_apex_for_test("same_time", &db_pool).await;

    let mut post_id_vec = Vec::new();
    for i in 0..12 {
        post_id_vec.push(create_post(&apex.id, &format!("post {i}"), "body", &user, &db_pool).await.id);
    }
    sqlx::query("UPDATE posts SET created_at = NOW()")
        .execute(&db_pool)
        .await?;

    // t3_10 and later rank above t3_9
    post_id_vec.reverse();
    for sorting_param in ["date", "votes", "comments"] {
        let result = sort_posts(sort_form(Some(&apex.id), Some(sorting_param)), &db_pool).await?;
        assert_eq!(result.posts.iter().map(|post| post.post.id.clone()).collect::<Vec<String>>(), post_id_vec);
    }

    Ok(())
}

#[tokio::test]
async fn test_sort_posts_missing_apex() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;

    assert_eq!(
        sort_posts(sort_form(Some("t5_999"), Some("votes")), &db_pool).await,
        Err(AppError::not_found("ApexCom is not found.")),
    );
    assert_eq!(
        user_sort_posts(sort_form(Some("t5_999"), None), &user, &db_pool).await,
        Err(AppError::not_found("ApexCom is not found.")),
    );

    Ok(())
}

#[tokio::test]
async fn test_user_sort_posts_filters_blocked_authors() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user_a = create_named_user("alice", &db_pool).await;
    let user_b = create_named_user("bob", &db_pool).await;
    let apex = create_apex_for_test("shared", &db_pool).await;
    let post_a = create_post(&apex.id, "from alice", "body", &user_a, &db_pool).await;
    let post_b = create_post(&apex.id, "from bob", "body", &user_b, &db_pool).await;

    block_user(&user_b, &user_a.id, &db_pool).await?;

    let guest_result = sort_posts(sort_form(Some(&apex.id), None), &db_pool).await?;
    assert_eq!(guest_result.posts.len(), 2);

    let result_a = user_sort_posts(sort_form(Some(&apex.id), None), &user_a, &db_pool).await?;
    assert_eq!(result_a.posts.iter().map(|post| post.post.id.clone()).collect::<Vec<String>>(), vec![post_a.id.clone()]);
    let result_b = user_sort_posts(sort_form(Some(&apex.id), None), &user_b, &db_pool).await?;
    assert_eq!(result_b.posts.iter().map(|post| post.post.id.clone()).collect::<Vec<String>>(), vec![post_b.id.clone()]);

    Ok(())
}

#[tokio::test]
async fn test_vote_on_post() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let author = create_named_user("author", &db_pool).await;
    let voter = create_named_user("voter", &db_pool).await;
    let apex = create_apex_for_test("votes", &db_pool).await;
    let post = create_post(&apex.id, "title", "body", &author, &db_pool).await;

    assert_eq!(vote(&post.id, 1, &voter, &db_pool).await?, VoteScore { votes: 1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma + 1);

    // repeating a vote changes nothing
    assert_eq!(vote(&post.id, 1, &voter, &db_pool).await?, VoteScore { votes: 1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma + 1);

    assert_eq!(vote(&post.id, -1, &voter, &db_pool).await?, VoteScore { votes: -1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma - 1);

    assert_eq!(vote(&post.id, 0, &voter, &db_pool).await?, VoteScore { votes: 0 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma);

    // votes on one's own post do not change karma
    assert_eq!(vote(&post.id, 1, &author, &db_pool).await?, VoteScore { votes: 1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma);

    Ok(())
}

#[tokio::test]
async fn test_vote_on_content_errors() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let user = create_test_user(&db_pool).await;
    let apex = create_apex_for_test("invalid_votes", &db_pool).await;
    let post = create_post(&apex.id, "title", "body", &user, &db_pool).await;

    assert!(matches!(vote(&post.id, 2, &user, &db_pool).await, Err(AppError::ValidationError(_))));
    assert!(matches!(
        vote_on_content(VoteForm { name: Some(post.id.clone()), dir: None }, &user, &db_pool).await,
        Err(AppError::ValidationError(_)),
    ));
    assert_eq!(vote("t3_999", 1, &user, &db_pool).await, Err(AppError::not_found("Post is not found.")));
    assert_eq!(vote("t1_999", 1, &user, &db_pool).await, Err(AppError::not_found("Comment is not found.")));
    assert!(matches!(vote("t5_1", 1, &user, &db_pool).await, Err(AppError::ValidationError(_))));

    Ok(())
}

#[tokio::test]
async fn test_vote_on_comment() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let author = create_named_user("author", &db_pool).await;
    let voter = create_named_user("voter", &db_pool).await;
    let apex = create_apex_for_test("comment_votes", &db_pool).await;
    let post = create_post(&apex.id, "title", "body", &voter, &db_pool).await;
    let comment = create_comment(&post.id, "comment", &author, &db_pool).await;

    assert_eq!(vote(&comment.id, 1, &voter, &db_pool).await?, VoteScore { votes: 1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma + 1);

    assert_eq!(vote(&comment.id, -1, &voter, &db_pool).await?, VoteScore { votes: -1 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma - 1);

    assert_eq!(vote(&comment.id, 1, &author, &db_pool).await?, VoteScore { votes: 0 });
    assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, author.karma - 1);

    // comment votes do not count for the post
    let result = sort_posts(sort_form(Some(&apex.id), Some("votes")), &db_pool).await?;
    assert_eq!(result.posts[0].votes, 0);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_move_karma_once() -> Result<(), AppError> {
    let Some(db_pool) = get_db_pool().await else { return Ok(()) };
    let author = create_named_user("author", &db_pool).await;
    let voter = create_named_user("voter", &db_pool).await;
    let apex = create_apex_for_test("concurrent", &db_pool).await;

    for i in 0..10 {
        let post = create_post(&apex.id, &format!("post {i}"), "body", &author, &db_pool).await;
        let comment = create_comment(&post.id, "comment", &author, &db_pool).await;
        let karma = get_user_by_id(&author.id, &db_pool).await?.karma;

        let (first_vote, second_vote) = tokio::join!(
            vote(&post.id, 1, &voter, &db_pool),
            vote(&post.id, 1, &voter, &db_pool),
        );
        assert_eq!(first_vote?, VoteScore { votes: 1 });
        assert_eq!(second_vote?, VoteScore { votes: 1 });
        assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, karma + 1);

        let (first_vote, second_vote) = tokio::join!(
            vote(&comment.id, -1, &voter, &db_pool),
            vote(&comment.id, -1, &voter, &db_pool),
        );
        assert_eq!(first_vote?, VoteScore { votes: -1 });
        assert_eq!(second_vote?, VoteScore { votes: -1 });
        assert_eq!(get_user_by_id(&author.id, &db_pool).await?.karma, karma);
    }

    Ok(())
}
