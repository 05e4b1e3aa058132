#![allow(dead_code)]

use sqlx::PgPool;

use apex_auth::role::Role;
use apex_auth::user::{set_user_role, User};
use apex_core::apex::{create_apex, ApexCom, CreateApexForm};
use apex_core::comment::{add_comment, Comment, CommentForm};
use apex_core::post::{submit_post, Post, SubmitPostForm};

pub async fn create_apex_as_admin(apex_name: &str, admin: &User, db_pool: &PgPool) -> ApexCom {
    let form = CreateApexForm {
        name: Some(apex_name.to_string()),
        description: Some(format!("{apex_name} description")),
    };
    create_apex(form, admin, db_pool).await.expect("Should be able to create apex.")
}

/// Creates an apex owned by a dedicated admin.
pub async fn create_apex_for_test(apex_name: &str, db_pool: &PgPool) -> ApexCom {
    let admin = crate::common::create_user_with_role(&format!("{apex_name}_admin"), Role::Admin, db_pool).await;
    create_apex_as_admin(apex_name, &admin, db_pool).await
}

pub async fn create_post(apex_id: &str, title: &str, content: &str, user: &User, db_pool: &PgPool) -> Post {
    let form = SubmitPostForm {
        apex_com_id: Some(apex_id.to_string()),
        title: Some(title.to_string()),
        content: Some(content.to_string()),
    };
    submit_post(form, user, db_pool).await.expect("Should be able to create post.")
}

pub async fn create_comment(parent: &str, content: &str, user: &User, db_pool: &PgPool) -> Comment {
    let form = CommentForm {
        parent: Some(parent.to_string()),
        content: Some(content.to_string()),
    };
    add_comment(form, user, db_pool).await.expect("Should be able to create comment.")
}

pub async fn create_apex_with_post(apex_name: &str, user: &User, db_pool: &PgPool) -> (ApexCom, Post) {
    let apex = create_apex_for_test(apex_name, db_pool).await;
    let post = create_post(&apex.id, "post", "body", user, db_pool).await;
    (apex, post)
}

pub async fn set_role(user: &mut User, role: Role, db_pool: &PgPool) {
    *user = set_user_role(&user.id, role, db_pool).await.expect("Should set user role.");
}
