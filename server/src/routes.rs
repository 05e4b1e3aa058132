use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use apex_auth::block::{block_user, get_blocked_user_vec, unblock_user, BlockForm};
use apex_auth::role::Requester;
use apex_auth::session::check_user;
use apex_auth::user::User;
use apex_core::apex::{ApexCom, ApexForm, ApexName, CreateApexForm};
use apex_core::comment::{Comment, CommentForm};
use apex_core::hidden::HideForm;
use apex_core::message::{ComposeForm, Message, MessageForm};
use apex_core::moderation::{ApexBlockForm, Report, ReportForm};
use apex_core::post::{Post, SubmitPostForm};
use apex_core::ranking::{SortForm, SortResult, VoteForm, VoteScore};
use apex_core::search::{SearchForm, SearchResult};
use apex_core::subscriber::SubscriberList;
use apex_core::{apex, comment, hidden, message, moderation, post, ranking, search, subscriber};
use apex_utils::checks::require_field;
use apex_utils::errors::AppError;

use crate::state::AppState;

/// Body of an authenticated request: the session token next to the operation's input.
#[derive(Clone, Debug, Deserialize)]
pub struct Authenticated<T> {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(flatten)]
    pub form: T,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct TokenParam {
    #[serde(default)]
    pub token: Option<String>,
}

fn parse_input<T>(input: Result<T, impl std::fmt::Display>) -> Result<T, AppError> {
    input.map_err(|rejection| AppError::invalid_field("request", rejection.to_string()))
}

async fn authenticate(app_state: &AppState, token: Option<&str>) -> Result<User, AppError> {
    check_user(app_state.identity_resolver.as_ref(), token).await
}

async fn authenticated_body<T>(
    app_state: &AppState,
    body: Result<Json<Authenticated<T>>, JsonRejection>,
) -> Result<(User, T), AppError> {
    let Json(Authenticated { token, form }) = parse_input(body)?;
    let user = authenticate(app_state, token.as_deref()).await?;
    Ok((user, form))
}

fn empty_response() -> Json<Value> {
    Json(json!({}))
}

pub async fn guest_search(
    State(app_state): State<AppState>,
    query: Result<Query<SearchForm>, QueryRejection>,
) -> Result<Json<SearchResult>, AppError> {
    let Query(form) = parse_input(query)?;
    Ok(Json(search::guest_search(form, &app_state.db_pool).await?))
}

pub async fn user_search(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<SearchForm>>, JsonRejection>,
) -> Result<Json<SearchResult>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(search::user_search(form, &user, &app_state.db_pool).await?))
}

pub async fn guest_sort_posts(
    State(app_state): State<AppState>,
    query: Result<Query<SortForm>, QueryRejection>,
) -> Result<Json<SortResult>, AppError> {
    let Query(form) = parse_input(query)?;
    Ok(Json(ranking::sort_posts(form, &app_state.db_pool).await?))
}

pub async fn user_sort_posts(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<SortForm>>, JsonRejection>,
) -> Result<Json<SortResult>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(ranking::user_sort_posts(form, &user, &app_state.db_pool).await?))
}

pub async fn apex_names(State(app_state): State<AppState>) -> Result<Json<Vec<ApexName>>, AppError> {
    Ok(Json(apex::get_apex_names(&app_state.db_pool).await?))
}

pub async fn get_subscribers(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
    query: Result<Query<ApexForm>, QueryRejection>,
) -> Result<Json<SubscriberList>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    let Query(form) = parse_input(query)?;
    Ok(Json(subscriber::get_subscribers(form, &Requester::User(user), &app_state.db_pool).await?))
}

pub async fn guest_get_subscribers(
    State(app_state): State<AppState>,
    query: Result<Query<ApexForm>, QueryRejection>,
) -> Result<Json<SubscriberList>, AppError> {
    let Query(form) = parse_input(query)?;
    Ok(Json(subscriber::get_subscribers(form, &Requester::Guest, &app_state.db_pool).await?))
}

pub async fn create_apex(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<CreateApexForm>>, JsonRejection>,
) -> Result<Json<ApexCom>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(apex::create_apex(form, &user, &app_state.db_pool).await?))
}

pub async fn subscribe(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ApexForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    apex::subscribe(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn unsubscribe(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ApexForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    apex::unsubscribe(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn block(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<BlockForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    let blocked_id = require_field(form.blocked_id, "blockedID")?;
    block_user(&user, &blocked_id, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn unblock(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<BlockForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    let blocked_id = require_field(form.blocked_id, "blockedID")?;
    unblock_user(&user, &blocked_id, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn block_list(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
) -> Result<Json<Vec<User>>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    Ok(Json(get_blocked_user_vec(&user, &app_state.db_pool).await?))
}

pub async fn apex_block(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ApexBlockForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    moderation::block_from_apex(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn apex_unblock(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ApexBlockForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    moderation::unblock_from_apex(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn submit_post(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<SubmitPostForm>>, JsonRejection>,
) -> Result<Json<Post>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(post::submit_post(form, &user, &app_state.db_pool).await?))
}

pub async fn add_comment(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<CommentForm>>, JsonRejection>,
) -> Result<Json<Comment>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(comment::add_comment(form, &user, &app_state.db_pool).await?))
}

pub async fn vote(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<VoteForm>>, JsonRejection>,
) -> Result<Json<VoteScore>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(ranking::vote_on_content(form, &user, &app_state.db_pool).await?))
}

pub async fn report(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ReportForm>>, JsonRejection>,
) -> Result<Json<Report>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(moderation::report_content(form, &user, &app_state.db_pool).await?))
}

pub async fn apex_reports(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
    query: Result<Query<ApexForm>, QueryRejection>,
) -> Result<Json<Vec<Report>>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    let Query(form) = parse_input(query)?;
    Ok(Json(moderation::get_apex_reports(form, &user, &app_state.db_pool).await?))
}

pub async fn compose(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<ComposeForm>>, JsonRejection>,
) -> Result<Json<Message>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(message::compose_message(form, &user, &app_state.db_pool).await?))
}

pub async fn inbox(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
) -> Result<Json<Vec<Message>>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    Ok(Json(message::get_inbox(&user, &app_state.db_pool).await?))
}

pub async fn sent(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
) -> Result<Json<Vec<Message>>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    Ok(Json(message::get_sent(&user, &app_state.db_pool).await?))
}

pub async fn read_message(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<MessageForm>>, JsonRejection>,
) -> Result<Json<Message>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    Ok(Json(message::read_message(form, &user, &app_state.db_pool).await?))
}

pub async fn delete_message(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<MessageForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    message::delete_message(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn hide(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<HideForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    hidden::hide_post(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn unhide(
    State(app_state): State<AppState>,
    body: Result<Json<Authenticated<HideForm>>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let (user, form) = authenticated_body(&app_state, body).await?;
    hidden::unhide_post(form, &user, &app_state.db_pool).await?;
    Ok(empty_response())
}

pub async fn hidden_posts(
    State(app_state): State<AppState>,
    token: Result<Query<TokenParam>, QueryRejection>,
) -> Result<Json<Vec<Post>>, AppError> {
    let Query(TokenParam { token }) = parse_input(token)?;
    let user = authenticate(&app_state, token.as_deref()).await?;
    Ok(Json(hidden::get_hidden_posts(&user, &app_state.db_pool).await?))
}

pub async fn route_not_found() -> AppError {
    AppError::not_found("Route is not found.")
}
