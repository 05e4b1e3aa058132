use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod config;
pub mod routes;
pub mod state;

/// Builds the router serving every route under `/api`.
pub fn build_router(app_state: AppState) -> Router {
    let api_router = Router::new()
        .route("/search", get(routes::guest_search).post(routes::user_search))
        .route("/sort", get(routes::guest_sort_posts).post(routes::user_sort_posts))
        .route("/apex_names", get(routes::apex_names))
        .route("/get_subscribers", get(routes::get_subscribers))
        .route("/guest_get_subscribers", get(routes::guest_get_subscribers))
        .route("/create_apex", post(routes::create_apex))
        .route("/subscribe", post(routes::subscribe))
        .route("/unsubscribe", post(routes::unsubscribe))
        .route("/block_user", post(routes::block))
        .route("/unblock_user", post(routes::unblock))
        .route("/block_list", get(routes::block_list))
        .route("/apex_block", post(routes::apex_block))
        .route("/apex_unblock", post(routes::apex_unblock))
        .route("/submit_post", post(routes::submit_post))
        .route("/add_comment", post(routes::add_comment))
        .route("/vote", post(routes::vote))
        .route("/report", post(routes::report))
        .route("/reports", get(routes::apex_reports))
        .route("/compose", post(routes::compose))
        .route("/inbox", get(routes::inbox))
        .route("/sent", get(routes::sent))
        .route("/read_msg", post(routes::read_message))
        .route("/del_msg", post(routes::delete_message))
        .route("/hide", post(routes::hide))
        .route("/unhide", post(routes::unhide))
        .route("/hidden_posts", get(routes::hidden_posts));

    Router::new()
        .nest("/api", api_router)
        .fallback(routes::route_not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
