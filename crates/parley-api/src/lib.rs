pub mod auth;
pub mod chat;
pub mod communities;
pub mod error;
pub mod extract;
pub mod messages;
pub mod middleware;
pub mod reactions;
pub mod threads;
pub mod users;

use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};

use auth::AppState;
use middleware::require_auth;

/// All REST routes. Everything except registration and login sits behind
/// the JWT middleware.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/users/search", get(users::search))
        .route("/dm/threads", get(threads::list_threads).post(threads::open_thread))
        .route(
            "/dm/threads/{thread_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/dm/messages/{message_id}", delete(messages::delete_message))
        .route(
            "/dm/messages/{message_id}/react",
            post(reactions::set_direct).delete(reactions::clear_direct),
        )
        .route("/chat", get(chat::get_global).post(chat::post_global))
        .route("/chat/{message_id}", delete(chat::delete_global))
        .route(
            "/chat/{message_id}/react",
            post(reactions::set_global).delete(reactions::clear_global),
        )
        .route(
            "/communities",
            get(communities::list_communities).post(communities::create_community),
        )
        .route(
            "/communities/{community_id}/members",
            get(communities::list_members).post(communities::add_member),
        )
        .route(
            "/communities/{community_id}/chat",
            get(chat::get_community).post(chat::post_community),
        )
        .route(
            "/communities/{community_id}/chat/{message_id}",
            delete(chat::delete_community),
        )
        .route(
            "/communities/{community_id}/chat/{message_id}/react",
            post(reactions::set_community).delete(reactions::clear_community),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
