use axum::{
    Router, middleware,
    routing::{delete, get, post, put},
};

use crate::{
    handlers::{family_handlers, watch_handlers},
    infra::{app_state::AppState, middleware::auth},
};

/// Create all v1 API routes.
///
/// Every route here acts on behalf of an authenticated user, so the whole
/// router sits behind the auth-context middleware.
pub fn create_v1_router(state: AppState) -> Router<AppState> {
    Router::new()
        // Watch progress and resume
        .route(
            "/watch/progress",
            put(watch_handlers::update_progress_handler),
        )
        .route(
            "/watch/continue",
            get(watch_handlers::continue_watching_handler),
        )
        .route(
            "/watch/series/{series_id}/resume",
            get(watch_handlers::resume_handler),
        )
        .route(
            "/watch/{kind}/{title_id}",
            delete(watch_handlers::clear_title_handler),
        )
        .route(
            "/watch/{kind}/{title_id}/{season}/{episode}",
            delete(watch_handlers::clear_episode_handler),
        )
        .route("/watch", delete(watch_handlers::clear_all_handler))
        // Family plan
        .route("/family", get(family_handlers::get_family_handler))
        .route(
            "/family/invites",
            post(family_handlers::create_invite_handler),
        )
        .route(
            "/family/invites/accept",
            post(family_handlers::accept_invite_handler),
        )
        .route(
            "/family/invites/{invite_id}",
            delete(family_handlers::revoke_invite_handler),
        )
        .route(
            "/family/members/{user_id}",
            delete(family_handlers::remove_member_handler),
        )
        .layer(middleware::from_fn_with_state(state, auth::require_user))
}
