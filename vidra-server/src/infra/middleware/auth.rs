//! Auth-context middleware.
//!
//! Session verification lives in the upstream auth gateway; by the time a
//! request reaches this service the gateway has stamped the authenticated
//! account id onto the `x-user-id` header. This middleware resolves that id
//! to a full account row and injects it as an [`Extension`] for handlers.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::infra::{app_state::AppState, errors::AppError};

pub const USER_ID_HEADER: &str = "x-user-id";

pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing authenticated user context"))?;

    let user_id = Uuid::parse_str(header)
        .map_err(|_| AppError::unauthorized("Malformed user id"))?;

    let user = state
        .unit_of_work
        .users
        .get_user_by_id(user_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::unauthorized("Unknown user"))?;

    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}
