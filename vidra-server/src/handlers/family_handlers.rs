use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use vidra_core::api::ApiResponse;
use vidra_model::{FamilyInvite, FamilyMember, FamilySummary, User};

use crate::infra::{app_state::AppState, errors::AppError};

#[derive(Debug, Deserialize)]
pub struct CreateInviteRequest {
    /// Omit for an open invite redeemable by anyone with the token
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AcceptInviteRequest {
    pub token: String,
}

/// Slot usage and membership for the settings plan panel
pub async fn get_family_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<ApiResponse<FamilySummary>>, AppError> {
    let summary = state.family.family_summary(&user).await?;

    Ok(Json(ApiResponse::success(summary)))
}

/// Issue an invite for one of the caller's family slots.
///
/// # Response
///
/// - `200 OK` with the created invite
/// - `403 Forbidden` without a multi-screen plan
/// - `409 Conflict` when every slot is taken or reserved
pub async fn create_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<Json<ApiResponse<FamilyInvite>>, AppError> {
    let invite = state
        .family
        .create_invite(&user, request.email.as_deref())
        .await?;

    Ok(Json(ApiResponse::success(invite)))
}

/// Redeem an invite token, occupying one family slot
pub async fn accept_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(request): Json<AcceptInviteRequest>,
) -> Result<Json<ApiResponse<FamilyMember>>, AppError> {
    let member = state.family.accept_invite(&user, &request.token).await?;

    Ok(Json(ApiResponse::success(member)))
}

/// Revoke one of the caller's pending invites
pub async fn revoke_invite_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(invite_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.family.revoke_invite(&user, invite_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Remove an active member from the caller's family
pub async fn remove_member_handler(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(member_user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.family.remove_member(&user, member_user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
