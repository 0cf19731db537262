use thiserror::Error;

/// Errors produced by the core services.
///
/// Family-plan rejections are individually distinguished so the HTTP layer
/// can map each to its own status code and domain message.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No family slots available")]
    FamilyAtCapacity,

    #[error("A multi-screen plan is required")]
    FamilyPlanRequired,

    #[error("Invalid email address: {0}")]
    InvalidEmail(String),

    #[error("Invite is no longer pending")]
    InviteNotPending,

    #[error("Invite has expired")]
    InviteExpired,

    #[error("Invite is addressed to a different email")]
    InviteEmailMismatch,

    #[error("A verified email is required to accept this invite")]
    EmailNotVerified,

    #[error("The family owner cannot accept their own invite")]
    SelfAccept,

    #[error("User already occupies a slot in this family")]
    AlreadyMember,

    #[error("Only the family owner may do this")]
    NotFamilyOwner,

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
