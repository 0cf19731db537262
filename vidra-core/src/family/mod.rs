//! Family-plan slot accounting and invite/member lifecycle.
//!
//! [`slots`] holds the pure capacity math; [`service::FamilyService`]
//! orchestrates invites, membership, and trial expiry over the repository
//! ports. Acceptance rules are a pure function here so the Postgres adapter
//! can apply them inside its transaction while tests exercise them
//! directly.

pub mod service;
pub mod slots;

use chrono::{DateTime, Utc};
use vidra_model::{Family, FamilyInvite, InviteStatus, User};

use crate::error::{CoreError, Result};

/// Whether `user` may redeem `invite` for `family` at `now`.
///
/// A targeted invite binds to the recipient's verified email,
/// case-insensitively; a leaked token alone is not enough. The owner can
/// never redeem their own invite.
pub fn validate_acceptance(
    family: &Family,
    invite: &FamilyInvite,
    user: &User,
    now: DateTime<Utc>,
) -> Result<()> {
    if invite.status != InviteStatus::Pending {
        return Err(CoreError::InviteNotPending);
    }
    if invite.expires_at <= now {
        return Err(CoreError::InviteExpired);
    }
    if family.owner_id == user.id {
        return Err(CoreError::SelfAccept);
    }
    if let Some(required) = &invite.email {
        if !user.email_verified {
            return Err(CoreError::EmailNotVerified);
        }
        match &user.email {
            Some(have) if have.eq_ignore_ascii_case(required) => {}
            _ => return Err(CoreError::InviteEmailMismatch),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn family(owner_id: Uuid) -> Family {
        Family {
            id: Uuid::new_v4(),
            owner_id,
            max_members: 4,
            created_at: Utc::now(),
        }
    }

    fn invite(family_id: Uuid, email: Option<&str>, expires_at: DateTime<Utc>) -> FamilyInvite {
        FamilyInvite {
            id: Uuid::new_v4(),
            family_id,
            token: "deadbeef".to_string(),
            email: email.map(str::to_string),
            status: InviteStatus::Pending,
            expires_at,
            used_by: None,
            used_at: None,
            created_at: Utc::now(),
        }
    }

    fn user(email: Option<&str>, verified: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
            email_verified: verified,
            display_name: "Test".to_string(),
            plan_id: None,
            max_screens: 1,
            trial_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_open_invite_accepted_by_anyone() {
        let fam = family(Uuid::new_v4());
        let inv = invite(fam.id, None, Utc::now() + Duration::days(1));
        let acceptor = user(None, false);

        assert!(validate_acceptance(&fam, &inv, &acceptor, Utc::now()).is_ok());
    }

    #[test]
    fn test_targeted_invite_matches_case_insensitively() {
        let fam = family(Uuid::new_v4());
        let inv = invite(fam.id, Some("Ada@Example.com"), Utc::now() + Duration::days(1));
        let acceptor = user(Some("ada@example.com"), true);

        assert!(validate_acceptance(&fam, &inv, &acceptor, Utc::now()).is_ok());
    }

    #[test]
    fn test_targeted_invite_rejects_other_email() {
        let fam = family(Uuid::new_v4());
        let inv = invite(fam.id, Some("ada@example.com"), Utc::now() + Duration::days(1));
        let acceptor = user(Some("eve@example.com"), true);

        assert!(matches!(
            validate_acceptance(&fam, &inv, &acceptor, Utc::now()),
            Err(CoreError::InviteEmailMismatch)
        ));
    }

    #[test]
    fn test_targeted_invite_requires_verified_email() {
        let fam = family(Uuid::new_v4());
        let inv = invite(fam.id, Some("ada@example.com"), Utc::now() + Duration::days(1));
        let acceptor = user(Some("ada@example.com"), false);

        assert!(matches!(
            validate_acceptance(&fam, &inv, &acceptor, Utc::now()),
            Err(CoreError::EmailNotVerified)
        ));
    }

    #[test]
    fn test_expired_invite_rejected() {
        let fam = family(Uuid::new_v4());
        let inv = invite(fam.id, None, Utc::now() - Duration::hours(1));
        let acceptor = user(None, false);

        assert!(matches!(
            validate_acceptance(&fam, &inv, &acceptor, Utc::now()),
            Err(CoreError::InviteExpired)
        ));
    }

    #[test]
    fn test_non_pending_invite_rejected() {
        let fam = family(Uuid::new_v4());
        let mut inv = invite(fam.id, None, Utc::now() + Duration::days(1));
        inv.status = InviteStatus::Revoked;
        let acceptor = user(None, false);

        assert!(matches!(
            validate_acceptance(&fam, &inv, &acceptor, Utc::now()),
            Err(CoreError::InviteNotPending)
        ));
    }

    #[test]
    fn test_owner_cannot_accept_own_invite() {
        let owner = user(Some("owner@example.com"), true);
        let fam = family(owner.id);
        let inv = invite(fam.id, None, Utc::now() + Duration::days(1));

        assert!(matches!(
            validate_acceptance(&fam, &inv, &owner, Utc::now()),
            Err(CoreError::SelfAccept)
        ));
    }
}
