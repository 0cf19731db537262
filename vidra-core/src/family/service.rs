//! Family lifecycle orchestration: invites, membership, trial expiry.

use std::fmt;
use std::sync::Arc;

use chrono::{Duration, Utc};
use once_cell::sync::Lazy;
use rand::RngCore;
use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    database::ports::{
        families::{FamiliesRepository, NewInvite},
        users::UsersRepository,
    },
    error::{CoreError, Result},
    family::slots,
};
use vidra_model::{
    FamilyInvite, FamilyMember, FamilyRole, FamilySummary, User, user::BASE_SCREENS,
};

/// Syntactic email check; deliverability is the mail provider's problem
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

fn generate_invite_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct FamilyService {
    users: Arc<dyn UsersRepository>,
    families: Arc<dyn FamiliesRepository>,
    invite_ttl: Duration,
}

impl fmt::Debug for FamilyService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FamilyService").finish_non_exhaustive()
    }
}

impl FamilyService {
    pub fn new(
        users: Arc<dyn UsersRepository>,
        families: Arc<dyn FamiliesRepository>,
        invite_ttl: Duration,
    ) -> Self {
        Self {
            users,
            families,
            invite_ttl,
        }
    }

    /// Issue an invite for one of the owner's family slots.
    ///
    /// The family row is created on demand: plan owners have no row until
    /// their first invite. The capacity check itself runs inside the store
    /// transaction, not here.
    pub async fn create_invite(
        &self,
        owner: &User,
        email: Option<&str>,
    ) -> Result<FamilyInvite> {
        if !owner.has_family_capability() {
            return Err(CoreError::FamilyPlanRequired);
        }

        let email = match email.map(str::trim) {
            Some(addr) if !addr.is_empty() => {
                if !EMAIL_RE.is_match(addr) {
                    return Err(CoreError::InvalidEmail(addr.to_string()));
                }
                Some(addr.to_string())
            }
            _ => None,
        };

        let family = self
            .families
            .get_or_create_for_owner(owner.id, owner.max_screens)
            .await?;

        let now = Utc::now();
        let invite = NewInvite {
            token: generate_invite_token(),
            email,
            expires_at: now + self.invite_ttl,
        };

        let created = self.families.create_invite(family.id, &invite, now).await?;

        info!(
            family_id = %family.id,
            invite_id = %created.id,
            targeted = created.email.is_some(),
            "family invite created"
        );

        Ok(created)
    }

    /// Redeem an invite token for the accepting user
    pub async fn accept_invite(&self, user: &User, token: &str) -> Result<FamilyMember> {
        let member = self.families.accept_invite(token, user, Utc::now()).await?;

        info!(
            family_id = %member.family_id,
            user_id = %user.id,
            "family invite accepted"
        );

        Ok(member)
    }

    /// Owner revokes one of their pending invites
    pub async fn revoke_invite(&self, owner: &User, invite_id: Uuid) -> Result<()> {
        let family = self
            .families
            .find_by_owner(owner.id)
            .await?
            .ok_or(CoreError::NotFamilyOwner)?;

        self.families.revoke_invite(family.id, invite_id).await
    }

    /// Owner removes an active member from their family
    pub async fn remove_member(&self, owner: &User, member_user_id: Uuid) -> Result<()> {
        if member_user_id == owner.id {
            return Err(CoreError::NotFamilyOwner);
        }

        let family = self
            .families
            .find_by_owner(owner.id)
            .await?
            .ok_or(CoreError::NotFamilyOwner)?;

        self.families.remove_member(family.id, member_user_id).await
    }

    /// Slot usage for the settings plan panel.
    ///
    /// A plan owner with no persisted family still shows one used slot
    /// (their own); a member of someone else's family has no slot math of
    /// their own.
    pub async fn family_summary(&self, user: &User) -> Result<FamilySummary> {
        let now = Utc::now();

        if user.has_family_capability() {
            let Some(family) = self.families.find_by_owner(user.id).await? else {
                return Ok(FamilySummary {
                    role: FamilyRole::Owner,
                    max_members: user.max_screens,
                    used_slots: 1,
                    pending_invites: 0,
                    available_slots: (i64::from(user.max_screens) - 1).max(0) as i16,
                    members: Vec::new(),
                    invites: Vec::new(),
                });
            };

            let members = self.families.list_members(family.id).await?;
            let invites = self.families.list_pending_invites(family.id, now).await?;

            let active = members.len() as i64;
            let pending = invites.len() as i64;
            let used = slots::total_members(active);
            let available =
                (slots::available_slots(i64::from(family.max_members), active) - pending).max(0);

            return Ok(FamilySummary {
                role: FamilyRole::Owner,
                max_members: family.max_members,
                used_slots: used as i16,
                pending_invites: pending as i16,
                available_slots: available as i16,
                members,
                invites,
            });
        }

        if self.families.find_membership(user.id).await?.is_some() {
            return Ok(FamilySummary {
                role: FamilyRole::Member,
                ..FamilySummary::none()
            });
        }

        Ok(FamilySummary::none())
    }

    /// Batch job: process every user whose trial has lapsed.
    ///
    /// Each user's plan clear and family cascade is one all-or-nothing
    /// transaction in the store; a failure there skips that user and the
    /// run continues. Returns the number of users processed.
    pub async fn expire_trials(&self, now: chrono::DateTime<Utc>) -> Result<usize> {
        let expired = self.users.list_trial_expired(now).await?;
        let mut processed = 0usize;

        for user in expired {
            match self.users.expire_trial(user.id, BASE_SCREENS).await {
                Ok(()) => processed += 1,
                Err(err) => {
                    warn!(
                        user_id = %user.id,
                        error = %err,
                        "trial expiry cascade failed; continuing with remaining users"
                    );
                }
            }
        }

        if processed > 0 {
            info!(processed, "cleared lapsed trials");
        }

        Ok(processed)
    }

    /// Batch job: transition pending invites past their expiry
    pub async fn expire_invites(&self, now: chrono::DateTime<Utc>) -> Result<u64> {
        let expired = self.families.expire_invites(now).await?;
        if expired > 0 {
            info!(expired, "expired stale family invites");
        }
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ports::families::MockFamiliesRepository;
    use crate::database::ports::users::MockUsersRepository;
    use chrono::DateTime;
    use vidra_model::{Family, InviteStatus};

    fn plan_owner(max_screens: i16) -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: Some("owner@example.com".to_string()),
            email_verified: true,
            display_name: "Owner".to_string(),
            plan_id: Some("plan_family".to_string()),
            max_screens,
            trial_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn free_user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: None,
            email_verified: false,
            display_name: "Free".to_string(),
            plan_id: None,
            max_screens: 1,
            trial_ends_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn family_for(owner_id: Uuid, max_members: i16) -> Family {
        Family {
            id: Uuid::new_v4(),
            owner_id,
            max_members,
            created_at: Utc::now(),
        }
    }

    fn trial_user(trial_ends_at: DateTime<Utc>) -> User {
        let mut user = plan_owner(4);
        user.trial_ends_at = Some(trial_ends_at);
        user
    }

    fn service(
        users: MockUsersRepository,
        families: MockFamiliesRepository,
    ) -> FamilyService {
        FamilyService::new(Arc::new(users), Arc::new(families), Duration::days(7))
    }

    #[tokio::test]
    async fn test_create_invite_rejects_invalid_email_before_store() {
        let svc = service(MockUsersRepository::new(), MockFamiliesRepository::new());
        let owner = plan_owner(4);

        let result = svc.create_invite(&owner, Some("not-an-address")).await;

        assert!(matches!(result, Err(CoreError::InvalidEmail(_))));
    }

    #[tokio::test]
    async fn test_create_invite_requires_family_plan() {
        let svc = service(MockUsersRepository::new(), MockFamiliesRepository::new());
        let user = free_user();

        let result = svc.create_invite(&user, None).await;

        assert!(matches!(result, Err(CoreError::FamilyPlanRequired)));
    }

    #[tokio::test]
    async fn test_create_invite_lazily_creates_family() {
        let owner = plan_owner(4);
        let owner_id = owner.id;
        let fam = family_for(owner_id, 4);
        let fam_id = fam.id;

        let mut families = MockFamiliesRepository::new();
        families
            .expect_get_or_create_for_owner()
            .withf(move |id, max| *id == owner_id && *max == 4)
            .times(1)
            .returning(move |_, _| {
                Ok(Family {
                    id: fam_id,
                    owner_id,
                    max_members: 4,
                    created_at: Utc::now(),
                })
            });
        families
            .expect_create_invite()
            .withf(move |id, _, _| *id == fam_id)
            .times(1)
            .returning(|family_id, invite, now| {
                Ok(FamilyInvite {
                    id: Uuid::new_v4(),
                    family_id,
                    token: invite.token.clone(),
                    email: invite.email.clone(),
                    status: InviteStatus::Pending,
                    expires_at: invite.expires_at,
                    used_by: None,
                    used_at: None,
                    created_at: now,
                })
            });

        let svc = service(MockUsersRepository::new(), families);
        let invite = svc
            .create_invite(&owner, Some("  friend@example.com "))
            .await
            .unwrap();

        // 32 random bytes, hex-encoded
        assert_eq!(invite.token.len(), 64);
        assert_eq!(invite.email.as_deref(), Some("friend@example.com"));
        assert!(invite.expires_at > Utc::now() + Duration::days(6));
    }

    #[tokio::test]
    async fn test_expire_trials_continues_past_failures() {
        let past = Utc::now() - Duration::days(1);
        let lapsed: Vec<User> = (0..3).map(|_| trial_user(past)).collect();
        let failing_id = lapsed[1].id;

        let mut users = MockUsersRepository::new();
        let listed = lapsed.clone();
        users
            .expect_list_trial_expired()
            .times(1)
            .returning(move |_| Ok(listed.clone()));
        users
            .expect_expire_trial()
            .times(3)
            .returning(move |user_id, base| {
                assert_eq!(base, BASE_SCREENS);
                if user_id == failing_id {
                    Err(CoreError::Internal("connection reset".to_string()))
                } else {
                    Ok(())
                }
            });

        let svc = service(users, MockFamiliesRepository::new());
        let processed = svc.expire_trials(Utc::now()).await.unwrap();

        assert_eq!(processed, 2);
    }

    #[tokio::test]
    async fn test_expire_trials_with_no_lapsed_users_is_a_noop() {
        let mut users = MockUsersRepository::new();
        users
            .expect_list_trial_expired()
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let svc = service(users, MockFamiliesRepository::new());

        assert_eq!(svc.expire_trials(Utc::now()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_summary_counts_owner_before_family_exists() {
        let owner = plan_owner(4);
        let mut families = MockFamiliesRepository::new();
        families
            .expect_find_by_owner()
            .times(1)
            .returning(|_| Ok(None));

        let svc = service(MockUsersRepository::new(), families);
        let summary = svc.family_summary(&owner).await.unwrap();

        assert_eq!(summary.role, FamilyRole::Owner);
        assert_eq!(summary.used_slots, 1);
        assert_eq!(summary.available_slots, 3);
        assert_eq!(summary.pending_invites, 0);
    }

    #[tokio::test]
    async fn test_summary_counts_members_and_pending_invites() {
        let owner = plan_owner(4);
        let owner_id = owner.id;
        let fam = family_for(owner_id, 4);
        let fam_id = fam.id;

        let mut families = MockFamiliesRepository::new();
        families.expect_find_by_owner().returning(move |_| {
            Ok(Some(Family {
                id: fam_id,
                owner_id,
                max_members: 4,
                created_at: Utc::now(),
            }))
        });
        families.expect_list_members().returning(move |_| {
            Ok(vec![FamilyMember {
                id: Uuid::new_v4(),
                family_id: fam_id,
                user_id: Uuid::new_v4(),
                joined_at: Utc::now(),
            }])
        });
        families.expect_list_pending_invites().returning(move |_, _| {
            Ok(vec![FamilyInvite {
                id: Uuid::new_v4(),
                family_id: fam_id,
                token: "cafe".to_string(),
                email: None,
                status: InviteStatus::Pending,
                expires_at: Utc::now() + Duration::days(1),
                used_by: None,
                used_at: None,
                created_at: Utc::now(),
            }])
        });

        let svc = service(MockUsersRepository::new(), families);
        let summary = svc.family_summary(&owner).await.unwrap();

        assert_eq!(summary.used_slots, 2);
        assert_eq!(summary.pending_invites, 1);
        assert_eq!(summary.available_slots, 1);
    }

    #[tokio::test]
    async fn test_summary_for_member_of_another_family() {
        let user = free_user();
        let user_id = user.id;

        let mut families = MockFamiliesRepository::new();
        families.expect_find_membership().returning(move |_| {
            Ok(Some(FamilyMember {
                id: Uuid::new_v4(),
                family_id: Uuid::new_v4(),
                user_id,
                joined_at: Utc::now(),
            }))
        });

        let svc = service(MockUsersRepository::new(), families);
        let summary = svc.family_summary(&user).await.unwrap();

        assert_eq!(summary.role, FamilyRole::Member);
        assert_eq!(summary.used_slots, 0);
        assert_eq!(summary.max_members, 0);
    }

    #[tokio::test]
    async fn test_summary_for_single_screen_user() {
        let user = free_user();

        let mut families = MockFamiliesRepository::new();
        families
            .expect_find_membership()
            .returning(|_| Ok(None));

        let svc = service(MockUsersRepository::new(), families);
        let summary = svc.family_summary(&user).await.unwrap();

        assert_eq!(summary.role, FamilyRole::None);
        assert_eq!(summary.used_slots, 0);
    }

    #[tokio::test]
    async fn test_remove_member_rejects_self_removal() {
        let owner = plan_owner(4);
        let owner_id = owner.id;

        let svc = service(MockUsersRepository::new(), MockFamiliesRepository::new());

        assert!(matches!(
            svc.remove_member(&owner, owner_id).await,
            Err(CoreError::NotFamilyOwner)
        ));
    }
}
