use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use vidra_model::{Family, FamilyInvite, FamilyMember, User};

/// Parameters for a new invite row
#[derive(Debug, Clone)]
pub struct NewInvite {
    pub token: String,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

/// Occupied-slot counts for one family at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotUsage {
    pub active_members: i64,
    pub pending_invites: i64,
}

/// Family aggregate store: families, members, and invites.
///
/// Capacity-affecting writes (invite creation, acceptance) are transactional
/// inside the implementation: the capacity check and the row insert must not
/// be separable, or two concurrent invites can both observe the same free
/// slot.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FamiliesRepository: Send + Sync {
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Family>>;

    /// Fetch the owner's family, creating the row if none exists yet.
    /// Families are created lazily on first invite, not at signup.
    async fn get_or_create_for_owner(
        &self,
        owner_id: Uuid,
        max_members: i16,
    ) -> Result<Family>;

    /// The caller's membership in someone else's family, if any
    async fn find_membership(&self, user_id: Uuid) -> Result<Option<FamilyMember>>;

    async fn slot_usage(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SlotUsage>;

    async fn list_members(&self, family_id: Uuid) -> Result<Vec<FamilyMember>>;

    /// Pending, unexpired invites for the family
    async fn list_pending_invites(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<FamilyInvite>>;

    /// Insert an invite after a capacity check run in the same transaction,
    /// holding a row lock on the family.
    ///
    /// Fails with [`crate::CoreError::FamilyAtCapacity`] when the owner,
    /// active members, and pending invites already fill every slot.
    async fn create_invite(
        &self,
        family_id: Uuid,
        invite: &NewInvite,
        now: DateTime<Utc>,
    ) -> Result<FamilyInvite>;

    /// Redeem an invite: validates the acceptance rules, inserts the member
    /// row, and marks the invite accepted in one transaction.
    async fn accept_invite(
        &self,
        token: &str,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<FamilyMember>;

    /// Owner-initiated revocation of a pending invite
    async fn revoke_invite(&self, family_id: Uuid, invite_id: Uuid) -> Result<()>;

    /// Owner-initiated removal of an active member
    async fn remove_member(
        &self,
        family_id: Uuid,
        member_user_id: Uuid,
    ) -> Result<()>;

    /// Mark pending invites past their expiry; returns rows transitioned
    async fn expire_invites(&self, now: DateTime<Utc>) -> Result<u64>;
}
