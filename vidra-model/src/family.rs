use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A multi-screen plan owner's family aggregate.
///
/// Created lazily on first invite, never at signup: a plan owner with no
/// persisted row still occupies one slot conceptually (see
/// [`FamilySummary`]).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Family {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Total slot capacity including the owner (2 for Duo, 4 for Family)
    pub max_members: i16,
    pub created_at: DateTime<Utc>,
}

/// A user occupying one slot of someone else's family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FamilyMember {
    pub id: Uuid,
    pub family_id: Uuid,
    pub user_id: Uuid,
    pub joined_at: DateTime<Utc>,
}

/// Lifecycle state of a family invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum InviteStatus {
    Pending,
    Accepted,
    Revoked,
    Expired,
}

impl InviteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::Pending => "pending",
            InviteStatus::Accepted => "accepted",
            InviteStatus::Revoked => "revoked",
            InviteStatus::Expired => "expired",
        }
    }

    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(InviteStatus::Pending),
            "accepted" => Some(InviteStatus::Accepted),
            "revoked" => Some(InviteStatus::Revoked),
            "expired" => Some(InviteStatus::Expired),
            _ => None,
        }
    }
}

/// An invitation to occupy a family slot.
///
/// A pending, unexpired invite reserves a slot exactly like an active
/// member. `email = None` is an open invite claimable by any user; a set
/// email restricts redemption to a user whose verified address matches
/// case-insensitively.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FamilyInvite {
    pub id: Uuid,
    pub family_id: Uuid,
    pub token: String,
    pub email: Option<String>,
    pub status: InviteStatus,
    pub expires_at: DateTime<Utc>,
    pub used_by: Option<Uuid>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl FamilyInvite {
    /// Whether the invite still reserves a slot at `now`
    pub fn is_reserving_at(&self, now: DateTime<Utc>) -> bool {
        self.status == InviteStatus::Pending && self.expires_at > now
    }
}

/// The caller's relationship to family-plan slots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FamilyRole {
    /// Holds a multi-screen plan and owns (or would own) the family
    Owner,
    /// Occupies a slot in someone else's family
    Member,
    /// No family capability and no membership
    None,
}

/// Slot usage snapshot for the settings plan panel.
///
/// `used_slots` never reads 0 for a multi-screen plan owner: the owner
/// always occupies one of their own slots, persisted row or not.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FamilySummary {
    pub role: FamilyRole,
    pub max_members: i16,
    /// Owner + active members
    pub used_slots: i16,
    pub pending_invites: i16,
    /// Slots still open for new invites; never negative
    pub available_slots: i16,
    pub members: Vec<FamilyMember>,
    pub invites: Vec<FamilyInvite>,
}

impl FamilySummary {
    /// Summary for a user with no family capability of their own
    pub fn none() -> Self {
        Self {
            role: FamilyRole::None,
            max_members: 0,
            used_slots: 0,
            pending_invites: 0,
            available_slots: 0,
            members: Vec::new(),
            invites: Vec::new(),
        }
    }
}
