use chrono::{DateTime, Utc};
use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Seat capacity of an account without any paid plan
pub const BASE_SCREENS: i16 = 1;

/// A registered account.
///
/// Authentication (OTP issuance, session cookies) is handled by an external
/// provider; this type only carries the profile and plan state the watch
/// and family subsystems act on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_verified: bool,
    pub display_name: String,
    /// Payment-provider plan reference; `None` once a plan or trial lapses
    pub plan_id: Option<String>,
    /// Concurrent-screen (and family slot) capacity granted by the plan
    pub max_screens: i16,
    /// Set while the account is on a free trial
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the plan grants family slots beyond the owner's own screen
    pub fn has_family_capability(&self) -> bool {
        self.plan_id.is_some() && self.max_screens > BASE_SCREENS
    }
}
