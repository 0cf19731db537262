use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use vidra_model::User;

/// Account rows, as far as the watch/family core needs them
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersRepository: Send + Sync {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Users whose trial has lapsed and whose plan has not been cleared
    /// yet. The plan-reference predicate is what makes the expiry job
    /// idempotent: already-processed users no longer match.
    async fn list_trial_expired(&self, now: DateTime<Utc>) -> Result<Vec<User>>;

    /// Clear the user's plan reference, reset seat capacity to
    /// `base_screens`, clear the trial timestamp, and delete the user's
    /// family (members and invites included), all in one transaction.
    ///
    /// A no-op for users whose plan is already cleared.
    async fn expire_trial(&self, user_id: Uuid, base_screens: i16) -> Result<()>;
}
