use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::{
    database::ports::families::{FamiliesRepository, NewInvite, SlotUsage},
    error::{CoreError, Result},
    family::{slots, validate_acceptance},
};
use vidra_model::{Family, FamilyInvite, FamilyMember, InviteStatus, User};

#[derive(Clone, Debug)]
pub struct PostgresFamiliesRepository {
    pool: PgPool,
}

impl PostgresFamiliesRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FamilyRow {
    id: Uuid,
    owner_id: Uuid,
    max_members: i16,
    created_at: DateTime<Utc>,
}

impl From<FamilyRow> for Family {
    fn from(row: FamilyRow) -> Self {
        Family {
            id: row.id,
            owner_id: row.owner_id,
            max_members: row.max_members,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FamilyMemberRow {
    id: Uuid,
    family_id: Uuid,
    user_id: Uuid,
    joined_at: DateTime<Utc>,
}

impl From<FamilyMemberRow> for FamilyMember {
    fn from(row: FamilyMemberRow) -> Self {
        FamilyMember {
            id: row.id,
            family_id: row.family_id,
            user_id: row.user_id,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct FamilyInviteRow {
    id: Uuid,
    family_id: Uuid,
    token: String,
    email: Option<String>,
    status: String,
    expires_at: DateTime<Utc>,
    used_by: Option<Uuid>,
    used_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl FamilyInviteRow {
    fn into_model(self) -> Result<FamilyInvite> {
        let status = InviteStatus::from_str_opt(&self.status).ok_or_else(|| {
            CoreError::Internal(format!("Unknown invite status in store: {}", self.status))
        })?;
        Ok(FamilyInvite {
            id: self.id,
            family_id: self.family_id,
            token: self.token,
            email: self.email,
            status,
            expires_at: self.expires_at,
            used_by: self.used_by,
            used_at: self.used_at,
            created_at: self.created_at,
        })
    }
}

/// Occupied-slot counts read under the family row lock
async fn locked_slot_usage(
    tx: &mut Transaction<'_, Postgres>,
    family_id: Uuid,
    now: DateTime<Utc>,
) -> Result<SlotUsage> {
    let active_members: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE family_id = $1")
            .bind(family_id)
            .fetch_one(&mut **tx)
            .await?;

    let pending_invites: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM family_invites
        WHERE family_id = $1 AND status = 'pending' AND expires_at > $2
        "#,
    )
    .bind(family_id)
    .bind(now)
    .fetch_one(&mut **tx)
    .await?;

    Ok(SlotUsage {
        active_members,
        pending_invites,
    })
}

#[async_trait]
impl FamiliesRepository for PostgresFamiliesRepository {
    async fn find_by_owner(&self, owner_id: Uuid) -> Result<Option<Family>> {
        let row = sqlx::query_as::<_, FamilyRow>(
            "SELECT id, owner_id, max_members, created_at FROM families WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Family::from))
    }

    async fn get_or_create_for_owner(
        &self,
        owner_id: Uuid,
        max_members: i16,
    ) -> Result<Family> {
        // Lazy creation: the unique owner_id constraint makes the insert a
        // no-op when a concurrent request created the row first.
        sqlx::query(
            r#"
            INSERT INTO families (id, owner_id, max_members, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (owner_id) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(max_members)
        .bind(Utc::now())
        .execute(self.pool())
        .await?;

        let row = sqlx::query_as::<_, FamilyRow>(
            "SELECT id, owner_id, max_members, created_at FROM families WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(self.pool())
        .await?;

        Ok(Family::from(row))
    }

    async fn find_membership(&self, user_id: Uuid) -> Result<Option<FamilyMember>> {
        let row = sqlx::query_as::<_, FamilyMemberRow>(
            r#"
            SELECT id, family_id, user_id, joined_at
            FROM family_members
            WHERE user_id = $1
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(FamilyMember::from))
    }

    async fn slot_usage(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<SlotUsage> {
        let active_members: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM family_members WHERE family_id = $1")
                .bind(family_id)
                .fetch_one(self.pool())
                .await?;

        let pending_invites: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM family_invites
            WHERE family_id = $1 AND status = 'pending' AND expires_at > $2
            "#,
        )
        .bind(family_id)
        .bind(now)
        .fetch_one(self.pool())
        .await?;

        Ok(SlotUsage {
            active_members,
            pending_invites,
        })
    }

    async fn list_members(&self, family_id: Uuid) -> Result<Vec<FamilyMember>> {
        let rows = sqlx::query_as::<_, FamilyMemberRow>(
            r#"
            SELECT id, family_id, user_id, joined_at
            FROM family_members
            WHERE family_id = $1
            ORDER BY joined_at
            "#,
        )
        .bind(family_id)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(FamilyMember::from).collect())
    }

    async fn list_pending_invites(
        &self,
        family_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<FamilyInvite>> {
        let rows = sqlx::query_as::<_, FamilyInviteRow>(
            r#"
            SELECT id, family_id, token, email, status, expires_at, used_by, used_at, created_at
            FROM family_invites
            WHERE family_id = $1 AND status = 'pending' AND expires_at > $2
            ORDER BY created_at
            "#,
        )
        .bind(family_id)
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        rows.into_iter().map(FamilyInviteRow::into_model).collect()
    }

    async fn create_invite(
        &self,
        family_id: Uuid,
        invite: &NewInvite,
        now: DateTime<Utc>,
    ) -> Result<FamilyInvite> {
        let mut tx = self.pool().begin().await?;

        // The row lock serialises concurrent invite creations for the same
        // family: the capacity check and the insert are inseparable.
        let family = sqlx::query_as::<_, FamilyRow>(
            "SELECT id, owner_id, max_members, created_at FROM families WHERE id = $1 FOR UPDATE",
        )
        .bind(family_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("Family {}", family_id)))?;

        let usage = locked_slot_usage(&mut tx, family_id, now).await?;
        if !slots::has_available_slots(
            i64::from(family.max_members),
            usage.active_members,
            usage.pending_invites,
        ) {
            return Err(CoreError::FamilyAtCapacity);
        }

        let row = sqlx::query_as::<_, FamilyInviteRow>(
            r#"
            INSERT INTO family_invites (
                id, family_id, token, email, status, expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, 'pending', $5, $6)
            RETURNING id, family_id, token, email, status, expires_at, used_by, used_at, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(family_id)
        .bind(&invite.token)
        .bind(&invite.email)
        .bind(invite.expires_at)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        row.into_model()
    }

    async fn accept_invite(
        &self,
        token: &str,
        user: &User,
        now: DateTime<Utc>,
    ) -> Result<FamilyMember> {
        let mut tx = self.pool().begin().await?;

        let invite = sqlx::query_as::<_, FamilyInviteRow>(
            r#"
            SELECT id, family_id, token, email, status, expires_at, used_by, used_at, created_at
            FROM family_invites
            WHERE token = $1
            FOR UPDATE
            "#,
        )
        .bind(token)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::NotFound("Invite".to_string()))?
        .into_model()?;

        let family = sqlx::query_as::<_, FamilyRow>(
            "SELECT id, owner_id, max_members, created_at FROM families WHERE id = $1 FOR UPDATE",
        )
        .bind(invite.family_id)
        .fetch_one(&mut *tx)
        .await
        .map(Family::from)?;

        validate_acceptance(&family, &invite, user, now)?;

        let already_member: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM family_members WHERE family_id = $1 AND user_id = $2)",
        )
        .bind(family.id)
        .bind(user.id)
        .fetch_one(&mut *tx)
        .await?;
        if already_member {
            return Err(CoreError::AlreadyMember);
        }

        let member = sqlx::query_as::<_, FamilyMemberRow>(
            r#"
            INSERT INTO family_members (id, family_id, user_id, joined_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, family_id, user_id, joined_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(family.id)
        .bind(user.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE family_invites
            SET status = 'accepted', used_by = $2, used_at = $3
            WHERE id = $1
            "#,
        )
        .bind(invite.id)
        .bind(user.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(FamilyMember::from(member))
    }

    async fn revoke_invite(&self, family_id: Uuid, invite_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE family_invites
            SET status = 'revoked'
            WHERE id = $1 AND family_id = $2 AND status = 'pending'
            "#,
        )
        .bind(invite_id)
        .bind(family_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!("Pending invite {}", invite_id)));
        }
        Ok(())
    }

    async fn remove_member(
        &self,
        family_id: Uuid,
        member_user_id: Uuid,
    ) -> Result<()> {
        let result = sqlx::query(
            "DELETE FROM family_members WHERE family_id = $1 AND user_id = $2",
        )
        .bind(family_id)
        .bind(member_user_id)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::NotFound(format!(
                "Member {} in family {}",
                member_user_id, family_id
            )));
        }
        Ok(())
    }

    async fn expire_invites(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE family_invites
            SET status = 'expired'
            WHERE status = 'pending' AND expires_at <= $1
            "#,
        )
        .bind(now)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
