use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{database::ports::users::UsersRepository, error::Result};
use vidra_model::User;

#[derive(Clone, Debug)]
pub struct PostgresUsersRepository {
    pool: PgPool,
}

impl PostgresUsersRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: Option<String>,
    email_verified: bool,
    display_name: String,
    plan_id: Option<String>,
    max_screens: i16,
    trial_ends_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            email_verified: row.email_verified,
            display_name: row.display_name,
            plan_id: row.plan_id,
            max_screens: row.max_screens,
            trial_ends_at: row.trial_ends_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl UsersRepository for PostgresUsersRepository {
    async fn get_user_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, email_verified, display_name, plan_id,
                   max_screens, trial_ends_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(User::from))
    }

    async fn list_trial_expired(&self, now: DateTime<Utc>) -> Result<Vec<User>> {
        // The plan_id predicate keeps the sweep idempotent: processed users
        // no longer match even though trial_ends_at stays in the past until
        // the same transaction clears it.
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, email_verified, display_name, plan_id,
                   max_screens, trial_ends_at, created_at, updated_at
            FROM users
            WHERE trial_ends_at IS NOT NULL
              AND trial_ends_at <= $1
              AND plan_id IS NOT NULL
            "#,
        )
        .bind(now)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn expire_trial(&self, user_id: Uuid, base_screens: i16) -> Result<()> {
        let now = Utc::now();
        let mut tx = self.pool().begin().await?;

        let cleared = sqlx::query(
            r#"
            UPDATE users
            SET plan_id = NULL, max_screens = $2, trial_ends_at = NULL, updated_at = $3
            WHERE id = $1 AND plan_id IS NOT NULL
            "#,
        )
        .bind(user_id)
        .bind(base_screens)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if cleared.rows_affected() == 0 {
            // Already processed by an earlier run.
            tx.commit().await?;
            return Ok(());
        }

        let family_id: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM families WHERE owner_id = $1")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(family_id) = family_id {
            sqlx::query("DELETE FROM family_members WHERE family_id = $1")
                .bind(family_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM family_invites WHERE family_id = $1")
                .bind(family_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM families WHERE id = $1")
                .bind(family_id)
                .execute(&mut *tx)
                .await?;

            info!(user_id = %user_id, family_id = %family_id, "trial expiry dissolved family");
        }

        tx.commit().await?;

        Ok(())
    }
}
