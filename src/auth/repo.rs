use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::auth::password::HashedPassword;
use crate::auth::repo_types::{
    NewUser, StoreError, UserChanges, UserCredentials, UserProfile, UserRecord,
};

/// Persistence for users and their login history.
///
/// Implementations classify failures into [`StoreError`] so callers never
/// look at driver messages.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<i64, StoreError>;

    async fn find_by_phone(&self, phone_number: &str) -> Result<UserCredentials, StoreError>;

    async fn find_by_id(&self, user_id: i64) -> Result<UserProfile, StoreError>;

    /// Read-modify-write of the mutable columns in one transaction.
    async fn update(&self, user_id: i64, changes: UserChanges) -> Result<UserProfile, StoreError>;

    /// Bumps the login counter, inserting the row on first login.
    ///
    /// Lookup-then-branch: two concurrent first logins of the same user can
    /// race, and the loser fails on the `user_id` unique constraint.
    async fn increment_login_count(&self, user_id: i64) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

async fn rollback(tx: Transaction<'_, Postgres>, cause: &StoreError) {
    debug!(error = %cause, "rolling back");
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

async fn commit(tx: Transaction<'_, Postgres>) -> Result<(), StoreError> {
    tx.commit().await.map_err(|e| {
        warn!(error = %e, "commit failed");
        StoreError::from(e)
    })
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    full_name: String,
    phone_number: String,
    password_hash: String,
}

impl From<UserRow> for UserRecord {
    fn from(r: UserRow) -> Self {
        Self {
            user_id: r.id,
            full_name: r.full_name,
            phone_number: r.phone_number,
            password_hash: HashedPassword::from_encoded(r.password_hash),
        }
    }
}

impl PgUserStore {
    async fn insert_user(
        tx: &mut Transaction<'_, Postgres>,
        user: &NewUser,
        now: OffsetDateTime,
    ) -> Result<i64, StoreError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO users (full_name, phone_number, password_hash, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&user.full_name)
        .bind(&user.phone_number)
        .bind(user.password_hash.as_str())
        .bind(now)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    async fn overlay_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        changes: UserChanges,
        now: OffsetDateTime,
    ) -> Result<UserRecord, StoreError> {
        // Row lock serializes concurrent updates of the same user.
        let mut record: UserRecord = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, full_name, phone_number, password_hash
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(StoreError::NotFound)?
        .into();

        changes.apply_to(&mut record);

        let result = sqlx::query(
            r#"
            UPDATE users
               SET full_name = $1, phone_number = $2, password_hash = $3, updated_at = $4
             WHERE id = $5
            "#,
        )
        .bind(&record.full_name)
        .bind(&record.phone_number)
        .bind(record.password_hash.as_str())
        .bind(now)
        .bind(record.user_id)
        .execute(&mut **tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(record)
    }

    async fn bump_login_count(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        now: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let existing = sqlx::query_scalar::<_, i32>(
            r#"SELECT login_count FROM users_login_history WHERE user_id = $1"#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            Some(_) => {
                sqlx::query(
                    r#"
                    UPDATE users_login_history
                       SET login_count = login_count + 1, updated_at = $2
                     WHERE user_id = $1
                    "#,
                )
                .bind(user_id)
                .bind(now)
                .execute(&mut **tx)
                .await?;
            }
            None => {
                sqlx::query(
                    r#"
                    INSERT INTO users_login_history (user_id, login_count, created_at)
                    VALUES ($1, 1, $2)
                    "#,
                )
                .bind(user_id)
                .bind(now)
                .execute(&mut **tx)
                .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> Result<i64, StoreError> {
        let mut tx = self.db.begin().await?;
        match Self::insert_user(&mut tx, &user, OffsetDateTime::now_utc()).await {
            Ok(id) => {
                commit(tx).await?;
                Ok(id)
            }
            Err(e) => {
                rollback(tx, &e).await;
                Err(e)
            }
        }
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<UserCredentials, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            r#"
            SELECT id, phone_number, password_hash
            FROM users
            WHERE phone_number = $1
            "#,
        )
        .bind(phone_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(UserCredentials {
            user_id: row.0,
            phone_number: row.1,
            password_hash: HashedPassword::from_encoded(row.2),
        })
    }

    async fn find_by_id(&self, user_id: i64) -> Result<UserProfile, StoreError> {
        let row = sqlx::query_as::<_, (i64, String, String)>(
            r#"
            SELECT id, phone_number, full_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(StoreError::NotFound)?;

        Ok(UserProfile {
            user_id: row.0,
            phone_number: row.1,
            full_name: row.2,
        })
    }

    async fn update(&self, user_id: i64, changes: UserChanges) -> Result<UserProfile, StoreError> {
        let mut tx = self.db.begin().await?;
        match Self::overlay_user(&mut tx, user_id, changes, OffsetDateTime::now_utc()).await {
            Ok(record) => {
                commit(tx).await?;
                Ok(record.into())
            }
            Err(e) => {
                rollback(tx, &e).await;
                Err(e)
            }
        }
    }

    async fn increment_login_count(&self, user_id: i64) -> Result<(), StoreError> {
        let mut tx = self.db.begin().await?;
        match Self::bump_login_count(&mut tx, user_id, OffsetDateTime::now_utc()).await {
            Ok(()) => commit(tx).await,
            Err(e) => {
                rollback(tx, &e).await;
                Err(e)
            }
        }
    }
}
