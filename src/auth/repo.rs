use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use crate::auth::repo_types::{Account, NewAccount, NewUser, User};

const USERS_EMAIL_KEY: &str = "users_email_key";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    DuplicateEmail,
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read access to users plus the entry point for a signup unit of work.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Opens a transaction. Dropping the returned unit without `commit` discards its writes.
    async fn begin(&self) -> Result<Box<dyn SignupUnit>, StoreError>;
}

/// Writes scoped to a single transaction.
#[async_trait]
pub trait SignupUnit: Send {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError>;
    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StoreError>;
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgStore {
    /// Find a user by email. Exact match, no normalisation.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, first_name, last_name, user_name, email, is_email_verified,
                   created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn begin(&self) -> Result<Box<dyn SignupUnit>, StoreError> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgSignupUnit { tx }))
    }
}

pub struct PgSignupUnit {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl SignupUnit for PgSignupUnit {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        let row = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, first_name, last_name, user_name, email)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, first_name, last_name, user_name, email, is_email_verified,
                      created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.user_name)
        .bind(&user.email)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StoreError> {
        let row = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (id, user_id, provider, provider_id, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, provider, provider_id, password_hash, created_at, updated_at
            "#,
        )
        .bind(account.id)
        .bind(account.user_id)
        .bind(account.provider)
        .bind(account.provider_id.as_deref())
        .bind(account.password_hash.as_deref())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_write_error)?;
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await.map_err(map_write_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

/// Turns unique violations into typed conflicts so a lost check-then-insert race
/// still surfaces as a duplicate email.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return match db_err.constraint() {
                Some(USERS_EMAIL_KEY) => StoreError::DuplicateEmail,
                other => StoreError::Conflict(other.unwrap_or("unknown").to_owned()),
            };
        }
    }
    StoreError::Database(e)
}
