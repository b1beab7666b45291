//! In-process `AccountStore` used by the unit and router tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::repo::{AccountStore, SignupUnit, StoreError};
use crate::auth::repo_types::{Account, NewAccount, NewUser, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    accounts: Vec<Account>,
}

#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    fail_account_insert: Arc<AtomicBool>,
    blind_lookups: Arc<AtomicBool>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent account insert fail after the user insert succeeded.
    pub fn fail_account_inserts(&self, fail: bool) {
        self.fail_account_insert.store(fail, Ordering::SeqCst);
    }

    /// Lookups report no user, as if a concurrent signup committed right after the check.
    pub fn blind_lookups(&self, blind: bool) {
        self.blind_lookups.store(blind, Ordering::SeqCst);
    }

    pub fn users(&self) -> Vec<User> {
        self.tables.lock().unwrap().users.clone()
    }

    pub fn accounts(&self) -> Vec<Account> {
        self.tables.lock().unwrap().accounts.clone()
    }
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        if self.blind_lookups.load(Ordering::SeqCst) {
            return Ok(None);
        }
        let tables = self.tables.lock().unwrap();
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn begin(&self) -> Result<Box<dyn SignupUnit>, StoreError> {
        Ok(Box::new(InMemoryUnit {
            tables: Arc::clone(&self.tables),
            fail_account_insert: self.fail_account_insert.load(Ordering::SeqCst),
            users: Vec::new(),
            accounts: Vec::new(),
        }))
    }
}

struct InMemoryUnit {
    tables: Arc<Mutex<Tables>>,
    fail_account_insert: bool,
    users: Vec<User>,
    accounts: Vec<Account>,
}

#[async_trait]
impl SignupUnit for InMemoryUnit {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, StoreError> {
        let taken = self.users.iter().any(|u| u.email == user.email)
            || self.tables.lock().unwrap().users.iter().any(|u| u.email == user.email);
        if taken {
            return Err(StoreError::DuplicateEmail);
        }
        let now = OffsetDateTime::now_utc();
        let row = User {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_name: user.user_name.clone(),
            email: user.email.clone(),
            is_email_verified: false,
            created_at: now,
            updated_at: now,
        };
        self.users.push(row.clone());
        Ok(row)
    }

    async fn insert_account(&mut self, account: &NewAccount) -> Result<Account, StoreError> {
        if self.fail_account_insert {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "injected account insert failure".into(),
            )));
        }
        if !self.users.iter().any(|u| u.id == account.user_id) {
            return Err(StoreError::Database(sqlx::Error::Protocol(
                "accounts.user_id references a missing user".into(),
            )));
        }
        let now = OffsetDateTime::now_utc();
        let row = Account {
            id: account.id,
            user_id: account.user_id,
            provider: account.provider,
            provider_id: account.provider_id.clone(),
            password_hash: account.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        self.accounts.push(row.clone());
        Ok(row)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let this = *self;
        let mut tables = this.tables.lock().unwrap();
        for u in &this.users {
            if tables.users.iter().any(|existing| existing.email == u.email) {
                return Err(StoreError::DuplicateEmail);
            }
        }
        tables.users.extend(this.users);
        tables.accounts.extend(this.accounts);
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
