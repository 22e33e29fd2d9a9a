//! Test doubles and fixtures shared by the auth tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::auth::{
    jwt::TokenService,
    password::BcryptHasher,
    repo::UserStore,
    repo_types::{NewUser, StoreError, UserChanges, UserCredentials, UserProfile, UserRecord},
    services::ProfileService,
};
use crate::config::MIN_HASH_COST;
use crate::state::AppState;

pub const PRIVATE_KEY: &[u8] = include_bytes!("testdata/private_key.pem");
pub const PUBLIC_KEY: &[u8] = include_bytes!("testdata/public_key.pem");
pub const OTHER_PRIVATE_KEY: &[u8] = include_bytes!("testdata/other_private_key.pem");

pub fn test_tokens() -> TokenService {
    TokenService::from_pem(PRIVATE_KEY, PUBLIC_KEY, 24).expect("test keys")
}

pub fn test_service() -> (ProfileService, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::default());
    let svc = ProfileService::new(
        store.clone(),
        Arc::new(BcryptHasher::new(MIN_HASH_COST)),
        Arc::new(test_tokens()),
    );
    (svc, store)
}

pub fn test_state() -> (AppState, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::default());
    let tokens = Arc::new(test_tokens());
    let profiles = ProfileService::new(
        store.clone(),
        Arc::new(BcryptHasher::new(MIN_HASH_COST)),
        tokens.clone(),
    );
    (AppState::from_parts(profiles, tokens), store)
}

#[derive(Default)]
struct Tables {
    users: HashMap<i64, UserRecord>,
    logins: HashMap<i64, i32>,
    last_id: i64,
}

/// Store with the same uniqueness rules as the SQL schema.
#[derive(Default)]
pub struct InMemoryUserStore {
    tables: RwLock<Tables>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
    fail_login_count: AtomicBool,
}

impl InMemoryUserStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every later call fails with `Unavailable(msg)`.
    pub fn fail_with(&self, msg: &str) {
        *self.failure.lock().unwrap() = Some(msg.to_owned());
    }

    pub fn fail_login_count(&self, fail: bool) {
        self.fail_login_count.store(fail, Ordering::SeqCst);
    }

    pub async fn record(&self, user_id: i64) -> Option<UserRecord> {
        self.tables.read().await.users.get(&user_id).cloned()
    }

    pub async fn login_count(&self, user_id: i64) -> Option<i32> {
        self.tables.read().await.logins.get(&user_id).copied()
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().clone() {
            Some(msg) => Err(StoreError::Unavailable(msg)),
            None => Ok(()),
        }
    }
}

fn phone_taken(tables: &Tables, phone_number: &str, except: Option<i64>) -> bool {
    tables
        .users
        .values()
        .any(|u| u.phone_number == phone_number && Some(u.user_id) != except)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<i64, StoreError> {
        self.enter()?;
        let mut tables = self.tables.write().await;
        if phone_taken(&tables, &user.phone_number, None) {
            return Err(StoreError::Conflict);
        }
        tables.last_id += 1;
        let id = tables.last_id;
        tables.users.insert(
            id,
            UserRecord {
                user_id: id,
                full_name: user.full_name,
                phone_number: user.phone_number,
                password_hash: user.password_hash,
            },
        );
        Ok(id)
    }

    async fn find_by_phone(&self, phone_number: &str) -> Result<UserCredentials, StoreError> {
        self.enter()?;
        let tables = self.tables.read().await;
        tables
            .users
            .values()
            .find(|u| u.phone_number == phone_number)
            .map(|u| UserCredentials {
                user_id: u.user_id,
                phone_number: u.phone_number.clone(),
                password_hash: u.password_hash.clone(),
            })
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<UserProfile, StoreError> {
        self.enter()?;
        let tables = self.tables.read().await;
        tables
            .users
            .get(&user_id)
            .cloned()
            .map(UserProfile::from)
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, user_id: i64, changes: UserChanges) -> Result<UserProfile, StoreError> {
        self.enter()?;
        let mut tables = self.tables.write().await;
        let mut record = tables.users.get(&user_id).cloned().ok_or(StoreError::NotFound)?;
        changes.apply_to(&mut record);
        if phone_taken(&tables, &record.phone_number, Some(user_id)) {
            return Err(StoreError::Conflict);
        }
        tables.users.insert(user_id, record.clone());
        Ok(record.into())
    }

    async fn increment_login_count(&self, user_id: i64) -> Result<(), StoreError> {
        self.enter()?;
        if self.fail_login_count.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("login history unavailable".into()));
        }
        let mut tables = self.tables.write().await;
        *tables.logins.entry(user_id).or_insert(0) += 1;
        Ok(())
    }
}
