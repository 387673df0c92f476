//! User management.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use meridian_core::id::parse_or_not_found;
use meridian_core::{DomainError, DomainResult, UserId};
use meridian_users::{CreateUser, UpdateUser, User, seed_users};

use crate::read_model::{InMemoryRecordStore, RecordStore};

fn user_not_found(id: &str) -> DomainError {
    DomainError::not_found(format!("User with ID {id} not found"))
}

/// CRUD over users.
#[derive(Debug)]
pub struct UserService<S> {
    store: Arc<S>,
}

impl<S> Clone for UserService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl UserService<InMemoryRecordStore<UserId, User>> {
    /// In-memory service holding the two demo users.
    pub fn seeded() -> Self {
        let users = seed_users(Utc::now()).into_iter().map(|u| (u.id, u));
        Self::new(Arc::new(InMemoryRecordStore::seeded(users)))
    }
}

impl<S> UserService<S>
where
    S: RecordStore<UserId, User>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, cmd: CreateUser) -> DomainResult<User> {
        let user = User::create(cmd, Utc::now())?;
        self.store.upsert(user.id, user.clone());
        info!(user_id = %user.id, role = user.role.as_str(), "user created");
        Ok(user)
    }

    pub fn find_all(&self) -> Vec<User> {
        self.store.list()
    }

    pub fn find_one(&self, id: &str) -> DomainResult<User> {
        let key: UserId = parse_or_not_found(id, || user_not_found(id))?;
        self.store.get(&key).ok_or_else(|| user_not_found(id))
    }

    pub fn update(&self, id: &str, patch: UpdateUser) -> DomainResult<User> {
        let key: UserId = parse_or_not_found(id, || user_not_found(id))?;
        let now = Utc::now();
        let updated = self
            .store
            .modify(&key, &mut |user| user.apply_update(patch.clone(), now))?
            .ok_or_else(|| user_not_found(id))?;
        debug!(user_id = %key, "user updated");
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> DomainResult<User> {
        let key: UserId = parse_or_not_found(id, || user_not_found(id))?;
        let removed = self.store.remove(&key).ok_or_else(|| user_not_found(id))?;
        info!(user_id = %key, "user deleted");
        Ok(removed)
    }
}
