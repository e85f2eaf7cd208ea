//! Store traits for users and journal entries.
//!
//! Handlers and services only see these traits through `AppState`, so the
//! Postgres-backed store and the in-memory store are interchangeable.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use shared_types::{Entry, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::types::FacebookProfile;
use crate::db::{self, DbPool};

/// Lookup and creation of local user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Get a user by local id.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Find the user linked to a provider profile id.
    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>>;

    /// Create a user from a provider profile with a fresh local id.
    async fn create(&self, profile: &FacebookProfile) -> Result<User>;
}

/// Date-keyed entry storage. At most one entry exists per (user, date).
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn find(&self, user_id: Uuid, date: &str) -> Result<Option<Entry>>;

    /// Entries with `from <= date <= to`, sorted by date. Either bound may be open.
    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Entry>>;

    /// Replace the whole entry for (user, date) with `body`, creating it if absent.
    async fn upsert(&self, user_id: Uuid, date: &str, body: &str) -> Result<Entry>;
}

// ============================================================================
// Postgres
// ============================================================================

/// Stores backed by the diesel-async connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::users::get_by_id(&mut conn, id).await
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::users::get_by_uid(&mut conn, uid).await
    }

    async fn create(&self, profile: &FacebookProfile) -> Result<User> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::users::create(&mut conn, &profile.id, &profile.name)
            .await
            .context("Failed to create user")
    }
}

#[async_trait]
impl EntryStore for PgStore {
    async fn find(&self, user_id: Uuid, date: &str) -> Result<Option<Entry>> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::entries::find(&mut conn, user_id, date).await
    }

    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::entries::find_by_date_range(&mut conn, user_id, from, to).await
    }

    async fn upsert(&self, user_id: Uuid, date: &str, body: &str) -> Result<Entry> {
        let mut conn = self.pool.get().await.context("Failed to get connection")?;
        db::entries::upsert(&mut conn, user_id, date, body)
            .await
            .context("Failed to save entry")
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Process-local store. Used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    entries: RwLock<HashMap<(Uuid, String), Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_uid(&self, uid: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.uid == uid).cloned())
    }

    async fn create(&self, profile: &FacebookProfile) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|user| user.uid == profile.id) {
            anyhow::bail!("User with uid {} already exists", profile.id);
        }
        let user = User {
            id: Uuid::new_v4(),
            uid: profile.id.clone(),
            name: profile.name.clone(),
            created_at: Utc::now(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn find(&self, user_id: Uuid, date: &str) -> Result<Option<Entry>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(user_id, date.to_string())).cloned())
    }

    async fn find_by_date_range(
        &self,
        user_id: Uuid,
        from: Option<&str>,
        to: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let entries = self.entries.read().await;
        let mut found: Vec<Entry> = entries
            .values()
            .filter(|entry| entry.user_id == user_id)
            .filter(|entry| from.map_or(true, |from| entry.date.as_str() >= from))
            .filter(|entry| to.map_or(true, |to| entry.date.as_str() <= to))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(found)
    }

    async fn upsert(&self, user_id: Uuid, date: &str, body: &str) -> Result<Entry> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry((user_id, date.to_string()))
            .or_insert_with(|| Entry::blank(user_id, date));
        entry.body = body.to_string();
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }
}
