//! The persistence contract the engine requires, plus an in-memory
//! implementation.
//!
//! The engine never mutates a record outside a read-modify-write cycle
//! against this trait: `get` returns the record with its version,
//! `compare_and_swap` commits only if the version is unchanged. Records
//! for different users are independent; implementations must not
//! serialize unrelated users behind a global lock beyond what a simple
//! map guard requires.
//!
//! The production store lives in `joystreak-db`; [`MemoryStore`] here
//! backs unit tests and embeddable deployments.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use joystreak_types::{GuildId, UserId, UserProgression};

/// Version assigned to a freshly created record.
pub const INITIAL_VERSION: u64 = 1;

/// Errors surfaced by a progression store.
///
/// Version conflicts and duplicate creates are not errors -- they are
/// expected outcomes modeled by [`CasResult`] and [`CreateResult`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The store could not be reached or the operation failed
    /// transiently. The engine retries these with backoff.
    #[error("store unavailable: {reason}")]
    Unavailable {
        /// Description of the underlying failure.
        reason: String,
    },
}

/// Outcome of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasResult {
    /// The write committed; the stored version advanced by one.
    Applied,
    /// The stored version no longer matches; nothing was written.
    VersionConflict,
}

/// Outcome of a record creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateResult {
    /// The record was created at [`INITIAL_VERSION`].
    Created,
    /// A record already exists for this (guild, user).
    AlreadyExists,
}

/// Storage contract for [`UserProgression`] records.
///
/// Implementations must provide atomic compare-and-swap semantics per
/// (guild, user) key: a `compare_and_swap` either commits the whole
/// record or writes nothing.
pub trait ProgressionStore {
    /// Fetch a record with its current version, or `None` if absent.
    fn get(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> impl Future<Output = Result<Option<(UserProgression, u64)>, StoreError>> + Send;

    /// Create a record at [`INITIAL_VERSION`]. Keyed by the record's
    /// own guild and user IDs.
    fn create(
        &self,
        record: &UserProgression,
    ) -> impl Future<Output = Result<CreateResult, StoreError>> + Send;

    /// Conditionally replace a record if its stored version equals
    /// `expected_version`. On success the stored version advances.
    fn compare_and_swap(
        &self,
        expected_version: u64,
        record: &UserProgression,
    ) -> impl Future<Output = Result<CasResult, StoreError>> + Send;

    /// List every user with a record in a guild (for bulk admin
    /// operations).
    fn list_users(
        &self,
        guild: GuildId,
    ) -> impl Future<Output = Result<Vec<UserId>, StoreError>> + Send;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

type Shard = HashMap<(GuildId, UserId), (UserProgression, u64)>;

/// Mutex-guarded in-memory store with true compare-and-swap semantics.
///
/// Cloning is cheap and shares the underlying map, so tests can hold a
/// handle while the engine owns another.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<Shard>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Shard>, StoreError> {
        self.inner.lock().map_err(|_err| StoreError::Unavailable {
            reason: "memory store lock poisoned".to_owned(),
        })
    }
}

impl ProgressionStore for MemoryStore {
    async fn get(
        &self,
        guild: GuildId,
        user: UserId,
    ) -> Result<Option<(UserProgression, u64)>, StoreError> {
        let shard = self.lock()?;
        Ok(shard.get(&(guild, user)).cloned())
    }

    async fn create(&self, record: &UserProgression) -> Result<CreateResult, StoreError> {
        let key = (record.guild_id, record.user_id);
        let mut shard = self.lock()?;
        if shard.contains_key(&key) {
            return Ok(CreateResult::AlreadyExists);
        }
        shard.insert(key, (record.clone(), INITIAL_VERSION));
        Ok(CreateResult::Created)
    }

    async fn compare_and_swap(
        &self,
        expected_version: u64,
        record: &UserProgression,
    ) -> Result<CasResult, StoreError> {
        let key = (record.guild_id, record.user_id);
        let mut shard = self.lock()?;
        match shard.get_mut(&key) {
            Some((stored, version)) if *version == expected_version => {
                *stored = record.clone();
                *version = version.saturating_add(1);
                Ok(CasResult::Applied)
            }
            _ => Ok(CasResult::VersionConflict),
        }
    }

    async fn list_users(&self, guild: GuildId) -> Result<Vec<UserId>, StoreError> {
        let shard = self.lock()?;
        let mut users: Vec<UserId> = shard
            .keys()
            .filter(|(g, _)| *g == guild)
            .map(|(_, u)| *u)
            .collect();
        users.sort_unstable();
        Ok(users)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(guild: u64, user: u64) -> UserProgression {
        UserProgression::new(GuildId::new(guild), UserId::new(user))
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let store = MemoryStore::new();
        let got = store.get(GuildId::new(1), UserId::new(2)).await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn create_then_get_returns_initial_version() {
        let store = MemoryStore::new();
        let rec = record(1, 2);
        assert_eq!(store.create(&rec).await.unwrap(), CreateResult::Created);
        let (got, version) = store
            .get(GuildId::new(1), UserId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, rec);
        assert_eq!(version, INITIAL_VERSION);
    }

    #[tokio::test]
    async fn double_create_reports_already_exists() {
        let store = MemoryStore::new();
        let rec = record(1, 2);
        assert_eq!(store.create(&rec).await.unwrap(), CreateResult::Created);
        assert_eq!(
            store.create(&rec).await.unwrap(),
            CreateResult::AlreadyExists
        );
    }

    #[tokio::test]
    async fn cas_applies_and_advances_version() {
        let store = MemoryStore::new();
        let mut rec = record(1, 2);
        store.create(&rec).await.unwrap();

        rec.xp = 30;
        assert_eq!(
            store.compare_and_swap(INITIAL_VERSION, &rec).await.unwrap(),
            CasResult::Applied
        );
        let (got, version) = store
            .get(GuildId::new(1), UserId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.xp, 30);
        assert_eq!(version, 2);
    }

    #[tokio::test]
    async fn cas_rejects_stale_version() {
        let store = MemoryStore::new();
        let mut rec = record(1, 2);
        store.create(&rec).await.unwrap();

        rec.xp = 30;
        store
            .compare_and_swap(INITIAL_VERSION, &rec)
            .await
            .unwrap();

        // A writer still holding the old version must lose.
        rec.xp = 60;
        assert_eq!(
            store.compare_and_swap(INITIAL_VERSION, &rec).await.unwrap(),
            CasResult::VersionConflict
        );
        let (got, _) = store
            .get(GuildId::new(1), UserId::new(2))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got.xp, 30);
    }

    #[tokio::test]
    async fn cas_on_missing_record_is_a_conflict() {
        let store = MemoryStore::new();
        let rec = record(1, 2);
        assert_eq!(
            store.compare_and_swap(INITIAL_VERSION, &rec).await.unwrap(),
            CasResult::VersionConflict
        );
    }

    #[tokio::test]
    async fn list_users_filters_by_guild() {
        let store = MemoryStore::new();
        store.create(&record(1, 10)).await.unwrap();
        store.create(&record(1, 11)).await.unwrap();
        store.create(&record(2, 12)).await.unwrap();

        let users = store.list_users(GuildId::new(1)).await.unwrap();
        assert_eq!(users, vec![UserId::new(10), UserId::new(11)]);
    }
}
