use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, SetlistKind, SongList, User};

/// Persistence for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError>;

    /// Inserts with `is_admin = false`. Duplicate email yields `DatabaseError::Conflict`.
    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError>;

    /// Returns false when no user has this id.
    async fn set_admin(&self, id: Uuid, value: bool) -> Result<bool, DatabaseError>;

    /// Overwrites only the fields that are `Some`. Returns false when no user has this id.
    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}

/// Persistence for per-user favorites and setlist documents, keyed by user key.
///
/// Reads return `None` for documents that were never written; callers decide
/// what absence means.
#[async_trait]
pub trait UserDataStore: Send + Sync {
    async fn get_favorites(&self, user_key: &str) -> Result<Option<SongList>, DatabaseError>;

    /// Full replace, creating the document if absent
    async fn put_favorites(&self, user_key: &str, list: SongList) -> Result<(), DatabaseError>;

    async fn get_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
    ) -> Result<Option<SongList>, DatabaseError>;

    /// Full replace, creating the document if absent
    async fn put_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
        list: SongList,
    ) -> Result<(), DatabaseError>;

    /// Creates any missing empty documents without touching existing ones.
    /// Returns how many documents were created.
    async fn ensure_documents(&self, user_key: &str) -> Result<u64, DatabaseError>;
}
