use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::database::models::{SetlistKind, SongList};
use crate::database::{CredentialStore, DatabaseError, UserDataStore};

/// Everything the frontend keeps for one user, read in a single call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    pub favorites: Vec<String>,
    pub praise_setlist: Vec<String>,
    pub worship_setlist: Vec<String>,
    pub name: String,
    pub email: String,
}

/// Partial aggregate write; omitted fields are left as they are
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDataUpdate {
    pub favorites: Option<Vec<String>>,
    pub praise_setlist: Option<Vec<String>>,
    pub worship_setlist: Option<Vec<String>>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Favorites and setlists, with absent documents read as empty.
///
/// Writes are full replacements with last-write-wins semantics; nothing here
/// serializes concurrent writes for the same user.
#[derive(Clone)]
pub struct UserDataService {
    users: Arc<dyn CredentialStore>,
    store: Arc<dyn UserDataStore>,
}

impl UserDataService {
    pub fn new(users: Arc<dyn CredentialStore>, store: Arc<dyn UserDataStore>) -> Self {
        Self { users, store }
    }

    pub async fn favorites(&self, identity: &Identity) -> Result<Vec<String>, DatabaseError> {
        let list = self.store.get_favorites(&identity.storage_key()).await?;
        Ok(list.unwrap_or_default().songs)
    }

    pub async fn save_favorites(
        &self,
        identity: &Identity,
        songs: Vec<String>,
        name: Option<String>,
    ) -> Result<(), DatabaseError> {
        self.store
            .put_favorites(&identity.storage_key(), SongList::new(songs, name))
            .await
    }

    pub async fn setlist(
        &self,
        identity: &Identity,
        kind: SetlistKind,
    ) -> Result<Vec<String>, DatabaseError> {
        let list = self.store.get_setlist(&identity.storage_key(), kind).await?;
        Ok(list.unwrap_or_default().songs)
    }

    pub async fn save_setlist(
        &self,
        identity: &Identity,
        kind: SetlistKind,
        songs: Vec<String>,
        name: Option<String>,
    ) -> Result<(), DatabaseError> {
        self.store
            .put_setlist(&identity.storage_key(), kind, SongList::new(songs, name))
            .await
    }

    /// Joins the credential record with the three documents. Never fails for a
    /// missing account: anonymous callers and local ids without a credential
    /// record get empty defaults. Federated identities have no credential
    /// record, so their documents are returned with the cached name.
    pub async fn aggregate(&self, identity: Option<&Identity>) -> Result<UserData, DatabaseError> {
        let Some(identity) = identity else {
            return Ok(UserData::default());
        };
        let key = identity.storage_key();

        let user_lookup = async {
            match identity.local_id() {
                Some(id) => self.users.find_by_id(id).await,
                None => Ok(None),
            }
        };

        let (user, favorites, praise, worship) = futures::try_join!(
            user_lookup,
            self.store.get_favorites(&key),
            self.store.get_setlist(&key, SetlistKind::Praise),
            self.store.get_setlist(&key, SetlistKind::Worship),
        )?;

        let favorites = favorites.unwrap_or_default();
        let (name, email) = match (user, identity) {
            (Some(user), _) => (user.name, user.email),
            // Orphaned documents of a deleted or never-registered account stay hidden
            (None, Identity::Local(id)) => {
                tracing::debug!("No credential record for user {}, returning defaults", id);
                return Ok(UserData::default());
            }
            (None, Identity::Federated(_)) => (favorites.name.clone().unwrap_or_default(), String::new()),
        };

        Ok(UserData {
            favorites: favorites.songs,
            praise_setlist: praise.unwrap_or_default().songs,
            worship_setlist: worship.unwrap_or_default().songs,
            name,
            email,
        })
    }

    /// Fans one payload out to up to four writes, in order: credential record,
    /// favorites, praise setlist, worship setlist. There is no transaction across
    /// them, so a failure part-way leaves the earlier writes in place.
    pub async fn save_aggregate(
        &self,
        identity: &Identity,
        update: UserDataUpdate,
    ) -> Result<(), DatabaseError> {
        let key = identity.storage_key();

        if update.name.is_some() || update.email.is_some() {
            match identity.local_id() {
                Some(id) => {
                    let found = self
                        .users
                        .update_profile(id, update.name.as_deref(), update.email.as_deref())
                        .await?;
                    if !found {
                        tracing::debug!("No credential record for {}, profile not updated", identity);
                    }
                }
                None => tracing::debug!("Federated identity {} has no credential record", identity),
            }
        }

        if let Some(songs) = update.favorites {
            self.store
                .put_favorites(&key, SongList::new(songs, update.name.clone()))
                .await?;
        }
        if let Some(songs) = update.praise_setlist {
            self.store
                .put_setlist(&key, SetlistKind::Praise, SongList::new(songs, update.name.clone()))
                .await?;
        }
        if let Some(songs) = update.worship_setlist {
            self.store
                .put_setlist(&key, SetlistKind::Worship, SongList::new(songs, update.name))
                .await?;
        }

        Ok(())
    }
}
