use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, SetlistKind, SongList, User};
use crate::database::repository::{CredentialStore, UserDataStore};

/// In-process store used by the test suite and by development runs without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    favorites: RwLock<HashMap<String, SongList>>,
    setlists: RwLock<HashMap<(String, SetlistKind), SongList>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("email already exists".to_string()));
        }

        let record = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            is_admin: false,
            created_at: Utc::now(),
        };
        users.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn set_admin(&self, id: Uuid, value: bool) -> Result<bool, DatabaseError> {
        match self.users.write().await.get_mut(&id) {
            Some(user) => {
                user.is_admin = value;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let mut users = self.users.write().await;
        if let Some(email) = email {
            if users.values().any(|u| u.id != id && u.email == email) {
                return Err(DatabaseError::Conflict("email already exists".to_string()));
            }
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(false);
        };
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(email) = email {
            user.email = email.to_string();
        }
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[async_trait]
impl UserDataStore for MemoryStore {
    async fn get_favorites(&self, user_key: &str) -> Result<Option<SongList>, DatabaseError> {
        Ok(self.favorites.read().await.get(user_key).cloned())
    }

    async fn put_favorites(&self, user_key: &str, list: SongList) -> Result<(), DatabaseError> {
        self.favorites.write().await.insert(user_key.to_string(), list);
        Ok(())
    }

    async fn get_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
    ) -> Result<Option<SongList>, DatabaseError> {
        let setlists = self.setlists.read().await;
        Ok(setlists.get(&(user_key.to_string(), kind)).cloned())
    }

    async fn put_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
        list: SongList,
    ) -> Result<(), DatabaseError> {
        self.setlists
            .write()
            .await
            .insert((user_key.to_string(), kind), list);
        Ok(())
    }

    async fn ensure_documents(&self, user_key: &str) -> Result<u64, DatabaseError> {
        let mut created = 0;

        let mut favorites = self.favorites.write().await;
        if !favorites.contains_key(user_key) {
            favorites.insert(user_key.to_string(), SongList::default());
            created += 1;
        }
        drop(favorites);

        let mut setlists = self.setlists.write().await;
        for kind in SetlistKind::ALL {
            let key = (user_key.to_string(), kind);
            if !setlists.contains_key(&key) {
                setlists.insert(key, SongList::default());
                created += 1;
            }
        }

        Ok(created)
    }
}
