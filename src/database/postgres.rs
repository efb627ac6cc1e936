use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, SetlistKind, SongList, User};
use crate::database::repository::{CredentialStore, UserDataStore};

const USER_COLUMNS: &str = "id, email, password_hash, name, is_admin, created_at";

/// PostgreSQL-backed store for users, favorites and setlists
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, name, is_admin)
             VALUES ($1, $2, $3, $4, FALSE)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "email"))
    }

    async fn list_users(&self) -> Result<Vec<User>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY created_at",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn set_admin(&self, id: Uuid, value: bool) -> Result<bool, DatabaseError> {
        let result = sqlx::query("UPDATE users SET is_admin = $2 WHERE id = $1")
            .bind(id)
            .bind(value)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            "UPDATE users
             SET name = COALESCE($2, name), email = COALESCE($3, email)
             WHERE id = $1",
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| DatabaseError::from_write(e, "email"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl UserDataStore for PgStore {
    async fn get_favorites(&self, user_key: &str) -> Result<Option<SongList>, DatabaseError> {
        let list = sqlx::query_as::<_, SongList>(
            "SELECT songs, name FROM favorites WHERE user_key = $1",
        )
        .bind(user_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(list)
    }

    async fn put_favorites(&self, user_key: &str, list: SongList) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO favorites (user_key, songs, name, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (user_key)
             DO UPDATE SET songs = EXCLUDED.songs, name = EXCLUDED.name, updated_at = now()",
        )
        .bind(user_key)
        .bind(&list.songs)
        .bind(&list.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
    ) -> Result<Option<SongList>, DatabaseError> {
        let list = sqlx::query_as::<_, SongList>(
            "SELECT songs, name FROM setlists WHERE user_key = $1 AND kind = $2",
        )
        .bind(user_key)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(list)
    }

    async fn put_setlist(
        &self,
        user_key: &str,
        kind: SetlistKind,
        list: SongList,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO setlists (user_key, kind, songs, name, updated_at)
             VALUES ($1, $2, $3, $4, now())
             ON CONFLICT (user_key, kind)
             DO UPDATE SET songs = EXCLUDED.songs, name = EXCLUDED.name, updated_at = now()",
        )
        .bind(user_key)
        .bind(kind.as_str())
        .bind(&list.songs)
        .bind(&list.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn ensure_documents(&self, user_key: &str) -> Result<u64, DatabaseError> {
        let mut created = sqlx::query(
            "INSERT INTO favorites (user_key) VALUES ($1) ON CONFLICT (user_key) DO NOTHING",
        )
        .bind(user_key)
        .execute(&self.pool)
        .await?
        .rows_affected();

        for kind in SetlistKind::ALL {
            created += sqlx::query(
                "INSERT INTO setlists (user_key, kind) VALUES ($1, $2)
                 ON CONFLICT (user_key, kind) DO NOTHING",
            )
            .bind(user_key)
            .bind(kind.as_str())
            .execute(&self.pool)
            .await?
            .rows_affected();
        }

        Ok(created)
    }
}
