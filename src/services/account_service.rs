use std::sync::Arc;

use once_cell::sync::Lazy;
use uuid::Uuid;

use crate::auth::password::{hash_password, hash_password_blocking, verify_password_blocking};
use crate::auth::{AuthError, Identity, TokenIssuer};
use crate::database::models::{NewUser, UserSummary};
use crate::database::{CredentialStore, DatabaseError, UserDataStore};

#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    #[error("{0}")]
    MissingFields(String),
    #[error("Email already registered")]
    EmailTaken,
    /// Deliberately the same for unknown email and wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Administrators cannot demote themselves")]
    SelfDemotion,
    #[error("User not found")]
    UserNotFound,
    #[error("Local sign-in is disabled")]
    LocalSignInDisabled,
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

// Verified against on unknown emails so both login failure paths cost one hash
static TIMING_GUARD_HASH: Lazy<String> =
    Lazy::new(|| hash_password("songbook-timing-guard").unwrap_or_default());

/// Registration, login and admin-flag management
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn CredentialStore>,
    user_data: Arc<dyn UserDataStore>,
    issuer: Option<TokenIssuer>,
}

impl AccountService {
    /// `issuer` is `None` when the deployment verifies externally issued tokens only.
    pub fn new(
        users: Arc<dyn CredentialStore>,
        user_data: Arc<dyn UserDataStore>,
        issuer: Option<TokenIssuer>,
    ) -> Self {
        Self {
            users,
            user_data,
            issuer,
        }
    }

    fn issuer(&self) -> Result<&TokenIssuer, AccountError> {
        self.issuer.as_ref().ok_or(AccountError::LocalSignInDisabled)
    }

    /// Creates the account, provisions its empty documents and returns a session token.
    ///
    /// Provisioning is not atomic with the insert: if it fails the account still
    /// exists and readers see empty documents.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<String, AccountError> {
        let issuer = self.issuer()?;

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            return Err(AccountError::MissingFields(
                "Email and password are required".to_string(),
            ));
        }

        if self.users.find_by_email(email).await?.is_some() {
            tracing::info!("Registration rejected, email already in use");
            return Err(AccountError::EmailTaken);
        }

        let password_hash = hash_password_blocking(password.to_string()).await?;
        let user = self
            .users
            .insert_user(NewUser {
                email: email.to_string(),
                password_hash,
                name: name.trim().to_string(),
            })
            .await
            .map_err(|e| match e {
                DatabaseError::Conflict(_) => AccountError::EmailTaken,
                other => other.into(),
            })?;

        let key = Identity::Local(user.id).storage_key();
        if let Err(e) = self.user_data.ensure_documents(&key).await {
            tracing::error!(
                "Registered user {} but failed to provision favorites/setlists: {}",
                user.id,
                e
            );
        }

        tracing::info!("Registered user {}", user.id);
        Ok(issuer.issue(&user)?)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<String, AccountError> {
        let issuer = self.issuer()?;

        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            let _ = verify_password_blocking(password.to_string(), TIMING_GUARD_HASH.clone()).await;
            tracing::info!("Login failed: unknown email");
            return Err(AccountError::InvalidCredentials);
        };

        match verify_password_blocking(password.to_string(), user.password_hash.clone()).await {
            Ok(true) => {
                tracing::info!("User {} logged in", user.id);
                Ok(issuer.issue(&user)?)
            }
            Ok(false) => {
                tracing::info!("Login failed: wrong password for user {}", user.id);
                Err(AccountError::InvalidCredentials)
            }
            Err(e) => {
                tracing::error!("Login failed: stored hash for user {} unreadable: {}", user.id, e);
                Err(AccountError::InvalidCredentials)
            }
        }
    }

    pub async fn list_users(&self) -> Result<Vec<UserSummary>, AccountError> {
        let users = self.users.list_users().await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }

    /// Only exact self-demotion is blocked; demoting the last other admin is allowed.
    pub async fn set_admin(
        &self,
        acting_admin: &Identity,
        target: Uuid,
        value: bool,
    ) -> Result<(), AccountError> {
        if acting_admin.local_id() == Some(target) && !value {
            return Err(AccountError::SelfDemotion);
        }

        if !self.users.set_admin(target, value).await? {
            return Err(AccountError::UserNotFound);
        }

        tracing::info!(
            "Admin {} set is_admin={} on user {}",
            acting_admin,
            value,
            target
        );
        Ok(())
    }

    pub async fn health_check(&self) -> Result<(), AccountError> {
        Ok(self.users.health_check().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{LocalVerifier, TokenVerifier};
    use crate::database::MemoryStore;

    const SECRET: &str = "account-service-test-secret";

    fn service() -> (AccountService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let issuer = TokenIssuer::new(SECRET, 168).unwrap();
        (
            AccountService::new(store.clone(), store.clone(), Some(issuer)),
            store,
        )
    }

    #[tokio::test]
    async fn register_then_login_yields_matching_claims() {
        let (accounts, _) = service();
        let verifier = LocalVerifier::new(SECRET).unwrap();

        let a = accounts.register("a@x.com", "pw123", "Alice").await.unwrap();
        let b = accounts.login("a@x.com", "pw123").await.unwrap();

        let a = verifier.verify(&a).await.unwrap();
        let b = verifier.verify(&b).await.unwrap();
        assert_eq!(a.identity, b.identity);
        assert_eq!(b.email, "a@x.com");
        assert!(!a.admin && !b.admin);
    }

    #[tokio::test]
    async fn register_provisions_three_documents() {
        let (accounts, store) = service();
        accounts.register("a@x.com", "pw123", "Alice").await.unwrap();

        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        let key = Identity::Local(user.id).storage_key();
        assert_eq!(store.ensure_documents(&key).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn register_requires_email_and_password() {
        let (accounts, _) = service();
        assert!(matches!(
            accounts.register("", "pw123", "Alice").await,
            Err(AccountError::MissingFields(_))
        ));
        assert!(matches!(
            accounts.register("a@x.com", "", "Alice").await,
            Err(AccountError::MissingFields(_))
        ));
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let (accounts, _) = service();
        accounts.register("a@x.com", "pw123", "Alice").await.unwrap();
        assert!(matches!(
            accounts.register("a@x.com", "other", "Alice 2").await,
            Err(AccountError::EmailTaken)
        ));
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (accounts, _) = service();
        accounts.register("a@x.com", "pw123", "Alice").await.unwrap();

        let unknown = accounts.login("nobody@x.com", "pw123").await.unwrap_err();
        let wrong = accounts.login("a@x.com", "wrong").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, AccountError::InvalidCredentials));
        assert!(matches!(wrong, AccountError::InvalidCredentials));
    }

    #[tokio::test]
    async fn self_demotion_is_rejected_regardless_of_role() {
        let (accounts, store) = service();
        accounts.register("a@x.com", "pw123", "Alice").await.unwrap();
        let alice = store.find_by_email("a@x.com").await.unwrap().unwrap();

        for is_admin in [false, true] {
            store.set_admin(alice.id, is_admin).await.unwrap();
            assert!(matches!(
                accounts.set_admin(&Identity::Local(alice.id), alice.id, false).await,
                Err(AccountError::SelfDemotion)
            ));
        }

        // Ids that resolve to nobody are still caught by the guard first
        let ghost = Uuid::new_v4();
        assert!(matches!(
            accounts.set_admin(&Identity::Local(ghost), ghost, false).await,
            Err(AccountError::SelfDemotion)
        ));
    }

    #[tokio::test]
    async fn set_admin_on_unknown_user_is_not_found() {
        let (accounts, _) = service();
        assert!(matches!(
            accounts.set_admin(&Identity::Local(Uuid::new_v4()), Uuid::new_v4(), true).await,
            Err(AccountError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn promoted_user_gets_admin_claim_on_next_login() {
        let (accounts, store) = service();
        let verifier = LocalVerifier::new(SECRET).unwrap();
        let before = accounts.register("a@x.com", "pw123", "Alice").await.unwrap();
        let alice = store.find_by_email("a@x.com").await.unwrap().unwrap();

        accounts.set_admin(&Identity::Federated("auth0|mod".into()), alice.id, true).await.unwrap();
        let after = accounts.login("a@x.com", "pw123").await.unwrap();

        // Existing tokens keep the flag they were issued with
        assert!(!verifier.verify(&before).await.unwrap().admin);
        assert!(verifier.verify(&after).await.unwrap().admin);
    }

    #[tokio::test]
    async fn sign_in_disabled_without_issuer() {
        let store = Arc::new(MemoryStore::new());
        let accounts = AccountService::new(store.clone(), store, None);
        assert!(matches!(
            accounts.register("a@x.com", "pw123", "Alice").await,
            Err(AccountError::LocalSignInDisabled)
        ));
        assert!(matches!(
            accounts.login("a@x.com", "pw123").await,
            Err(AccountError::LocalSignInDisabled)
        ));
    }

    #[tokio::test]
    async fn listed_users_exclude_password_hash() {
        let (accounts, _) = service();
        accounts.register("a@x.com", "pw123", "Alice").await.unwrap();
        let users = accounts.list_users().await.unwrap();
        assert_eq!(users.len(), 1);

        let json = serde_json::to_value(&users).unwrap();
        assert!(json[0].get("passwordHash").is_none());
        assert!(json[0].get("password_hash").is_none());
        assert_eq!(json[0]["isAdmin"], false);
    }
}
