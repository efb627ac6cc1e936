use anyhow::anyhow;
use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::User;
use crate::database::CredentialStore;

#[derive(Subcommand)]
pub enum AdminCommands {
    #[command(about = "Make an account an administrator")]
    Grant {
        #[arg(help = "Account email")]
        email: String,
    },

    #[command(about = "Remove administrator rights from an account")]
    Revoke {
        #[arg(help = "Account email")]
        email: String,
    },
}

pub async fn handle(
    cmd: AdminCommands,
    users: &dyn CredentialStore,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let (email, value) = match cmd {
        AdminCommands::Grant { email } => (email, true),
        AdminCommands::Revoke { email } => (email, false),
    };

    let user = set_admin_by_email(users, &email, value).await?;
    let verb = if value { "granted to" } else { "revoked from" };

    output_success(
        output_format,
        &format!("Admin rights {} {}", verb, user.email),
        Some(json!({ "id": user.id, "email": user.email, "isAdmin": value })),
    )
}

/// Operator-side flag change; bypasses the HTTP self-demotion guard.
pub async fn set_admin_by_email(
    users: &dyn CredentialStore,
    email: &str,
    value: bool,
) -> anyhow::Result<User> {
    let mut user = users
        .find_by_email(email.trim())
        .await?
        .ok_or_else(|| anyhow!("No account registered for {}", email))?;

    if !users.set_admin(user.id, value).await? {
        return Err(anyhow!("Account {} disappeared during update", user.id));
    }

    tracing::info!("Operator set is_admin={} on user {}", value, user.id);
    user.is_admin = value;
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn grant_then_revoke_by_email() {
        let store = MemoryStore::new();
        let alice = store
            .insert_user(NewUser {
                email: "a@x.com".into(),
                password_hash: String::new(),
                name: "Alice".into(),
            })
            .await
            .unwrap();

        assert!(set_admin_by_email(&store, "a@x.com", true).await.unwrap().is_admin);
        assert!(store.find_by_id(alice.id).await.unwrap().unwrap().is_admin);

        set_admin_by_email(&store, "a@x.com", false).await.unwrap();
        assert!(!store.find_by_id(alice.id).await.unwrap().unwrap().is_admin);
    }

    #[tokio::test]
    async fn unknown_email_is_an_error() {
        let store = MemoryStore::new();
        let err = set_admin_by_email(&store, "ghost@x.com", true).await.unwrap_err();
        assert!(err.to_string().contains("ghost@x.com"));
    }
}
