use serde::Serialize;
use serde_json::json;

use crate::auth::Identity;
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::{CredentialStore, DatabaseError, UserDataStore};

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub accounts: usize,
    pub documents_created: u64,
}

pub async fn handle(
    users: &dyn CredentialStore,
    data: &dyn UserDataStore,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let report = backfill(users, data).await?;

    output_success(
        output_format,
        &format!(
            "Checked {} accounts, created {} documents",
            report.accounts, report.documents_created
        ),
        Some(json!(report)),
    )
}

/// Provisions whatever favorites/setlist documents registration failed to create.
pub async fn backfill(
    users: &dyn CredentialStore,
    data: &dyn UserDataStore,
) -> Result<BackfillReport, DatabaseError> {
    let mut report = BackfillReport::default();

    for user in users.list_users().await? {
        let created = data
            .ensure_documents(&Identity::Local(user.id).storage_key())
            .await?;
        if created > 0 {
            tracing::info!("Provisioned {} documents for user {}", created, user.id);
        }
        report.accounts += 1;
        report.documents_created += created;
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewUser;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn backfill_is_idempotent() {
        let store = MemoryStore::new();
        for email in ["a@x.com", "b@x.com"] {
            store
                .insert_user(NewUser {
                    email: email.into(),
                    password_hash: String::new(),
                    name: String::new(),
                })
                .await
                .unwrap();
        }

        let first = backfill(&store, &store).await.unwrap();
        assert_eq!(first, BackfillReport { accounts: 2, documents_created: 6 });

        let second = backfill(&store, &store).await.unwrap();
        assert_eq!(second, BackfillReport { accounts: 2, documents_created: 0 });
    }
}
