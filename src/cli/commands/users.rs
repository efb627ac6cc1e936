use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_empty_collection;
use crate::cli::OutputFormat;
use crate::database::models::UserSummary;
use crate::database::CredentialStore;

#[derive(Subcommand)]
pub enum UsersCommands {
    #[command(about = "List all accounts")]
    List,
}

pub async fn handle(
    cmd: UsersCommands,
    users: &dyn CredentialStore,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    match cmd {
        UsersCommands::List => {
            let users: Vec<UserSummary> = users
                .list_users()
                .await?
                .into_iter()
                .map(UserSummary::from)
                .collect();

            if users.is_empty() {
                return output_empty_collection(output_format, "users", "No accounts registered");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<36}  {:<5}  {:<30}  NAME", "ID", "ADMIN", "EMAIL");
                    for user in &users {
                        println!(
                            "{:<36}  {:<5}  {:<30}  {}",
                            user.id,
                            if user.is_admin { "yes" } else { "no" },
                            user.email,
                            user.name
                        );
                    }
                }
            }
            Ok(())
        }
    }
}
