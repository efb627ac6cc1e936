use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::DatabaseManager;

pub async fn handle(manager: &DatabaseManager, output_format: OutputFormat) -> anyhow::Result<()> {
    manager.ensure_schema().await?;
    output_success(output_format, "Schema is up to date", None)
}
