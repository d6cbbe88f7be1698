//! Db command implementation

use crate::cli::{DbArgs, DbCommand};
use crate::output::OutputWriter;
use crate::output_types::MigrationEntry;
use crate::storage::connect_postgres;
use anyhow::{Context, Result};
use tabled::Tabled;

#[derive(Tabled)]
struct MigrationRow {
    #[tabled(rename = "Version")]
    version: i64,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Applied")]
    applied: &'static str,
}

/// Execute database management commands
pub async fn execute(args: DbArgs, output: &OutputWriter) -> Result<()> {
    let store = connect_postgres(false).await?;

    match args.command {
        DbCommand::Status => {
            let status = store
                .migration_status()
                .await
                .context("Failed to read migration status")?;
            let entries: Vec<MigrationEntry> = status
                .into_iter()
                .map(|m| MigrationEntry {
                    version: m.version,
                    description: m.description,
                    applied: m.applied,
                })
                .collect();

            if output.is_json() {
                return output.result(entries);
            }

            output.section("Migrations");
            let pending = entries.iter().filter(|m| !m.applied).count();
            output.table(
                entries
                    .into_iter()
                    .map(|m| MigrationRow {
                        version: m.version,
                        description: m.description,
                        applied: if m.applied { "✓" } else { "✗" },
                    })
                    .collect(),
            );
            if pending > 0 {
                output.warning(format!(
                    "{} pending migration(s). Run 'mgnrega db migrate'.",
                    pending
                ));
            }
        }
        DbCommand::Migrate => {
            output.info("Applying migrations...");
            store
                .run_migrations()
                .await
                .context("Failed to apply migrations")?;
            let version = store.current_version().await?;
            output.success(format!(
                "Database is at version {}",
                version.map_or_else(|| "none".to_string(), |v| v.to_string())
            ));
        }
    }

    Ok(())
}
