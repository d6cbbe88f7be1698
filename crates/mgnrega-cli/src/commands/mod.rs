//! Command implementations

mod check;
mod config;
mod coordinates;
mod db;
mod district;
mod etl;
mod nearest;
mod probe;
mod state;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use crate::storage::Storage;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Etl(args) => {
            let storage = Storage::new(cli.storage).await?;
            etl::execute(args, config_path, &storage, &output).await
        }
        Commands::Check => check::execute(&Storage::new(cli.storage).await?, &output).await,
        Commands::District(args) => {
            district::execute(args, &Storage::new(cli.storage).await?, &output).await
        }
        Commands::State(args) => {
            let storage = Storage::new(cli.storage).await?;
            state::execute(args, config_path, &storage, &output).await
        }
        Commands::Nearest(args) => {
            nearest::execute(args, &Storage::new(cli.storage).await?, &output).await
        }
        Commands::Coordinates(args) => {
            coordinates::execute(args, &Storage::new(cli.storage).await?, &output).await
        }
        Commands::Probe(args) => probe::execute(args, config_path, &output).await,
        Commands::Config => config::execute(config_path, &output),
        Commands::Db(args) => db::execute(args, &output).await,
    }
}
