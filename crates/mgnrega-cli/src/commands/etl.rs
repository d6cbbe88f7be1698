//! Etl command implementation

use crate::cli::EtlArgs;
use crate::config_loader::load_app_config;
use crate::output::OutputWriter;
use crate::output_types::EtlOutput;
use crate::storage::Storage;
use anyhow::{Context, Result};
use mgnrega_core::config::CliConfigOverrides;
use mgnrega_ingest::{DataGovClient, IngestionPipeline, IngestionRequest};
use mgnrega_store::cache;
use std::path::Path;
use std::sync::Arc;

pub async fn execute(
    args: EtlArgs,
    config_path: Option<&Path>,
    storage: &Storage,
    output: &OutputWriter,
) -> Result<()> {
    let config = load_app_config(
        config_path,
        CliConfigOverrides {
            default_state_code: None,
            page_limit: args.page_limit,
            request_timeout_ms: args.timeout_ms,
            page_backoff_ms: args.page_backoff_ms,
        },
    )?;
    config
        .require_upstream()
        .context("Cannot fetch from data.gov.in")?;

    if storage.is_ephemeral() {
        output.warning("Using in-memory storage; fetched records are discarded on exit. Pass --storage postgres to keep them.");
    }

    // Clears dashboards cached by API servers sharing the same Redis
    let (cache, cache_backend) = cache::from_env().await;
    if cache_backend == "memory" && !storage.is_ephemeral() {
        output.warning(format!(
            "{} not set or unreachable; dashboards cached by a running API server expire on their TTL",
            cache::REDIS_URL_ENV
        ));
    }

    let client = DataGovClient::new(&config.data_gov).context("Failed to build upstream client")?;
    let pipeline = IngestionPipeline::new(
        Arc::new(client),
        storage.records.clone(),
        storage.districts.clone(),
        &config,
    )
    .with_cache(cache)
    .with_lease(storage.lease.clone());

    let request = IngestionRequest {
        state_code: args.state_code.clone(),
        financial_year: args.financial_year.clone(),
        month: args.month,
    };

    output.info(format!(
        "Running ETL for state {} (financial year {}, month {})",
        request.state_code.as_deref().unwrap_or(&config.default_state_code),
        request.financial_year.as_deref().unwrap_or("all"),
        request.month.map_or_else(|| "all".to_string(), |m| m.to_string()),
    ));

    let summary = if args.exclusive {
        let holder = format!("cli-{}", uuid::Uuid::new_v4());
        pipeline.run_exclusive(&request, &holder).await?
    } else {
        Some(pipeline.run(&request).await?)
    };

    if output.is_json() {
        return output.result(EtlOutput {
            state_code: request.state_code,
            financial_year: request.financial_year,
            month: request.month,
            ran: summary.is_some(),
            summary,
        });
    }

    let Some(summary) = summary else {
        output.warning("Another ingestion run holds the lease; nothing was done");
        return Ok(());
    };

    output.section("ETL Summary");
    output.kv("Records processed", summary.processed);
    output.kv("Districts", summary.districts);
    output.kv("Rejected records", summary.rejected);
    output.kv("Errors", summary.errors);

    if summary.aborted {
        output.warning("Run stopped after repeated upstream failures; re-run to fetch the remaining pages");
    } else if summary.errors > 0 {
        output.warning("Some pages failed; check the logs and consider re-running");
    } else {
        output.success("ETL completed successfully");
    }

    Ok(())
}
