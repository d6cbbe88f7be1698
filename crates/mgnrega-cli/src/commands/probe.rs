//! Probe command implementation

use crate::cli::ProbeArgs;
use crate::config_loader::load_app_config;
use crate::output::OutputWriter;
use crate::output_types::ProbeOutput;
use anyhow::{Context, Result};
use mgnrega_core::config::CliConfigOverrides;
use mgnrega_ingest::{resolve_state_name, DataGovClient, UpstreamQuery, UpstreamSource};
use std::path::Path;

const SAMPLE_SIZE: usize = 10;

pub async fn execute(args: ProbeArgs, config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let config = load_app_config(config_path, CliConfigOverrides::default())?;
    config
        .require_upstream()
        .context("Cannot reach data.gov.in")?;

    let client = DataGovClient::new(&config.data_gov).context("Failed to build upstream client")?;
    let query = UpstreamQuery {
        state_name: resolve_state_name(args.state_code.as_deref()),
        ..UpstreamQuery::default()
    };

    let page = client
        .fetch_page(&query, 0, SAMPLE_SIZE)
        .await
        .context("Upstream request failed")?;

    // Bare-array responses carry no total
    let total = page.total.filter(|_| !page.records.is_empty());
    let page_limit = config.data_gov.page_limit.max(1) as u64;
    let estimated_pages = total.map(|t| t.div_ceil(page_limit));
    let per_page_secs = config.pipeline.page_delay.as_secs_f64() + 1.0;
    let estimated_minutes =
        estimated_pages.map(|pages| (pages as f64 * per_page_secs / 60.0).ceil() as u64);

    let report = ProbeOutput {
        endpoint: client.endpoint().to_string(),
        sample_records: page.records.len(),
        total,
        estimated_pages,
        estimated_minutes,
    };

    if output.is_json() {
        return output.result(report);
    }

    output.kv("Endpoint", &report.endpoint);
    output.kv("Sample records", report.sample_records);
    match (report.total, report.estimated_pages, report.estimated_minutes) {
        (Some(total), Some(pages), Some(minutes)) => {
            output.kv("Total records", total);
            output.kv("Pages", format!("{} at {} per page", pages, page_limit));
            output.kv("Estimated time", format!("~{} min", minutes));
        }
        _ => output.warning("Upstream did not report a total"),
    }

    if report.sample_records == 0 {
        output.warning("Upstream returned no records for this query");
    } else {
        output.success("Upstream is reachable");
    }
    Ok(())
}
