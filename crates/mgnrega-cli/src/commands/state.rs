//! State command implementation

use crate::cli::StateArgs;
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use crate::output_types::StateOutput;
use crate::storage::Storage;
use anyhow::{Context, Result};
use mgnrega_analytics::{performance_category, AggregationEngine};
use mgnrega_core::calendar::format_amount;
use mgnrega_core::models::RecordFilter;
use std::path::Path;
use tabled::Tabled;

#[derive(Tabled)]
struct DistrictRow {
    #[tabled(rename = "#")]
    rank: usize,
    #[tabled(rename = "District")]
    district: String,
    #[tabled(rename = "Workdays")]
    workdays: String,
    #[tabled(rename = "Persons")]
    persons_worked: i64,
    #[tabled(rename = "Expenditure")]
    expenditure: String,
    #[tabled(rename = "vs avg")]
    vs_state_average: String,
    #[tabled(rename = "Category")]
    category: String,
}

pub async fn execute(
    args: StateArgs,
    config_path: Option<&Path>,
    storage: &Storage,
    output: &OutputWriter,
) -> Result<()> {
    let state_code = match args.state_code {
        Some(code) => code,
        None => load_config(config_path)?
            .build()
            .context("Invalid configuration")?
            .default_state_code,
    };

    let engine = AggregationEngine::new(storage.records.clone());
    let filter = RecordFilter::state(&state_code).financial_year(args.financial_year.as_deref());
    let latest = storage.records.latest_record(&filter).await?;

    let Some(latest) = latest else {
        if output.is_json() {
            return output.result(StateOutput {
                state_code,
                financial_year: args.financial_year,
                month: None,
                summary: None,
                top_districts: Vec::new(),
            });
        }
        output.warning(format!(
            "No records found for state {}. Run 'mgnrega etl' first.",
            state_code
        ));
        return Ok(());
    };

    let summary = engine
        .state_summary(&state_code, Some(latest.financial_year.as_str()), Some(latest.month))
        .await?;
    let top = engine
        .top_districts(&state_code, &latest.financial_year, latest.month, args.top)
        .await?;

    if output.is_json() {
        return output.result(StateOutput {
            state_code,
            financial_year: Some(latest.financial_year),
            month: Some(latest.month),
            summary,
            top_districts: top,
        });
    }

    output.section(format!(
        "State {}: FY {} month {}",
        state_code, latest.financial_year, latest.month
    ));

    let average = summary.as_ref().map_or(0.0, |s| s.workdays_per_district());
    if let Some(summary) = &summary {
        output.kv("Districts reporting", summary.district_count);
        output.kv("Persons worked", summary.total_persons_worked);
        output.kv("Workdays generated", format!("{:.0}", summary.total_workdays_generated));
        output.kv("Workdays per person", format!("{:.2}", summary.average_workdays_per_person));
        output.kv("Expenditure", format_amount(summary.total_expenditure));
    }

    let districts = storage.districts.list_districts(Some(state_code.as_str())).await?;

    output.section("Top districts");
    let rows = top
        .into_iter()
        .enumerate()
        .map(|(idx, totals)| {
            let vs = if average > 0.0 {
                (totals.workdays_generated - average) / average * 100.0
            } else {
                0.0
            };
            let district = districts
                .iter()
                .find(|d| d.district_code == totals.district_code)
                .map(|d| d.district_name.clone())
                .unwrap_or_else(|| totals.district_code.clone());
            DistrictRow {
                rank: idx + 1,
                district,
                workdays: format!("{:.0}", totals.workdays_generated),
                persons_worked: totals.persons_worked,
                expenditure: format_amount(totals.total_expenditure),
                vs_state_average: format!("{:+.1}%", vs),
                category: format!("{:?}", performance_category(vs)),
            }
        })
        .collect();
    output.table(rows);

    Ok(())
}
