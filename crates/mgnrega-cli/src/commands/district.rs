//! District command implementation

use crate::cli::DistrictArgs;
use crate::output::OutputWriter;
use crate::output_types::DistrictOutput;
use crate::storage::Storage;
use anyhow::{bail, Result};
use mgnrega_analytics::{calculate_trends, AggregationEngine};
use mgnrega_core::calendar::format_amount;
use mgnrega_core::models::CanonicalRecord;
use tabled::Tabled;

#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "FY")]
    financial_year: String,
    #[tabled(rename = "Month")]
    month: u8,
    #[tabled(rename = "Year")]
    year: i32,
    #[tabled(rename = "Persons")]
    persons_worked: i64,
    #[tabled(rename = "Workdays")]
    workdays: String,
    #[tabled(rename = "Expenditure")]
    expenditure: String,
    #[tabled(rename = "Works done")]
    works_completed: i64,
}

pub async fn execute(args: DistrictArgs, storage: &Storage, output: &OutputWriter) -> Result<()> {
    let Some(district) = storage.districts.get_district(&args.code).await? else {
        bail!("District {} not found. Run 'mgnrega etl' to populate districts.", args.code);
    };

    let engine = AggregationEngine::new(storage.records.clone());
    let totals = engine
        .aggregate_district(&args.code, args.financial_year.as_deref())
        .await?;
    let history = engine.trend(&args.code, args.months).await?;
    let ordered: Vec<CanonicalRecord> = history.iter().map(|d| d.record.clone()).collect();
    let trends = calculate_trends(&ordered);

    if output.is_json() {
        return output.result(DistrictOutput {
            district,
            totals,
            trends,
            history,
        });
    }

    output.section(format!(
        "{} ({}), {}",
        district.district_name, district.district_code, district.state_name
    ));

    let Some(totals) = totals else {
        output.warning("No monthly data for this district yet. Run 'mgnrega etl'.");
        return Ok(());
    };

    output.kv("Periods", totals.record_count);
    output.kv("Persons worked", totals.total_persons_worked);
    output.kv("Households worked", totals.total_households_worked);
    output.kv("Workdays generated", format!("{:.0}", totals.total_workdays_generated));
    output.kv("Workdays per person", format!("{:.2}", totals.average_workdays_per_person));
    output.kv("Expenditure", format_amount(totals.total_expenditure));
    output.kv("Works completed", totals.total_works_completed);

    output.section("Trend vs previous period");
    output.kv(
        "Workdays",
        format!("{:?} ({:+.2}%)", trends.workdays_trend, trends.workdays_change),
    );
    output.kv(
        "Expenditure",
        format!("{:?} ({:+.2}%)", trends.expenditure_trend, trends.expenditure_change),
    );
    output.kv(
        "Works completed",
        format!("{:?} ({:+.2}%)", trends.works_trend, trends.works_change),
    );

    output.section("Recent periods");
    let rows = history
        .into_iter()
        .map(|dated| PeriodRow {
            year: dated.year,
            financial_year: dated.record.financial_year,
            month: dated.record.month,
            persons_worked: dated.record.persons_worked,
            workdays: format!("{:.0}", dated.record.workdays_generated),
            expenditure: format_amount(dated.record.total_expenditure),
            works_completed: dated.record.works_completed,
        })
        .collect();
    output.table(rows);

    Ok(())
}
