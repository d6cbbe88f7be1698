//! Check command implementation

use crate::output::OutputWriter;
use crate::output_types::{CheckOutput, LatestRecordInfo};
use crate::storage::Storage;
use anyhow::Result;
use mgnrega_core::models::RecordFilter;

pub async fn execute(storage: &Storage, output: &OutputWriter) -> Result<()> {
    let districts = storage.districts.list_districts(None).await?;
    let districts_with_coordinates = districts.iter().filter(|d| d.coordinates.is_some()).count();

    let all = RecordFilter::default();
    let record_count = storage.records.count_records(&all).await?;

    let latest = match storage.records.latest_record(&all).await? {
        Some(record) => {
            let district_name = districts
                .iter()
                .find(|d| d.district_code == record.district_code)
                .map(|d| d.district_name.clone());
            Some(LatestRecordInfo {
                financial_year: record.financial_year,
                month: record.month,
                district_code: record.district_code,
                district_name,
                workdays_generated: record.workdays_generated,
            })
        }
        None => None,
    };

    let districts_with_data = storage.records.districts_with_data().await?.len();
    let financial_years = storage.records.financial_years().await?;

    let report = CheckOutput {
        district_count: districts.len(),
        districts_with_coordinates,
        record_count,
        latest,
        districts_with_data,
        financial_years,
    };

    if output.is_json() {
        return output.result(report);
    }

    output.section("Districts");
    output.kv("Stored", report.district_count);
    output.kv("With coordinates", report.districts_with_coordinates);
    if report.district_count > 0 && report.districts_with_coordinates == 0 {
        output.warning("No districts have coordinates; geolocation falls back to the first district");
    }

    output.section("Monthly Records");
    output.kv("Stored", report.record_count);
    if let Some(latest) = &report.latest {
        output.kv(
            "Latest",
            format!("FY {} month {}", latest.financial_year, latest.month),
        );
        output.kv(
            "District",
            latest.district_name.as_deref().unwrap_or(&latest.district_code),
        );
        output.kv("Workdays", format!("{:.0}", latest.workdays_generated));
    }
    output.kv("Districts with data", report.districts_with_data);
    output.kv("Financial years", report.financial_years.join(", "));

    if report.district_count == 0 {
        output.warning("No districts found. Run 'mgnrega etl' to populate data.");
    } else if report.record_count == 0 {
        output.warning("Districts exist but there is no monthly data. Run 'mgnrega etl'.");
    } else {
        output.success("Data is available");
    }

    Ok(())
}
