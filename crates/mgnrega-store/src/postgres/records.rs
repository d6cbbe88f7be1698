use async_trait::async_trait;
use mgnrega_core::error::{MgnregaError, Result};
use mgnrega_core::models::{
    CanonicalRecord, DistrictTotals, MetricSums, PeriodTotals, RecordFilter, RecordKey,
};
use sqlx::postgres::PgRow;
use sqlx::{Postgres, QueryBuilder, Row};
use std::collections::HashMap;

use super::{db_error, PostgresStore};
use crate::ports::RecordStore;

const RECORD_COLUMNS: &str = "district_code, state_code, financial_year, financial_year_start, \
     month, persons_worked, households_worked, workdays_generated, workdays_per_person, \
     total_expenditure, wage_expenditure, material_expenditure, works_completed, \
     works_in_progress, works_sanctioned, persons_demanded, avg_wage_rate";

/// Append a WHERE clause for the filter; every value goes through a bind parameter
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &RecordFilter) {
    builder.push(" WHERE TRUE");
    if let Some(code) = &filter.district_code {
        builder.push(" AND district_code = ").push_bind(code.clone());
    }
    if let Some(code) = &filter.state_code {
        builder.push(" AND state_code = ").push_bind(code.clone());
    }
    if let Some(fy) = &filter.financial_year {
        builder.push(" AND financial_year = ").push_bind(fy.clone());
    }
    if let Some(month) = filter.month {
        builder.push(" AND month = ").push_bind(i16::from(month));
    }
}

fn month_from_row(row: &PgRow) -> Result<u8> {
    let month: i16 = row.try_get("month").map_err(db_error("Failed to read month"))?;
    u8::try_from(month)
        .map_err(|_| MgnregaError::Storage(format!("Stored month {} is out of range", month)))
}

fn record_from_row(row: &PgRow) -> Result<CanonicalRecord> {
    let get = db_error("Failed to decode record row");
    Ok(CanonicalRecord {
        district_code: row.try_get("district_code").map_err(&get)?,
        state_code: row.try_get("state_code").map_err(&get)?,
        financial_year: row.try_get("financial_year").map_err(&get)?,
        financial_year_start: row.try_get("financial_year_start").map_err(&get)?,
        month: month_from_row(row)?,
        persons_worked: row.try_get("persons_worked").map_err(&get)?,
        households_worked: row.try_get("households_worked").map_err(&get)?,
        workdays_generated: row.try_get("workdays_generated").map_err(&get)?,
        workdays_per_person: row.try_get("workdays_per_person").map_err(&get)?,
        total_expenditure: row.try_get("total_expenditure").map_err(&get)?,
        wage_expenditure: row.try_get("wage_expenditure").map_err(&get)?,
        material_expenditure: row.try_get("material_expenditure").map_err(&get)?,
        works_completed: row.try_get("works_completed").map_err(&get)?,
        works_in_progress: row.try_get("works_in_progress").map_err(&get)?,
        works_sanctioned: row.try_get("works_sanctioned").map_err(&get)?,
        persons_demanded: row.try_get("persons_demanded").map_err(&get)?,
        avg_wage_rate: row.try_get("avg_wage_rate").map_err(&get)?,
    })
}

/// Keep the last occurrence of each key.
///
/// PostgreSQL rejects an INSERT ... ON CONFLICT that touches the same row twice.
fn dedupe_by_key(records: &[CanonicalRecord]) -> Vec<&CanonicalRecord> {
    let mut positions: HashMap<RecordKey, usize> = HashMap::new();
    let mut unique: Vec<&CanonicalRecord> = Vec::with_capacity(records.len());
    for record in records {
        match positions.get(&record.key()) {
            Some(&idx) => unique[idx] = record,
            None => {
                positions.insert(record.key(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

#[async_trait]
impl RecordStore for PostgresStore {
    async fn upsert_records(&self, records: &[CanonicalRecord]) -> Result<u64> {
        let unique = dedupe_by_key(records);
        if unique.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("INSERT INTO mgnrega_records ({}) ", RECORD_COLUMNS));
        builder.push_values(unique, |mut b, r| {
            b.push_bind(r.district_code.clone())
                .push_bind(r.state_code.clone())
                .push_bind(r.financial_year.clone())
                .push_bind(r.financial_year_start)
                .push_bind(i16::from(r.month))
                .push_bind(r.persons_worked)
                .push_bind(r.households_worked)
                .push_bind(r.workdays_generated)
                .push_bind(r.workdays_per_person)
                .push_bind(r.total_expenditure)
                .push_bind(r.wage_expenditure)
                .push_bind(r.material_expenditure)
                .push_bind(r.works_completed)
                .push_bind(r.works_in_progress)
                .push_bind(r.works_sanctioned)
                .push_bind(r.persons_demanded)
                .push_bind(r.avg_wage_rate);
        });
        builder.push(
            r#"
            ON CONFLICT (district_code, financial_year, month) DO UPDATE
            SET state_code = EXCLUDED.state_code,
                financial_year_start = EXCLUDED.financial_year_start,
                persons_worked = EXCLUDED.persons_worked,
                households_worked = EXCLUDED.households_worked,
                workdays_generated = EXCLUDED.workdays_generated,
                workdays_per_person = EXCLUDED.workdays_per_person,
                total_expenditure = EXCLUDED.total_expenditure,
                wage_expenditure = EXCLUDED.wage_expenditure,
                material_expenditure = EXCLUDED.material_expenditure,
                works_completed = EXCLUDED.works_completed,
                works_in_progress = EXCLUDED.works_in_progress,
                works_sanctioned = EXCLUDED.works_sanctioned,
                persons_demanded = EXCLUDED.persons_demanded,
                avg_wage_rate = EXCLUDED.avg_wage_rate,
                updated_at = NOW()
            "#,
        );

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to upsert records"))?;
        Ok(result.rows_affected())
    }

    async fn find_records(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<CanonicalRecord>> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {} FROM mgnrega_records", RECORD_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY financial_year_start DESC, month DESC, district_code ASC");
        if let Some(limit) = limit {
            builder.push(" LIMIT ").push_bind(sql_limit(limit));
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to query records"))?;
        rows.iter().map(record_from_row).collect()
    }

    async fn sum_metrics(&self, filter: &RecordFilter) -> Result<MetricSums> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT COALESCE(SUM(persons_worked), 0)::BIGINT AS persons_worked,
                   COALESCE(SUM(households_worked), 0)::BIGINT AS households_worked,
                   COALESCE(SUM(workdays_generated), 0)::DOUBLE PRECISION AS workdays_generated,
                   COALESCE(SUM(total_expenditure), 0)::DOUBLE PRECISION AS total_expenditure,
                   COALESCE(SUM(works_completed), 0)::BIGINT AS works_completed,
                   COALESCE(SUM(works_in_progress), 0)::BIGINT AS works_in_progress,
                   COALESCE(SUM(works_sanctioned), 0)::BIGINT AS works_sanctioned,
                   COUNT(*) AS record_count,
                   COUNT(DISTINCT district_code) AS district_count
            FROM mgnrega_records
            "#,
        );
        push_filter(&mut builder, filter);

        let row = builder
            .build()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to sum metrics"))?;

        let get = db_error("Failed to decode metric sums");
        Ok(MetricSums {
            total_persons_worked: row.try_get("persons_worked").map_err(&get)?,
            total_households_worked: row.try_get("households_worked").map_err(&get)?,
            total_workdays_generated: row.try_get("workdays_generated").map_err(&get)?,
            total_expenditure: row.try_get("total_expenditure").map_err(&get)?,
            total_works_completed: row.try_get("works_completed").map_err(&get)?,
            total_works_in_progress: row.try_get("works_in_progress").map_err(&get)?,
            total_works_sanctioned: row.try_get("works_sanctioned").map_err(&get)?,
            record_count: row.try_get::<i64, _>("record_count").map_err(&get)? as u64,
            district_count: row.try_get::<i64, _>("district_count").map_err(&get)? as u64,
        })
    }

    async fn period_totals(
        &self,
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<PeriodTotals>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT financial_year, financial_year_start, month,
                   COALESCE(SUM(persons_worked), 0)::BIGINT AS persons_worked,
                   COALESCE(SUM(households_worked), 0)::BIGINT AS households_worked,
                   COALESCE(SUM(workdays_generated), 0)::DOUBLE PRECISION AS workdays_generated,
                   COALESCE(SUM(total_expenditure), 0)::DOUBLE PRECISION AS total_expenditure,
                   COALESCE(SUM(works_completed), 0)::BIGINT AS works_completed
            FROM mgnrega_records
            "#,
        );
        push_filter(&mut builder, filter);
        builder.push(
            " GROUP BY financial_year, financial_year_start, month \
             ORDER BY financial_year_start DESC, month DESC LIMIT ",
        );
        builder.push_bind(sql_limit(limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to aggregate periods"))?;

        let get = db_error("Failed to decode period totals");
        rows.iter()
            .map(|row| {
                let financial_year: String = row.try_get("financial_year").map_err(&get)?;
                let start: i32 = row.try_get("financial_year_start").map_err(&get)?;
                let mut totals = PeriodTotals::empty(financial_year, start, month_from_row(row)?);
                totals.total_persons_worked = row.try_get("persons_worked").map_err(&get)?;
                totals.total_households_worked = row.try_get("households_worked").map_err(&get)?;
                totals.total_workdays_generated =
                    row.try_get("workdays_generated").map_err(&get)?;
                totals.total_expenditure = row.try_get("total_expenditure").map_err(&get)?;
                totals.total_works_completed = row.try_get("works_completed").map_err(&get)?;
                Ok(totals)
            })
            .collect()
    }

    async fn district_totals(
        &self,
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<DistrictTotals>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            r#"
            SELECT district_code,
                   COALESCE(SUM(workdays_generated), 0)::DOUBLE PRECISION AS workdays_generated,
                   COALESCE(SUM(persons_worked), 0)::BIGINT AS persons_worked,
                   COALESCE(SUM(total_expenditure), 0)::DOUBLE PRECISION AS total_expenditure
            FROM mgnrega_records
            "#,
        );
        push_filter(&mut builder, filter);
        builder.push(
            " GROUP BY district_code ORDER BY workdays_generated DESC, district_code ASC LIMIT ",
        );
        builder.push_bind(sql_limit(limit));

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to rank districts"))?;

        let get = db_error("Failed to decode district totals");
        rows.iter()
            .map(|row| {
                Ok(DistrictTotals {
                    district_code: row.try_get("district_code").map_err(&get)?,
                    workdays_generated: row.try_get("workdays_generated").map_err(&get)?,
                    persons_worked: row.try_get("persons_worked").map_err(&get)?,
                    total_expenditure: row.try_get("total_expenditure").map_err(&get)?,
                })
            })
            .collect()
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM mgnrega_records");
        push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count records"))?;
        Ok(count as u64)
    }

    async fn financial_years(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            r#"
            SELECT financial_year FROM mgnrega_records
            GROUP BY financial_year, financial_year_start
            ORDER BY financial_year_start DESC, financial_year DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list financial years"))
    }

    async fn districts_with_data(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(
            "SELECT DISTINCT district_code FROM mgnrega_records ORDER BY district_code",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list districts with data"))
    }
}

/// LIMIT value for a caller-supplied row count; saturates instead of wrapping negative
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: &str, month: u8, workdays: f64) -> CanonicalRecord {
        CanonicalRecord {
            district_code: district.to_string(),
            state_code: "17".to_string(),
            financial_year: "2023-24".to_string(),
            financial_year_start: 2023,
            month,
            persons_worked: 1,
            households_worked: 1,
            workdays_generated: workdays,
            workdays_per_person: workdays,
            total_expenditure: 0.0,
            wage_expenditure: 0.0,
            material_expenditure: 0.0,
            works_completed: 0,
            works_in_progress: 0,
            works_sanctioned: 0,
            persons_demanded: None,
            avg_wage_rate: None,
        }
    }

    #[test]
    fn test_dedupe_keeps_last_occurrence_in_place() {
        let records = vec![
            record("1701", 5, 1.0),
            record("1702", 5, 2.0),
            record("1701", 5, 3.0),
        ];
        let unique = dedupe_by_key(&records);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].district_code, "1701");
        assert_eq!(unique[0].workdays_generated, 3.0);
        assert_eq!(unique[1].district_code, "1702");
    }

    #[test]
    fn test_filter_sql_uses_bind_parameters() {
        let filter = RecordFilter::state("17").financial_year(Some("2023-24")).month(Some(5));
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new("SELECT 1 FROM mgnrega_records");
        push_filter(&mut builder, &filter);
        let sql = builder.sql();
        assert!(sql.contains("state_code = $1"));
        assert!(sql.contains("financial_year = $2"));
        assert!(sql.contains("month = $3"));
        assert!(!sql.contains("district_code"));
    }

    #[test]
    fn test_sql_limit_saturates() {
        assert_eq!(sql_limit(12), 12);
        assert_eq!(sql_limit(usize::MAX), i64::MAX);
    }
}
