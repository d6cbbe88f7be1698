//! In-memory storage implementations for development and testing.
//!
//! Lock poisoning is reported as a storage error rather than a panic, so a
//! failed writer surfaces through the same path as a database outage.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mgnrega_core::error::{MgnregaError, Result};
use mgnrega_core::models::{
    CanonicalRecord, Coordinates, District, DistrictTotals, MetricSums, PeriodTotals,
    RecordFilter, RecordKey,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use crate::ports::{DistrictStore, RecordStore, RunLease};

#[derive(Debug, Clone)]
struct LeaseEntry {
    holder: String,
    expires_at: DateTime<Utc>,
}

/// In-memory implementation of every storage port
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<RecordKey, CanonicalRecord>>>,
    districts: Arc<RwLock<HashMap<String, District>>>,
    leases: Arc<RwLock<HashMap<String, LeaseEntry>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|e| MgnregaError::Storage(format!("memory store lock poisoned: {}", e)))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|e| MgnregaError::Storage(format!("memory store lock poisoned: {}", e)))
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records
    pub fn record_len(&self) -> Result<usize> {
        Ok(read(&self.records)?.len())
    }

    /// Number of stored districts
    pub fn district_len(&self) -> Result<usize> {
        Ok(read(&self.districts)?.len())
    }

    fn matching(&self, filter: &RecordFilter) -> Result<Vec<CanonicalRecord>> {
        let records = read(&self.records)?;
        Ok(records.values().filter(|r| filter.matches(r)).cloned().collect())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn upsert_records(&self, records: &[CanonicalRecord]) -> Result<u64> {
        let mut stored = write(&self.records)?;
        for record in records {
            stored.insert(record.key(), record.clone());
        }
        Ok(records.len() as u64)
    }

    async fn find_records(
        &self,
        filter: &RecordFilter,
        limit: Option<usize>,
    ) -> Result<Vec<CanonicalRecord>> {
        let mut records = self.matching(filter)?;
        records.sort_by(|a, b| {
            CanonicalRecord::latest_first(a, b).then_with(|| a.district_code.cmp(&b.district_code))
        });
        if let Some(limit) = limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    async fn sum_metrics(&self, filter: &RecordFilter) -> Result<MetricSums> {
        let records = read(&self.records)?;
        Ok(MetricSums::from_records(records.values().filter(|r| filter.matches(r))))
    }

    async fn period_totals(
        &self,
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<PeriodTotals>> {
        let records = read(&self.records)?;
        let mut groups: BTreeMap<(i32, u8, String), PeriodTotals> = BTreeMap::new();
        for record in records.values().filter(|r| filter.matches(r)) {
            groups
                .entry((record.financial_year_start, record.month, record.financial_year.clone()))
                .or_insert_with(|| {
                    PeriodTotals::empty(
                        record.financial_year.clone(),
                        record.financial_year_start,
                        record.month,
                    )
                })
                .add(record);
        }
        Ok(groups.into_values().rev().take(limit).collect())
    }

    async fn district_totals(
        &self,
        filter: &RecordFilter,
        limit: usize,
    ) -> Result<Vec<DistrictTotals>> {
        let records = read(&self.records)?;
        let mut groups: HashMap<&str, DistrictTotals> = HashMap::new();
        for record in records.values().filter(|r| filter.matches(r)) {
            let entry = groups
                .entry(record.district_code.as_str())
                .or_insert_with(|| DistrictTotals {
                    district_code: record.district_code.clone(),
                    workdays_generated: 0.0,
                    persons_worked: 0,
                    total_expenditure: 0.0,
                });
            entry.workdays_generated += record.workdays_generated;
            entry.persons_worked += record.persons_worked;
            entry.total_expenditure += record.total_expenditure;
        }

        let mut totals: Vec<_> = groups.into_values().collect();
        totals.sort_by(|a, b| {
            b.workdays_generated
                .total_cmp(&a.workdays_generated)
                .then_with(|| a.district_code.cmp(&b.district_code))
        });
        totals.truncate(limit);
        Ok(totals)
    }

    async fn count_records(&self, filter: &RecordFilter) -> Result<u64> {
        let records = read(&self.records)?;
        Ok(records.values().filter(|r| filter.matches(r)).count() as u64)
    }

    async fn financial_years(&self) -> Result<Vec<String>> {
        let records = read(&self.records)?;
        let years: BTreeSet<(i32, &str)> = records
            .values()
            .map(|r| (r.financial_year_start, r.financial_year.as_str()))
            .collect();
        Ok(years.into_iter().rev().map(|(_, fy)| fy.to_string()).collect())
    }

    async fn districts_with_data(&self) -> Result<Vec<String>> {
        let records = read(&self.records)?;
        let codes: BTreeSet<&str> = records.values().map(|r| r.district_code.as_str()).collect();
        Ok(codes.into_iter().map(String::from).collect())
    }
}

#[async_trait]
impl DistrictStore for MemoryStore {
    async fn upsert_district(&self, district: &District) -> Result<()> {
        let mut districts = write(&self.districts)?;
        let mut incoming = district.clone();
        if incoming.coordinates.is_none() {
            incoming.coordinates =
                districts.get(&district.district_code).and_then(|d| d.coordinates);
        }
        districts.insert(incoming.district_code.clone(), incoming);
        Ok(())
    }

    async fn get_district(&self, district_code: &str) -> Result<Option<District>> {
        Ok(read(&self.districts)?.get(district_code).cloned())
    }

    async fn list_districts(&self, state_code: Option<&str>) -> Result<Vec<District>> {
        let districts = read(&self.districts)?;
        let mut list: Vec<District> = districts
            .values()
            .filter(|d| state_code.map_or(true, |s| d.state_code == s))
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            a.district_name
                .cmp(&b.district_name)
                .then_with(|| a.district_code.cmp(&b.district_code))
        });
        Ok(list)
    }

    async fn set_coordinates(
        &self,
        district_code: &str,
        coordinates: Coordinates,
    ) -> Result<bool> {
        let mut districts = write(&self.districts)?;
        match districts.get_mut(district_code) {
            Some(district) => {
                district.coordinates = Some(coordinates);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RunLease for MemoryStore {
    async fn try_acquire(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| MgnregaError::Storage(format!("invalid lease ttl: {}", e)))?;
        let mut leases = write(&self.leases)?;

        if let Some(existing) = leases.get(name) {
            if existing.expires_at > now && existing.holder != holder {
                return Ok(false);
            }
        }

        leases.insert(
            name.to_string(),
            LeaseEntry {
                holder: holder.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    async fn release(&self, name: &str, holder: &str) -> Result<()> {
        let mut leases = write(&self.leases)?;
        if leases.get(name).is_some_and(|l| l.holder == holder) {
            leases.remove(name);
        }
        Ok(())
    }

    async fn is_held(&self, name: &str) -> Result<bool> {
        let leases = read(&self.leases)?;
        Ok(leases.get(name).is_some_and(|l| l.expires_at > Utc::now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(district: &str, fy: &str, start: i32, month: u8, workdays: f64) -> CanonicalRecord {
        CanonicalRecord {
            district_code: district.to_string(),
            state_code: "17".to_string(),
            financial_year: fy.to_string(),
            financial_year_start: start,
            month,
            persons_worked: 10,
            households_worked: 5,
            workdays_generated: workdays,
            workdays_per_person: workdays / 10.0,
            total_expenditure: 1.5,
            wage_expenditure: 1.0,
            material_expenditure: 0.5,
            works_completed: 2,
            works_in_progress: 3,
            works_sanctioned: 5,
            persons_demanded: None,
            avg_wage_rate: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_per_key() {
        let store = MemoryStore::new();
        let first = record("1701", "2023-24", 2023, 5, 100.0);
        let mut second = first.clone();
        second.workdays_generated = 250.0;

        store.upsert_records(&[first.clone()]).await.unwrap();
        store.upsert_records(&[first]).await.unwrap();
        store.upsert_records(&[second]).await.unwrap();

        assert_eq!(store.record_len().unwrap(), 1);
        let latest = store
            .latest_record(&RecordFilter::district("1701"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest.workdays_generated, 250.0);
    }

    #[tokio::test]
    async fn test_find_records_latest_first() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1701", "2022-23", 2022, 12, 1.0),
                record("1701", "2023-24", 2023, 1, 1.0),
                record("1701", "2023-24", 2023, 11, 1.0),
            ])
            .await
            .unwrap();

        let records = store.find_records(&RecordFilter::default(), None).await.unwrap();
        let periods: Vec<_> = records.iter().map(|r| r.period()).collect();
        assert_eq!(periods, vec![(2023, 11), (2023, 1), (2022, 12)]);

        let limited = store.find_records(&RecordFilter::default(), Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn test_period_totals_group_and_order() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1701", "2023-24", 2023, 5, 100.0),
                record("1702", "2023-24", 2023, 5, 50.0),
                record("1701", "2023-24", 2023, 2, 10.0),
            ])
            .await
            .unwrap();

        let periods = store.period_totals(&RecordFilter::state("17"), 12).await.unwrap();
        assert_eq!(periods.len(), 2);
        // Ordered by (financial_year_start, month), not by calendar date
        assert_eq!(periods[0].month, 5);
        assert_eq!(periods[0].year, 2023);
        assert_eq!(periods[0].total_workdays_generated, 150.0);
        assert_eq!(periods[1].year, 2024);
    }

    #[tokio::test]
    async fn test_period_totals_financial_year_start_ordering() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1701", "2022-23", 2022, 12, 1.0),
                record("1701", "2023-24", 2023, 4, 1.0),
            ])
            .await
            .unwrap();

        let periods = store.period_totals(&RecordFilter::default(), 12).await.unwrap();
        assert_eq!(periods[0].financial_year, "2023-24");
        assert_eq!(periods[1].financial_year, "2022-23");
    }

    #[tokio::test]
    async fn test_district_totals_tie_break_by_code() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1703", "2023-24", 2023, 5, 100.0),
                record("1701", "2023-24", 2023, 5, 100.0),
                record("1702", "2023-24", 2023, 5, 300.0),
            ])
            .await
            .unwrap();

        let totals = store.district_totals(&RecordFilter::default(), 10).await.unwrap();
        let codes: Vec<_> = totals.iter().map(|t| t.district_code.as_str()).collect();
        assert_eq!(codes, vec!["1702", "1701", "1703"]);
    }

    #[tokio::test]
    async fn test_sum_metrics_counts_districts() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1701", "2023-24", 2023, 5, 100.0),
                record("1701", "2023-24", 2023, 6, 100.0),
                record("1702", "2023-24", 2023, 5, 100.0),
            ])
            .await
            .unwrap();

        let sums = store.sum_metrics(&RecordFilter::state("17")).await.unwrap();
        assert_eq!(sums.record_count, 3);
        assert_eq!(sums.district_count, 2);
        assert_eq!(sums.total_workdays_generated, 300.0);
    }

    #[tokio::test]
    async fn test_financial_years_most_recent_first() {
        let store = MemoryStore::new();
        store
            .upsert_records(&[
                record("1701", "2021-22", 2021, 5, 1.0),
                record("1701", "2023-24", 2023, 5, 1.0),
                record("1702", "2023-24", 2023, 5, 1.0),
            ])
            .await
            .unwrap();

        assert_eq!(store.financial_years().await.unwrap(), vec!["2023-24", "2021-22"]);
        assert_eq!(store.districts_with_data().await.unwrap(), vec!["1701", "1702"]);
    }

    #[tokio::test]
    async fn test_district_upsert_preserves_coordinates() {
        let store = MemoryStore::new();
        store
            .upsert_district(&District::new("1701", "Bhopal", "17", "MADHYA PRADESH"))
            .await
            .unwrap();
        assert!(store
            .set_coordinates("1701", Coordinates { lat: 23.25, lng: 77.41 })
            .await
            .unwrap());

        store
            .upsert_district(&District::new("1701", "BHOPAL", "17", "MADHYA PRADESH"))
            .await
            .unwrap();

        let district = store.get_district("1701").await.unwrap().unwrap();
        assert_eq!(district.district_name, "BHOPAL");
        assert_eq!(district.coordinates, Some(Coordinates { lat: 23.25, lng: 77.41 }));
        assert!(!store
            .set_coordinates("9999", Coordinates { lat: 0.0, lng: 0.0 })
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_list_districts_filters_and_sorts() {
        let store = MemoryStore::new();
        for (code, name, state) in [("1702", "Indore", "17"), ("1701", "Bhopal", "17"), ("2701", "Pune", "27")] {
            store
                .upsert_district(&District::new(code, name, state, "X"))
                .await
                .unwrap();
        }

        let names: Vec<_> = store
            .list_districts(Some("17"))
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.district_name)
            .collect();
        assert_eq!(names, vec!["Bhopal", "Indore"]);
        assert_eq!(store.list_districts(None).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_lease_excludes_other_holders() {
        let store = MemoryStore::new();
        let ttl = Duration::from_secs(60);

        assert!(store.try_acquire("ingestion", "a", ttl).await.unwrap());
        assert!(!store.try_acquire("ingestion", "b", ttl).await.unwrap());
        assert!(store.is_held("ingestion").await.unwrap());

        store.release("ingestion", "b").await.unwrap();
        assert!(store.is_held("ingestion").await.unwrap());

        store.release("ingestion", "a").await.unwrap();
        assert!(!store.is_held("ingestion").await.unwrap());
        assert!(store.try_acquire("ingestion", "b", ttl).await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_lease_can_be_taken() {
        let store = MemoryStore::new();
        assert!(store.try_acquire("ingestion", "a", Duration::ZERO).await.unwrap());
        assert!(store.try_acquire("ingestion", "b", Duration::from_secs(60)).await.unwrap());
    }
}
