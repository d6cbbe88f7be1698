//! Calendar-driven ingestion
//!
//! Two jobs run in server local time: a daily incremental run at 02:00 and a
//! weekly full refresh on Sunday at 03:00. Both take the ingestion lease, so
//! several server instances sharing one database run each job at most once.

use chrono::{Datelike, Duration as ChronoDuration, Local, NaiveDateTime, NaiveTime, Weekday};
use mgnrega_ingest::{IngestionPipeline, IngestionRequest};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// When a job fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Daily { hour: u32 },
    Weekly { weekday: Weekday, hour: u32 },
}

#[derive(Debug, Clone, Copy)]
pub struct ScheduledJob {
    pub name: &'static str,
    pub cadence: Cadence,
}

pub const DAILY_INCREMENTAL: ScheduledJob = ScheduledJob {
    name: "daily-incremental",
    cadence: Cadence::Daily { hour: 2 },
};

pub const WEEKLY_REFRESH: ScheduledJob = ScheduledJob {
    name: "weekly-refresh",
    cadence: Cadence::Weekly {
        weekday: Weekday::Sun,
        hour: 3,
    },
};

impl ScheduledJob {
    /// First firing strictly after `now`
    pub fn next_after(&self, now: NaiveDateTime) -> NaiveDateTime {
        let (hour, weekday) = match self.cadence {
            Cadence::Daily { hour } => (hour, None),
            Cadence::Weekly { weekday, hour } => (hour, Some(weekday)),
        };
        let at = NaiveTime::from_hms_opt(hour.min(23), 0, 0).unwrap_or_default();

        let mut day = now.date();
        loop {
            let candidate = day.and_time(at);
            let weekday_matches = weekday.is_none_or(|w| day.weekday() == w);
            if candidate > now && weekday_matches {
                return candidate;
            }
            day += ChronoDuration::days(1);
        }
    }
}

/// Spawn both scheduled jobs onto the runtime
pub fn spawn(pipeline: Arc<IngestionPipeline>) -> Vec<JoinHandle<()>> {
    [DAILY_INCREMENTAL, WEEKLY_REFRESH]
        .into_iter()
        .map(|job| tokio::spawn(run_job(job, pipeline.clone())))
        .collect()
}

async fn run_job(job: ScheduledJob, pipeline: Arc<IngestionPipeline>) {
    loop {
        let now = Local::now().naive_local();
        let next = job.next_after(now);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(job = job.name, next_run = %next, "Scheduled ingestion");
        tokio::time::sleep(wait).await;

        let holder = format!("{}-{}", job.name, Uuid::new_v4());
        tracing::info!(job = job.name, holder = %holder, "Running scheduled ingestion");

        match pipeline
            .run_exclusive(&IngestionRequest::default(), &holder)
            .await
        {
            Ok(Some(summary)) => tracing::info!(
                job = job.name,
                processed = summary.processed,
                districts = summary.districts,
                errors = summary.errors,
                aborted = summary.aborted,
                "Scheduled ingestion completed"
            ),
            Ok(None) => tracing::info!(job = job.name, "Skipped; another run holds the lease"),
            Err(e) => tracing::error!(job = job.name, error = %e, "Scheduled ingestion failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_daily_fires_same_day_before_two() {
        assert_eq!(
            DAILY_INCREMENTAL.next_after(at(2024, 5, 10, 1, 30)),
            at(2024, 5, 10, 2, 0)
        );
    }

    #[test]
    fn test_daily_rolls_to_next_day() {
        assert_eq!(
            DAILY_INCREMENTAL.next_after(at(2024, 5, 10, 2, 0)),
            at(2024, 5, 11, 2, 0)
        );
        assert_eq!(
            DAILY_INCREMENTAL.next_after(at(2024, 12, 31, 23, 0)),
            at(2025, 1, 1, 2, 0)
        );
    }

    #[test]
    fn test_weekly_waits_for_sunday() {
        // 2024-05-10 is a Friday
        assert_eq!(
            WEEKLY_REFRESH.next_after(at(2024, 5, 10, 12, 0)),
            at(2024, 5, 12, 3, 0)
        );
    }

    #[test]
    fn test_weekly_after_sunday_run_skips_a_week() {
        assert_eq!(
            WEEKLY_REFRESH.next_after(at(2024, 5, 12, 3, 0)),
            at(2024, 5, 19, 3, 0)
        );
        assert_eq!(
            WEEKLY_REFRESH.next_after(at(2024, 5, 12, 2, 59)),
            at(2024, 5, 12, 3, 0)
        );
    }
}
