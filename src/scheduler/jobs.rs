//! Weekday job scheduling
//!
//! Each job fires at a fixed local time in its exchange's timezone, weekdays
//! only. A job task sleeps until its next fire time, runs, then recomputes;
//! a run that overlaps the next market day is not queued twice.

use crate::config;
use crate::etl::processor::EtlProcessor;
use crate::report;
use chrono::{DateTime, Datelike, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// What a scheduled job does when it fires.
#[derive(Debug, Clone)]
pub enum JobKind {
    /// Run the full pipeline for one exchange.
    CollectExchange(String),
    /// Generate and log the end-of-day market summary.
    MarketSummary,
}

/// A job with a fixed weekday fire time in a local timezone.
#[derive(Debug, Clone)]
pub struct Job {
    pub name: String,
    pub kind: JobKind,
    pub hour: u32,
    pub minute: u32,
    pub timezone: Tz,
}

impl Job {
    async fn execute(&self, processor: &EtlProcessor) {
        match &self.kind {
            JobKind::CollectExchange(code) => {
                let summary = processor.process_exchange(code).await;
                if summary.errors.is_empty() {
                    tracing::info!("Scheduled run for {} completed cleanly", code);
                } else {
                    tracing::warn!(
                        "Scheduled run for {} completed with {} errors",
                        code,
                        summary.errors.len()
                    );
                }
            }
            JobKind::MarketSummary => match report::generate_market_summary(processor.db()) {
                Ok(text) => tracing::info!("\n{}", text),
                Err(e) => tracing::error!("Market summary generation failed: {}", e),
            },
        }
    }
}

/// Holds the job table and spawns one timer task per job.
pub struct JobScheduler {
    jobs: Vec<Job>,
}

impl JobScheduler {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self { jobs }
    }

    /// The standard daily schedule: each exchange shortly after its close,
    /// then the summary once all three have run.
    pub fn with_default_jobs() -> Self {
        let close_times: &[(&str, u32, u32)] =
            &[("JSE", 16, 30), ("NGX", 17, 0), ("BRVM", 17, 30)];

        let mut jobs = Vec::new();
        for &(code, hour, minute) in close_times {
            jobs.push(Job {
                name: format!("collect_{}", code.to_lowercase()),
                kind: JobKind::CollectExchange(code.to_string()),
                hour,
                minute,
                timezone: config::exchange_timezone(code),
            });
        }
        jobs.push(Job {
            name: "market_summary".to_string(),
            kind: JobKind::MarketSummary,
            hour: 18,
            minute: 0,
            timezone: config::exchange_timezone("JSE"),
        });

        Self { jobs }
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    /// Spawn the timer tasks. The returned handles never resolve on their
    /// own; the caller decides how long the process lives.
    pub fn run(self, processor: Arc<EtlProcessor>) -> Vec<JoinHandle<()>> {
        let mut handles = Vec::new();
        for job in self.jobs {
            let processor = processor.clone();
            handles.push(tokio::spawn(async move {
                tracing::info!(
                    "Scheduled job {} at {:02}:{:02} {} on weekdays",
                    job.name,
                    job.hour,
                    job.minute,
                    job.timezone
                );
                loop {
                    let wait = duration_until(&job, Utc::now());
                    tracing::info!(
                        "Job {} fires in {}h {}m",
                        job.name,
                        wait.as_secs() / 3600,
                        (wait.as_secs() % 3600) / 60
                    );
                    tokio::time::sleep(wait).await;
                    job.execute(&processor).await;
                    // Step past the fire minute before recomputing.
                    tokio::time::sleep(Duration::from_secs(60)).await;
                }
            }));
        }
        handles
    }
}

/// Duration from `now` until the job's next weekday fire time in its local
/// timezone.
pub fn duration_until(job: &Job, now: DateTime<Utc>) -> Duration {
    let now_local = now.with_timezone(&job.timezone);
    let target_time =
        NaiveTime::from_hms_opt(job.hour, job.minute, 0).unwrap_or(NaiveTime::MIN);

    let mut date = now_local.date_naive();
    if now_local.time() >= target_time {
        date = date.succ_opt().unwrap_or(date);
    }
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date = date.succ_opt().unwrap_or(date);
    }

    let fire = job
        .timezone
        .from_local_datetime(&date.and_time(target_time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(now);
    let secs = (fire - now).num_seconds().max(0) as u64;
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::ScraperRegistry;

    fn job_at(hour: u32, minute: u32, timezone: Tz) -> Job {
        Job {
            name: "test".to_string(),
            kind: JobKind::MarketSummary,
            hour,
            minute,
            timezone,
        }
    }

    #[test]
    fn test_same_day_when_fire_time_ahead() {
        // Monday 2024-01-15 10:00 UTC; Johannesburg is UTC+2, so local 12:00.
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        let job = job_at(16, 30, chrono_tz::Africa::Johannesburg);
        // Fires at 16:30 local = 14:30 UTC, 4.5 hours away.
        assert_eq!(duration_until(&job, now).as_secs(), 4 * 3600 + 1800);
    }

    #[test]
    fn test_next_day_when_fire_time_passed() {
        // Monday 15:00 UTC = 17:00 Johannesburg, past a 16:30 job.
        let now = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let job = job_at(16, 30, chrono_tz::Africa::Johannesburg);
        // Tuesday 16:30 local = 14:30 UTC, 23.5 hours away.
        assert_eq!(duration_until(&job, now).as_secs(), 23 * 3600 + 1800);
    }

    #[test]
    fn test_weekend_is_skipped() {
        // Friday 2024-01-19 15:00 UTC = 17:00 Johannesburg, past the job.
        let now = Utc.with_ymd_and_hms(2024, 1, 19, 15, 0, 0).unwrap();
        let job = job_at(16, 30, chrono_tz::Africa::Johannesburg);
        // Next fire is Monday, not Saturday.
        let wait = duration_until(&job, now);
        assert_eq!(wait.as_secs(), (2 * 24 + 23) * 3600 + 1800);
    }

    #[test]
    fn test_saturday_rolls_to_monday() {
        // Saturday 2024-01-20 08:00 UTC.
        let now = Utc.with_ymd_and_hms(2024, 1, 20, 8, 0, 0).unwrap();
        let job = job_at(17, 0, chrono_tz::Africa::Lagos);
        let fire = now + chrono::Duration::from_std(duration_until(&job, now)).unwrap();
        assert_eq!(fire.with_timezone(&chrono_tz::Africa::Lagos).weekday(), Weekday::Mon);
    }

    #[test]
    fn test_default_jobs_cover_all_exchanges() {
        let scheduler = JobScheduler::with_default_jobs();
        assert_eq!(scheduler.jobs().len(), 4);
        let collects: Vec<_> = scheduler
            .jobs()
            .iter()
            .filter_map(|j| match &j.kind {
                JobKind::CollectExchange(code) => Some(code.as_str()),
                JobKind::MarketSummary => None,
            })
            .collect();
        assert_eq!(collects, vec!["JSE", "NGX", "BRVM"]);

        // Every scheduled exchange has a registered scraper.
        let registry = ScraperRegistry::new();
        for code in collects {
            assert!(registry.get(code).is_some(), "no scraper for {code}");
        }
    }
}
