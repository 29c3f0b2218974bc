//! Pipeline orchestration
//!
//! Runs scrape, transform and load per exchange with each step isolated: a
//! failed step is recorded in the run summary and the remaining steps still
//! execute against whatever data is available.

use crate::db::{self, Db};
use crate::etl::load::{LoadOutcome, Loader};
use crate::etl::transform;
use crate::scrapers::ScraperRegistry;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Outcome of one exchange run, suitable for logging or JSON output.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub exchange: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_secs: f64,
    pub stocks_processed: usize,
    pub prices_processed: usize,
    pub indices_processed: usize,
    pub errors: Vec<String>,
}

impl RunSummary {
    fn begin(exchange: &str, start: DateTime<Utc>) -> Self {
        Self {
            exchange: exchange.to_string(),
            start_time: start.to_rfc3339(),
            end_time: String::new(),
            duration_secs: 0.0,
            stocks_processed: 0,
            prices_processed: 0,
            indices_processed: 0,
            errors: Vec::new(),
        }
    }

    fn finish(&mut self, start: DateTime<Utc>) {
        let end = Utc::now();
        self.end_time = end.to_rfc3339();
        self.duration_secs = (end - start).num_milliseconds() as f64 / 1000.0;
    }

    fn merge(&mut self, outcome: LoadOutcome, counter: fn(&mut Self) -> &mut usize) {
        *counter(self) += outcome.processed;
        self.errors.extend(outcome.errors);
    }
}

/// Coordinates scrapers, transformation and loading.
pub struct EtlProcessor {
    db: Arc<Db>,
    scrapers: ScraperRegistry,
    loader: Loader,
}

impl EtlProcessor {
    /// Processor with every supported exchange registered.
    pub fn new(db: Arc<Db>) -> Self {
        Self::with_registry(db, ScraperRegistry::new())
    }

    /// Processor over an explicit registry. Tests register stub scrapers.
    pub fn with_registry(db: Arc<Db>, scrapers: ScraperRegistry) -> Self {
        let loader = Loader::new(db.clone());
        Self { db, scrapers, loader }
    }

    pub fn db(&self) -> &Arc<Db> {
        &self.db
    }

    /// Registered exchange codes.
    pub fn exchange_codes(&self) -> Vec<String> {
        self.scrapers.codes()
    }

    /// Run the full pipeline for one exchange. Never fails: every error ends
    /// up in the returned summary and in the run-metadata row.
    pub async fn process_exchange(&self, exchange_code: &str) -> RunSummary {
        let start = Utc::now();
        let mut summary = RunSummary::begin(exchange_code, start);
        tracing::info!("Starting ETL run for {}", exchange_code);

        let Some(scraper) = self.scrapers.get(exchange_code) else {
            let msg = format!("No scraper registered for exchange {exchange_code}");
            tracing::error!("{}", msg);
            summary.errors.push(msg);
            summary.finish(start);
            return summary;
        };

        // Stocks first so the prices step can resolve tickers.
        match scraper.scrape_stocks().await {
            Ok(raws) => {
                let stocks = transform::transform_stocks(&raws, exchange_code);
                match self.loader.load_stocks(&stocks, exchange_code) {
                    Ok(outcome) => summary.merge(outcome, |s| &mut s.stocks_processed),
                    Err(e) => summary.errors.push(format!("Stock load failed: {e}")),
                }
            }
            Err(e) => summary.errors.push(format!("Stock scrape failed: {e}")),
        }

        match scraper.scrape_prices().await {
            Ok(raws) => {
                let prices = transform::transform_prices(&raws, exchange_code);
                match self.loader.load_prices(&prices, exchange_code) {
                    Ok(outcome) => summary.merge(outcome, |s| &mut s.prices_processed),
                    Err(e) => summary.errors.push(format!("Price load failed: {e}")),
                }
            }
            Err(e) => summary.errors.push(format!("Price scrape failed: {e}")),
        }

        match scraper.scrape_indices().await {
            Ok(raws) => {
                let (indices, values) = transform::transform_indices(&raws, exchange_code);
                match self.loader.load_indices(&indices, &values, exchange_code) {
                    Ok(outcome) => summary.merge(outcome, |s| &mut s.indices_processed),
                    Err(e) => summary.errors.push(format!("Index load failed: {e}")),
                }
            }
            Err(e) => summary.errors.push(format!("Index scrape failed: {e}")),
        }

        self.record_run_metadata(exchange_code, &summary.errors);
        summary.finish(start);

        tracing::info!(
            "Completed ETL run for {}: {} stocks, {} prices, {} indices, {} errors in {:.1}s",
            exchange_code,
            summary.stocks_processed,
            summary.prices_processed,
            summary.indices_processed,
            summary.errors.len(),
            summary.duration_secs
        );
        summary
    }

    /// Run every registered exchange in sequence.
    pub async fn process_all(&self) -> HashMap<String, RunSummary> {
        let mut summaries = HashMap::new();
        for code in self.scrapers.codes() {
            let summary = self.process_exchange(&code).await;
            summaries.insert(code, summary);
        }
        summaries
    }

    /// Stamp last_run on the exchange's run-metadata row. The timestamp is
    /// written even when the run accumulated errors; the error text rides
    /// along for inspection.
    fn record_run_metadata(&self, exchange_code: &str, errors: &[String]) {
        let error_log = if errors.is_empty() { None } else { Some(errors.join("; ")) };
        let result = self.db.with_conn(|conn| {
            match db::data_source::find(conn, exchange_code, "stock")? {
                Some(source) => {
                    let now = Utc::now().to_rfc3339();
                    db::data_source::record_run(conn, source.id, &now, error_log.as_deref())
                }
                None => {
                    tracing::warn!("No run-metadata row for {}, skipping update", exchange_code);
                    Ok(())
                }
            }
        });
        if let Err(e) = result {
            tracing::error!("Failed to record run metadata for {}: {}", exchange_code, e);
        }
    }
}
