//! Exchange scrapers
//!
//! One implementation per supported exchange behind a common trait. A
//! scraper never fails a whole run: transport errors and structural
//! mismatches degrade to empty collections with a log line, and a malformed
//! row is skipped without aborting the rest of the page.

pub mod types;

pub mod brvm;
pub mod fetch;
pub mod jse;
pub mod ngx;
pub mod table;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use types::{RawIndex, RawPrice, RawStock};

/// Scraper trait that all exchange implementations must implement
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Exchange code (e.g. "JSE", "NGX", "BRVM")
    fn exchange_code(&self) -> &'static str;

    /// Scrape stock listings
    async fn scrape_stocks(&self) -> Result<Vec<RawStock>>;

    /// Scrape daily stock prices
    async fn scrape_prices(&self) -> Result<Vec<RawPrice>>;

    /// Scrape index levels
    async fn scrape_indices(&self) -> Result<Vec<RawIndex>>;
}

/// Registry mapping exchange codes to scraper implementations
pub struct ScraperRegistry {
    scrapers: HashMap<String, Arc<dyn Scraper>>,
}

impl ScraperRegistry {
    /// Create a registry with all supported exchanges
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(jse::JseScraper::new()));
        registry.register(Arc::new(ngx::NgxScraper::new()));
        registry.register(Arc::new(brvm::BrvmScraper::new()));
        registry
    }

    /// Create an empty registry; tests register stubs into it.
    pub fn empty() -> Self {
        Self { scrapers: HashMap::new() }
    }

    /// Register a scraper under its exchange code.
    pub fn register(&mut self, scraper: Arc<dyn Scraper>) {
        self.scrapers.insert(scraper.exchange_code().to_string(), scraper);
    }

    /// Get the scraper for an exchange code.
    pub fn get(&self, code: &str) -> Option<Arc<dyn Scraper>> {
        self.scrapers.get(code).cloned()
    }

    /// Registered exchange codes, sorted for deterministic iteration.
    pub fn codes(&self) -> Vec<String> {
        let mut codes: Vec<String> = self.scrapers.keys().cloned().collect();
        codes.sort();
        codes
    }
}

impl Default for ScraperRegistry {
    fn default() -> Self {
        Self::new()
    }
}
