//! Nigerian Exchange Group scraper
//!
//! Listings and daily prices share the equities price-list page. The page
//! carries no date column; every price row is the current session, so rows
//! are stamped with the scrape day's date at extraction time.

use crate::error::Result;
use crate::scrapers::fetch::Fetcher;
use crate::scrapers::table::{
    column_index, get_cell, header_texts, parse_float, parse_int, row_texts, selector,
};
use crate::scrapers::types::{RawIndex, RawPrice, RawStock};
use crate::scrapers::Scraper;
use async_trait::async_trait;
use chrono::Utc;
use scraper::Html;

const EQUITY_URL: &str = "https://ngxgroup.com/exchange/data/equities-price-list/";
const INDICES_URL: &str = "https://ngxgroup.com/exchange/data/indices/";

/// NGX scraper implementation
pub struct NgxScraper {
    fetcher: Fetcher,
    equity_url: String,
    indices_url: String,
}

impl NgxScraper {
    pub fn new() -> Self {
        Self {
            fetcher: Fetcher::new(),
            equity_url: EQUITY_URL.to_string(),
            indices_url: INDICES_URL.to_string(),
        }
    }
}

impl Default for NgxScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for NgxScraper {
    fn exchange_code(&self) -> &'static str {
        "NGX"
    }

    async fn scrape_stocks(&self) -> Result<Vec<RawStock>> {
        let Some(html) = self.fetcher.try_fetch(&self.equity_url, "NGX equities page").await
        else {
            return Ok(Vec::new());
        };
        let stocks = parse_stocks(&html);
        tracing::info!("Scraped {} stocks from NGX", stocks.len());
        Ok(stocks)
    }

    async fn scrape_prices(&self) -> Result<Vec<RawPrice>> {
        let Some(html) = self.fetcher.try_fetch(&self.equity_url, "NGX equities page").await
        else {
            return Ok(Vec::new());
        };
        let session_date = Utc::now().date_naive().to_string();
        let prices = parse_prices(&html, &session_date);
        tracing::info!("Scraped {} price rows from NGX", prices.len());
        Ok(prices)
    }

    async fn scrape_indices(&self) -> Result<Vec<RawIndex>> {
        let Some(html) = self.fetcher.try_fetch(&self.indices_url, "NGX indices page").await
        else {
            return Ok(Vec::new());
        };
        let indices = parse_indices(&html);
        tracing::info!("Scraped {} indices from NGX", indices.len());
        Ok(indices)
    }
}

fn parse_stocks(html: &str) -> Vec<RawStock> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.price-list-table");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No price list table found on NGX page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let ticker_col = column_index(&headers, &["symbol", "ticker"]);
    let name_col = column_index(&headers, &["company", "name"]);
    let sector_col = column_index(&headers, &["sector", "industry"]);

    let row_sel = selector("tbody tr");
    let mut stocks = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        let ticker = get_cell(&cells, ticker_col)
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        let name = get_cell(&cells, name_col)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if ticker.is_none() || name.is_none() {
            tracing::warn!("Skipping NGX stock row with missing ticker or name");
            continue;
        }

        stocks.push(RawStock {
            ticker,
            name,
            sector: get_cell(&cells, sector_col)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            currency: Some("NGN".to_string()),
        });
    }
    stocks
}

fn parse_prices(html: &str, session_date: &str) -> Vec<RawPrice> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.price-list-table");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No price list table found on NGX page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let ticker_col = column_index(&headers, &["symbol", "ticker"]);
    let close_col = column_index(&headers, &["close", "closing"]);
    let open_col = column_index(&headers, &["open", "opening"]);
    let high_col = column_index(&headers, &["high"]);
    let low_col = column_index(&headers, &["low"]);
    let volume_col = column_index(&headers, &["volume"]);
    let change_col = column_index(&headers, &["change", "%"]);

    let row_sel = selector("tbody tr");
    let mut prices = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        let ticker = get_cell(&cells, ticker_col)
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        if ticker.is_none() {
            continue;
        }

        prices.push(RawPrice {
            ticker,
            date: Some(session_date.to_string()),
            close_price: get_cell(&cells, close_col).and_then(parse_float),
            open_price: get_cell(&cells, open_col).and_then(parse_float),
            high_price: get_cell(&cells, high_col).and_then(parse_float),
            low_price: get_cell(&cells, low_col).and_then(parse_float),
            volume: get_cell(&cells, volume_col).and_then(parse_int),
            change_percent: get_cell(&cells, change_col).and_then(parse_float),
        });
    }
    prices
}

fn parse_indices(html: &str) -> Vec<RawIndex> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.indices-table");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No indices table found on NGX page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let code_col = column_index(&headers, &["code", "symbol"]);
    let name_col = column_index(&headers, &["name", "description"]);
    let value_col = column_index(&headers, &["value", "price", "close"]);
    let change_col = column_index(&headers, &["change", "%"]);

    let row_sel = selector("tbody tr");
    let mut indices = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        let code = get_cell(&cells, code_col)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let name = get_cell(&cells, name_col)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if code.is_none() || name.is_none() {
            continue;
        }

        indices.push(RawIndex {
            code,
            name,
            value: get_cell(&cells, value_col).and_then(parse_float),
            change_percent: get_cell(&cells, change_col).and_then(parse_float),
        });
    }
    indices
}
