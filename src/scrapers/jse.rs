//! Johannesburg Stock Exchange scraper

use crate::error::Result;
use crate::scrapers::fetch::Fetcher;
use crate::scrapers::table::{
    column_index, get_cell, header_texts, parse_float, parse_int, row_texts, selector,
};
use crate::scrapers::types::{RawIndex, RawPrice, RawStock};
use crate::scrapers::Scraper;
use async_trait::async_trait;
use scraper::Html;

const EQUITY_URL: &str = "https://www.jse.co.za/market-data/equity-market";
const PRICE_DATA_URL: &str = "https://www.jse.co.za/market-data/equity-market/price-data";
const INDICES_URL: &str = "https://www.jse.co.za/market-data/indices";

/// JSE scraper implementation
pub struct JseScraper {
    fetcher: Fetcher,
    equity_url: String,
    price_data_url: String,
    indices_url: String,
}

impl JseScraper {
    pub fn new() -> Self {
        Self {
            fetcher: Fetcher::new(),
            equity_url: EQUITY_URL.to_string(),
            price_data_url: PRICE_DATA_URL.to_string(),
            indices_url: INDICES_URL.to_string(),
        }
    }
}

impl Default for JseScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for JseScraper {
    fn exchange_code(&self) -> &'static str {
        "JSE"
    }

    async fn scrape_stocks(&self) -> Result<Vec<RawStock>> {
        let Some(html) = self.fetcher.try_fetch(&self.equity_url, "JSE stocks page").await else {
            return Ok(Vec::new());
        };
        let stocks = parse_stocks(&html);
        tracing::info!("Scraped {} stocks from JSE", stocks.len());
        Ok(stocks)
    }

    async fn scrape_prices(&self) -> Result<Vec<RawPrice>> {
        let Some(html) = self.fetcher.try_fetch(&self.price_data_url, "JSE price data").await
        else {
            return Ok(Vec::new());
        };
        let prices = parse_prices(&html);
        tracing::info!("Scraped {} price rows from JSE", prices.len());
        Ok(prices)
    }

    async fn scrape_indices(&self) -> Result<Vec<RawIndex>> {
        let Some(html) = self.fetcher.try_fetch(&self.indices_url, "JSE indices page").await
        else {
            return Ok(Vec::new());
        };
        let indices = parse_indices(&html);
        tracing::info!("Scraped {} indices from JSE", indices.len());
        Ok(indices)
    }
}

/// Listings live in `table.equity-table`: ticker, name, then market fields,
/// with sector in the fifth column when present.
fn parse_stocks(html: &str) -> Vec<RawStock> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.equity-table");
    let row_sel = selector("tbody tr");

    let tables: Vec<_> = doc.select(&table_sel).collect();
    if tables.is_empty() {
        tracing::warn!("No stock tables found on JSE page");
        return Vec::new();
    }

    let mut stocks = Vec::new();
    for table in tables {
        for row in table.select(&row_sel) {
            let cells = row_texts(&row);
            if cells.len() < 4 {
                continue;
            }

            let ticker = cells[0].trim().to_uppercase();
            let name = cells[1].trim().to_string();
            if ticker.is_empty() || name.is_empty() {
                tracing::warn!("Skipping JSE stock row with empty ticker or name");
                continue;
            }

            stocks.push(RawStock {
                ticker: Some(ticker),
                name: Some(name),
                sector: cells.get(4).map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
                currency: Some("ZAR".to_string()),
            });
        }
    }
    stocks
}

/// Price rows live in `table.price-table` with a real date column; the raw
/// date text is passed through untouched and the cleaner decides whether it
/// parses. Rows it cannot parse are dropped there, never backfilled with
/// today's date.
fn parse_prices(html: &str) -> Vec<RawPrice> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.price-table");
    let row_sel = selector("tbody tr");

    let tables: Vec<_> = doc.select(&table_sel).collect();
    if tables.is_empty() {
        tracing::warn!("No price tables found on JSE page");
        return Vec::new();
    }

    let mut prices = Vec::new();
    for table in tables {
        let headers = header_texts(&table);
        let ticker_col = column_index(&headers, &["code", "ticker"]);
        let close_col = column_index(&headers, &["close", "price"]);
        let open_col = column_index(&headers, &["open"]);
        let high_col = column_index(&headers, &["high"]);
        let low_col = column_index(&headers, &["low"]);
        let volume_col = column_index(&headers, &["volume"]);
        let change_col = column_index(&headers, &["change", "%"]);
        let date_col = column_index(&headers, &["date"]);

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
                date: get_cell(&cells, date_col)
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty()),
                close_price: get_cell(&cells, close_col).and_then(parse_float),
                open_price: get_cell(&cells, open_col).and_then(parse_float),
                high_price: get_cell(&cells, high_col).and_then(parse_float),
                low_price: get_cell(&cells, low_col).and_then(parse_float),
                volume: get_cell(&cells, volume_col).and_then(parse_int),
                change_percent: get_cell(&cells, change_col).and_then(parse_float),
            });
        }
    }
    prices
}

/// Indices live in `table.indices-table`: code, name, current level, change.
fn parse_indices(html: &str) -> Vec<RawIndex> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.indices-table");
    let row_sel = selector("tbody tr");

    let tables: Vec<_> = doc.select(&table_sel).collect();
    if tables.is_empty() {
        tracing::warn!("No indices tables found on JSE page");
        return Vec::new();
    }

    let mut indices = Vec::new();
    for table in tables {
        for row in table.select(&row_sel) {
            let cells = row_texts(&row);
            if cells.len() < 3 {
                continue;
            }

            indices.push(RawIndex {
                code: Some(cells[0].trim().to_string()).filter(|c| !c.is_empty()),
                name: Some(cells[1].trim().to_string()).filter(|n| !n.is_empty()),
                value: parse_float(&cells[2]),
                change_percent: cells.get(3).and_then(|c| parse_float(c)),
            });
        }
    }
    indices
}
