//! Bourse Régionale des Valeurs Mobilières scraper
//!
//! BRVM pages are striped tables with French-leaning headers, so header
//! matching falls back to the site's long-stable column positions when no
//! synonym hits. Prices and listings share the equities page, which carries
//! no date column; price rows are the current session.

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

const EQUITY_URL: &str = "https://www.brvm.org/en/cours-actions/0";
const INDICES_URL: &str = "https://www.brvm.org/en/indices/0";

/// BRVM scraper implementation
pub struct BrvmScraper {
    fetcher: Fetcher,
    equity_url: String,
    indices_url: String,
}

impl BrvmScraper {
    pub fn new() -> Self {
        Self {
            fetcher: Fetcher::new(),
            equity_url: EQUITY_URL.to_string(),
            indices_url: INDICES_URL.to_string(),
        }
    }
}

impl Default for BrvmScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scraper for BrvmScraper {
    fn exchange_code(&self) -> &'static str {
        "BRVM"
    }

    async fn scrape_stocks(&self) -> Result<Vec<RawStock>> {
        let Some(html) = self.fetcher.try_fetch(&self.equity_url, "BRVM equities page").await
        else {
            return Ok(Vec::new());
        };
        let stocks = parse_stocks(&html);
        tracing::info!("Scraped {} stocks from BRVM", stocks.len());
        Ok(stocks)
    }

    async fn scrape_prices(&self) -> Result<Vec<RawPrice>> {
        let Some(html) = self.fetcher.try_fetch(&self.equity_url, "BRVM equities page").await
        else {
            return Ok(Vec::new());
        };
        let session_date = Utc::now().date_naive().to_string();
        let prices = parse_prices(&html, &session_date);
        tracing::info!("Scraped {} price rows from BRVM", prices.len());
        Ok(prices)
    }

    async fn scrape_indices(&self) -> Result<Vec<RawIndex>> {
        let Some(html) = self.fetcher.try_fetch(&self.indices_url, "BRVM indices page").await
        else {
            return Ok(Vec::new());
        };
        let indices = parse_indices(&html);
        tracing::info!("Scraped {} indices from BRVM", indices.len());
        Ok(indices)
    }
}

fn parse_stocks(html: &str) -> Vec<RawStock> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.table-striped");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No stock table found on BRVM page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let ticker_col = column_index(&headers, &["symbol", "ticker", "code"]).or(Some(0));
    let name_col = column_index(&headers, &["name", "company", "title", "titre"]).or(Some(1));
    let sector_col = column_index(&headers, &["sector", "industry"]);

    let row_sel = selector("tbody tr");
    let mut stocks = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        if cells.len() < 2 {
            continue;
        }

        let ticker = get_cell(&cells, ticker_col)
            .map(|t| t.trim().to_uppercase())
            .filter(|t| !t.is_empty());
        let name = get_cell(&cells, name_col)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        if ticker.is_none() || name.is_none() {
            tracing::warn!("Skipping BRVM stock row with missing ticker or name");
            continue;
        }

        stocks.push(RawStock {
            ticker,
            name,
            sector: get_cell(&cells, sector_col)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            currency: Some("XOF".to_string()),
        });
    }
    stocks
}

fn parse_prices(html: &str, session_date: &str) -> Vec<RawPrice> {
    let doc = Html::parse_document(html);
    let table_sel = selector("table.table-striped");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No price table found on BRVM page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let ticker_col = column_index(&headers, &["symbol", "ticker", "code"]).or(Some(0));
    let close_col = column_index(&headers, &["close", "closing", "price", "cours"]).or(Some(2));
    let open_col = column_index(&headers, &["open", "opening", "previous"]).or(Some(3));
    let high_col = column_index(&headers, &["high"]);
    let low_col = column_index(&headers, &["low"]);
    let volume_col = column_index(&headers, &["volume", "qty"]).or(Some(4));
    let change_col = column_index(&headers, &["change", "var", "%"]).or(Some(5));

    let row_sel = selector("tbody tr");
    let mut prices = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        if cells.len() < 6 {
            continue;
        }

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
    let table_sel = selector("table.table-striped");

    let Some(table) = doc.select(&table_sel).next() else {
        tracing::warn!("No indices table found on BRVM page");
        return Vec::new();
    };

    let headers = header_texts(&table);
    let code_col = column_index(&headers, &["code", "symbol", "name"]).or(Some(0));
    let value_col = column_index(&headers, &["value", "price", "close", "points"]).or(Some(1));
    let change_col = column_index(&headers, &["change", "var", "%"]).or(Some(2));

    let row_sel = selector("tbody tr");
    let mut indices = Vec::new();
    for row in table.select(&row_sel) {
        let cells = row_texts(&row);
        if cells.len() < 3 {
            continue;
        }

        let Some(label) = get_cell(&cells, code_col).map(str::trim).filter(|c| !c.is_empty())
        else {
            continue;
        };

        // The code cell often carries the full index name; the first token is
        // the code and the full text serves as the name.
        let short_code = label.split_whitespace().next().unwrap_or(label);

        indices.push(RawIndex {
            code: Some(short_code.to_string()),
            name: Some(label.to_string()),
            value: get_cell(&cells, value_col).and_then(parse_float),
            change_percent: get_cell(&cells, change_col).and_then(parse_float),
        });
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;

    const EQUITY_HTML: &str = r#"
        <table class="table-striped">
          <thead><tr>
            <th>Symbole</th><th>Titre</th><th>Cours</th><th>Ouverture</th>
            <th>Volume</th><th>Var %</th>
          </tr></thead>
          <tbody>
            <tr><td>sgbc</td><td>Société Générale CI</td><td>13 500</td><td>13 400</td>
                <td>1,250</td><td>0.75</td></tr>
            <tr><td>PALC</td><td>Palm CI</td><td>-</td><td>-</td><td>-</td><td>-</td></tr>
          </tbody>
        </table>"#;

    #[test]
    fn test_parse_stocks_with_positional_fallback() {
        let stocks = parse_stocks(EQUITY_HTML);
        assert_eq!(stocks.len(), 2);
        assert_eq!(stocks[0].ticker.as_deref(), Some("SGBC"));
        assert_eq!(stocks[0].name.as_deref(), Some("Société Générale CI"));
        assert_eq!(stocks[0].currency.as_deref(), Some("XOF"));
    }

    #[test]
    fn test_parse_prices_placeholders_stay_absent() {
        let prices = parse_prices(EQUITY_HTML, "2024-01-15");
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0].close_price, Some(13500.0));
        assert_eq!(prices[0].volume, Some(1250));
        assert_eq!(prices[1].close_price, None);
        assert_eq!(prices[1].date.as_deref(), Some("2024-01-15"));
    }

    #[test]
    fn test_parse_indices_splits_code_from_label() {
        let html = r#"
            <table class="table-striped">
              <thead><tr><th>Indice</th><th>Points</th><th>Var %</th></tr></thead>
              <tbody>
                <tr><td>BRVM-COMPOSITE Composite Index</td><td>245.18</td><td>-0.12</td></tr>
              </tbody>
            </table>"#;
        let indices = parse_indices(html);
        assert_eq!(indices.len(), 1);
        assert_eq!(indices[0].code.as_deref(), Some("BRVM-COMPOSITE"));
        assert_eq!(indices[0].name.as_deref(), Some("BRVM-COMPOSITE Composite Index"));
        assert_eq!(indices[0].value, Some(245.18));
    }
}
