//! Record-level cleaning and validation
//!
//! Turns a loose raw record into a canonical one or fails with a
//! `Validation` error naming the offending field. Callers decide whether to
//! skip-and-log (the transformer) or propagate.

use crate::config;
use crate::error::{AppError, Result};
use crate::scrapers::types::{RawIndex, RawPrice, RawStock};
use chrono::{DateTime, NaiveDate, Utc};

/// Accepted date formats, tried in order.
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d %b %Y"];

/// A validated stock listing ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanStock {
    pub ticker: String,
    pub name: String,
    pub sector: Option<String>,
    pub currency: String,
    pub last_updated: DateTime<Utc>,
}

/// A validated price point ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanPrice {
    pub ticker: String,
    pub date: NaiveDate,
    pub close_price: f64,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub volume: Option<i64>,
    pub change_percent: Option<f64>,
}

/// A validated index ready for upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanIndex {
    pub code: String,
    pub name: String,
    pub last_updated: DateTime<Utc>,
}

/// A validated index level ready for upsert, keyed by index code until the
/// loader resolves the surrogate id.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanIndexValue {
    pub index_code: String,
    pub date: NaiveDate,
    pub value: f64,
    pub change_percent: Option<f64>,
}

/// Parse a date string against the accepted formats, first match wins.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let trimmed = text.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return Ok(date);
        }
    }
    Err(AppError::Validation(format!("Unrecognized date format: {trimmed}")))
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::Validation(format!("{field} is required")))
}

/// Clean a raw stock record. Ticker and name are required; the currency is
/// defaulted from the exchange when the source carried none.
pub fn clean_stock(raw: &RawStock, exchange_code: &str) -> Result<CleanStock> {
    let ticker = required(raw.ticker.as_deref(), "Ticker")?.to_uppercase();
    let name = required(raw.name.as_deref(), "Stock name")?.to_string();

    let currency = raw
        .currency
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| config::default_currency(exchange_code).to_string());

    Ok(CleanStock {
        ticker,
        name,
        sector: raw.sector.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        currency,
        last_updated: Utc::now(),
    })
}

/// Clean a raw price record. Ticker, date and close price are required; a
/// date that matches none of the accepted formats fails validation rather
/// than being replaced with today.
pub fn clean_price(raw: &RawPrice) -> Result<CleanPrice> {
    let ticker = required(raw.ticker.as_deref(), "Ticker")?.to_uppercase();
    let date_text = required(raw.date.as_deref(), "Price date")?;
    let date = parse_date(date_text)?;
    let close_price = raw
        .close_price
        .ok_or_else(|| AppError::Validation(format!("Close price is required for {ticker}")))?;

    Ok(CleanPrice {
        ticker,
        date,
        close_price,
        open_price: raw.open_price,
        high_price: raw.high_price,
        low_price: raw.low_price,
        volume: raw.volume,
        change_percent: raw.change_percent,
    })
}

/// Clean a raw index record. Code and name are required. When the source row
/// carried a current level, the paired value record is synthesized for
/// `value_date` in the same pass.
pub fn clean_index(
    raw: &RawIndex,
    value_date: NaiveDate,
) -> Result<(CleanIndex, Option<CleanIndexValue>)> {
    let code = required(raw.code.as_deref(), "Index code")?.to_uppercase();
    let name = required(raw.name.as_deref(), "Index name")?.to_string();

    let value = raw.value.map(|value| CleanIndexValue {
        index_code: code.clone(),
        date: value_date,
        value,
        change_percent: raw.change_percent,
    });

    Ok((CleanIndex { code, name, last_updated: Utc::now() }, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_accepts_all_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        for text in ["2024-01-15", "15/01/2024", "15-01-2024", "15 Jan 2024"] {
            assert_eq!(parse_date(text).unwrap(), expected, "format: {text}");
        }
    }

    #[test]
    fn test_parse_date_rejects_unknown_format() {
        let err = parse_date("2024/01/15").unwrap_err();
        assert!(err.to_string().contains("2024/01/15"), "error names the value: {err}");
    }

    #[test]
    fn test_clean_stock_defaults_currency_by_exchange() {
        let raw = RawStock {
            ticker: Some(" abc ".to_string()),
            name: Some("ABC Ltd".to_string()),
            ..Default::default()
        };
        let stock = clean_stock(&raw, "JSE").unwrap();
        assert_eq!(stock.ticker, "ABC");
        assert_eq!(stock.currency, "ZAR");

        let stock = clean_stock(&raw, "XXX").unwrap();
        assert_eq!(stock.currency, "USD");
    }

    #[test]
    fn test_clean_stock_requires_ticker_and_name() {
        let raw = RawStock { name: Some("No Ticker Plc".to_string()), ..Default::default() };
        assert!(clean_stock(&raw, "JSE").is_err());

        let raw = RawStock { ticker: Some("ABC".to_string()), ..Default::default() };
        assert!(clean_stock(&raw, "JSE").is_err());
    }

    #[test]
    fn test_clean_price_requires_close() {
        let raw = RawPrice {
            ticker: Some("ABC".to_string()),
            date: Some("2024-01-15".to_string()),
            ..Default::default()
        };
        let err = clean_price(&raw).unwrap_err();
        assert!(err.to_string().contains("Close price"));
    }

    #[test]
    fn test_clean_price_rejects_bad_date() {
        let raw = RawPrice {
            ticker: Some("ABC".to_string()),
            date: Some("not-a-date".to_string()),
            close_price: Some(45.0),
            ..Default::default()
        };
        assert!(clean_price(&raw).is_err());
    }

    #[test]
    fn test_clean_index_synthesizes_value() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let raw = RawIndex {
            code: Some("top40".to_string()),
            name: Some("Top 40".to_string()),
            value: Some(68412.55),
            change_percent: Some(0.8),
        };
        let (index, value) = clean_index(&raw, date).unwrap();
        assert_eq!(index.code, "TOP40");
        let value = value.unwrap();
        assert_eq!(value.index_code, "TOP40");
        assert_eq!(value.date, date);
        assert_eq!(value.value, 68412.55);
    }

    #[test]
    fn test_clean_index_without_level_has_no_value() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let raw = RawIndex {
            code: Some("ALSI".to_string()),
            name: Some("All Share".to_string()),
            ..Default::default()
        };
        let (_, value) = clean_index(&raw, date).unwrap();
        assert!(value.is_none());
    }
}
