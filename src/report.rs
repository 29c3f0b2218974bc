//! End-of-day market summary
//!
//! Renders a plain-text digest of the latest stored session per exchange:
//! index levels, then the top gainers and losers by change percent. Meant
//! for the evening log line and the `summary` command.

use crate::db::{self, Db};
use crate::error::Result;
use std::fmt::Write;
use std::sync::Arc;

const TOP_MOVERS: usize = 3;

/// Build the daily summary across every stored exchange.
pub fn generate_market_summary(db: &Arc<Db>) -> Result<String> {
    let exchanges = db.list_exchanges()?;
    let mut out = String::new();

    let _ = writeln!(out, "=== African Markets Daily Summary ===");
    if exchanges.is_empty() {
        let _ = writeln!(out, "No exchange data collected yet.");
        return Ok(out);
    }

    for exchange in exchanges {
        let (levels, movers) = db.with_conn(|conn| {
            Ok((
                db::index::latest_levels(conn, exchange.id)?,
                db::price::latest_movers(conn, exchange.id)?,
            ))
        })?;

        let _ = writeln!(out, "\n{} ({})", exchange.name, exchange.code);

        if levels.is_empty() {
            let _ = writeln!(out, "  No index data available.");
        }
        for level in &levels {
            match level.change_percent {
                Some(change) => {
                    let _ = writeln!(
                        out,
                        "  {}: {:.2} ({:+.2}%) as of {}",
                        level.code, level.value, change, level.date
                    );
                }
                None => {
                    let _ = writeln!(
                        out,
                        "  {}: {:.2} as of {}",
                        level.code, level.value, level.date
                    );
                }
            }
        }

        if movers.is_empty() {
            let _ = writeln!(out, "  No price movement data available.");
            continue;
        }

        // Movers arrive sorted by change percent descending; a flat or
        // one-sided session leaves one of the lists empty.
        let gainers = movers.iter().filter(|m| m.change_percent > 0.0).take(TOP_MOVERS);
        let losers = movers.iter().rev().filter(|m| m.change_percent < 0.0).take(TOP_MOVERS);

        let _ = writeln!(out, "  Top gainers:");
        for mover in gainers {
            let _ = writeln!(
                out,
                "    {} ({}): {:+.2}%",
                mover.ticker, mover.name, mover.change_percent
            );
        }

        let _ = writeln!(out, "  Top losers:");
        for mover in losers {
            let _ = writeln!(
                out,
                "    {} ({}): {:+.2}%",
                mover.ticker, mover.name, mover.change_percent
            );
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::etl::clean::{CleanIndex, CleanIndexValue, CleanPrice, CleanStock};
    use crate::etl::load::Loader;
    use chrono::{NaiveDate, Utc};

    fn stock(ticker: &str) -> CleanStock {
        CleanStock {
            ticker: ticker.to_string(),
            name: format!("{ticker} Ltd"),
            sector: None,
            currency: "ZAR".to_string(),
            last_updated: Utc::now(),
        }
    }

    fn price(ticker: &str, change: f64) -> CleanPrice {
        CleanPrice {
            ticker: ticker.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            close_price: 100.0,
            open_price: None,
            high_price: None,
            low_price: None,
            volume: None,
            change_percent: Some(change),
        }
    }

    #[test]
    fn test_summary_with_no_data() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let summary = generate_market_summary(&db).unwrap();
        assert!(summary.contains("No exchange data collected yet"));
    }

    #[test]
    fn test_summary_lists_indices_and_movers() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let loader = Loader::new(db.clone());

        let stocks: Vec<_> = ["AAA", "BBB", "CCC", "DDD"].iter().map(|t| stock(t)).collect();
        loader.load_stocks(&stocks, "JSE").unwrap();
        let prices = vec![price("AAA", 4.2), price("BBB", 1.1), price("CCC", -0.5),
            price("DDD", -2.8)];
        loader.load_prices(&prices, "JSE").unwrap();

        let indices = vec![CleanIndex {
            code: "TOP40".to_string(),
            name: "Top 40".to_string(),
            last_updated: Utc::now(),
        }];
        let values = vec![CleanIndexValue {
            index_code: "TOP40".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            value: 68412.55,
            change_percent: Some(0.8),
        }];
        loader.load_indices(&indices, &values, "JSE").unwrap();

        let summary = generate_market_summary(&db).unwrap();
        assert!(summary.contains("Johannesburg Stock Exchange (JSE)"));
        assert!(summary.contains("TOP40: 68412.55 (+0.80%)"));
        assert!(summary.contains("AAA"), "gainers present: {summary}");
        assert!(summary.contains("DDD"), "losers present: {summary}");
    }

    #[test]
    fn test_few_movers_do_not_appear_in_both_lists() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let loader = Loader::new(db.clone());
        loader.load_stocks(&[stock("AAA"), stock("CCC")], "JSE").unwrap();
        loader.load_prices(&[price("AAA", 1.1), price("CCC", -0.5)], "JSE").unwrap();

        let summary = generate_market_summary(&db).unwrap();
        let (gainers, losers) = summary.split_once("Top losers:").unwrap();
        assert!(gainers.contains("AAA") && !gainers.contains("CCC"), "{summary}");
        assert!(losers.contains("CCC") && !losers.contains("AAA"), "{summary}");
    }

    #[test]
    fn test_one_sided_session_leaves_losers_empty() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let loader = Loader::new(db.clone());
        loader.load_stocks(&[stock("AAA"), stock("BBB")], "JSE").unwrap();
        loader.load_prices(&[price("AAA", 2.0), price("BBB", 0.4)], "JSE").unwrap();

        let summary = generate_market_summary(&db).unwrap();
        let (_, losers) = summary.split_once("Top losers:").unwrap();
        assert!(!losers.contains("AAA") && !losers.contains("BBB"), "{summary}");
    }

    #[test]
    fn test_summary_exchange_without_prices() {
        let db = Arc::new(Db::open_in_memory().unwrap());
        let loader = Loader::new(db.clone());
        loader.load_stocks(&[stock("AAA")], "JSE").unwrap();

        let summary = generate_market_summary(&db).unwrap();
        assert!(summary.contains("No index data available"));
        assert!(summary.contains("No price movement data available"));
    }
}
