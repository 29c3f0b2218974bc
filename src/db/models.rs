//! Database row models

use serde::{Deserialize, Serialize};

/// Exchange model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exchange {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub country: String,
    pub currency: String,
    pub website: Option<String>,
    pub timezone: Option<String>,
    pub last_updated: String,
}

/// Stock listing model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stock {
    pub id: i64,
    pub ticker: String,
    pub name: String,
    pub sector: Option<String>,
    pub exchange_id: i64,
    pub currency: Option<String>,
    pub created_at: String,
    pub last_updated: String,
}

/// Daily price point for a stock. Dates are ISO `YYYY-MM-DD` strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockPrice {
    pub id: i64,
    pub stock_id: i64,
    pub date: String,
    pub open_price: Option<f64>,
    pub close_price: f64,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub volume: Option<i64>,
    pub change_percent: Option<f64>,
    pub created_at: String,
}

/// Market index model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketIndex {
    pub id: i64,
    pub code: String,
    pub name: String,
    pub exchange_id: i64,
    pub created_at: String,
    pub last_updated: String,
}

/// Daily level for a market index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexValue {
    pub id: i64,
    pub index_id: i64,
    pub date: String,
    pub value: f64,
    pub change_percent: Option<f64>,
    pub created_at: String,
}

/// Run metadata for a data source. One row per (exchange, type), seeded by
/// migration; the orchestrator only ever updates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSource {
    pub id: i64,
    pub exchange_code: String,
    pub source_type: String,
    pub last_run: Option<String>,
    pub error_log: Option<String>,
}
