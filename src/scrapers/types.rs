//! Raw records produced by extraction
//!
//! Everything is optional: source pages routinely miss columns or carry
//! placeholder cells, and validation happens downstream in the cleaner.
//! Date fields stay as the raw cell text; the cleaner decides what parses.

/// A stock listing as extracted from a source page.
#[derive(Debug, Clone, Default)]
pub struct RawStock {
    pub ticker: Option<String>,
    pub name: Option<String>,
    pub sector: Option<String>,
    pub currency: Option<String>,
}

/// A daily price row as extracted from a source page.
#[derive(Debug, Clone, Default)]
pub struct RawPrice {
    pub ticker: Option<String>,
    pub date: Option<String>,
    pub close_price: Option<f64>,
    pub open_price: Option<f64>,
    pub high_price: Option<f64>,
    pub low_price: Option<f64>,
    pub volume: Option<i64>,
    pub change_percent: Option<f64>,
}

/// An index row as extracted from a source page. Source markup conflates the
/// index's identity with its current level, so both travel together and the
/// transformer splits them apart.
#[derive(Debug, Clone, Default)]
pub struct RawIndex {
    pub code: Option<String>,
    pub name: Option<String>,
    pub value: Option<f64>,
    pub change_percent: Option<f64>,
}
