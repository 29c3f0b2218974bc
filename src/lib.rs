//! African Markets ETL
//!
//! A scheduled ETL service that scrapes equity listings, daily prices and
//! index levels from three African stock exchanges (JSE, NGX, BRVM),
//! normalizes the data and idempotently upserts it into SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod etl;
pub mod report;
pub mod scheduler;
pub mod scrapers;
