//! ETL pipeline
//!
//! Scraped raw records flow through cleaning and batch transformation into
//! the idempotent loader; the processor orchestrates the steps per exchange.

pub mod clean;
pub mod load;
pub mod processor;
pub mod transform;
