//! Upstream adapters.
//!
//! - `file`: reads rows from JSON files, one per category and region
//! - `rates`: CAD to USD quotes over HTTP
//!
//! Both implement the contracts from `pulse_core`, re-exported here.

pub mod file;
pub mod rates;

pub use file::FileDataSource;
pub use pulse_core::{DataSource, ExchangeRateProvider};
pub use rates::{default_rate_providers, parse_usd_rate, HttpRateProvider};
