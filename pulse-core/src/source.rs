//! Upstream contracts.
//!
//! The refresh engine only needs two capabilities from the outside world:
//! rows per region for a data category, and a CAD to USD quote. Query
//! construction, connection pooling and wire formats live behind these traits.

use async_trait::async_trait;

use crate::{DataCategory, ExportRow, FetchError, RawRecord, Region};

/// A regional order database for one data category.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Category of rows this source produces.
    fn category(&self) -> DataCategory;

    /// Name used in log lines and errors.
    fn name(&self) -> &str;

    /// Lean rows for aggregation.
    async fn fetch_raw(&self, region: Region) -> Result<Vec<RawRecord>, FetchError>;

    /// Wide rows for spreadsheet export.
    async fn fetch_export(&self, region: Region) -> Result<Vec<ExportRow>, FetchError>;
}

/// A CAD to USD quote service.
///
/// Implementations return the raw quote; range checking is done by the
/// caller so every provider is held to the same bounds.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch_rate(&self) -> Result<f64, FetchError>;
}
