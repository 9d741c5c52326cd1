//! File-backed data source.
//!
//! Each `(category, region)` pair maps to two JSON files in one directory:
//!
//! ```text
//! <dir>/bookings_us.json            raw rows for aggregation
//! <dir>/bookings_us_export.json     wide rows for export
//! <dir>/open_orders_ca.json
//! <dir>/open_orders_ca_export.json
//! ```
//!
//! Files are re-read on every fetch, so an external extractor can replace them
//! between refreshes.

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use pulse_core::{DataCategory, DataSource, ExportRow, FetchError, RawRecord, Region};

/// Reads rows for one data category from a directory of JSON arrays.
#[derive(Debug, Clone)]
pub struct FileDataSource {
    category: DataCategory,
    dir: PathBuf,
    name: String,
}

impl FileDataSource {
    pub fn new(category: DataCategory, dir: impl AsRef<Path>) -> Self {
        Self {
            category,
            dir: dir.as_ref().to_path_buf(),
            name: format!("file:{}", category.key_prefix()),
        }
    }

    /// Path of the raw rows for `region`.
    pub fn raw_path(&self, region: Region) -> PathBuf {
        self.dir.join(format!(
            "{}_{}.json",
            self.category.key_prefix(),
            region.key_suffix()
        ))
    }

    /// Path of the export rows for `region`.
    pub fn export_path(&self, region: Region) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_export.json",
            self.category.key_prefix(),
            region.key_suffix()
        ))
    }

    fn source_name(&self, region: Region) -> String {
        format!("{}/{}", self.name, region.key_suffix())
    }

    /// Read a file whose top-level value must be an array.
    async fn read_array(&self, path: &Path, region: Region) -> Result<Vec<Value>, FetchError> {
        let source_name = self.source_name(region);
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::NotFound => format!("{} does not exist", path.display()),
                _ => format!("reading {}: {}", path.display(), e),
            };
            FetchError::Connection {
                source_name: source_name.clone(),
                reason,
            }
        })?;

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| FetchError::Malformed {
            source_name: source_name.clone(),
            reason: format!("{}: {}", path.display(), e),
        })?;

        match value {
            Value::Array(items) => Ok(items),
            other => Err(FetchError::Malformed {
                source_name,
                reason: format!(
                    "{}: expected a JSON array, found {}",
                    path.display(),
                    json_kind(&other)
                ),
            }),
        }
    }
}

#[async_trait]
impl DataSource for FileDataSource {
    fn category(&self) -> DataCategory {
        self.category
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_raw(&self, region: Region) -> Result<Vec<RawRecord>, FetchError> {
        let path = self.raw_path(region);
        let items = self.read_array(&path, region).await?;
        let mut malformed = 0usize;
        let records: Vec<RawRecord> = items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item).unwrap_or_else(|_| {
                    malformed += 1;
                    RawRecord::default()
                })
            })
            .collect();

        if malformed > 0 {
            debug!(
                source = %self.source_name(region),
                malformed,
                "Replaced malformed rows with empty records"
            );
        }
        Ok(records)
    }

    async fn fetch_export(&self, region: Region) -> Result<Vec<ExportRow>, FetchError> {
        let path = self.export_path(region);
        let items = self.read_array(&path, region).await?;
        Ok(items
            .into_iter()
            .map(|item| match item {
                Value::Object(columns) => ExportRow::from(columns),
                _ => ExportRow::new(),
            })
            .collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, value: Value) {
        std::fs::write(dir.join(name), serde_json::to_vec(&value).unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_fetch_raw_reads_region_file() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "bookings_us.json",
            json!([
                {"order_id": "1", "quantity": 10, "amount": 1000.0, "territory_code": "900"},
                {"order_id": 2, "quantity": "5", "amount": "500.5"}
            ]),
        );

        let source = FileDataSource::new(DataCategory::Bookings, dir.path());
        let records = source.fetch_raw(Region::Us).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].territory_code.as_deref(), Some("900"));
        assert_eq!(records[1].order_id.as_deref(), Some("2"));
        assert_eq!(records[1].amount, Some(500.5));
    }

    #[tokio::test]
    async fn test_malformed_element_becomes_empty_record() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "open_orders_ca.json",
            json!([42, {"order_id": "9", "amount": 10.0}]),
        );

        let source = FileDataSource::new(DataCategory::OpenOrders, dir.path());
        let records = source.fetch_raw(Region::Ca).await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], RawRecord::default());
        assert_eq!(records[1].order_id.as_deref(), Some("9"));
    }

    #[tokio::test]
    async fn test_non_array_document_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bookings_ca.json", json!({"rows": []}));

        let source = FileDataSource::new(DataCategory::Bookings, dir.path());
        let err = source.fetch_raw(Region::Ca).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed { .. }));
        assert_eq!(err.source_name(), "file:bookings/ca");
    }

    #[tokio::test]
    async fn test_missing_file_is_connection_failure() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileDataSource::new(DataCategory::Bookings, dir.path());
        let err = source.fetch_export(Region::Us).await.unwrap_err();
        assert!(matches!(err, FetchError::Connection { .. }));
    }

    #[tokio::test]
    async fn test_fetch_export_keeps_columns() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "open_orders_us_export.json",
            json!([{"SalesOrder": "A1", "CustomerNo": " ABC "}, "junk"]),
        );

        let source = FileDataSource::new(DataCategory::OpenOrders, dir.path());
        let rows = source.fetch_export(Region::Us).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("CustomerNo").as_deref(), Some(" ABC "));
        assert!(rows[1].is_empty());
        assert_eq!(source.name(), "file:open_orders");
        assert_eq!(
            source.export_path(Region::Us),
            dir.path().join("open_orders_us_export.json")
        );
    }
}
