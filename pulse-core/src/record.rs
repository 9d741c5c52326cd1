//! Upstream row types.
//!
//! Rows are transient: produced per fetch, owned by one refresh cycle, and
//! dropped once aggregated or processed into export rows. Field decoding is
//! lenient so that a single odd cell degrades to an empty field instead of
//! failing the whole batch.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One line-item observation from an upstream order database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    /// Sales order number. Lines of the same order share it.
    #[serde(deserialize_with = "lenient_string")]
    pub order_id: Option<String>,
    /// Ordered (bookings) or still-open (open orders) quantity.
    #[serde(deserialize_with = "lenient_i64")]
    pub quantity: Option<i64>,
    /// Gross extended amount, quantity times unit price.
    #[serde(deserialize_with = "lenient_f64")]
    pub amount: Option<f64>,
    /// Territory code on the order header.
    #[serde(deserialize_with = "lenient_string")]
    pub territory_code: Option<String>,
    /// Territory code on the customer master.
    #[serde(deserialize_with = "lenient_string")]
    pub customer_territory: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub customer_id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub product_line: Option<String>,
    /// Line discount in percent (open orders only).
    #[serde(deserialize_with = "lenient_f64")]
    pub discount_pct: Option<f64>,
    /// Salesperson id (open orders only).
    #[serde(deserialize_with = "lenient_string")]
    pub salesperson: Option<String>,
}

impl RawRecord {
    /// Amount as a finite number; missing or non-finite values count as zero.
    pub fn amount_or_zero(&self) -> f64 {
        finite_or_zero(self.amount)
    }

    /// Quantity with missing values counted as zero.
    pub fn quantity_or_zero(&self) -> i64 {
        self.quantity.unwrap_or(0)
    }

    /// Discount percentage as a finite number, zero when absent.
    pub fn discount_or_zero(&self) -> f64 {
        finite_or_zero(self.discount_pct)
    }
}

fn finite_or_zero(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// A wide line-item row destined for spreadsheet export.
///
/// Columns are kept as JSON values keyed by column name; formatting is the
/// presentation layer's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExportRow(pub Map<String, Value>);

impl ExportRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Column value as text, when it is a string or a number.
    pub fn text(&self, column: &str) -> Option<String> {
        match self.0.get(column)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ExportRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

// ============================================================================
// LENIENT FIELD DECODING
// ============================================================================

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_record_decodes_numeric_order_id() {
        let record: RawRecord = serde_json::from_value(json!({
            "order_id": 1,
            "quantity": 10,
            "amount": 1000.0,
            "territory_code": "900",
            "customer_id": "ABC",
            "product_line": "WHEEL"
        }))
        .unwrap();
        assert_eq!(record.order_id.as_deref(), Some("1"));
        assert_eq!(record.quantity, Some(10));
        assert_eq!(record.amount_or_zero(), 1000.0);
        assert_eq!(record.salesperson, None);
    }

    #[test]
    fn test_raw_record_tolerates_odd_cells() {
        let record: RawRecord = serde_json::from_value(json!({
            "order_id": null,
            "quantity": "7.9",
            "amount": {"nested": true},
            "discount_pct": "12.5"
        }))
        .unwrap();
        assert_eq!(record.order_id, None);
        assert_eq!(record.quantity, Some(7));
        assert_eq!(record.amount_or_zero(), 0.0);
        assert_eq!(record.discount_or_zero(), 12.5);
    }

    #[test]
    fn test_non_finite_amount_counts_as_zero() {
        let record = RawRecord {
            amount: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(record.amount_or_zero(), 0.0);
        assert_eq!(record.quantity_or_zero(), 0);
    }

    #[test]
    fn test_export_row_text() {
        let mut row = ExportRow::new();
        row.insert("SalesOrder", 42);
        row.insert("CustomerNo", " ABC ");
        row.insert("ShipDate", Value::Null);
        assert_eq!(row.text("SalesOrder").as_deref(), Some("42"));
        assert_eq!(row.text("CustomerNo").as_deref(), Some(" ABC "));
        assert_eq!(row.text("ShipDate"), None);
        assert_eq!(row.len(), 3);
    }
}
