//! Export row processing.
//!
//! Export rows are wide line items handed to the spreadsheet layer. They go
//! through the same exclusions as aggregation rows and gain a mapped
//! `Territory` column.

use pulse_core::{
    is_excluded_customer, is_tax_product_line, resolve_territory_code, DataCategory, ExportRow,
    Region,
};
use serde_json::Value;

pub const CUSTOMER_COLUMN: &str = "CustomerNo";
pub const PRODUCT_LINE_COLUMN: &str = "ProductLine";
pub const TERRITORY_CODE_COLUMN: &str = "TerrCode";
pub const CUSTOMER_TERRITORY_COLUMN: &str = "CustTerr";
pub const TERRITORY_COLUMN: &str = "Territory";

const TRIMMED_COLUMNS: &[&str] = &[
    "CustomerNo",
    "CustomerName",
    "Item",
    "Description",
    "ProductLine",
    "Salesman",
    "Location",
    "ShipVia",
];

/// Text columns trimmed for a category. Open orders also carry a release.
pub fn trimmed_columns(category: DataCategory) -> Vec<&'static str> {
    let mut columns = TRIMMED_COLUMNS.to_vec();
    if category == DataCategory::OpenOrders {
        columns.push("Release");
    }
    columns
}

/// Filter, annotate and clean export rows for one category and region.
///
/// `Territory` is added, overwriting any upstream column of the same name.
pub fn process_export_rows(
    rows: Vec<ExportRow>,
    category: DataCategory,
    region: Region,
) -> Vec<ExportRow> {
    let columns = trimmed_columns(category);
    rows.into_iter()
        .filter(|row| {
            !is_excluded_customer(row.text(CUSTOMER_COLUMN).as_deref())
                && !is_tax_product_line(row.text(PRODUCT_LINE_COLUMN).as_deref())
        })
        .map(|mut row| {
            let order_code = row.text(TERRITORY_CODE_COLUMN);
            let customer_code = row.text(CUSTOMER_TERRITORY_COLUMN);
            let code = resolve_territory_code(order_code.as_deref(), customer_code.as_deref());
            let territory = region.territory_name(code);
            row.insert(TERRITORY_COLUMN, territory);

            for column in &columns {
                trim_column(&mut row, column);
            }
            row
        })
        .collect()
}

/// Trim a text column in place. Non-zero numbers in a text column become
/// their textual form; empty, zero and null cells are left as they are.
fn trim_column(row: &mut ExportRow, column: &str) {
    let Some(cell) = row.0.get_mut(column) else {
        return;
    };
    match cell {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.len() != text.len() {
                *text = trimmed.to_string();
            }
        }
        Value::Number(number) if number.as_f64() != Some(0.0) => {
            *cell = Value::String(number.to_string());
        }
        _ => {}
    }
}
