//! Exclusion filters and territory resolution for aggregation rows.

use pulse_core::{
    is_excluded_customer, is_tax_product_line, resolve_territory_code, RawRecord, Region,
};

/// Returns true if the record may contribute to totals.
///
/// House and test accounts are dropped, as are tax lines.
pub fn is_retained(record: &RawRecord) -> bool {
    !is_excluded_customer(record.customer_id.as_deref())
        && !is_tax_product_line(record.product_line.as_deref())
}

/// Display name of the territory that owns a record.
pub fn territory_of(record: &RawRecord, region: Region) -> &'static str {
    let code = resolve_territory_code(
        record.territory_code.as_deref(),
        record.customer_territory.as_deref(),
    );
    region.territory_name(code)
}
