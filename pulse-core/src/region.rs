//! Regions, territory tables and the customer exclusion set.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Territory code reserved for central billing. When it appears as the
/// customer's own territory it overrides the order-level territory.
pub const BILLING_OVERRIDE_CODE: &str = "900";

/// Display name for territory codes absent from a region's table.
pub const OTHERS_TERRITORY: &str = "Others";

/// Group name for open-order lines without a salesperson.
pub const UNASSIGNED_SALESPERSON: &str = "Unassigned";

/// Product line code that never contributes to totals.
pub const TAX_PRODUCT_LINE: &str = "TAX";

static TERRITORY_MAP_US: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("000", "LA"),
        ("001", "LA"),
        ("010", "China"),
        ("114", "Seattle"),
        ("126", "Denver"),
        ("204", "Columbus"),
        ("206", "Jacksonville"),
        ("210", "Houston"),
        ("211", "Dallas"),
        ("218", "San Antonio"),
        ("221", "Kansas City"),
        ("302", "Nashville"),
        ("305", "Levittown,PA"),
        ("307", "Charlotte"),
        ("312", "Atlanta"),
        ("324", "Indianapolis"),
        ("900", "Central Billing"),
    ])
});

static TERRITORY_MAP_CA: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([("501", "Vancouver"), ("502", "Toronto"), ("503", "Montreal")])
});

/// House and test accounts, compared after trimming and upper-casing.
static EXCLUDED_CUSTOMERS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "W1VAN",
        "W1TOR",
        "W1MON",
        "MISC",
        "TWGMARKET",
        "EMP-US",
        "TEST123",
    ])
});

/// Geographic partition with its own upstream database and territory table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Region {
    Us,
    Ca,
}

impl Region {
    /// All regions in refresh order.
    pub const ALL: [Region; 2] = [Region::Us, Region::Ca];

    /// Lower-case suffix used in cache keys.
    pub fn key_suffix(&self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Ca => "ca",
        }
    }

    /// Upper-case label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Region::Us => "US",
            Region::Ca => "CA",
        }
    }

    /// Whether monetary values in this region are quoted in CAD.
    pub fn needs_usd_conversion(&self) -> bool {
        matches!(self, Region::Ca)
    }

    /// Map a territory code to its display name.
    ///
    /// The code is trimmed first; unknown or empty codes map to
    /// [`OTHERS_TERRITORY`].
    pub fn territory_name(&self, code: &str) -> &'static str {
        let table = match self {
            Region::Us => &*TERRITORY_MAP_US,
            Region::Ca => &*TERRITORY_MAP_CA,
        };
        table.get(code.trim()).copied().unwrap_or(OTHERS_TERRITORY)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pick the territory code that owns a line.
///
/// A customer billed centrally keeps the billing code no matter where the
/// order was placed; otherwise the order-level code is used.
pub fn resolve_territory_code<'a>(
    order_territory: Option<&'a str>,
    customer_territory: Option<&'a str>,
) -> &'a str {
    let customer = customer_territory.unwrap_or_default().trim();
    if customer == BILLING_OVERRIDE_CODE {
        return customer;
    }
    order_territory.unwrap_or_default().trim()
}

/// Whether a customer id belongs to the house/test exclusion set.
pub fn is_excluded_customer(customer_id: Option<&str>) -> bool {
    let normalized = customer_id.unwrap_or_default().trim().to_uppercase();
    EXCLUDED_CUSTOMERS.contains(normalized.as_str())
}

/// Whether a product line code is the tax line.
pub fn is_tax_product_line(product_line: Option<&str>) -> bool {
    product_line.unwrap_or_default().trim().eq_ignore_ascii_case(TAX_PRODUCT_LINE)
}
