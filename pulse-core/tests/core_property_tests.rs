//! Property-Based Tests for Core Types
//!
//! Properties:
//! - `ExchangeRate::checked` accepts exactly the plausible quotes
//! - Territory resolution always honours the billing override
//! - Every cache key name is unique and belongs to a concrete group

use proptest::prelude::*;
use std::collections::HashSet;

use pulse_core::{
    is_plausible_rate, resolve_territory_code, CacheKey, ExchangeRate, FetchError, RefreshGroup,
    BILLING_OVERRIDE_CODE,
};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_checked_rate_matches_plausibility(rate in -1.0f64..2.0) {
        match ExchangeRate::checked(rate, "provider") {
            Ok(accepted) => {
                prop_assert!(is_plausible_rate(rate));
                prop_assert_eq!(accepted.rate, rate);
                prop_assert!(!accepted.is_fallback());
            }
            Err(FetchError::OutOfRange { provider, .. }) => {
                prop_assert!(!is_plausible_rate(rate));
                prop_assert_eq!(provider, "provider");
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn prop_billing_override_wins(
        order in prop::option::of("[0-9 ]{0,5}"),
        padding in " {0,2}",
    ) {
        let customer = format!("{}{}{}", padding, BILLING_OVERRIDE_CODE, padding);
        prop_assert_eq!(
            resolve_territory_code(order.as_deref(), Some(customer.as_str())),
            BILLING_OVERRIDE_CODE
        );
    }

    #[test]
    fn prop_order_code_used_without_override(
        order in "[0-8][0-9]{2}",
        customer in prop::option::of("[0-8][0-9]{2}"),
    ) {
        prop_assert_eq!(
            resolve_territory_code(Some(order.as_str()), customer.as_deref()),
            order.as_str()
        );
    }
}

#[test]
fn test_key_names_unique_and_grouped() {
    let keys = CacheKey::all();
    let names: HashSet<String> = keys.iter().map(|k| k.to_string()).collect();
    assert_eq!(names.len(), keys.len());

    for key in keys {
        assert_ne!(key.group(), RefreshGroup::All, "{} maps to All", key);
    }
}
