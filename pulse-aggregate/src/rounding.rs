//! Ceiling rounding of monetary totals.
//!
//! Published amounts are always rounded up to the next whole unit. The grand
//! total and every group subtotal are rounded independently, so the rounded
//! parts need not sum to the rounded whole.

/// Round a monetary amount up to a whole unit. Non-finite input yields zero.
pub fn ceil_amount(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    value.ceil() as i64
}

/// Convert an already-rounded CAD amount to USD, rounding up again.
pub fn convert_ceil(amount: i64, rate: f64) -> i64 {
    ceil_amount(amount as f64 * rate)
}
