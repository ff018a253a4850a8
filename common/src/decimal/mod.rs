//! Decimal type utilities for precise financial calculations

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Price type with high precision
pub type Price = Decimal;

/// Quantity type with high precision
pub type Quantity = Decimal;

/// Amount type with high precision (typically Price * Quantity)
pub type Amount = Decimal;

/// Canonical string form of a decimal value.
///
/// Trailing zeros are stripped so that numerically equal values map to
/// the same key (`100`, `100.0` and `100.00` all yield `"100"`).
pub fn canonical(value: &Decimal) -> String {
    value.normalize().to_string()
}
