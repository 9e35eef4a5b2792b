//! Minor-unit money helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Amounts are `i64` minor currency units (cents); every fractional
//! intermediate (tax rates, rule results) is a `rust_decimal::Decimal`.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Tolerance for deciding that a fractional part sits exactly half-way.
///
/// Rule evaluation can hand back values like `2.4999999995` that are meant
/// to be `2.5`; anything closer to the half-way point than this tolerance is
/// snapped onto it before round-half-to-even is applied.
const HALF_WAY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 8);

/// Rounds a value to `decimal_places` using banker's rounding (half-to-even).
///
/// Values within [`HALF_WAY_TOLERANCE`] of the half-way point are treated as
/// exactly half-way; everything else rounds normally.
///
/// # Example
///
/// ```
/// use rust_decimal_macros::dec;
/// use splitrail_shared::types::money::bankers_round;
///
/// assert_eq!(bankers_round(dec!(2.5), 0), dec!(2));
/// assert_eq!(bankers_round(dec!(3.5), 0), dec!(4));
/// ```
#[must_use]
pub fn bankers_round(value: Decimal, decimal_places: u32) -> Decimal {
    let factor = Decimal::from(10u64.pow(decimal_places));
    let scaled = value * factor;

    let floor = scaled.floor();
    let fraction = scaled - floor;
    let half = Decimal::new(5, 1);

    let snapped = if (fraction - half).abs() < HALF_WAY_TOLERANCE {
        floor + half
    } else {
        scaled
    };

    snapped.round_dp_with_strategy(0, RoundingStrategy::MidpointNearestEven) / factor
}

/// Converts a rule-produced decimal into whole minor units.
///
/// Applies banker's rounding to zero decimal places. Values outside the
/// `i64` range collapse to zero; rule results are minor-unit magnitudes and
/// never come near that boundary.
#[must_use]
pub fn to_minor_units(value: Decimal) -> i64 {
    bankers_round(value, 0).to_i64().unwrap_or(0)
}

/// Computes the tax on a taxable minor-unit amount.
///
/// `tax = bankers_round(tax_rate * taxable)`; negative rates produce no tax.
#[must_use]
pub fn round_tax(tax_rate: Decimal, taxable: i64) -> i64 {
    if tax_rate < Decimal::ZERO {
        return 0;
    }
    to_minor_units(tax_rate * Decimal::from(taxable))
}
