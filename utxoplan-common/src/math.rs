//! Integer helpers for satoshi calculations
//!
//! Everything here works on whole satoshis. Fee windows are
//! computed with integer ceilings rather than floating point so that two runs
//! over the same inputs always produce the same bounds.

use crate::error::PlanError;

/// Integer division rounding up
///
/// # Examples
///
/// ```
/// use utxoplan_common::math::div_ceil;
///
/// assert_eq!(div_ceil(10, 5), 2);
/// assert_eq!(div_ceil(11, 5), 3);
/// assert_eq!(div_ceil(0, 5), 0);
/// ```
pub fn div_ceil(value: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    value / divisor + u64::from(value % divisor != 0)
}

/// `ceil(value * numerator / denominator)` without intermediate overflow
///
/// Used for the "90% of the no-change fee" lower bound of the exact-fit window.
pub fn mul_ratio_ceil(value: u64, numerator: u64, denominator: u64) -> u64 {
    if denominator == 0 {
        return 0;
    }
    let product = value as u128 * numerator as u128;
    let quotient = product / denominator as u128 + u128::from(product % denominator as u128 != 0);
    quotient.min(u64::MAX as u128) as u64
}

/// Sum satoshi values, failing on overflow
pub fn checked_sum<I>(values: I) -> Result<u64, PlanError>
where
    I: IntoIterator<Item = u64>,
{
    values
        .into_iter()
        .try_fold(0u64, |acc, value| acc.checked_add(value))
        .ok_or(PlanError::AmountOverflow)
}

/// Add two satoshi amounts, failing on overflow
pub fn checked_add(a: u64, b: u64) -> Result<u64, PlanError> {
    a.checked_add(b).ok_or(PlanError::AmountOverflow)
}
