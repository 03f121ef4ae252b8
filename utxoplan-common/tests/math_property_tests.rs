//! Property-based tests for the math module

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use utxoplan_common::error::PlanError;
use utxoplan_common::math;

#[quickcheck]
fn div_ceil_is_smallest_cover(value: u64, divisor: u64) -> TestResult {
    if divisor == 0 {
        return TestResult::discard();
    }
    let q = math::div_ceil(value, divisor) as u128;
    let (value, divisor) = (value as u128, divisor as u128);

    TestResult::from_bool(q * divisor >= value && (q == 0 || (q - 1) * divisor < value))
}

#[quickcheck]
fn ninety_percent_bound_never_undershoots(fee: u32) -> bool {
    let fee = u64::from(fee);
    let bound = math::mul_ratio_ceil(fee, 9, 10);
    bound * 10 >= fee * 9 && bound <= fee && (bound == 0 || (bound - 1) * 10 < fee * 9)
}

#[quickcheck]
fn checked_sum_matches_wide_sum(values: Vec<u64>) -> bool {
    let wide: u128 = values.iter().map(|&v| v as u128).sum();
    match math::checked_sum(values) {
        Ok(sum) => sum as u128 == wide,
        Err(PlanError::AmountOverflow) => wide > u64::MAX as u128,
        Err(_) => false,
    }
}

#[test]
fn known_values() {
    assert_eq!(math::div_ceil(20_000, 1_024), 20);
    assert_eq!(math::div_ceil(7, 0), 0);
    assert_eq!(math::mul_ratio_ceil(1_770, 9, 10), 1_593);
    assert_eq!(math::mul_ratio_ceil(1_100, 9, 10), 990);
    assert!(math::checked_add(u64::MAX, 1).is_err());
}
