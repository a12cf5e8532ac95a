//! Mathematical Utilities
//!
//! Checked fixed-point arithmetic for swap pricing. All divisions truncate
//! toward zero, so every conversion rounds in the protocol's favour by at
//! most one unit of the smallest denomination.
//!
//! Products such as `amount * price * (granularity - fee)` exceed `u128`
//! for realistic 18-decimal amounts, so [`mul_div`] carries a 256-bit
//! intermediate.

use crate::constants::{fees::BASIS_POINTS_GRANULARITY, precision::SCALE};
use crate::errors::{PegError, PegResult};

const LOW_MASK: u128 = u64::MAX as u128;

/// Full 128x128 -> 256 bit multiplication, returned as (high, low)
fn full_mul(a: u128, b: u128) -> (u128, u128) {
    let a0 = a & LOW_MASK;
    let a1 = a >> 64;
    let b0 = b & LOW_MASK;
    let b1 = b >> 64;

    let p00 = a0 * b0;
    let p01 = a0 * b1;
    let p10 = a1 * b0;
    let p11 = a1 * b1;

    // Cannot overflow: each term is below 2^64
    let mid = (p00 >> 64) + (p01 & LOW_MASK) + (p10 & LOW_MASK);

    let lo = (p00 & LOW_MASK) | ((mid & LOW_MASK) << 64);
    let hi = p11 + (p01 >> 64) + (p10 >> 64) + (mid >> 64);
    (hi, lo)
}

/// Compute `floor(a * b / denominator)` without intermediate overflow
///
/// # Errors
/// * `DivisionByZero` if `denominator == 0`
/// * `Overflow` if the quotient does not fit in `u128`
pub fn mul_div(a: u128, b: u128, denominator: u128) -> PegResult<u128> {
    if denominator == 0 {
        return Err(PegError::DivisionByZero);
    }

    let (hi, lo) = full_mul(a, b);
    if hi == 0 {
        return Ok(lo / denominator);
    }
    if hi >= denominator {
        return Err(PegError::Overflow);
    }

    // Shift-subtract long division of (hi, lo) by denominator; hi < denominator
    // keeps the quotient within 128 bits.
    let mut remainder = hi;
    let mut quotient: u128 = 0;
    for i in (0..128).rev() {
        let carry = remainder >> 127;
        remainder = (remainder << 1) | ((lo >> i) & 1);
        if carry == 1 || remainder >= denominator {
            remainder = remainder.wrapping_sub(denominator);
            quotient |= 1u128 << i;
        }
    }
    Ok(quotient)
}

/// `10^exp` as u128
pub fn pow10(exp: u32) -> PegResult<u128> {
    10u128.checked_pow(exp).ok_or(PegError::Overflow)
}

/// Convert a basis-point price bound into an 18-decimal price
///
/// 10_000 bp == 1.0 == 1e18
pub fn bps_to_price(bps: u64) -> u128 {
    bps as u128 * (SCALE / BASIS_POINTS_GRANULARITY as u128)
}

fn check_fee(fee_bps: u64) -> PegResult<u128> {
    if fee_bps > BASIS_POINTS_GRANULARITY {
        return Err(PegError::InvalidParameter {
            param: "fee_bps",
            reason: "exceeds basis point granularity",
        });
    }
    Ok((BASIS_POINTS_GRANULARITY - fee_bps) as u128)
}

/// Token out for `amount_in` of the reserve asset
///
/// `out = amount_in * price * (10_000 - fee) / (10_000 * 1e18)`
///
/// The oracle conversion is applied first and the fee is deducted
/// proportionally from the converted amount.
pub fn calculate_mint_amount_out(amount_in: u128, price: u128, mint_fee_bps: u64) -> PegResult<u128> {
    let fee_factor = check_fee(mint_fee_bps)?;
    if amount_in == 0 {
        return Ok(0);
    }
    let numerator = price.checked_mul(fee_factor).ok_or(PegError::Overflow)?;
    let denominator = BASIS_POINTS_GRANULARITY as u128 * SCALE;
    mul_div(amount_in, numerator, denominator)
}

/// Reserve asset out for `amount_in` of the token
///
/// `adjusted = amount_in * (10_000 - fee) / 10_000`, then
/// `out = adjusted * 1e18 / price`.
pub fn calculate_redeem_amount_out(amount_in: u128, price: u128, redeem_fee_bps: u64) -> PegResult<u128> {
    let fee_factor = check_fee(redeem_fee_bps)?;
    if amount_in == 0 {
        return Ok(0);
    }
    let adjusted = mul_div(amount_in, fee_factor, BASIS_POINTS_GRANULARITY as u128)?;
    mul_div(adjusted, SCALE, price)
}

/// Signed difference `balance - threshold`, saturating at the i128 range
pub fn signed_surplus(balance: u128, threshold: u128) -> i128 {
    if balance >= threshold {
        i128::try_from(balance - threshold).unwrap_or(i128::MAX)
    } else {
        i128::try_from(threshold - balance).map(|d| -d).unwrap_or(i128::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ONE: u128 = SCALE;

    #[test]
    fn test_mul_div_small() {
        assert_eq!(mul_div(6, 7, 2).unwrap(), 21);
        assert_eq!(mul_div(10, 1, 3).unwrap(), 3); // truncates
    }

    #[test]
    fn test_mul_div_wide_intermediate() {
        // 1e22 * 1e22 overflows u128 but the quotient does not
        let a = 10_000 * ONE;
        let result = mul_div(a, a, ONE).unwrap();
        assert_eq!(result, 100_000_000 * ONE);
    }

    #[test]
    fn test_mul_div_max_values() {
        assert_eq!(mul_div(u128::MAX, u128::MAX, u128::MAX).unwrap(), u128::MAX);
        assert_eq!(mul_div(u128::MAX, 2, 4).unwrap(), u128::MAX / 2);
    }

    #[test]
    fn test_mul_div_errors() {
        assert_eq!(mul_div(1, 1, 0), Err(PegError::DivisionByZero));
        assert_eq!(mul_div(u128::MAX, 4, 2), Err(PegError::Overflow));
    }

    #[test]
    fn test_bps_to_price() {
        assert_eq!(bps_to_price(10_000), ONE);
        assert_eq!(bps_to_price(9_800), 98 * ONE / 100);
        assert_eq!(bps_to_price(10_200), 102 * ONE / 100);
    }

    #[test]
    fn test_mint_amount_with_fee() {
        // 2.5% fee at peg: 1000 in -> 975 out
        assert_eq!(calculate_mint_amount_out(1000, ONE, 250).unwrap(), 975);
        assert_eq!(calculate_mint_amount_out(10 * ONE, ONE, 0).unwrap(), 10 * ONE);
    }

    #[test]
    fn test_mint_amount_zero_input() {
        assert_eq!(calculate_mint_amount_out(0, ONE, 100).unwrap(), 0);
        assert_eq!(calculate_redeem_amount_out(0, ONE, 100).unwrap(), 0);
    }

    #[test]
    fn test_redeem_amount_with_price() {
        // Price 1.25 reserve per token quoted as token per reserve:
        // 1000 tokens / 1.25 = 800 reserve
        let price = 125 * ONE / 100;
        assert_eq!(calculate_redeem_amount_out(1000 * ONE, price, 0).unwrap(), 800 * ONE);
    }

    #[test]
    fn test_fee_above_granularity_rejected() {
        assert!(calculate_mint_amount_out(1, ONE, 10_001).is_err());
        assert!(calculate_redeem_amount_out(1, ONE, 10_001).is_err());
    }

    #[test]
    fn test_signed_surplus() {
        assert_eq!(signed_surplus(30, 10), 20);
        assert_eq!(signed_surplus(10, 30), -20);
        assert_eq!(signed_surplus(u128::MAX, 0), i128::MAX);
    }

    fn reference_mul_div(a: u64, b: u64, d: u64) -> u128 {
        (a as u128 * b as u128) / d as u128
    }

    proptest! {
        #[test]
        fn prop_mul_div_matches_native(a in any::<u64>(), b in any::<u64>(), d in 1u64..=u64::MAX) {
            prop_assert_eq!(mul_div(a as u128, b as u128, d as u128).unwrap(), reference_mul_div(a, b, d));
        }

        #[test]
        fn prop_mint_non_decreasing_in_amount(
            x in 0u128..1_000_000_000 * ONE,
            delta in 0u128..1_000 * ONE,
            price in (98 * ONE / 100)..(102 * ONE / 100),
            fee in 0u64..=300,
        ) {
            let lo = calculate_mint_amount_out(x, price, fee).unwrap();
            let hi = calculate_mint_amount_out(x + delta, price, fee).unwrap();
            prop_assert!(hi >= lo);
        }

        #[test]
        fn prop_mint_strictly_decreasing_in_fee(
            x in ONE..1_000_000_000 * ONE,
            price in (98 * ONE / 100)..(102 * ONE / 100),
            fee in 0u64..300,
        ) {
            let cheaper = calculate_mint_amount_out(x, price, fee).unwrap();
            let dearer = calculate_mint_amount_out(x, price, fee + 1).unwrap();
            prop_assert!(dearer < cheaper);
        }

        #[test]
        fn prop_round_trip_never_profits(
            x in 0u128..1_000_000_000 * ONE,
            price in (98 * ONE / 100)..(102 * ONE / 100),
            mint_fee in 0u64..=300,
            redeem_fee in 0u64..=300,
        ) {
            let minted = calculate_mint_amount_out(x, price, mint_fee).unwrap();
            let back = calculate_redeem_amount_out(minted, price, redeem_fee).unwrap();
            prop_assert!(back <= x);
        }
    }
}
