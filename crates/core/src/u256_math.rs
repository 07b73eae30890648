//! U256 fixed-point helpers for position valuation and migration sizing.
//!
//! All USD values are WAD (18 decimals). Source oracle prices are already
//! scaled per asset, so `amount * price / WAD` is a WAD USD value regardless
//! of the token's decimals.

use alloy::primitives::U256;

/// WAD constant: 1e18 for 18-decimal fixed-point arithmetic
pub const WAD: U256 = U256::from_limbs([1_000_000_000_000_000_000u64, 0, 0, 0]);

/// Scale of the destination's nominal collateral ratio (1e20)
pub const NICR_PRECISION: U256 = U256::from_limbs([0x6bc7_5e2d_6310_0000, 0x5, 0, 0]);

/// Basis points denominator (10000 = 100%)
pub const BPS_DENOMINATOR: U256 = U256::from_limbs([10000u64, 0, 0, 0]);

/// Percent denominator
pub const PERCENT: U256 = U256::from_limbs([100u64, 0, 0, 0]);

/// USD value (WAD) of `amount` at an oracle `price`.
#[inline(always)]
pub fn usd_value(amount: U256, price: U256) -> U256 {
    if amount.is_zero() || price.is_zero() {
        return U256::ZERO;
    }
    amount * price / WAD
}

/// Apply basis points increase.
/// Returns: value * (10000 + basis_points) / 10000
///
/// Example: apply_basis_points_up(1000, 100) = 1010 (1% increase)
#[inline(always)]
pub fn apply_basis_points_up(value: U256, basis_points: u16) -> U256 {
    let factor = BPS_DENOMINATOR + U256::from(basis_points);
    (value * factor) / BPS_DENOMINATOR
}

/// Nominal collateral ratio used to order troves: `collateral * 1e20 / debt`.
///
/// Returns U256::MAX if debt is zero.
#[inline(always)]
pub fn nominal_collateral_ratio(collateral: U256, debt: U256) -> U256 {
    if debt.is_zero() {
        return U256::MAX;
    }
    collateral * NICR_PRECISION / debt
}

/// Multiply two WAD values: (a * b) / WAD
#[inline(always)]
pub fn wad_mul(a: U256, b: U256) -> U256 {
    (a * b) / WAD
}

/// Convert WAD (18 decimals) to f64.
/// Use only for display/logging, not for computation.
#[inline(always)]
pub fn wad_to_f64(wad: U256) -> f64 {
    if wad <= U256::from(u128::MAX) {
        let value: u128 = wad.to();
        value as f64 / 1e18
    } else {
        let limbs = wad.as_limbs();
        let high = limbs[1] as f64 * (u64::MAX as f64 + 1.0);
        let low = limbs[0] as f64;
        (high + low) / 1e18
    }
}

/// Convert whole tokens to an 18-decimal amount.
#[inline(always)]
pub fn tokens_to_wad(tokens: u64) -> U256 {
    U256::from(tokens) * WAD
}

/// Calculate percentage as f64 (for display).
/// Returns: (value * 100) / total as percentage, two decimals.
#[inline(always)]
pub fn pct_f64(value: U256, total: U256) -> f64 {
    if total.is_zero() {
        return 0.0;
    }
    let bps = (value * BPS_DENOMINATOR) / total;
    bps.saturating_to::<u64>() as f64 / 100.0
}

/// Safe maximum of two U256 values
#[inline(always)]
pub fn max(a: U256, b: U256) -> U256 {
    if a > b {
        a
    } else {
        b
    }
}
