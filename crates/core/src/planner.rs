//! Migration amount planning.
//!
//! The canonical debt rule: migrate the whole collateral and the largest
//! repayment that keeps the new trove at or above the minimum collateral
//! ratio, capped at the full source debt. When the ratio forces a partial
//! repayment the rest of the debt stays in the source market, which must
//! still be solvent without the migrated collateral.

use crate::config::PlannerConfig;
use crate::error::{MigrationError, MigrationResult, PositionShortfall};
use crate::health::AccountSnapshot;
use crate::market::MarketParams;
use crate::u256_math::{apply_basis_points_up, pct_f64, usd_value, wad_mul, wad_to_f64, PERCENT};
use alloy::primitives::U256;
use serde::Serialize;
use tracing::info;

/// Amounts for one migration, produced once and consumed once.
///
/// `debt_amount_in_destination == debt_repay_amount * (10000 + buffer_bps) / 10000`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MigrationPlan {
    /// Underlying collateral leaving the source market
    pub collateral_amount: U256,
    /// Same collateral in vTokens
    pub wrapped_collateral_amount: U256,
    /// Source debt repaid by the flash loan
    pub debt_repay_amount: U256,
    /// Debt opened in the destination trove
    pub debt_amount_in_destination: U256,
    /// Repayment was reduced to respect the minimum collateral ratio
    pub capped_by_ratio: bool,
}

#[derive(Debug, Clone)]
pub struct MigrationPlanner {
    min_ratio_pct: U256,
    min_debt: U256,
    debt_buffer_bps: u16,
}

impl MigrationPlanner {
    pub fn new(config: &PlannerConfig) -> Self {
        Self {
            min_ratio_pct: U256::from(config.min_collateral_ratio_pct),
            min_debt: config.min_debt(),
            debt_buffer_bps: config.debt_buffer_bps,
        }
    }

    pub fn plan(&self, snapshot: &AccountSnapshot, market: &MarketParams) -> MigrationResult<MigrationPlan> {
        if snapshot.collateral_balance.is_zero() {
            return Err(MigrationError::InsufficientPosition(PositionShortfall::NoCollateral));
        }
        if snapshot.borrow_balance.is_zero() {
            return Err(MigrationError::InsufficientPosition(PositionShortfall::NoDebt));
        }
        if snapshot.liquidity_to_remove_usd > snapshot.available_liquidity_usd {
            return Err(MigrationError::InsufficientLiquidity {
                required: snapshot.liquidity_to_remove_usd,
                available: snapshot.available_liquidity_usd,
            });
        }

        let collateral_amount = snapshot.collateral_balance;
        let mut debt_repay_amount = snapshot.borrow_balance;

        // collateral * pc * 100 >= repay * pd * ratio
        let collateral_side = collateral_amount * market.collateral_price * PERCENT;
        let ratio_denominator = market.debt_price * self.min_ratio_pct;
        let capped_by_ratio = collateral_side < debt_repay_amount * ratio_denominator;
        if capped_by_ratio {
            debt_repay_amount = collateral_side / ratio_denominator;

            let required = wad_mul(snapshot.collateral_value_usd, market.collateral_factor)
                .saturating_sub(usd_value(debt_repay_amount, market.debt_price));
            if required > snapshot.available_liquidity_usd {
                return Err(MigrationError::InsufficientLiquidity {
                    required,
                    available: snapshot.available_liquidity_usd,
                });
            }
        }

        let debt_amount_in_destination = apply_basis_points_up(debt_repay_amount, self.debt_buffer_bps);
        if debt_amount_in_destination < self.min_debt {
            return Err(MigrationError::InsufficientPosition(
                PositionShortfall::BelowMinimumDebt {
                    debt: debt_amount_in_destination,
                    minimum: self.min_debt,
                },
            ));
        }

        let plan = MigrationPlan {
            collateral_amount,
            wrapped_collateral_amount: snapshot.wrapped_collateral_balance,
            debt_repay_amount,
            debt_amount_in_destination,
            capped_by_ratio,
        };
        self.log_credit_usage(snapshot, market, &plan);
        Ok(plan)
    }

    fn log_credit_usage(&self, snapshot: &AccountSnapshot, market: &MarketParams, plan: &MigrationPlan) {
        let repaid_usd = usd_value(plan.debt_repay_amount, market.debt_price);
        let removed_credit = wad_mul(snapshot.collateral_value_usd, market.collateral_factor);
        let borrows_after = snapshot.total_borrows_usd.saturating_sub(repaid_usd);
        let credit_after = snapshot.available_credit_usd.saturating_sub(removed_credit);

        info!(
            collateral = wad_to_f64(plan.collateral_amount),
            repay = wad_to_f64(plan.debt_repay_amount),
            destination_debt = wad_to_f64(plan.debt_amount_in_destination),
            capped = plan.capped_by_ratio,
            credit_used_before_pct = snapshot.credit_used_pct(),
            credit_used_after_pct = pct_f64(borrows_after, credit_after),
            "Migration planned"
        );
    }
}
