//! Position health evaluation against the source market.
//!
//! Only stored (non-accruing) reads are used, so evaluating an account has no
//! side effects and two evaluations without an intervening state change return
//! identical snapshots.

use crate::error::{MigrationError, MigrationResult};
use crate::market::MarketParams;
use crate::u256_math::{pct_f64, usd_value, wad_mul, wad_to_f64, WAD};
use alloy::primitives::{Address, U256};
use futures::future::try_join_all;
use migrator_chain::{ComptrollerError, SourceMarket};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{info, instrument};

/// Per-account view of the pair being migrated plus portfolio totals.
///
/// `available_credit_usd == total_borrows_usd + available_liquidity_usd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSnapshot {
    pub account: Address,
    /// vToken balance
    pub wrapped_collateral_balance: U256,
    pub exchange_rate: U256,
    /// Underlying collateral (native units)
    pub collateral_balance: U256,
    pub collateral_value_usd: U256,
    /// Stored borrow balance (native units)
    pub borrow_balance: U256,
    pub borrow_value_usd: U256,
    /// Borrowing power lost by moving this pair out, net of the repaid debt.
    /// Zero when the pair on its own is under water.
    pub liquidity_to_remove_usd: U256,
    pub available_liquidity_usd: U256,
    pub shortfall_usd: U256,
    /// Borrows summed over every entered market
    pub total_borrows_usd: U256,
    pub available_credit_usd: U256,
    pub markets_entered: SmallVec<[Address; 4]>,
}

impl AccountSnapshot {
    /// Share of borrowing power in use, in percent.
    pub fn credit_used_pct(&self) -> f64 {
        pct_f64(self.total_borrows_usd, self.available_credit_usd)
    }
}

#[derive(Debug, Clone)]
pub struct HealthEvaluator {
    source: Arc<dyn SourceMarket>,
}

impl HealthEvaluator {
    pub fn new(source: Arc<dyn SourceMarket>) -> Self {
        Self { source }
    }

    #[instrument(skip(self, market), fields(account = %account))]
    pub async fn evaluate(&self, account: Address, market: &MarketParams) -> MigrationResult<AccountSnapshot> {
        let (exchange_rate, wrapped, borrow_balance, liquidity, entered) = tokio::try_join!(
            self.source.exchange_rate_stored(market.collateral_vtoken),
            self.source.wrapped_balance(market.collateral_vtoken, account),
            self.source.borrow_balance_stored(market.debt_vtoken, account),
            self.source.account_liquidity(account),
            self.source.assets_in(account),
        )
        .map_err(|e| MigrationError::read("account position", e))?;

        if !liquidity.error_code.is_zero() {
            return Err(MigrationError::read(
                "account liquidity",
                ComptrollerError {
                    code: liquidity.error_code.saturating_to(),
                }
                .into(),
            ));
        }

        let collateral_balance = wrapped * exchange_rate / WAD;
        let collateral_value_usd = usd_value(collateral_balance, market.collateral_price);
        let borrow_value_usd = usd_value(borrow_balance, market.debt_price);
        let liquidity_to_remove_usd =
            wad_mul(collateral_value_usd, market.collateral_factor).saturating_sub(borrow_value_usd);

        let total_borrows_usd = self.total_borrows(account, market, &entered).await?;
        let available_credit_usd = total_borrows_usd + liquidity.liquidity;

        let snapshot = AccountSnapshot {
            account,
            wrapped_collateral_balance: wrapped,
            exchange_rate,
            collateral_balance,
            collateral_value_usd,
            borrow_balance,
            borrow_value_usd,
            liquidity_to_remove_usd,
            available_liquidity_usd: liquidity.liquidity,
            shortfall_usd: liquidity.shortfall,
            total_borrows_usd,
            available_credit_usd,
            markets_entered: entered.into_iter().collect(),
        };

        info!(
            collateral_usd = wad_to_f64(collateral_value_usd),
            borrow_usd = wad_to_f64(borrow_value_usd),
            liquidity_to_remove_usd = wad_to_f64(liquidity_to_remove_usd),
            available_liquidity_usd = wad_to_f64(liquidity.liquidity),
            credit_used_pct = snapshot.credit_used_pct(),
            "Position evaluated"
        );

        Ok(snapshot)
    }

    /// Sum of stored borrows times price over every entered market.
    async fn total_borrows(
        &self,
        account: Address,
        market: &MarketParams,
        entered: &[Address],
    ) -> MigrationResult<U256> {
        let values = try_join_all(entered.iter().map(|&vtoken| async move {
            let known_price = if vtoken == market.debt_vtoken {
                Some(market.debt_price)
            } else if vtoken == market.collateral_vtoken {
                Some(market.collateral_price)
            } else {
                None
            };
            let (borrow, price) = match known_price {
                Some(price) => (self.source.borrow_balance_stored(vtoken, account).await?, price),
                None => tokio::try_join!(
                    self.source.borrow_balance_stored(vtoken, account),
                    self.source.underlying_price(vtoken),
                )?,
            };
            anyhow::Ok(usd_value(borrow, price))
        }))
        .await
        .map_err(|e| MigrationError::read("entered market borrows", e))?;

        Ok(values.into_iter().fold(U256::ZERO, |acc, v| acc + v))
    }
}
