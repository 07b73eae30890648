//! Open and close source positions for the signing account.
//!
//! Used to set up a leveraged position before a migration and to unwind one
//! afterwards. Every write goes through the signer's single submission lane,
//! so the steps here run strictly one after another.

use crate::config::PreparationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::u256_math::{apply_basis_points_up, wad_to_f64, BPS_DENOMINATOR};
use alloy::primitives::{Address, B256, U256};
use migrator_chain::{SourceMarket, SourcePositionWriter};
use serde::Serialize;
use smallvec::SmallVec;
use std::num::NonZeroU64;
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone, Serialize)]
pub struct OpenedPosition {
    pub deposit: U256,
    pub borrowed: U256,
    /// enterMarkets, mint, borrow
    pub txs: SmallVec<[B256; 3]>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClosedPosition {
    pub repaid: U256,
    pub redeemed_wrapped: U256,
    pub txs: SmallVec<[B256; 5]>,
}

#[derive(Debug)]
pub struct PositionPreparer {
    source: Arc<dyn SourceMarket>,
    writer: Arc<dyn SourcePositionWriter>,
    collateral_vtoken: Address,
    debt_vtoken: Address,
    debt_underlying: Address,
    repay_buffer_bps: u16,
}

impl PositionPreparer {
    pub fn new(
        source: Arc<dyn SourceMarket>,
        writer: Arc<dyn SourcePositionWriter>,
        collateral_vtoken: Address,
        debt_vtoken: Address,
        debt_underlying: Address,
        config: &PreparationConfig,
    ) -> Self {
        Self {
            source,
            writer,
            collateral_vtoken,
            debt_vtoken,
            debt_underlying,
            repay_buffer_bps: config.repay_buffer_bps,
        }
    }

    /// Borrow that puts `deposit` at `target_ratio_bps` (12500 = 125%).
    pub fn borrow_for_ratio(
        deposit: U256,
        collateral_price: U256,
        debt_price: U256,
        target_ratio_bps: NonZeroU64,
    ) -> U256 {
        let denominator = debt_price * U256::from(target_ratio_bps.get());
        if denominator.is_zero() {
            return U256::ZERO;
        }
        deposit * collateral_price * BPS_DENOMINATOR / denominator
    }

    /// Supply `deposit` of native collateral and borrow against it.
    #[instrument(skip(self))]
    pub async fn open_with_ratio(
        &self,
        deposit: U256,
        target_ratio_bps: NonZeroU64,
    ) -> MigrationResult<OpenedPosition> {
        let (collateral_price, debt_price) = tokio::try_join!(
            self.source.underlying_price(self.collateral_vtoken),
            self.source.underlying_price(self.debt_vtoken),
        )
        .map_err(|e| MigrationError::read("prices", e))?;

        if collateral_price.is_zero() || debt_price.is_zero() {
            return Err(MigrationError::read(
                "prices",
                anyhow::anyhow!("oracle returned a zero price"),
            ));
        }

        let borrowed = Self::borrow_for_ratio(deposit, collateral_price, debt_price, target_ratio_bps);
        if borrowed.is_zero() {
            return Err(MigrationError::InvalidInput(format!(
                "deposit {deposit} borrows nothing at {} bps",
                target_ratio_bps.get()
            )));
        }

        let mut txs = SmallVec::new();
        txs.push(
            self.writer
                .enter_markets(&[self.collateral_vtoken, self.debt_vtoken])
                .await
                .map_err(|e| MigrationError::submission("enter markets", e))?,
        );
        txs.push(
            self.writer
                .mint_native(self.collateral_vtoken, deposit)
                .await
                .map_err(|e| MigrationError::submission("mint", e))?,
        );
        txs.push(
            self.writer
                .borrow(self.debt_vtoken, borrowed)
                .await
                .map_err(|e| MigrationError::submission("borrow", e))?,
        );

        info!(
            deposit = wad_to_f64(deposit),
            borrowed = wad_to_f64(borrowed),
            ratio_bps = target_ratio_bps.get(),
            "Position opened"
        );

        Ok(OpenedPosition {
            deposit,
            borrowed,
            txs,
        })
    }

    /// Repay the whole debt and redeem the whole collateral.
    ///
    /// Fails before any repayment when the wallet cannot cover the debt plus
    /// one interest block of buffer.
    #[instrument(skip(self))]
    pub async fn close_all(&self) -> MigrationResult<ClosedPosition> {
        let account = self.writer.account();
        let mut txs = SmallVec::new();

        // Debt first, then collateral; each accrual lands before the next.
        for vtoken in [self.debt_vtoken, self.collateral_vtoken] {
            txs.push(
                self.writer
                    .accrue_interest(vtoken)
                    .await
                    .map_err(|e| MigrationError::submission("accrue interest", e))?,
            );
        }

        let (wrapped, wallet, borrow) = tokio::try_join!(
            self.source.wrapped_balance(self.collateral_vtoken, account),
            self.source.wallet_balance(self.debt_underlying, account),
            self.source.borrow_balance_stored(self.debt_vtoken, account),
        )
        .map_err(|e| MigrationError::read("position balances", e))?;

        let repaid = apply_basis_points_up(borrow, self.repay_buffer_bps);
        if wallet < repaid {
            return Err(MigrationError::InsufficientFunds {
                required: repaid,
                available: wallet,
            });
        }

        if !borrow.is_zero() {
            txs.push(
                self.writer
                    .approve(self.debt_underlying, self.debt_vtoken, repaid)
                    .await
                    .map_err(|e| MigrationError::submission("approve repay", e))?,
            );
            txs.push(
                self.writer
                    .repay_borrow(self.debt_vtoken, U256::MAX)
                    .await
                    .map_err(|e| MigrationError::submission("repay", e))?,
            );
        }

        if !wrapped.is_zero() {
            txs.push(
                self.writer
                    .redeem(self.collateral_vtoken, wrapped)
                    .await
                    .map_err(|e| MigrationError::submission("redeem", e))?,
            );
        }

        info!(
            repaid = wad_to_f64(repaid),
            redeemed_wrapped = %wrapped,
            "Position closed"
        );

        Ok(ClosedPosition {
            repaid,
            redeemed_wrapped: wrapped,
            txs,
        })
    }
}
