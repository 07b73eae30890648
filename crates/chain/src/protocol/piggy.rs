//! Piggy implementation of [`TroveRegistry`].

use super::{ApproxHint, TroveRegistry};
use crate::contracts::common::IERC20;
use crate::contracts::piggy::{IHintHelpers, ISortedTroves, ITroveManager};
use alloy::primitives::{Address, U256};
use alloy::providers::Provider;
use anyhow::{Context, Result};
use async_trait::async_trait;

/// Piggy contracts read by the migrator.
#[derive(Debug, Clone, Copy)]
pub struct PiggyAddresses {
    pub trove_manager: Address,
    pub hint_helpers: Address,
    pub sorted_troves: Address,
    pub reward_token: Address,
}

#[derive(Clone)]
pub struct PiggyTroves<P> {
    provider: P,
    addresses: PiggyAddresses,
}

impl<P: Provider + Clone + 'static> PiggyTroves<P> {
    pub fn new(provider: P, addresses: PiggyAddresses) -> Self {
        Self { provider, addresses }
    }
}

impl<P> std::fmt::Debug for PiggyTroves<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PiggyTroves")
            .field("addresses", &self.addresses)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> TroveRegistry for PiggyTroves<P> {
    async fn borrowing_fee(&self, debt: U256) -> Result<U256> {
        let manager = ITroveManager::new(self.addresses.trove_manager, &self.provider);
        Ok(manager
            .getBorrowingFeeWithDecay(debt)
            .call()
            .await
            .context("getBorrowingFeeWithDecay")?
            ._0)
    }

    async fn gas_compensation(&self) -> Result<U256> {
        let manager = ITroveManager::new(self.addresses.trove_manager, &self.provider);
        Ok(manager
            .LUSD_GAS_COMPENSATION()
            .call()
            .await
            .context("LUSD_GAS_COMPENSATION")?
            ._0)
    }

    async fn size(&self) -> Result<U256> {
        let sorted = ISortedTroves::new(self.addresses.sorted_troves, &self.provider);
        Ok(sorted.getSize().call().await.context("getSize")?._0)
    }

    async fn approx_hint(&self, nicr: U256, trials: U256, seed: U256) -> Result<ApproxHint> {
        let helpers = IHintHelpers::new(self.addresses.hint_helpers, &self.provider);
        let ret = helpers
            .getApproxHint(nicr, trials, seed)
            .call()
            .await
            .context("getApproxHint")?;
        Ok(ApproxHint {
            hint: ret.hintAddress,
            diff: ret.diff,
            latest_seed: ret.latestRandomSeed,
        })
    }

    async fn find_insert_position(
        &self,
        nicr: U256,
        prev: Address,
        next: Address,
    ) -> Result<(Address, Address)> {
        let sorted = ISortedTroves::new(self.addresses.sorted_troves, &self.provider);
        let ret = sorted
            .findInsertPosition(nicr, prev, next)
            .call()
            .await
            .context("findInsertPosition")?;
        Ok((ret._0, ret._1))
    }

    async fn trove_collateral(&self, borrower: Address) -> Result<U256> {
        let manager = ITroveManager::new(self.addresses.trove_manager, &self.provider);
        Ok(manager
            .getTroveColl(borrower)
            .call()
            .await
            .context("getTroveColl")?
            ._0)
    }

    async fn trove_debt(&self, borrower: Address) -> Result<U256> {
        let manager = ITroveManager::new(self.addresses.trove_manager, &self.provider);
        Ok(manager
            .getTroveDebt(borrower)
            .call()
            .await
            .context("getTroveDebt")?
            ._0)
    }

    async fn reward_balance(&self, account: Address) -> Result<U256> {
        let reward = IERC20::new(self.addresses.reward_token, &self.provider);
        Ok(reward
            .balanceOf(account)
            .call()
            .await
            .context("reward balanceOf")?
            ._0)
    }
}
