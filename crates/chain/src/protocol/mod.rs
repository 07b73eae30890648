//! Protocol seams for the migration.
//!
//! The planning engine only talks to these traits:
//!
//! - [`SourceMarket`]: stored (side-effect free) reads of the Compound-style
//!   source market
//! - [`SourcePositionWriter`]: state-changing source calls used to open and
//!   close positions
//! - [`TroveRegistry`]: read-only view of the destination trove system,
//!   including the sorted-list hint helpers
//! - [`MigrationGateway`]: approvals and the atomic flash-loan migration call
//!
//! # Example
//!
//! ```rust,ignore
//! use migrator_chain::protocol::{PiggyTroves, TroveRegistry};
//!
//! let troves = PiggyTroves::new(manager.hint_provider()?, piggy_addresses);
//! let size = troves.size().await?;
//! ```

mod migration;
mod piggy;
mod venus;

pub use migration::VaultMigrationGateway;
pub use piggy::{PiggyAddresses, PiggyTroves};
pub use venus::{VenusAddresses, VenusMarket, VenusPositionWriter};

use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

/// Comptroller `getAccountLiquidity` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccountLiquidity {
    /// Non-zero means the comptroller could not compute liquidity.
    pub error_code: U256,
    /// Excess borrowing power in USD (WAD).
    pub liquidity: U256,
    /// Borrowing power deficit in USD (WAD).
    pub shortfall: U256,
}

/// `HintHelpers.getApproxHint` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApproxHint {
    pub hint: Address,
    pub diff: U256,
    pub latest_seed: U256,
}

/// Read-only view of the source money market.
#[async_trait]
pub trait SourceMarket: Send + Sync + Debug {
    /// Oracle price of a market's underlying, scaled so that
    /// `amount * price / 1e18` is USD with 18 decimals.
    async fn underlying_price(&self, vtoken: Address) -> Result<U256>;

    /// Collateral factor of a market (WAD fraction).
    async fn collateral_factor(&self, vtoken: Address) -> Result<U256>;

    async fn exchange_rate_stored(&self, vtoken: Address) -> Result<U256>;

    /// Wrapped (vToken) balance.
    async fn wrapped_balance(&self, vtoken: Address, account: Address) -> Result<U256>;

    /// Borrow balance as of the last accrual.
    async fn borrow_balance_stored(&self, vtoken: Address, account: Address) -> Result<U256>;

    async fn account_liquidity(&self, account: Address) -> Result<AccountLiquidity>;

    /// Markets the account has entered.
    async fn assets_in(&self, account: Address) -> Result<Vec<Address>>;

    /// Plain ERC20 wallet balance.
    async fn wallet_balance(&self, token: Address, account: Address) -> Result<U256>;
}

/// State-changing source market calls, signed by [`Self::account`].
///
/// Every method waits for the receipt and returns the transaction hash.
#[async_trait]
pub trait SourcePositionWriter: Send + Sync + Debug {
    fn account(&self) -> Address;

    async fn enter_markets(&self, vtokens: &[Address]) -> Result<B256>;

    /// Supply native currency to a native-underlying market.
    async fn mint_native(&self, vtoken: Address, value: U256) -> Result<B256>;

    async fn borrow(&self, vtoken: Address, amount: U256) -> Result<B256>;

    async fn accrue_interest(&self, vtoken: Address) -> Result<B256>;

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256>;

    /// `U256::MAX` repays the full outstanding debt.
    async fn repay_borrow(&self, vtoken: Address, amount: U256) -> Result<B256>;

    async fn redeem(&self, vtoken: Address, wrapped_amount: U256) -> Result<B256>;
}

/// Read-only view of the destination trove system.
#[async_trait]
pub trait TroveRegistry: Send + Sync + Debug {
    /// Borrowing fee charged on `debt`, including the decayed base rate.
    async fn borrowing_fee(&self, debt: U256) -> Result<U256>;

    /// Fixed debt reserve added to every trove.
    async fn gas_compensation(&self) -> Result<U256>;

    /// Number of troves in the sorted list.
    async fn size(&self) -> Result<U256>;

    async fn approx_hint(&self, nicr: U256, trials: U256, seed: U256) -> Result<ApproxHint>;

    /// Exact `(upper, lower)` neighbours for `nicr`, starting the walk at
    /// `prev` / `next`.
    async fn find_insert_position(
        &self,
        nicr: U256,
        prev: Address,
        next: Address,
    ) -> Result<(Address, Address)>;

    async fn trove_collateral(&self, borrower: Address) -> Result<U256>;

    async fn trove_debt(&self, borrower: Address) -> Result<U256>;

    /// Reward token balance.
    async fn reward_balance(&self, account: Address) -> Result<U256>;
}

/// Approvals and the atomic migration call.
#[async_trait]
pub trait MigrationGateway: Send + Sync + Debug {
    fn account(&self) -> Address;

    /// Approve the migration contract to spend `amount` of `token`.
    async fn approve_migrator(&self, token: Address, amount: U256) -> Result<B256>;

    /// Invoke `migrate(upper, lower)`. A revert surfaces as
    /// [`crate::TransactionReverted`].
    async fn migrate(&self, upper_hint: Address, lower_hint: Address) -> Result<B256>;
}
