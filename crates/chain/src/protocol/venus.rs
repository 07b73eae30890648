//! Venus implementation of the source market seams.

use super::{AccountLiquidity, SourceMarket, SourcePositionWriter};
use crate::contracts::common::{encode_approve, IERC20};
use crate::contracts::venus::{
    encode_accrue_interest, encode_borrow, encode_enter_markets, encode_mint_native,
    encode_redeem, encode_repay_borrow, IComptroller, IVToken, IVenusPriceOracle,
};
use crate::signer::{TransactionSender, APPROVE_GAS_LIMIT, SOURCE_WRITE_GAS_LIMIT};
use alloy::primitives::{Address, B256, U256};
use alloy::providers::Provider;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Venus core contracts.
#[derive(Debug, Clone, Copy)]
pub struct VenusAddresses {
    pub comptroller: Address,
    pub price_oracle: Address,
}

/// Stored reads against Venus over any provider.
#[derive(Clone)]
pub struct VenusMarket<P> {
    provider: P,
    addresses: VenusAddresses,
}

impl<P: Provider + Clone + 'static> VenusMarket<P> {
    pub fn new(provider: P, addresses: VenusAddresses) -> Self {
        Self { provider, addresses }
    }
}

impl<P> std::fmt::Debug for VenusMarket<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VenusMarket")
            .field("comptroller", &self.addresses.comptroller)
            .field("price_oracle", &self.addresses.price_oracle)
            .finish()
    }
}

#[async_trait]
impl<P: Provider + Clone + 'static> SourceMarket for VenusMarket<P> {
    async fn underlying_price(&self, vtoken: Address) -> Result<U256> {
        let oracle = IVenusPriceOracle::new(self.addresses.price_oracle, &self.provider);
        let price = oracle
            .getUnderlyingPrice(vtoken)
            .call()
            .await
            .with_context(|| format!("getUnderlyingPrice({vtoken})"))?
            ._0;
        Ok(price)
    }

    async fn collateral_factor(&self, vtoken: Address) -> Result<U256> {
        let comptroller = IComptroller::new(self.addresses.comptroller, &self.provider);
        let market = comptroller
            .markets(vtoken)
            .call()
            .await
            .with_context(|| format!("markets({vtoken})"))?;
        if !market._0 {
            anyhow::bail!("market {vtoken} is not listed");
        }
        Ok(market._1)
    }

    async fn exchange_rate_stored(&self, vtoken: Address) -> Result<U256> {
        let market = IVToken::new(vtoken, &self.provider);
        Ok(market
            .exchangeRateStored()
            .call()
            .await
            .with_context(|| format!("exchangeRateStored({vtoken})"))?
            ._0)
    }

    async fn wrapped_balance(&self, vtoken: Address, account: Address) -> Result<U256> {
        let market = IVToken::new(vtoken, &self.provider);
        Ok(market
            .balanceOf(account)
            .call()
            .await
            .with_context(|| format!("balanceOf({vtoken})"))?
            ._0)
    }

    async fn borrow_balance_stored(&self, vtoken: Address, account: Address) -> Result<U256> {
        let market = IVToken::new(vtoken, &self.provider);
        Ok(market
            .borrowBalanceStored(account)
            .call()
            .await
            .with_context(|| format!("borrowBalanceStored({vtoken})"))?
            ._0)
    }

    async fn account_liquidity(&self, account: Address) -> Result<AccountLiquidity> {
        let comptroller = IComptroller::new(self.addresses.comptroller, &self.provider);
        let ret = comptroller
            .getAccountLiquidity(account)
            .call()
            .await
            .context("getAccountLiquidity")?;
        Ok(AccountLiquidity {
            error_code: ret._0,
            liquidity: ret._1,
            shortfall: ret._2,
        })
    }

    async fn assets_in(&self, account: Address) -> Result<Vec<Address>> {
        let comptroller = IComptroller::new(self.addresses.comptroller, &self.provider);
        Ok(comptroller
            .getAssetsIn(account)
            .call()
            .await
            .context("getAssetsIn")?
            ._0)
    }

    async fn wallet_balance(&self, token: Address, account: Address) -> Result<U256> {
        let erc20 = IERC20::new(token, &self.provider);
        Ok(erc20
            .balanceOf(account)
            .call()
            .await
            .with_context(|| format!("balanceOf({token})"))?
            ._0)
    }
}

/// Signed Venus writes routed through the shared [`TransactionSender`].
#[derive(Debug, Clone)]
pub struct VenusPositionWriter {
    sender: Arc<TransactionSender>,
    comptroller: Address,
}

impl VenusPositionWriter {
    pub fn new(sender: Arc<TransactionSender>, comptroller: Address) -> Self {
        Self { sender, comptroller }
    }

    async fn write(&self, to: Address, calldata: alloy::primitives::Bytes, value: U256) -> Result<B256> {
        self.sender
            .send_transaction_with_gas(to, calldata, value, SOURCE_WRITE_GAS_LIMIT)
            .await
    }
}

#[async_trait]
impl SourcePositionWriter for VenusPositionWriter {
    fn account(&self) -> Address {
        self.sender.address
    }

    async fn enter_markets(&self, vtokens: &[Address]) -> Result<B256> {
        debug!(markets = ?vtokens, "enterMarkets");
        self.write(self.comptroller, encode_enter_markets(vtokens), U256::ZERO)
            .await
            .context("enterMarkets")
    }

    async fn mint_native(&self, vtoken: Address, value: U256) -> Result<B256> {
        self.write(vtoken, encode_mint_native(), value)
            .await
            .context("mint")
    }

    async fn borrow(&self, vtoken: Address, amount: U256) -> Result<B256> {
        self.write(vtoken, encode_borrow(amount), U256::ZERO)
            .await
            .context("borrow")
    }

    async fn accrue_interest(&self, vtoken: Address) -> Result<B256> {
        self.write(vtoken, encode_accrue_interest(), U256::ZERO)
            .await
            .context("accrueInterest")
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        self.sender
            .send_transaction_with_gas(token, encode_approve(spender, amount), U256::ZERO, APPROVE_GAS_LIMIT)
            .await
            .context("approve")
    }

    async fn repay_borrow(&self, vtoken: Address, amount: U256) -> Result<B256> {
        self.write(vtoken, encode_repay_borrow(amount), U256::ZERO)
            .await
            .context("repayBorrow")
    }

    async fn redeem(&self, vtoken: Address, wrapped_amount: U256) -> Result<B256> {
        self.write(vtoken, encode_redeem(wrapped_amount), U256::ZERO)
            .await
            .context("redeem")
    }
}
