//! In-memory protocol fakes for unit tests.
//!
//! Each fake records the calls it receives in a shared log so tests can assert
//! ordering across reads and writes.

use alloy::primitives::{Address, B256, U256};
use anyhow::Result;
use async_trait::async_trait;
use migrator_chain::{
    AccountLiquidity, ApproxHint, MigrationGateway, SourceMarket, SourcePositionWriter,
    TransactionReverted, TroveRegistry,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::u256_math::WAD;

pub type CallLog = Arc<Mutex<Vec<String>>>;

pub fn wad(tokens: u64) -> U256 {
    U256::from(tokens) * WAD
}

pub const ACCOUNT: Address = Address::new([0xaa; 20]);
pub const VBNB: Address = Address::new([0x01; 20]);
pub const VBUSD: Address = Address::new([0x02; 20]);
pub const BUSD: Address = Address::new([0x03; 20]);
pub const PUSD: Address = Address::new([0x04; 20]);

fn tx(n: usize) -> B256 {
    B256::from(U256::from(n + 1))
}

#[derive(Debug, Default)]
pub struct SourceState {
    pub prices: HashMap<Address, U256>,
    pub collateral_factors: HashMap<Address, U256>,
    pub exchange_rates: HashMap<Address, U256>,
    pub wrapped: HashMap<Address, U256>,
    pub borrows: HashMap<Address, U256>,
    pub wallet: HashMap<Address, U256>,
    pub liquidity: AccountLiquidity,
    pub assets_in: Vec<Address>,
    pub fail_reads: bool,
    pub revert_writes: bool,
}

/// Venus market fake serving both the read and the write seam.
#[derive(Debug)]
pub struct FakeVenus {
    pub state: Mutex<SourceState>,
    pub calls: CallLog,
}

impl FakeVenus {
    pub fn new(calls: CallLog) -> Self {
        Self {
            state: Mutex::new(SourceState::default()),
            calls,
        }
    }

    /// One native collateral market (exchange rate 1.0) and one debt market,
    /// both entered, $1 prices.
    pub fn with_position(calls: CallLog, collateral: U256, debt: U256, cf: U256, liquidity: U256) -> Self {
        let fake = Self::new(calls);
        {
            let mut s = fake.state.lock();
            s.prices.insert(VBNB, WAD);
            s.prices.insert(VBUSD, WAD);
            s.collateral_factors.insert(VBNB, cf);
            s.exchange_rates.insert(VBNB, WAD);
            s.wrapped.insert(VBNB, collateral);
            s.borrows.insert(VBUSD, debt);
            s.liquidity = AccountLiquidity {
                error_code: U256::ZERO,
                liquidity,
                shortfall: U256::ZERO,
            };
            s.assets_in = vec![VBNB, VBUSD];
        }
        fake
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().push(call);
        if self.state.lock().fail_reads {
            anyhow::bail!("connection refused");
        }
        Ok(())
    }

    fn write(&self, call: String) -> Result<B256> {
        let mut calls = self.calls.lock();
        calls.push(call);
        if self.state.lock().revert_writes {
            return Err(TransactionReverted { tx_hash: tx(calls.len()) }.into());
        }
        Ok(tx(calls.len()))
    }
}

#[async_trait]
impl SourceMarket for FakeVenus {
    async fn underlying_price(&self, vtoken: Address) -> Result<U256> {
        self.record(format!("price:{vtoken}"))?;
        Ok(self.state.lock().prices.get(&vtoken).copied().unwrap_or_default())
    }

    async fn collateral_factor(&self, vtoken: Address) -> Result<U256> {
        self.record(format!("cf:{vtoken}"))?;
        Ok(self.state.lock().collateral_factors.get(&vtoken).copied().unwrap_or_default())
    }

    async fn exchange_rate_stored(&self, vtoken: Address) -> Result<U256> {
        self.record(format!("exchange_rate:{vtoken}"))?;
        Ok(self.state.lock().exchange_rates.get(&vtoken).copied().unwrap_or(WAD))
    }

    async fn wrapped_balance(&self, vtoken: Address, _account: Address) -> Result<U256> {
        self.record(format!("wrapped:{vtoken}"))?;
        Ok(self.state.lock().wrapped.get(&vtoken).copied().unwrap_or_default())
    }

    async fn borrow_balance_stored(&self, vtoken: Address, _account: Address) -> Result<U256> {
        self.record(format!("borrow_balance:{vtoken}"))?;
        Ok(self.state.lock().borrows.get(&vtoken).copied().unwrap_or_default())
    }

    async fn account_liquidity(&self, _account: Address) -> Result<AccountLiquidity> {
        self.record("account_liquidity".to_string())?;
        Ok(self.state.lock().liquidity)
    }

    async fn assets_in(&self, _account: Address) -> Result<Vec<Address>> {
        self.record("assets_in".to_string())?;
        Ok(self.state.lock().assets_in.clone())
    }

    async fn wallet_balance(&self, token: Address, _account: Address) -> Result<U256> {
        self.record(format!("wallet:{token}"))?;
        Ok(self.state.lock().wallet.get(&token).copied().unwrap_or_default())
    }
}

#[async_trait]
impl SourcePositionWriter for FakeVenus {
    fn account(&self) -> Address {
        ACCOUNT
    }

    async fn enter_markets(&self, vtokens: &[Address]) -> Result<B256> {
        self.write(format!("enter_markets:{}", vtokens.len()))
    }

    async fn mint_native(&self, vtoken: Address, value: U256) -> Result<B256> {
        self.write(format!("mint:{vtoken}:{value}"))
    }

    async fn borrow(&self, vtoken: Address, amount: U256) -> Result<B256> {
        self.write(format!("borrow:{vtoken}:{amount}"))
    }

    async fn accrue_interest(&self, vtoken: Address) -> Result<B256> {
        self.write(format!("accrue:{vtoken}"))
    }

    async fn approve(&self, token: Address, spender: Address, amount: U256) -> Result<B256> {
        self.write(format!("approve:{token}:{spender}:{amount}"))
    }

    async fn repay_borrow(&self, vtoken: Address, amount: U256) -> Result<B256> {
        self.write(format!("repay:{vtoken}:{amount}"))
    }

    async fn redeem(&self, vtoken: Address, wrapped_amount: U256) -> Result<B256> {
        self.write(format!("redeem:{vtoken}:{wrapped_amount}"))
    }
}

#[derive(Debug, Default)]
pub struct TroveState {
    pub borrowing_fee: U256,
    pub gas_compensation: U256,
    pub size: U256,
    pub approx_hint: Option<ApproxHint>,
    pub insert_position: (Address, Address),
    pub trove_collateral: U256,
    pub trove_debt: U256,
    pub reward_balance: U256,
    pub fail_reads: bool,
    pub delay: Option<Duration>,
}

/// Sorted trove list fake.
#[derive(Debug)]
pub struct FakeTroves {
    pub state: Mutex<TroveState>,
    pub calls: CallLog,
}

impl FakeTroves {
    pub fn new(calls: CallLog) -> Self {
        Self {
            state: Mutex::new(TroveState::default()),
            calls,
        }
    }

    async fn record(&self, call: String) -> Result<()> {
        self.calls.lock().push(call);
        let (fail, delay) = {
            let s = self.state.lock();
            (s.fail_reads, s.delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fail {
            anyhow::bail!("hint node unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl TroveRegistry for FakeTroves {
    async fn borrowing_fee(&self, debt: U256) -> Result<U256> {
        self.record(format!("borrowing_fee:{debt}")).await?;
        Ok(self.state.lock().borrowing_fee)
    }

    async fn gas_compensation(&self) -> Result<U256> {
        self.record("gas_compensation".to_string()).await?;
        Ok(self.state.lock().gas_compensation)
    }

    async fn size(&self) -> Result<U256> {
        self.record("size".to_string()).await?;
        Ok(self.state.lock().size)
    }

    async fn approx_hint(&self, nicr: U256, trials: U256, seed: U256) -> Result<ApproxHint> {
        self.record(format!("approx_hint:{nicr}:{trials}:{seed}")).await?;
        self.state
            .lock()
            .approx_hint
            .ok_or_else(|| anyhow::anyhow!("no approximate hint configured"))
    }

    async fn find_insert_position(
        &self,
        nicr: U256,
        prev: Address,
        next: Address,
    ) -> Result<(Address, Address)> {
        self.record(format!("find_insert_position:{nicr}:{prev}:{next}")).await?;
        Ok(self.state.lock().insert_position)
    }

    async fn trove_collateral(&self, _borrower: Address) -> Result<U256> {
        self.record("trove_collateral".to_string()).await?;
        Ok(self.state.lock().trove_collateral)
    }

    async fn trove_debt(&self, _borrower: Address) -> Result<U256> {
        self.record("trove_debt".to_string()).await?;
        Ok(self.state.lock().trove_debt)
    }

    async fn reward_balance(&self, _account: Address) -> Result<U256> {
        self.record("reward_balance".to_string()).await?;
        Ok(self.state.lock().reward_balance)
    }
}

/// Migration contract fake.
#[derive(Debug)]
pub struct FakeGateway {
    pub calls: CallLog,
    pub revert_migrate: Mutex<bool>,
    pub fail_approvals: Mutex<bool>,
    pub revert_approvals: Mutex<bool>,
}

impl FakeGateway {
    pub fn new(calls: CallLog) -> Self {
        Self {
            calls,
            revert_migrate: Mutex::new(false),
            fail_approvals: Mutex::new(false),
            revert_approvals: Mutex::new(false),
        }
    }
}

#[async_trait]
impl MigrationGateway for FakeGateway {
    fn account(&self) -> Address {
        ACCOUNT
    }

    async fn approve_migrator(&self, token: Address, amount: U256) -> Result<B256> {
        let mut calls = self.calls.lock();
        calls.push(format!("approve:{token}:{amount}"));
        if *self.fail_approvals.lock() {
            anyhow::bail!("nonce too low");
        }
        let tx_hash = tx(calls.len());
        if *self.revert_approvals.lock() {
            return Err(anyhow::Error::from(TransactionReverted { tx_hash }).context("approve"));
        }
        Ok(tx_hash)
    }

    async fn migrate(&self, upper_hint: Address, lower_hint: Address) -> Result<B256> {
        let mut calls = self.calls.lock();
        calls.push(format!("migrate:{upper_hint}:{lower_hint}"));
        let tx_hash = tx(calls.len());
        if *self.revert_migrate.lock() {
            return Err(anyhow::Error::from(TransactionReverted { tx_hash }).context("migrate"));
        }
        Ok(tx_hash)
    }
}

pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// Position of each recorded call that starts with `prefix`.
pub fn positions(calls: &CallLog, prefix: &str) -> Vec<usize> {
    calls
        .lock()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.starts_with(prefix))
        .map(|(i, _)| i)
        .collect()
}
