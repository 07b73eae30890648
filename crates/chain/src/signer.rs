//! Transaction signer and sender for approvals, source-market writes and the
//! migration call.
//!
//! Every state-changing call for one signer goes through a single
//! [`TransactionSender`]. A submission lock is held from nonce allocation
//! until the receipt comes back, so two writes for the same account can never
//! be in flight at once.

use crate::error::TransactionReverted;
use crate::gas::{create_gas_strategy, GasParams, GasStrategy, LegacyGasStrategy};
use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Gas limit for the flash-loan migration call.
pub const DEFAULT_MIGRATION_GAS_LIMIT: u64 = 3_000_000;

/// Gas limit for ERC20 approvals.
pub const APPROVE_GAS_LIMIT: u64 = 100_000;

/// Gas limit for single source-market writes (mint, borrow, repay, redeem).
pub const SOURCE_WRITE_GAS_LIMIT: u64 = 800_000;

/// Locally tracked nonce.
pub struct NonceManager {
    current: AtomicU64,
}

impl NonceManager {
    pub fn new(initial_nonce: u64) -> Self {
        Self {
            current: AtomicU64::new(initial_nonce),
        }
    }

    /// Take the next nonce.
    #[inline]
    pub fn next(&self) -> u64 {
        self.current.fetch_add(1, Ordering::SeqCst)
    }

    /// Force the chain nonce (after a failed or reverted submission).
    pub fn reset(&self, chain_nonce: u64) {
        self.current.store(chain_nonce, Ordering::SeqCst);
    }
}

/// Signs, submits and confirms transactions for one account.
pub struct TransactionSender {
    rpc_url: String,
    wallet: EthereumWallet,
    pub address: Address,
    chain_id: u64,
    nonce_manager: NonceManager,
    default_gas_limit: u64,
    gas_strategy: Box<dyn GasStrategy>,
    cached_gas_params: parking_lot::RwLock<Option<GasParams>>,
    /// Held from nonce allocation until the receipt is returned.
    submit_lock: Mutex<()>,
}

pub struct TransactionSenderBuilder {
    rpc_url: String,
    chain_id: u64,
    gas_strategy: Option<Box<dyn GasStrategy>>,
    gas_limit: Option<u64>,
}

impl TransactionSenderBuilder {
    pub fn new(rpc_url: impl Into<String>, chain_id: u64) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id,
            gas_strategy: None,
            gas_limit: None,
        }
    }

    pub fn gas_strategy(mut self, strategy: Box<dyn GasStrategy>) -> Self {
        self.gas_strategy = Some(strategy);
        self
    }

    /// Override the gas limit used for the migration call.
    pub fn gas_limit(mut self, limit: u64) -> Self {
        self.gas_limit = Some(limit);
        self
    }

    /// Set the gas strategy from deployment gas settings.
    pub fn gas_from_config(
        mut self,
        pricing_model: &str,
        default_gas_price_gwei: f64,
        max_gas_price_gwei: f64,
        priority_fee_gwei: Option<f64>,
    ) -> Self {
        self.gas_strategy = Some(create_gas_strategy(
            pricing_model,
            default_gas_price_gwei,
            max_gas_price_gwei,
            priority_fee_gwei,
        ));
        self
    }

    pub async fn build(self, private_key: &str) -> Result<TransactionSender> {
        let key_str = private_key.trim_start_matches("0x");
        let signer: PrivateKeySigner = key_str.parse()?;
        let address = signer.address();
        let wallet = EthereumWallet::from(signer);

        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        let initial_nonce = provider.get_transaction_count(address).await?;

        // BNB Chain defaults: 3 gwei floor, 20 gwei ceiling
        let gas_strategy = self.gas_strategy.unwrap_or_else(|| {
            Box::new(LegacyGasStrategy::new(3_000_000_000, 20_000_000_000))
        });
        let initial_gas_params = gas_strategy.fetch_params(&self.rpc_url).await.ok();

        info!(
            address = %address,
            chain_id = self.chain_id,
            initial_nonce = initial_nonce,
            gas_strategy = gas_strategy.strategy_name(),
            "Transaction sender initialized"
        );

        Ok(TransactionSender {
            rpc_url: self.rpc_url,
            wallet,
            address,
            chain_id: self.chain_id,
            nonce_manager: NonceManager::new(initial_nonce),
            default_gas_limit: self.gas_limit.unwrap_or(DEFAULT_MIGRATION_GAS_LIMIT),
            gas_strategy,
            cached_gas_params: parking_lot::RwLock::new(initial_gas_params),
            submit_lock: Mutex::new(()),
        })
    }
}

impl TransactionSender {
    fn cached_gas_params(&self) -> Option<GasParams> {
        self.cached_gas_params.read().clone()
    }

    /// Submit with the default (migration) gas limit and wait for the receipt.
    pub async fn send_transaction(&self, to: Address, calldata: Bytes, value: U256) -> Result<B256> {
        self.send_transaction_with_gas(to, calldata, value, self.default_gas_limit)
            .await
    }

    /// Submit with an explicit gas limit and wait for the receipt.
    ///
    /// A mined-but-failed receipt returns [`TransactionReverted`].
    pub async fn send_transaction_with_gas(
        &self,
        to: Address,
        calldata: Bytes,
        value: U256,
        gas_limit: u64,
    ) -> Result<B256> {
        let _guard = self.submit_lock.lock().await;
        let total_start = Instant::now();

        let gas_params = match self.cached_gas_params() {
            Some(params) => params,
            None => self.gas_strategy.fetch_params(&self.rpc_url).await?,
        };
        let nonce = self.nonce_manager.next();

        let selector = hex::encode(&calldata[..calldata.len().min(4)]);
        let mut tx = TransactionRequest::default()
            .with_to(to)
            .with_input(calldata)
            .with_value(value)
            .with_nonce(nonce)
            .with_gas_limit(gas_limit)
            .with_chain_id(self.chain_id);
        self.gas_strategy.apply_gas(&mut tx, &gas_params);

        info!(
            to = %to,
            selector = %selector,
            nonce = nonce,
            gas_limit = gas_limit,
            gas_price_gwei = gas_params.effective_gas_price() / 1_000_000_000,
            "Sending transaction"
        );

        let provider = ProviderBuilder::new()
            .wallet(self.wallet.clone())
            .on_http(self.rpc_url.parse()?);

        let submit_start = Instant::now();
        let pending = match provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                // Nonce was never consumed on chain
                self.sync_nonce().await;
                return Err(e.into());
            }
        };
        let tx_hash = *pending.tx_hash();
        let submit_elapsed = submit_start.elapsed();

        debug!(
            tx_hash = %tx_hash,
            submit_ms = submit_elapsed.as_millis(),
            "Transaction submitted, waiting for confirmation"
        );

        let receipt = pending.get_receipt().await?;
        let total_elapsed = total_start.elapsed();

        if receipt.status() {
            info!(
                tx_hash = %tx_hash,
                block = receipt.block_number.unwrap_or(0),
                gas_used = receipt.gas_used,
                total_ms = total_elapsed.as_millis(),
                "Transaction confirmed"
            );
            Ok(tx_hash)
        } else {
            warn!(
                tx_hash = %tx_hash,
                total_ms = total_elapsed.as_millis(),
                "Transaction reverted, syncing nonce"
            );
            self.sync_nonce().await;
            Err(TransactionReverted { tx_hash }.into())
        }
    }

    /// Re-read the nonce from chain.
    pub async fn sync_nonce(&self) {
        let url = match self.rpc_url.parse() {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Invalid send RPC URL, nonce not synced");
                return;
            }
        };
        let provider = ProviderBuilder::new().on_http(url);
        match provider.get_transaction_count(self.address).await {
            Ok(chain_nonce) => {
                self.nonce_manager.reset(chain_nonce);
                debug!(nonce = chain_nonce, "Nonce synced from chain");
            }
            Err(e) => {
                warn!(error = %e, "Failed to sync nonce from chain");
            }
        }
    }

    /// Refresh cached gas pricing. On failure the previous pricing is kept.
    pub async fn update_gas_params(&self) {
        match self.gas_strategy.fetch_params(&self.rpc_url).await {
            Ok(params) => {
                debug!(
                    gas_price_gwei = params.effective_gas_price() / 1_000_000_000,
                    strategy = self.gas_strategy.strategy_name(),
                    "Gas params updated"
                );
                *self.cached_gas_params.write() = Some(params);
            }
            Err(e) => {
                warn!(error = %e, "Failed to update gas params");
            }
        }
    }

    /// Native balance of the signer.
    pub async fn get_balance(&self) -> Result<U256> {
        let provider = ProviderBuilder::new().on_http(self.rpc_url.parse()?);
        Ok(provider.get_balance(self.address).await?)
    }
}

impl std::fmt::Debug for TransactionSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionSender")
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url)
            .field("gas_strategy", &self.gas_strategy.strategy_name())
            .finish_non_exhaustive()
    }
}
