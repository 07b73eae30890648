//! Plain gas-price strategy (BNB Chain and other pre-London chains).

use super::{GasParams, GasStrategy};
use alloy::network::TransactionBuilder;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

/// Uses the node's `eth_gasPrice`, clamped to `[floor, ceiling]`.
///
/// The floor is also the fallback when the node cannot be queried, so a flaky
/// endpoint never produces an under-priced migration that sits in the mempool
/// past the planning deadline.
#[derive(Debug, Clone)]
pub struct LegacyGasStrategy {
    /// Minimum (and fallback) gas price in wei.
    floor: u128,
    /// Maximum gas price in wei.
    ceiling: u128,
}

impl LegacyGasStrategy {
    pub fn new(floor: u128, ceiling: u128) -> Self {
        Self {
            floor,
            ceiling: ceiling.max(floor),
        }
    }

    /// Clamp an observed node price into the configured band.
    pub fn clamp(&self, observed: u128) -> u128 {
        observed.clamp(self.floor, self.ceiling)
    }
}

#[async_trait]
impl GasStrategy for LegacyGasStrategy {
    async fn fetch_params(&self, rpc_url: &str) -> Result<GasParams> {
        let provider = ProviderBuilder::new().on_http(rpc_url.parse()?);
        let observed = match provider.get_gas_price().await {
            Ok(price) => price,
            Err(e) => {
                debug!(error = %e, fallback = self.floor, "eth_gasPrice failed, using floor");
                self.floor
            }
        };

        Ok(GasParams::Legacy {
            gas_price: self.clamp(observed),
        })
    }

    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams) {
        tx.set_gas_price(params.effective_gas_price());
    }

    fn strategy_name(&self) -> &'static str {
        "Legacy"
    }
}
