//! Base-fee + tip strategy for networks running EIP-1559.

use super::{GasParams, GasStrategy};
use alloy::eips::BlockNumberOrTag;
use alloy::network::TransactionBuilder;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use anyhow::Result;
use async_trait::async_trait;

/// Base fee used when the latest block carries none (pre-London fork).
const FALLBACK_BASE_FEE: u128 = 1_000_000_000;

/// `max_fee = base_fee * multiplier + tip`, capped at `max_fee_cap`.
#[derive(Debug, Clone)]
pub struct Eip1559GasStrategy {
    /// Tip in wei when the node does not suggest one.
    default_priority_fee: u128,
    /// Headroom over the current base fee.
    base_fee_multiplier: f64,
    /// Hard cap on `max_fee_per_gas` in wei.
    max_fee_cap: u128,
}

impl Eip1559GasStrategy {
    pub fn new(default_priority_fee: u128, base_fee_multiplier: f64) -> Self {
        Self {
            default_priority_fee,
            base_fee_multiplier,
            max_fee_cap: 100_000_000_000,
        }
    }

    pub fn with_max_fee_cap(mut self, cap: u128) -> Self {
        self.max_fee_cap = cap;
        self
    }

    fn max_fee(&self, base_fee: u128, tip: u128) -> u128 {
        let scaled = (base_fee as f64 * self.base_fee_multiplier) as u128;
        scaled.saturating_add(tip).min(self.max_fee_cap)
    }
}

#[async_trait]
impl GasStrategy for Eip1559GasStrategy {
    async fn fetch_params(&self, rpc_url: &str) -> Result<GasParams> {
        let provider = ProviderBuilder::new().on_http(rpc_url.parse()?);

        let block = provider
            .get_block_by_number(BlockNumberOrTag::Latest)
            .await?
            .ok_or_else(|| anyhow::anyhow!("latest block unavailable"))?;
        let base_fee = block
            .header
            .base_fee_per_gas
            .map(u128::from)
            .unwrap_or(FALLBACK_BASE_FEE);

        let tip = provider
            .get_max_priority_fee_per_gas()
            .await
            .unwrap_or(self.default_priority_fee);

        Ok(GasParams::Eip1559 {
            max_fee_per_gas: self.max_fee(base_fee, tip),
            max_priority_fee_per_gas: tip.min(self.max_fee_cap),
            base_fee,
        })
    }

    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams) {
        match params {
            GasParams::Eip1559 {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                ..
            } => {
                tx.set_max_fee_per_gas(*max_fee_per_gas);
                tx.set_max_priority_fee_per_gas(*max_priority_fee_per_gas);
            }
            GasParams::Legacy { gas_price } => {
                tx.set_max_fee_per_gas(*gas_price);
                tx.set_max_priority_fee_per_gas(self.default_priority_fee.min(*gas_price));
            }
        }
    }

    fn strategy_name(&self) -> &'static str {
        "EIP-1559"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::Address;

    #[test]
    fn test_max_fee_with_headroom() {
        let strategy = Eip1559GasStrategy::new(1_000_000_000, 2.0);
        // 5 gwei * 2 + 1 gwei
        assert_eq!(strategy.max_fee(5_000_000_000, 1_000_000_000), 11_000_000_000);
    }

    #[test]
    fn test_max_fee_capped() {
        let strategy = Eip1559GasStrategy::new(1_000_000_000, 2.0).with_max_fee_cap(8_000_000_000);
        assert_eq!(strategy.max_fee(5_000_000_000, 1_000_000_000), 8_000_000_000);
    }

    #[test]
    fn test_apply_gas() {
        let strategy = Eip1559GasStrategy::new(1_000_000_000, 2.0);
        let mut tx = TransactionRequest::default().with_to(Address::ZERO);

        strategy.apply_gas(
            &mut tx,
            &GasParams::Eip1559 {
                max_fee_per_gas: 11_000_000_000,
                max_priority_fee_per_gas: 1_000_000_000,
                base_fee: 5_000_000_000,
            },
        );
        assert_eq!(tx.max_fee_per_gas, Some(11_000_000_000));
        assert_eq!(tx.max_priority_fee_per_gas, Some(1_000_000_000));
    }
}
