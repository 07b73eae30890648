//! Gas pricing for migration transactions.
//!
//! BNB Chain prices transactions with a plain gas price, so [`LegacyGasStrategy`]
//! is the default. [`Eip1559GasStrategy`] covers forks and test networks that
//! run with a base fee.
//!
//! ```rust,ignore
//! use migrator_chain::gas::create_gas_strategy;
//!
//! let strategy = create_gas_strategy("Legacy", 3.0, 20.0, None);
//! let params = strategy.fetch_params(send_url).await?;
//! ```

mod eip1559;
mod legacy;

pub use eip1559::Eip1559GasStrategy;
pub use legacy::LegacyGasStrategy;

use alloy::rpc::types::TransactionRequest;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;

const GWEI: f64 = 1e9;

/// Gas pricing resolved for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GasParams {
    Legacy {
        /// Gas price in wei.
        gas_price: u128,
    },
    Eip1559 {
        /// Maximum fee per gas in wei.
        max_fee_per_gas: u128,
        /// Tip in wei.
        max_priority_fee_per_gas: u128,
        /// Base fee observed when the params were fetched.
        base_fee: u128,
    },
}

impl GasParams {
    /// Worst-case price per gas unit, for logging.
    pub fn effective_gas_price(&self) -> u128 {
        match self {
            GasParams::Legacy { gas_price } => *gas_price,
            GasParams::Eip1559 { max_fee_per_gas, .. } => *max_fee_per_gas,
        }
    }
}

/// Fetches gas pricing from the chain and writes it into transaction requests.
#[async_trait]
pub trait GasStrategy: Send + Sync + Debug {
    /// Query current pricing from the given RPC endpoint.
    async fn fetch_params(&self, rpc_url: &str) -> Result<GasParams>;

    /// Write pricing fields into the request.
    fn apply_gas(&self, tx: &mut TransactionRequest, params: &GasParams);

    fn strategy_name(&self) -> &'static str;
}

/// Build a strategy from deployment gas settings (prices in gwei).
pub fn create_gas_strategy(
    pricing_model: &str,
    default_gas_price_gwei: f64,
    max_gas_price_gwei: f64,
    priority_fee_gwei: Option<f64>,
) -> Box<dyn GasStrategy> {
    match pricing_model.to_lowercase().as_str() {
        "eip1559" | "eip-1559" => {
            let tip = priority_fee_gwei.unwrap_or(1.0);
            Box::new(
                Eip1559GasStrategy::new((tip * GWEI) as u128, 2.0)
                    .with_max_fee_cap((max_gas_price_gwei * GWEI) as u128),
            )
        }
        _ => Box::new(LegacyGasStrategy::new(
            (default_gas_price_gwei * GWEI) as u128,
            (max_gas_price_gwei * GWEI) as u128,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_gas_price() {
        let legacy = GasParams::Legacy { gas_price: 3_000_000_000 };
        assert_eq!(legacy.effective_gas_price(), 3_000_000_000);

        let eip1559 = GasParams::Eip1559 {
            max_fee_per_gas: 12_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            base_fee: 5_000_000_000,
        };
        assert_eq!(eip1559.effective_gas_price(), 12_000_000_000);
    }

    #[test]
    fn test_create_gas_strategy() {
        assert_eq!(create_gas_strategy("Legacy", 3.0, 20.0, None).strategy_name(), "Legacy");
        assert_eq!(
            create_gas_strategy("eip-1559", 3.0, 20.0, Some(1.0)).strategy_name(),
            "EIP-1559"
        );
        // Unknown models fall back to legacy pricing
        assert_eq!(create_gas_strategy("custom", 3.0, 20.0, None).strategy_name(), "Legacy");
    }
}
