//! Price and collateral-factor reads for one collateral/debt pair.

use crate::error::{MigrationError, MigrationResult};
use alloy::primitives::{Address, U256};
use migrator_chain::SourceMarket;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Market parameters for the pair being migrated. Read fresh every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketParams {
    pub collateral_vtoken: Address,
    pub debt_vtoken: Address,
    /// WAD fraction in [0, 1]
    pub collateral_factor: U256,
    pub collateral_price: U256,
    pub debt_price: U256,
}

#[derive(Debug, Clone)]
pub struct MarketReader {
    source: Arc<dyn SourceMarket>,
}

impl MarketReader {
    pub fn new(source: Arc<dyn SourceMarket>) -> Self {
        Self { source }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn read(&self, collateral_vtoken: Address, debt_vtoken: Address) -> MigrationResult<MarketParams> {
        let (collateral_price, debt_price, collateral_factor) = tokio::try_join!(
            self.source.underlying_price(collateral_vtoken),
            self.source.underlying_price(debt_vtoken),
            self.source.collateral_factor(collateral_vtoken),
        )
        .map_err(|e| MigrationError::read("market params", e))?;

        for (vtoken, price) in [(collateral_vtoken, collateral_price), (debt_vtoken, debt_price)] {
            if price.is_zero() {
                return Err(MigrationError::read(
                    "market params",
                    anyhow::anyhow!("oracle returned a zero price for {vtoken}"),
                ));
            }
        }

        debug!(
            collateral_price = %collateral_price,
            debt_price = %debt_price,
            collateral_factor = %collateral_factor,
            "Market params read"
        );

        Ok(MarketParams {
            collateral_vtoken,
            debt_vtoken,
            collateral_factor,
            collateral_price,
            debt_price,
        })
    }
}
