//! Insertion hints for the destination's sorted trove list.
//!
//! The list is ordered by nominal collateral ratio. Inserting without a good
//! neighbour pair forces the contract to walk the list on chain, so the hint
//! is searched off chain: a randomized approximation first, then an exact
//! neighbour lookup seeded from it.

use crate::config::HintConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::u256_math::nominal_collateral_ratio;
use alloy::primitives::{Address, U256};
use migrator_chain::TroveRegistry;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Neighbour pair bracketing a new sorted-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HintPair {
    pub upper: Address,
    pub lower: Address,
}

impl HintPair {
    /// Valid hint for an empty list.
    pub const EMPTY: Self = Self {
        upper: Address::ZERO,
        lower: Address::ZERO,
    };
}

#[derive(Debug, Clone)]
pub struct HintFinder {
    troves: Arc<dyn TroveRegistry>,
    trials_per_entry: u64,
    seed: U256,
}

impl HintFinder {
    pub fn new(troves: Arc<dyn TroveRegistry>, config: &HintConfig) -> Self {
        Self {
            troves,
            trials_per_entry: config.trials_per_entry,
            seed: U256::from(config.random_seed),
        }
    }

    /// Find where a trove with `collateral` and requested `debt` belongs.
    ///
    /// The returned pair is not checked locally. The destination re-validates
    /// it on insertion and falls back to a list walk when it is stale.
    #[instrument(skip(self), level = "debug")]
    pub async fn find_hint(&self, collateral: U256, debt: U256) -> MigrationResult<HintPair> {
        let (fee, reserve, size) = tokio::try_join!(
            self.troves.borrowing_fee(debt),
            self.troves.gas_compensation(),
            self.troves.size(),
        )
        .map_err(MigrationError::HintLookupFailed)?;

        let expected_debt = debt + fee + reserve;
        let nicr = nominal_collateral_ratio(collateral, expected_debt);

        if size.is_zero() {
            debug!(nicr = %nicr, "Sorted list empty");
            return Ok(HintPair::EMPTY);
        }

        let trials = size.checked_mul(U256::from(self.trials_per_entry)).ok_or_else(|| {
            MigrationError::HintLookupFailed(anyhow::anyhow!(
                "trial count overflows for list size {size}"
            ))
        })?;

        let approx = self
            .troves
            .approx_hint(nicr, trials, self.seed)
            .await
            .map_err(MigrationError::HintLookupFailed)?;

        let (upper, lower) = self
            .troves
            .find_insert_position(nicr, approx.hint, approx.hint)
            .await
            .map_err(MigrationError::HintLookupFailed)?;

        debug!(
            nicr = %nicr,
            expected_debt = %expected_debt,
            trials = %trials,
            approx = %approx.hint,
            diff = %approx.diff,
            upper = %upper,
            lower = %lower,
            "Insertion hint found"
        );

        Ok(HintPair { upper, lower })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use migrator_chain::ApproxHint;

    const APPROX: Address = Address::new([0x10; 20]);
    const UPPER: Address = Address::new([0x11; 20]);
    const LOWER: Address = Address::new([0x12; 20]);

    fn troves(calls: CallLog, size: u64) -> Arc<FakeTroves> {
        let fake = FakeTroves::new(calls);
        {
            let mut s = fake.state.lock();
            s.borrowing_fee = wad(5);
            s.gas_compensation = wad(200);
            s.size = U256::from(size);
            s.approx_hint = Some(ApproxHint {
                hint: APPROX,
                diff: U256::from(7u64),
                latest_seed: U256::from(99u64),
            });
            s.insert_position = (UPPER, LOWER);
        }
        Arc::new(fake)
    }

    #[tokio::test]
    async fn test_find_hint() {
        let calls = call_log();
        let finder = HintFinder::new(troves(calls.clone(), 4), &HintConfig::default());

        let hint = finder.find_hint(wad(1000), wad(795)).await.unwrap();
        assert_eq!(hint, HintPair { upper: UPPER, lower: LOWER });

        // 1000 * 1e20 / (795 + 5 + 200)
        let nicr = U256::from(100_000_000_000_000_000_000u128);
        let trials = U256::from(60u64);
        let log = calls.lock().clone();
        assert!(log.contains(&format!("approx_hint:{nicr}:{trials}:42")));
        assert!(log.contains(&format!("find_insert_position:{nicr}:{APPROX}:{APPROX}")));
    }

    #[tokio::test]
    async fn test_empty_list_skips_approximation() {
        let calls = call_log();
        let finder = HintFinder::new(troves(calls.clone(), 0), &HintConfig::default());

        let hint = finder.find_hint(wad(1000), wad(800)).await.unwrap();
        assert_eq!(hint, HintPair::EMPTY);
        assert!(positions(&calls, "approx_hint").is_empty());
        assert!(positions(&calls, "find_insert_position").is_empty());
    }

    #[tokio::test]
    async fn test_configured_trials_and_seed() {
        let calls = call_log();
        let config = HintConfig {
            trials_per_entry: 3,
            random_seed: 7,
        };
        HintFinder::new(troves(calls.clone(), 10), &config)
            .find_hint(wad(1), wad(1))
            .await
            .unwrap();

        let index = positions(&calls, "approx_hint")[0];
        assert!(calls.lock()[index].ends_with(":30:7"));
    }

    #[tokio::test]
    async fn test_trial_overflow() {
        let fake = troves(call_log(), 0);
        fake.state.lock().size = U256::MAX;
        let err = HintFinder::new(fake, &HintConfig::default())
            .find_hint(wad(1), wad(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::HintLookupFailed(_)));
    }

    #[tokio::test]
    async fn test_read_failure_is_retryable() {
        let fake = troves(call_log(), 4);
        fake.state.lock().fail_reads = true;
        let err = HintFinder::new(fake, &HintConfig::default())
            .find_hint(wad(1), wad(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::HintLookupFailed(_)));
        assert!(err.is_retryable());
    }
}
