//! One migration pass: read, evaluate, plan, hint, then execute.

use crate::config::MigrationConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::health::{AccountSnapshot, HealthEvaluator};
use crate::hint::{HintFinder, HintPair};
use crate::market::{MarketParams, MarketReader};
use crate::planner::{MigrationPlan, MigrationPlanner};
use crate::sequencer::{MigrationReport, MigrationSequencer};
use alloy::primitives::Address;
use migrator_chain::{MigrationGateway, SourceMarket, TroveRegistry};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, instrument};

/// Tokens the migrator works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationMarkets {
    /// Source collateral market, also the token approved for the migration
    pub collateral_vtoken: Address,
    pub debt_vtoken: Address,
    /// Destination debt token
    pub debt_token: Address,
}

/// Everything computed before anything is submitted.
#[derive(Debug, Clone, Serialize)]
pub struct PreparedMigration {
    pub account: Address,
    pub market: MarketParams,
    pub snapshot: AccountSnapshot,
    pub plan: MigrationPlan,
    pub hints: HintPair,
}

/// Read-only half of a migration pass: read, evaluate, plan, hint.
///
/// Needs no signer, so it also backs dry-run planning for any account.
#[derive(Debug)]
pub struct MigrationPreparer {
    markets: MigrationMarkets,
    reader: MarketReader,
    evaluator: HealthEvaluator,
    planner: MigrationPlanner,
    hints: HintFinder,
}

impl MigrationPreparer {
    pub fn new(
        source: Arc<dyn SourceMarket>,
        troves: Arc<dyn TroveRegistry>,
        markets: MigrationMarkets,
        config: &MigrationConfig,
    ) -> Self {
        Self {
            markets,
            reader: MarketReader::new(source.clone()),
            evaluator: HealthEvaluator::new(source),
            planner: MigrationPlanner::new(&config.planner),
            hints: HintFinder::new(troves, &config.hints),
        }
    }

    #[instrument(skip(self), fields(account = %account))]
    pub async fn prepare(&self, account: Address) -> MigrationResult<PreparedMigration> {
        let market = self
            .reader
            .read(self.markets.collateral_vtoken, self.markets.debt_vtoken)
            .await?;
        let snapshot = self.evaluator.evaluate(account, &market).await?;
        let plan = self.planner.plan(&snapshot, &market)?;
        let hints = self
            .hints
            .find_hint(plan.collateral_amount, plan.debt_amount_in_destination)
            .await?;

        Ok(PreparedMigration {
            account,
            market,
            snapshot,
            plan,
            hints,
        })
    }
}

#[derive(Debug)]
pub struct Migrator {
    preparer: MigrationPreparer,
    sequencer: MigrationSequencer,
    gateway: Arc<dyn MigrationGateway>,
    deadline: Duration,
}

impl Migrator {
    pub fn new(
        source: Arc<dyn SourceMarket>,
        troves: Arc<dyn TroveRegistry>,
        gateway: Arc<dyn MigrationGateway>,
        markets: MigrationMarkets,
        config: &MigrationConfig,
    ) -> Self {
        let sequencer = MigrationSequencer::new(
            gateway.clone(),
            troves.clone(),
            markets.collateral_vtoken,
            markets.debt_token,
            &config.execution,
        );

        Self {
            preparer: MigrationPreparer::new(source, troves, markets, config),
            sequencer,
            gateway,
            deadline: config.execution.planning_deadline(),
        }
    }

    /// Read-only half of a pass. Safe to call at any time.
    pub async fn prepare(&self, account: Address) -> MigrationResult<PreparedMigration> {
        self.preparer.prepare(account).await
    }

    /// Prepare under the planning deadline, then submit.
    ///
    /// Only the signer's own position can be migrated. Once submission has
    /// started it runs to a receipt.
    pub async fn migrate(&mut self, account: Address) -> MigrationResult<MigrationReport> {
        let signer = self.gateway.account();
        if account != signer {
            return Err(MigrationError::SubmissionFailed {
                context: "signer mismatch".to_string(),
                source: anyhow::anyhow!("account {account} is not the signing account {signer}"),
            });
        }

        self.sequencer.reset();

        let started = Instant::now();
        let prepared = tokio::time::timeout(self.deadline, self.prepare(account))
            .await
            .map_err(|_| MigrationError::DeadlineExceeded {
                elapsed_ms: started.elapsed().as_millis() as u64,
            })??;

        info!(
            account = %account,
            planning_ms = started.elapsed().as_millis() as u64,
            upper = %prepared.hints.upper,
            lower = %prepared.hints.lower,
            "Submitting migration"
        );

        self.sequencer
            .execute(account, &prepared.plan, prepared.hints)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::MigrationState;
    use crate::testing::*;
    use alloy::primitives::U256;
    use migrator_chain::ApproxHint;

    struct Harness {
        calls: CallLog,
        venus: Arc<FakeVenus>,
        troves: Arc<FakeTroves>,
        migrator: Migrator,
    }

    fn harness(config: MigrationConfig) -> Harness {
        let calls = call_log();
        // 1000 collateral, 800 debt, cf 0.8
        let venus = Arc::new(FakeVenus::with_position(
            calls.clone(),
            wad(1000),
            wad(800),
            wad(8) / U256::from(10u64),
            wad(100),
        ));
        let troves = Arc::new(FakeTroves::new(calls.clone()));
        {
            let mut s = troves.state.lock();
            s.size = U256::from(3u64);
            s.approx_hint = Some(ApproxHint {
                hint: Address::new([0x10; 20]),
                diff: U256::ZERO,
                latest_seed: U256::ZERO,
            });
            s.insert_position = (Address::new([0x11; 20]), Address::new([0x12; 20]));
            s.trove_collateral = wad(1000);
            s.trove_debt = wad(1008);
        }
        let gateway = Arc::new(FakeGateway::new(calls.clone()));
        let markets = MigrationMarkets {
            collateral_vtoken: VBNB,
            debt_vtoken: VBUSD,
            debt_token: PUSD,
        };
        let migrator = Migrator::new(venus.clone(), troves.clone(), gateway, markets, &config);
        Harness {
            calls,
            venus,
            troves,
            migrator,
        }
    }

    #[tokio::test]
    async fn test_prepare() {
        let h = harness(MigrationConfig::default());
        let prepared = h.migrator.prepare(ACCOUNT).await.unwrap();

        assert_eq!(prepared.plan.debt_amount_in_destination, wad(808));
        assert_eq!(prepared.hints.upper, Address::new([0x11; 20]));
        assert!(positions(&h.calls, "approve").is_empty());
        assert!(positions(&h.calls, "migrate").is_empty());
    }

    #[tokio::test]
    async fn test_migrate_end_to_end() {
        let mut h = harness(MigrationConfig::default());
        let report = h.migrator.migrate(ACCOUNT).await.unwrap();

        assert!(report.postconditions_hold);
        assert_eq!(h.migrator.sequencer.state(), MigrationState::Confirmed);

        // Hint search finishes before the first approval
        let last_hint = *positions(&h.calls, "find_insert_position").last().unwrap();
        let first_approval = positions(&h.calls, "approve")[0];
        assert!(last_hint < first_approval);

        // A second pass resets the sequencer first
        h.migrator.migrate(ACCOUNT).await.unwrap();
    }

    #[tokio::test]
    async fn test_preparer_plans_any_account_without_gateway() {
        let h = harness(MigrationConfig::default());
        let markets = MigrationMarkets {
            collateral_vtoken: VBNB,
            debt_vtoken: VBUSD,
            debt_token: PUSD,
        };
        let preparer = MigrationPreparer::new(
            h.venus.clone(),
            h.troves.clone(),
            markets,
            &MigrationConfig::default(),
        );

        let other = Address::new([0xbb; 20]);
        let prepared = preparer.prepare(other).await.unwrap();
        assert_eq!(prepared.account, other);
        assert_eq!(prepared.plan.debt_amount_in_destination, wad(808));
        assert!(positions(&h.calls, "approve").is_empty());
    }

    #[tokio::test]
    async fn test_deadline_exceeded_submits_nothing() {
        let mut config = MigrationConfig::testing();
        config.execution.planning_deadline_ms = 20;
        let mut h = harness(config);
        h.troves.state.lock().delay = Some(Duration::from_millis(500));

        let err = h.migrator.migrate(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, MigrationError::DeadlineExceeded { .. }));
        assert!(err.is_retryable());
        assert!(positions(&h.calls, "approve").is_empty());
        assert!(positions(&h.calls, "migrate").is_empty());
    }

    #[tokio::test]
    async fn test_ineligible_position_submits_nothing() {
        let mut h = harness(MigrationConfig::default());
        h.venus.state.lock().borrows.insert(VBUSD, U256::ZERO);

        let err = h.migrator.migrate(ACCOUNT).await.unwrap_err();
        assert!(matches!(err, MigrationError::InsufficientPosition(_)));
        assert!(positions(&h.calls, "approve").is_empty());
    }

    #[tokio::test]
    async fn test_other_account_rejected() {
        let mut h = harness(MigrationConfig::default());
        let err = h.migrator.migrate(Address::new([0xbb; 20])).await.unwrap_err();

        assert!(matches!(err, MigrationError::SubmissionFailed { .. }));
        assert!(h.calls.lock().is_empty());
    }
}
