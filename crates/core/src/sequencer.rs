//! Approval and submission sequencing for one migration.
//!
//! ```text
//! Idle -> Planned -> Approved -> Submitted -> Confirmed
//!                                          \-> Reverted
//! ```
//!
//! `execute` takes `&mut self`, so a sequencer can drive at most one
//! migration at a time. After a revert the sequencer stays in `Reverted`
//! until [`MigrationSequencer::reset`].

use crate::config::ExecutionConfig;
use crate::error::{MigrationError, MigrationResult};
use crate::hint::HintPair;
use crate::planner::MigrationPlan;
use crate::u256_math::{max, wad_to_f64};
use alloy::primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use migrator_chain::{MigrationGateway, TroveRegistry};
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MigrationState {
    Idle,
    Planned,
    Approved,
    Submitted,
    Confirmed,
    Reverted,
}

impl MigrationState {
    fn can_transition_to(self, next: MigrationState) -> bool {
        use MigrationState::*;
        matches!(
            (self, next),
            (Idle, Planned)
                | (Planned, Approved)
                | (Approved, Submitted)
                | (Submitted, Confirmed)
                | (Submitted, Reverted)
        )
    }
}

/// Destination state read after a confirmed migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TroveReadback {
    pub trove_collateral: U256,
    pub trove_debt: U256,
    pub reward_balance: U256,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub account: Address,
    pub plan: MigrationPlan,
    pub hints: HintPair,
    /// Collateral approval, then debt approval
    pub approval_txs: SmallVec<[B256; 2]>,
    pub migration_tx: B256,
    /// `None` when the post-migration reads failed
    pub readback: Option<TroveReadback>,
    pub postconditions_hold: bool,
    pub confirmed_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct MigrationSequencer {
    gateway: Arc<dyn MigrationGateway>,
    troves: Arc<dyn TroveRegistry>,
    /// Wrapped collateral (vToken) approved for the migration contract
    collateral_token: Address,
    /// Destination debt token
    debt_token: Address,
    approval_multiplier: U256,
    state: MigrationState,
}

impl MigrationSequencer {
    pub fn new(
        gateway: Arc<dyn MigrationGateway>,
        troves: Arc<dyn TroveRegistry>,
        collateral_token: Address,
        debt_token: Address,
        config: &ExecutionConfig,
    ) -> Self {
        Self {
            gateway,
            troves,
            collateral_token,
            debt_token,
            approval_multiplier: U256::from(config.approval_multiplier),
            state: MigrationState::Idle,
        }
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = MigrationState::Idle;
    }

    /// Collateral and debt allowances granted to the migration contract.
    pub fn approval_amounts(&self, plan: &MigrationPlan) -> (U256, U256) {
        let collateral = max(
            plan.collateral_amount,
            plan.wrapped_collateral_amount * self.approval_multiplier,
        );
        let debt = plan.debt_amount_in_destination * self.approval_multiplier;
        (collateral, debt)
    }

    fn transition(&mut self, next: MigrationState) -> MigrationResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(MigrationError::InvalidState {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    #[instrument(skip(self, plan, hints), fields(account = %account))]
    pub async fn execute(
        &mut self,
        account: Address,
        plan: &MigrationPlan,
        hints: HintPair,
    ) -> MigrationResult<MigrationReport> {
        self.transition(MigrationState::Planned)?;

        let (collateral_allowance, debt_allowance) = self.approval_amounts(plan);
        let mut approval_txs = SmallVec::new();
        for (token, amount, context) in [
            (self.collateral_token, collateral_allowance, "approve collateral"),
            (self.debt_token, debt_allowance, "approve debt"),
        ] {
            let tx_hash = self
                .gateway
                .approve_migrator(token, amount)
                .await
                .map_err(|e| MigrationError::submission(context, e))?;
            info!(token = %token, amount = %amount, tx = %tx_hash, "Migration contract approved");
            approval_txs.push(tx_hash);
        }
        self.transition(MigrationState::Approved)?;

        self.transition(MigrationState::Submitted)?;
        let migration_tx = match self.gateway.migrate(hints.upper, hints.lower).await {
            Ok(tx_hash) => {
                self.transition(MigrationState::Confirmed)?;
                tx_hash
            }
            Err(e) => {
                let err = MigrationError::migration(e);
                if let MigrationError::ExecutionReverted { tx_hash } = &err {
                    self.transition(MigrationState::Reverted)?;
                    warn!(tx = %tx_hash, "Migration reverted");
                }
                return Err(err);
            }
        };
        info!(
            tx = %migration_tx,
            collateral = wad_to_f64(plan.collateral_amount),
            debt = wad_to_f64(plan.debt_amount_in_destination),
            "Migration confirmed"
        );

        let readback = self.read_back(account).await;
        let postconditions_hold = match &readback {
            Some(trove) => {
                let hold = trove.trove_collateral >= plan.collateral_amount
                    && trove.trove_debt >= plan.debt_amount_in_destination;
                if !hold {
                    warn!(
                        trove_collateral = %trove.trove_collateral,
                        planned_collateral = %plan.collateral_amount,
                        trove_debt = %trove.trove_debt,
                        planned_debt = %plan.debt_amount_in_destination,
                        "Trove does not match the plan, investigate manually"
                    );
                }
                hold
            }
            None => false,
        };

        Ok(MigrationReport {
            account,
            plan: *plan,
            hints,
            approval_txs,
            migration_tx,
            readback,
            postconditions_hold,
            confirmed_at: Utc::now(),
        })
    }

    async fn read_back(&self, account: Address) -> Option<TroveReadback> {
        let result = tokio::try_join!(
            self.troves.trove_collateral(account),
            self.troves.trove_debt(account),
            self.troves.reward_balance(account),
        );
        match result {
            Ok((trove_collateral, trove_debt, reward_balance)) => Some(TroveReadback {
                trove_collateral,
                trove_debt,
                reward_balance,
            }),
            Err(e) => {
                warn!(error = %e, "Post-migration readback failed, migration is confirmed");
                None
            }
        }
    }
}
