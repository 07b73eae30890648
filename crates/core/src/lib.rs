//! Vault migration engine.
//!
//! Moves a leveraged position out of a Venus money market into a Piggy trove
//! through an atomic flash-loan contract:
//! - Market and position health reads (stored values only)
//! - Migration amount planning under the destination's ratio and debt floors
//! - Insertion-hint search in the destination's sorted trove list
//! - Approval and submission sequencing with post-migration checks
//! - Position preparation and unwinding for the signing account
//!
//! Chain access lives in `migrator-chain`; everything here talks to its
//! protocol traits.

pub mod config;
mod error;
mod health;
mod hint;
mod market;
mod migrator;
mod planner;
mod preparation;
mod sequencer;
pub mod u256_math;

#[cfg(test)]
mod testing;

pub use config::{
    DeploymentConfig, ExecutionConfig, HintConfig, MigrationConfig, PlannerConfig,
    PreparationConfig, ResolvedContracts, ResolvedDeployment, RpcUrls,
};
pub use error::{MigrationError, MigrationResult, PositionShortfall};
pub use health::{AccountSnapshot, HealthEvaluator};
pub use hint::{HintFinder, HintPair};
pub use market::{MarketParams, MarketReader};
pub use migrator::{MigrationMarkets, MigrationPreparer, Migrator, PreparedMigration};
pub use planner::{MigrationPlan, MigrationPlanner};
pub use preparation::{ClosedPosition, OpenedPosition, PositionPreparer};
pub use sequencer::{MigrationReport, MigrationSequencer, MigrationState, TroveReadback};
