//! Configuration for the migrator.
//!
//! This module provides:
//! - Migration runtime configuration (profiles, planner constraints, hint
//!   search, approvals, deadline)
//! - Deployment configuration (chain, RPC endpoints, gas, contract addresses)

mod deployment;
mod migration;

pub use deployment::{
    ChainDetails, ContractsConfig, DeploymentConfig, GasConfig, ResolvedContracts,
    ResolvedDeployment, RpcConfig, RpcUrls,
};
pub use migration::{
    ExecutionConfig, HintConfig, MigrationConfig, PlannerConfig, PreparationConfig,
};
