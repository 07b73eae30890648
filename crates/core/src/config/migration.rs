//! Migration parameters with profile support.
//!
//! Provides the planning, hint-search and execution settings with profiles
//! (default, strict, testing) selectable through `MIGRATOR_PROFILE` or loaded
//! from a TOML file.

use crate::u256_math::tokens_to_wad;
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main configuration structure containing all migration parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Profile name (for logging/identification)
    #[serde(default = "default_profile_name")]
    pub profile: String,

    #[serde(default)]
    pub planner: PlannerConfig,

    #[serde(default)]
    pub hints: HintConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub preparation: PreparationConfig,
}

fn default_profile_name() -> String {
    "default".to_string()
}

/// Amount planning constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Minimum collateral ratio of the new trove, in percent
    #[serde(default = "default_min_ratio_pct")]
    pub min_collateral_ratio_pct: u64,

    /// Destination minimum debt, in whole debt tokens
    #[serde(default = "default_min_debt_tokens")]
    pub min_debt_tokens: u64,

    /// Headroom added to the repaid amount when sizing the trove debt (bps)
    #[serde(default = "default_debt_buffer_bps")]
    pub debt_buffer_bps: u16,
}

fn default_min_ratio_pct() -> u64 {
    110
}
fn default_min_debt_tokens() -> u64 {
    200
}
fn default_debt_buffer_bps() -> u16 {
    100
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            min_collateral_ratio_pct: default_min_ratio_pct(),
            min_debt_tokens: default_min_debt_tokens(),
            debt_buffer_bps: default_debt_buffer_bps(),
        }
    }
}

impl PlannerConfig {
    /// Minimum debt as an 18-decimal amount.
    pub fn min_debt(&self) -> U256 {
        tokens_to_wad(self.min_debt_tokens)
    }
}

/// Sorted-list hint search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HintConfig {
    /// Random trials per trove in the list
    #[serde(default = "default_trials_per_entry")]
    pub trials_per_entry: u64,

    #[serde(default = "default_random_seed")]
    pub random_seed: u64,
}

fn default_trials_per_entry() -> u64 {
    15
}
fn default_random_seed() -> u64 {
    42
}

impl Default for HintConfig {
    fn default() -> Self {
        Self {
            trials_per_entry: default_trials_per_entry(),
            random_seed: default_random_seed(),
        }
    }
}

/// Approval sizing and timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Approvals cover this multiple of the planned amounts
    #[serde(default = "default_approval_multiplier")]
    pub approval_multiplier: u64,

    /// Deadline for market read, evaluation, planning and hint search (ms)
    #[serde(default = "default_planning_deadline")]
    pub planning_deadline_ms: u64,

    /// Gas limit for the migration call
    #[serde(default = "default_migration_gas_limit")]
    pub migration_gas_limit: u64,
}

fn default_approval_multiplier() -> u64 {
    2
}
fn default_planning_deadline() -> u64 {
    30_000
}
fn default_migration_gas_limit() -> u64 {
    3_000_000
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            approval_multiplier: default_approval_multiplier(),
            planning_deadline_ms: default_planning_deadline(),
            migration_gas_limit: default_migration_gas_limit(),
        }
    }
}

impl ExecutionConfig {
    pub fn planning_deadline(&self) -> Duration {
        Duration::from_millis(self.planning_deadline_ms)
    }
}

/// Source position opening and closing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreparationConfig {
    /// Extra repaid on close to cover interest accrued in the closing block (bps)
    #[serde(default = "default_repay_buffer_bps")]
    pub repay_buffer_bps: u16,
}

fn default_repay_buffer_bps() -> u16 {
    1
}

impl Default for PreparationConfig {
    fn default() -> Self {
        Self {
            repay_buffer_bps: default_repay_buffer_bps(),
        }
    }
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            profile: default_profile_name(),
            planner: PlannerConfig::default(),
            hints: HintConfig::default(),
            execution: ExecutionConfig::default(),
            preparation: PreparationConfig::default(),
        }
    }
}

impl MigrationConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Conservative destination constraints: 150% and 1800 debt tokens.
    pub fn strict() -> Self {
        Self {
            profile: "strict".to_string(),
            planner: PlannerConfig {
                min_collateral_ratio_pct: 150,
                min_debt_tokens: 1800,
                debt_buffer_bps: 100,
            },
            execution: ExecutionConfig {
                planning_deadline_ms: 15_000,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Local fork runs: long deadline, deterministic seed.
    pub fn testing() -> Self {
        Self {
            profile: "testing".to_string(),
            planner: PlannerConfig::default(),
            hints: HintConfig {
                trials_per_entry: 15,
                random_seed: 42,
            },
            execution: ExecutionConfig {
                approval_multiplier: 2,
                planning_deadline_ms: 120_000,
                migration_gas_limit: 5_000_000,
            },
            preparation: PreparationConfig::default(),
        }
    }

    /// Get profile from environment variable MIGRATOR_PROFILE, or default.
    /// Supported values: default, strict, testing
    pub fn from_env() -> Self {
        let profile = std::env::var("MIGRATOR_PROFILE").unwrap_or_else(|_| "default".to_string());
        Self::for_profile(&profile)
    }

    pub fn for_profile(profile: &str) -> Self {
        match profile.to_lowercase().as_str() {
            "strict" => Self::strict(),
            "testing" | "test" => Self::testing(),
            _ => Self::default(),
        }
    }

    /// Log the current configuration.
    pub fn log_config(&self) {
        tracing::info!(profile = %self.profile, "Migration configuration loaded");
        tracing::info!(
            min_ratio_pct = self.planner.min_collateral_ratio_pct,
            min_debt = self.planner.min_debt_tokens,
            buffer_bps = self.planner.debt_buffer_bps,
            "Planner constraints"
        );
        tracing::info!(
            trials_per_entry = self.hints.trials_per_entry,
            seed = self.hints.random_seed,
            "Hint search"
        );
        tracing::info!(
            approval_multiplier = self.execution.approval_multiplier,
            deadline_ms = self.execution.planning_deadline_ms,
            gas_limit = self.execution.migration_gas_limit,
            "Execution parameters"
        );
    }
}
