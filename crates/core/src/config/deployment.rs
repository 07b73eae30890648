//! Deployment configuration: chain, RPC endpoints, gas and contract addresses.
//!
//! ```toml
//! [chain]
//! chain_id = 56
//! name = "bsc"
//!
//! [rpc]
//! read = "${BSC_RPC_URL}"
//! hint = "${BSC_HINT_RPC_URL}"
//!
//! [gas]
//! pricing = "Legacy"
//!
//! [contracts]
//! comptroller = "0x..."
//! # ...
//! ```

use alloy::primitives::Address;
use anyhow::{Context, Result};
use migrator_chain::{PiggyAddresses, VenusAddresses};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub chain: ChainDetails,
    pub rpc: RpcConfig,
    #[serde(default)]
    pub gas: GasConfig,
    pub contracts: ContractsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainDetails {
    pub chain_id: u64,
    /// Human-readable name
    pub name: String,
    /// Explorer URL for transaction links
    #[serde(default)]
    pub explorer_url: Option<String>,
}

/// RPC endpoints. `hint` and `send` fall back to `read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    pub read: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub send: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GasConfig {
    #[serde(default = "default_pricing")]
    pub pricing: String,
    /// Floor gas price for legacy transactions (in gwei)
    #[serde(default = "default_gas_price")]
    pub default_gas_price_gwei: f64,
    /// Maximum gas price willing to pay (in gwei)
    #[serde(default = "default_max_gas_price")]
    pub max_gas_price_gwei: f64,
    /// Priority fee for EIP-1559 transactions (in gwei)
    #[serde(default)]
    pub priority_fee_gwei: Option<f64>,
}

fn default_pricing() -> String {
    "Legacy".to_string()
}
fn default_gas_price() -> f64 {
    3.0
}
fn default_max_gas_price() -> f64 {
    20.0
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            pricing: default_pricing(),
            default_gas_price_gwei: default_gas_price(),
            max_gas_price_gwei: default_max_gas_price(),
            priority_fee_gwei: None,
        }
    }
}

/// Contract addresses as written in the file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractsConfig {
    pub comptroller: String,
    pub price_oracle: String,
    /// Wrapped collateral market (native underlying)
    pub collateral_vtoken: String,
    pub debt_vtoken: String,
    /// Underlying token of the debt market
    pub debt_underlying: String,
    pub trove_manager: String,
    pub hint_helpers: String,
    pub sorted_troves: String,
    /// Destination debt token
    pub debt_token: String,
    pub reward_token: String,
    pub vault_migration: String,
}

/// Contract addresses after parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedContracts {
    pub comptroller: Address,
    pub price_oracle: Address,
    pub collateral_vtoken: Address,
    pub debt_vtoken: Address,
    pub debt_underlying: Address,
    pub trove_manager: Address,
    pub hint_helpers: Address,
    pub sorted_troves: Address,
    pub debt_token: Address,
    pub reward_token: Address,
    pub vault_migration: Address,
}

impl ResolvedContracts {
    pub fn venus(&self) -> VenusAddresses {
        VenusAddresses {
            comptroller: self.comptroller,
            price_oracle: self.price_oracle,
        }
    }

    pub fn piggy(&self) -> PiggyAddresses {
        PiggyAddresses {
            trove_manager: self.trove_manager,
            hint_helpers: self.hint_helpers,
            sorted_troves: self.sorted_troves,
            reward_token: self.reward_token,
        }
    }
}

/// RPC endpoints with env vars expanded and fallbacks applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcUrls {
    pub read: String,
    pub hint: String,
    pub send: String,
}

/// Fully resolved deployment ready for wiring.
#[derive(Debug, Clone)]
pub struct ResolvedDeployment {
    pub chain_id: u64,
    pub name: String,
    pub explorer_url: Option<String>,
    pub rpc: RpcUrls,
    pub gas: GasConfig,
    pub contracts: ResolvedContracts,
}

impl DeploymentConfig {
    /// Load a deployment from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading deployment {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Expand `${VAR}` references and parse every address.
    pub fn resolve(&self) -> Result<ResolvedDeployment> {
        let read = expand_env(&self.rpc.read);
        let hint = self
            .rpc
            .hint
            .as_deref()
            .map(expand_env)
            .unwrap_or_else(|| read.clone());
        let send = self
            .rpc
            .send
            .as_deref()
            .map(expand_env)
            .unwrap_or_else(|| read.clone());

        let c = &self.contracts;
        let contracts = ResolvedContracts {
            comptroller: parse_address("comptroller", &c.comptroller)?,
            price_oracle: parse_address("price_oracle", &c.price_oracle)?,
            collateral_vtoken: parse_address("collateral_vtoken", &c.collateral_vtoken)?,
            debt_vtoken: parse_address("debt_vtoken", &c.debt_vtoken)?,
            debt_underlying: parse_address("debt_underlying", &c.debt_underlying)?,
            trove_manager: parse_address("trove_manager", &c.trove_manager)?,
            hint_helpers: parse_address("hint_helpers", &c.hint_helpers)?,
            sorted_troves: parse_address("sorted_troves", &c.sorted_troves)?,
            debt_token: parse_address("debt_token", &c.debt_token)?,
            reward_token: parse_address("reward_token", &c.reward_token)?,
            vault_migration: parse_address("vault_migration", &c.vault_migration)?,
        };

        Ok(ResolvedDeployment {
            chain_id: self.chain.chain_id,
            name: self.chain.name.clone(),
            explorer_url: self.chain.explorer_url.clone(),
            rpc: RpcUrls { read, hint, send },
            gas: self.gas.clone(),
            contracts,
        })
    }
}

impl ResolvedDeployment {
    /// Explorer link for a transaction, if an explorer is configured.
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url
            .as_ref()
            .map(|base| format!("{}/tx/{}", base.trim_end_matches('/'), tx_hash))
    }
}

fn parse_address(field: &str, value: &str) -> Result<Address> {
    let expanded = expand_env(value);
    expanded
        .trim()
        .parse::<Address>()
        .with_context(|| format!("contracts.{field}: invalid address {expanded:?}"))
}

/// Expand ${VAR_NAME} patterns with environment variable values.
fn expand_env(s: &str) -> String {
    let mut result = s.to_string();
    let re = match regex_lite::Regex::new(r"\$\{([^}]+)\}") {
        Ok(re) => re,
        Err(_) => return result,
    };

    for cap in re.captures_iter(s) {
        if let (Some(full_match), Some(var_match)) = (cap.get(0), cap.get(1)) {
            if let Ok(value) = std::env::var(var_match.as_str()) {
                result = result.replace(full_match.as_str(), &value);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [chain]
        chain_id = 97
        name = "bsc-testnet"
        explorer_url = "https://testnet.bscscan.com/"

        [rpc]
        read = "${DEPLOY_TEST_READ_URL}"
        hint = "https://hint.example/rpc"

        [contracts]
        comptroller = "0x94d1820b2d1c7c7452a163983dc888cec546b77d"
        price_oracle = "0x3cd069e4b7c8fe6a6d8bd6f5e8e3b1e6b0a0a1b2"
        collateral_vtoken = "0x2e7222e51c0f6e98610a1543aa3836e092cde62c"
        debt_vtoken = "0x08e0a5575de71037ae36abfafb516595fe68e5e4"
        debt_underlying = "0x8301f2213c0eed49a7e28ae4c3e91722919b8b47"
        trove_manager = "0x1111111111111111111111111111111111111111"
        hint_helpers = "0x2222222222222222222222222222222222222222"
        sorted_troves = "0x3333333333333333333333333333333333333333"
        debt_token = "0x4444444444444444444444444444444444444444"
        reward_token = "0x5555555555555555555555555555555555555555"
        vault_migration = "${DEPLOY_TEST_MIGRATION}"
    "#;

    #[test]
    fn test_expand_env() {
        std::env::set_var("DEPLOY_EXPAND_VAR", "test_value");
        assert_eq!(expand_env("${DEPLOY_EXPAND_VAR}"), "test_value");
        assert_eq!(expand_env("prefix_${DEPLOY_EXPAND_VAR}_suffix"), "prefix_test_value_suffix");
        assert_eq!(expand_env("no_vars"), "no_vars");
        // Unset variables are left in place
        assert_eq!(expand_env("${DEPLOY_UNSET_VAR}"), "${DEPLOY_UNSET_VAR}");
        std::env::remove_var("DEPLOY_EXPAND_VAR");
    }

    #[test]
    fn test_resolve_deployment() {
        std::env::set_var("DEPLOY_TEST_READ_URL", "http://localhost:8545");
        std::env::set_var(
            "DEPLOY_TEST_MIGRATION",
            "0x6666666666666666666666666666666666666666",
        );

        let resolved = DeploymentConfig::from_toml(SAMPLE).unwrap().resolve().unwrap();
        assert_eq!(resolved.chain_id, 97);
        assert_eq!(resolved.rpc.read, "http://localhost:8545");
        assert_eq!(resolved.rpc.hint, "https://hint.example/rpc");
        // send falls back to read
        assert_eq!(resolved.rpc.send, "http://localhost:8545");
        assert_eq!(resolved.gas.pricing, "Legacy");
        assert_eq!(
            resolved.contracts.vault_migration,
            Address::repeat_byte(0x66)
        );
        assert_eq!(resolved.contracts.piggy().reward_token, Address::repeat_byte(0x55));
        assert_eq!(
            resolved.tx_url("0xabc").as_deref(),
            Some("https://testnet.bscscan.com/tx/0xabc")
        );

        std::env::remove_var("DEPLOY_TEST_READ_URL");
        std::env::remove_var("DEPLOY_TEST_MIGRATION");
    }

    #[test]
    fn test_invalid_address_names_field() {
        let content = SAMPLE.replace(
            "\"0x1111111111111111111111111111111111111111\"",
            "\"not-an-address\"",
        );
        let err = DeploymentConfig::from_toml(&content).unwrap().resolve().unwrap_err();
        assert!(err.to_string().contains("trove_manager"));
    }
}
