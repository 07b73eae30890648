use super::MigrationGateway;
use crate::contracts::common::encode_approve;
use crate::contracts::migration::encode_migrate;
use crate::signer::{TransactionSender, APPROVE_GAS_LIMIT};
use alloy::primitives::{Address, B256, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Submits approvals and `migrate` to the deployed VaultMigration contract.
#[derive(Debug, Clone)]
pub struct VaultMigrationGateway {
    sender: Arc<TransactionSender>,
    vault_migration: Address,
}

impl VaultMigrationGateway {
    pub fn new(sender: Arc<TransactionSender>, vault_migration: Address) -> Self {
        Self {
            sender,
            vault_migration,
        }
    }
}

#[async_trait]
impl MigrationGateway for VaultMigrationGateway {
    fn account(&self) -> Address {
        self.sender.address
    }

    async fn approve_migrator(&self, token: Address, amount: U256) -> Result<B256> {
        info!(token = %token, amount = %amount, spender = %self.vault_migration, "Approving migration contract");
        self.sender
            .send_transaction_with_gas(
                token,
                encode_approve(self.vault_migration, amount),
                U256::ZERO,
                APPROVE_GAS_LIMIT,
            )
            .await
            .with_context(|| format!("approve {token}"))
    }

    async fn migrate(&self, upper_hint: Address, lower_hint: Address) -> Result<B256> {
        // Approvals may have taken several blocks; price the flash-loan call fresh
        self.sender.update_gas_params().await;
        info!(upper = %upper_hint, lower = %lower_hint, "Submitting migrate");
        self.sender
            .send_transaction(
                self.vault_migration,
                encode_migrate(upper_hint, lower_hint),
                U256::ZERO,
            )
            .await
            .context("migrate")
    }
}
