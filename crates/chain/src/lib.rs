//! Migrator chain interaction layer.
//!
//! This crate provides:
//! - Contract bindings for Venus, Piggy and the VaultMigration contract
//! - Provider management with separate read, hint and send endpoints
//! - Transaction signing and serialized submission
//! - Gas strategy abstraction (Legacy + EIP-1559)
//! - Protocol seams ([`SourceMarket`], [`SourcePositionWriter`],
//!   [`TroveRegistry`], [`MigrationGateway`]) and their implementations

pub mod contracts;
mod error;
pub mod gas;
pub mod protocol;
mod provider;
mod signer;

pub use error::{ComptrollerError, TransactionReverted};
pub use protocol::{
    AccountLiquidity, ApproxHint, MigrationGateway, PiggyAddresses, PiggyTroves, SourceMarket,
    SourcePositionWriter, TroveRegistry, VaultMigrationGateway, VenusAddresses, VenusMarket,
    VenusPositionWriter,
};
pub use provider::ProviderManager;
pub use signer::{
    TransactionSender, TransactionSenderBuilder, APPROVE_GAS_LIMIT, DEFAULT_MIGRATION_GAS_LIMIT,
    SOURCE_WRITE_GAS_LIMIT,
};
