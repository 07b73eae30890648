//! Contract bindings for the source market, the destination trove system
//! and the migration contract.
//!
//! Interfaces are declared inline with `sol!` and carry `#[sol(rpc)]` so the
//! same definitions serve typed view calls and calldata encoding for the
//! transaction sender.
//!
//! # Example
//!
//! ```rust,ignore
//! use migrator_chain::contracts::{migration, piggy::ISortedTroves};
//!
//! let sorted = ISortedTroves::new(sorted_troves, &provider);
//! let size = sorted.getSize().call().await?._0;
//!
//! let calldata = migration::encode_migrate(upper_hint, lower_hint);
//! ```

pub mod common;
pub mod migration;
pub mod piggy;
pub mod venus;

pub use common::{encode_approve, IERC20};
pub use migration::{encode_migrate, IVaultMigration};
pub use piggy::{IHintHelpers, ISortedTroves, ITroveManager};
pub use venus::{IComptroller, IVBnb, IVToken, IVenusPriceOracle};
