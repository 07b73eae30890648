//! VaultMigration flash-loan contract.
//!
//! `migrate` borrows the debt asset through a flash loan, repays the source
//! debt, pulls the caller's wrapped collateral (allowance required), redeems
//! it, opens a trove on the caller's behalf at the hinted position and repays
//! the loan with the trove's debt token (allowance required). A failure at any
//! step reverts the whole transaction.

use alloy::primitives::{Address, Bytes};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    #[sol(rpc)]
    interface IVaultMigration {
        function migrate(address _upperHint, address _lowerHint) external;
    }
}

/// Encode `migrate(upperHint, lowerHint)` calldata.
pub fn encode_migrate(upper_hint: Address, lower_hint: Address) -> Bytes {
    Bytes::from(
        IVaultMigration::migrateCall {
            _upperHint: upper_hint,
            _lowerHint: lower_hint,
        }
        .abi_encode(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_selector_matches_signature() {
        let hash = keccak256("migrate(address,address)");
        assert_eq!(IVaultMigration::migrateCall::SELECTOR, hash[..4]);
    }

    #[test]
    fn test_encode_migrate_hints_in_order() {
        let upper = Address::repeat_byte(0x11);
        let lower = Address::repeat_byte(0x22);
        let calldata = encode_migrate(upper, lower);

        assert_eq!(calldata.len(), 4 + 64);
        // Addresses are right-aligned in their 32-byte words
        assert_eq!(&calldata[16..36], upper.as_slice());
        assert_eq!(&calldata[48..68], lower.as_slice());
    }
}
