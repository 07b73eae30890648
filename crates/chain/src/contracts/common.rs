//! Common contract interfaces shared by both protocols.
//!
//! The ERC20 subset covers what the migration needs: balance reads for the
//! reward token and debt token, and approvals for the migration contract and
//! the source market.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// Standard ERC20 interface (subset used by the migrator)
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
    }
}

/// Encode `approve(spender, amount)` calldata.
pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    Bytes::from(IERC20::approveCall { spender, amount }.abi_encode())
}
