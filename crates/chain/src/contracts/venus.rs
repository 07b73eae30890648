//! Venus (Compound-style) money market interfaces.
//!
//! All prices returned by the Venus oracle are scaled so that
//! `underlying_amount * price / 1e18` yields a USD value with 18 decimals,
//! independent of the underlying token's decimals.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol;
use alloy::sol_types::SolCall;

sol! {
    /// vToken market (BEP20 underlying)
    #[sol(rpc)]
    interface IVToken {
        function exchangeRateStored() external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function borrowBalanceStored(address account) external view returns (uint256);

        function accrueInterest() external returns (uint256);
        function borrow(uint256 borrowAmount) external returns (uint256);
        function repayBorrow(uint256 repayAmount) external returns (uint256);
        function redeem(uint256 redeemTokens) external returns (uint256);
    }

    /// vBNB market (native underlying, payable mint)
    #[sol(rpc)]
    interface IVBnb {
        function mint() external payable;
    }

    /// Comptroller (Unitroller proxy)
    #[sol(rpc)]
    interface IComptroller {
        function enterMarkets(address[] calldata vTokens) external returns (uint256[] memory);
        function getAssetsIn(address account) external view returns (address[] memory);
        function getAccountLiquidity(address account) external view returns (uint256, uint256, uint256);
        function markets(address vToken) external view returns (bool, uint256, bool);
    }

    /// Venus price oracle
    #[sol(rpc)]
    interface IVenusPriceOracle {
        function getUnderlyingPrice(address vToken) external view returns (uint256);
    }
}

/// Encode `enterMarkets(vTokens)` calldata.
pub fn encode_enter_markets(vtokens: &[Address]) -> Bytes {
    Bytes::from(
        IComptroller::enterMarketsCall {
            vTokens: vtokens.to_vec(),
        }
        .abi_encode(),
    )
}

/// Encode the payable `mint()` calldata for the native market.
pub fn encode_mint_native() -> Bytes {
    Bytes::from(IVBnb::mintCall {}.abi_encode())
}

/// Encode `borrow(amount)` calldata.
pub fn encode_borrow(amount: U256) -> Bytes {
    Bytes::from(IVToken::borrowCall { borrowAmount: amount }.abi_encode())
}

/// Encode `accrueInterest()` calldata.
pub fn encode_accrue_interest() -> Bytes {
    Bytes::from(IVToken::accrueInterestCall {}.abi_encode())
}

/// Encode `repayBorrow(amount)` calldata. `U256::MAX` repays the whole debt.
pub fn encode_repay_borrow(amount: U256) -> Bytes {
    Bytes::from(IVToken::repayBorrowCall { repayAmount: amount }.abi_encode())
}

/// Encode `redeem(vTokens)` calldata.
pub fn encode_redeem(wrapped_amount: U256) -> Bytes {
    Bytes::from(IVToken::redeemCall { redeemTokens: wrapped_amount }.abi_encode())
}
