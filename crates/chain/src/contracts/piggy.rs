//! Piggy (Liquity-style) trove system interfaces.
//!
//! Only the read side is used by the migrator: the trove itself is opened by
//! the flash-loan migration contract on the borrower's behalf.

use alloy::sol;

sol! {
    /// TroveManager
    #[sol(rpc)]
    interface ITroveManager {
        function LUSD_GAS_COMPENSATION() external view returns (uint256);
        function getBorrowingFeeWithDecay(uint256 _LUSDDebt) external view returns (uint256);
        function getTroveDebt(address _borrower) external view returns (uint256);
        function getTroveColl(address _borrower) external view returns (uint256);
    }

    /// HintHelpers
    #[sol(rpc)]
    interface IHintHelpers {
        function getApproxHint(uint256 _CR, uint256 _numTrials, uint256 _inputRandomSeed)
            external
            view
            returns (address hintAddress, uint256 diff, uint256 latestRandomSeed);
    }

    /// SortedTroves (descending by NICR)
    #[sol(rpc)]
    interface ISortedTroves {
        function getSize() external view returns (uint256);
        function findInsertPosition(uint256 _NICR, address _prevId, address _nextId)
            external
            view
            returns (address, address);
    }
}
