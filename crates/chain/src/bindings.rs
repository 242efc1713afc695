//! ABI bindings of the Crypto Devs sale contract.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug)]
    interface ICryptoDevs {
        // Views
        function presaleStarted() external view returns (bool);
        function presaleEnded() external view returns (uint256);
        function tokenIds() external view returns (uint256);
        function maxTokenIds() external view returns (uint256);
        function getOwner() external view returns (address);

        // State-changing functions
        function startPresale() external;
        function presaleMint() external payable;
        function mint() external payable;
    }
}
