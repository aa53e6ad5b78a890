//! Solidity interface of the drop contract.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    interface IDrop {
        function mint(address to, uint256 quantity) external payable;
        function totalSupply() external view returns (uint256);
    }
}
