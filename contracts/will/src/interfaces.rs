//! Solidity ABI interface scaffolding for the contracts a will talks to.
//!
//! Note: calls are made through hand-built calldata (see `ledger`); having
//! these around keeps the ABI expectations explicit.

use stylus_sdk::alloy_sol_types::sol;

sol! {
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }

    interface IERC721 {
        function ownerOf(uint256 tokenId) external view returns (address);
        function transferFrom(address from, address to, uint256 tokenId) external;
    }

    interface IWillFactory {
        function clearWillRecord(address owner) external;
    }
}
