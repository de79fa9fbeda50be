//! Solidity ABI interface scaffolding for the contracts the factory talks
//! to. Calls are made through hand-built calldata (see `calls` and
//! `ledger`); these keep the ABI expectations explicit.

use stylus_sdk::alloy_sol_types::sol;

sol! {
    interface IWill {
        function initialize(address owner, address executor, uint16 feeBps, uint16 cancelFeeBps) external;
        function configure(
            address[] heirs,
            uint256[] percents,
            uint64 interval,
            address[] tokens,
            address[] nftContracts,
            uint256[] nftIds,
            address[] nftHeirs
        ) external;
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function transfer(address to, uint256 amount) external returns (bool);
        function transferFrom(address from, address to, uint256 amount) external returns (bool);
    }

    interface IERC721 {
        function transferFrom(address from, address to, uint256 tokenId) external;
    }
}
