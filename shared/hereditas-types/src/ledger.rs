//! Asset-ledger call surface shared by the will and factory contracts.
//!
//! The trait mirrors the narrow ERC-20/ERC-721 surface the system needs.
//! Each contract crate binds it to the live chain with raw calls; tests
//! bind it to an in-memory mock.

use alloy_primitives::{Address, U256};

/// Errors during ledger calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerError {
    /// The underlying call reverted or could not be made.
    CallFailed { target: Address },
    /// The token reported failure (`transfer`/`transferFrom` returned false).
    TransferRejected { token: Address },
    /// Return data was malformed or could not be decoded.
    MalformedReturn,
}

/// The asset-ledger collaborator: balance/ownership queries plus
/// transfer-on-behalf. Native-coin balances are host state, not a call,
/// so callers pass them in rather than reading them through the trait.
pub trait Ledger {
    /// Plain value transfer out of the calling contract.
    fn native_transfer(&mut self, to: Address, amount: U256) -> Result<(), LedgerError>;

    fn erc20_balance_of(&self, token: Address, account: Address) -> Result<U256, LedgerError>;

    fn erc20_transfer(&mut self, token: Address, to: Address, amount: U256)
        -> Result<(), LedgerError>;

    /// Requires a prior `approve` by `from`.
    fn erc20_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError>;

    fn erc721_owner_of(&self, token: Address, token_id: U256) -> Result<Address, LedgerError>;

    /// Requires a prior per-token or operator approval by `from`.
    fn erc721_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), LedgerError>;
}
