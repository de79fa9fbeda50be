//! On-chain asset ledger backed by raw EVM calls.
//!
//! Same `Ledger` binding as the will contract's: the factory uses it to
//! pull opening assets into new wills and to pay out withdrawn fees.

use stylus_sdk::{
    alloy_primitives::{keccak256, Address, U256},
    call::RawCall,
};

use hereditas_types::{abi, Ledger, LedgerError};

pub struct OnchainLedger;

impl Ledger for OnchainLedger {
    fn native_transfer(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
        unsafe { RawCall::new_with_value(amount).call(to, &[]) }
            .map_err(|_| LedgerError::CallFailed { target: to })?;
        Ok(())
    }

    fn erc20_balance_of(&self, token: Address, account: Address) -> Result<U256, LedgerError> {
        let ret = unsafe { RawCall::new_static().call(token, &abi::erc20_balance_of(account)) }
            .map_err(|_| LedgerError::CallFailed { target: token })?;
        abi::decode_u256(&ret).map_err(|_| LedgerError::MalformedReturn)
    }

    fn erc20_transfer(
        &mut self,
        token: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let ret = unsafe { RawCall::new().call(token, &abi::erc20_transfer(to, amount)) }
            .map_err(|_| LedgerError::CallFailed { target: token })?;
        if abi::erc20_call_succeeded(&ret) {
            Ok(())
        } else {
            Err(LedgerError::TransferRejected { token })
        }
    }

    fn erc20_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), LedgerError> {
        let ret = unsafe { RawCall::new().call(token, &abi::transfer_from(from, to, amount)) }
            .map_err(|_| LedgerError::CallFailed { target: token })?;
        if abi::erc20_call_succeeded(&ret) {
            Ok(())
        } else {
            Err(LedgerError::TransferRejected { token })
        }
    }

    fn erc721_owner_of(&self, token: Address, token_id: U256) -> Result<Address, LedgerError> {
        let ret = unsafe { RawCall::new_static().call(token, &abi::erc721_owner_of(token_id)) }
            .map_err(|_| LedgerError::CallFailed { target: token })?;
        abi::decode_address(&ret).map_err(|_| LedgerError::MalformedReturn)
    }

    fn erc721_transfer_from(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        token_id: U256,
    ) -> Result<(), LedgerError> {
        unsafe { RawCall::new().call(token, &abi::transfer_from(from, to, token_id)) }
            .map_err(|_| LedgerError::CallFailed { target: token })?;
        Ok(())
    }
}

pub(crate) fn selector(sig: &str) -> [u8; 4] {
    let h = keccak256(sig.as_bytes());
    [h[0], h[1], h[2], h[3]]
}
