//! Hand-built calls into newly created wills.

use alloc::vec::Vec;

use stylus_sdk::{
    alloy_primitives::{Address, U256},
    call::RawCall,
};

use hereditas_types::abi::{self, Arg};

use crate::ledger::selector;

pub fn initialize_calldata(
    owner: Address,
    executor: Address,
    fee_bps: u16,
    cancel_fee_bps: u16,
) -> Vec<u8> {
    abi::encode_call(
        selector("initialize(address,address,uint16,uint16)"),
        &[
            Arg::Word(abi::word_from_address(owner)),
            Arg::Word(abi::word_from_address(executor)),
            Arg::Word(abi::word_from_u16(fee_bps)),
            Arg::Word(abi::word_from_u16(cancel_fee_bps)),
        ],
    )
}

#[allow(clippy::too_many_arguments)]
pub fn configure_calldata(
    heirs: &[Address],
    percents: &[U256],
    interval: u64,
    tokens: &[Address],
    nft_contracts: &[Address],
    nft_ids: &[U256],
    nft_heirs: &[Address],
) -> Vec<u8> {
    abi::encode_call(
        selector("configure(address[],uint256[],uint64,address[],address[],uint256[],address[])"),
        &[
            Arg::Array(abi::address_words(heirs)),
            Arg::Array(abi::u256_words(percents)),
            Arg::Word(abi::word_from_u64(interval)),
            Arg::Array(abi::address_words(tokens)),
            Arg::Array(abi::address_words(nft_contracts)),
            Arg::Array(abi::u256_words(nft_ids)),
            Arg::Array(abi::address_words(nft_heirs)),
        ],
    )
}

/// Bind a freshly deployed clone to its owner.
pub fn initialize_will(
    will: Address,
    owner: Address,
    executor: Address,
    fee_bps: u16,
    cancel_fee_bps: u16,
) -> Result<(), ()> {
    let data = initialize_calldata(owner, executor, fee_bps, cancel_fee_bps);
    unsafe { RawCall::new().call(will, &data) }.map_err(|_| ())?;
    Ok(())
}

/// Activate a will with its heirs and asset book. The listed assets must
/// already have been pulled into the will.
#[allow(clippy::too_many_arguments)]
pub fn configure_will(
    will: Address,
    heirs: &[Address],
    percents: &[U256],
    interval: u64,
    tokens: &[Address],
    nft_contracts: &[Address],
    nft_ids: &[U256],
    nft_heirs: &[Address],
) -> Result<(), ()> {
    let data = configure_calldata(
        heirs,
        percents,
        interval,
        tokens,
        nft_contracts,
        nft_ids,
        nft_heirs,
    );
    unsafe { RawCall::new().call(will, &data) }.map_err(|_| ())?;
    Ok(())
}
