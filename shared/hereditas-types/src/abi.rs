//! Minimal canonical ABI helpers for the calls the system makes.
//!
//! The contracts talk to tokens and to each other through hand-built
//! calldata rather than generated bindings; everything the system encodes
//! or decodes lives here so both sides (and the tests) agree byte-for-byte.

use alloc::vec::Vec;

use alloy_primitives::{Address, U256};

/// `balanceOf(address)`
pub const SEL_ERC20_BALANCE_OF: [u8; 4] = [0x70, 0xa0, 0x82, 0x31];
/// `transfer(address,uint256)`
pub const SEL_ERC20_TRANSFER: [u8; 4] = [0xa9, 0x05, 0x9c, 0xbb];
/// `transferFrom(address,address,uint256)` — shared by ERC-20 and ERC-721.
pub const SEL_TRANSFER_FROM: [u8; 4] = [0x23, 0xb8, 0x72, 0xdd];
/// `ownerOf(uint256)`
pub const SEL_ERC721_OWNER_OF: [u8; 4] = [0x63, 0x52, 0x21, 0x1e];

pub fn word_from_address(value: Address) -> [u8; 32] {
    // address is left-padded in its 32-byte ABI word
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(value.as_slice());
    word
}

pub fn word_from_u256(value: U256) -> [u8; 32] {
    value.to_be_bytes::<32>()
}

pub fn word_from_u64(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..32].copy_from_slice(&value.to_be_bytes());
    word
}

pub fn word_from_u16(value: u16) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[30..32].copy_from_slice(&value.to_be_bytes());
    word
}

/// One head-position argument of a call: a single 32-byte word, or a
/// dynamic array of words (tail-encoded behind an offset).
pub enum Arg {
    Word([u8; 32]),
    Array(Vec<[u8; 32]>),
}

/// Encode `selector ++ abi.encode(args...)` for word-shaped arguments,
/// per the canonical head/tail layout. Covers every call signature this
/// system uses; it is not a general ABI encoder.
pub fn encode_call(selector: [u8; 4], args: &[Arg]) -> Vec<u8> {
    let head_len = 32 * args.len();
    let mut head = Vec::with_capacity(head_len);
    let mut tail: Vec<u8> = Vec::new();

    for arg in args {
        match arg {
            Arg::Word(word) => head.extend_from_slice(word),
            Arg::Array(words) => {
                // Offsets are measured from the start of the argument block.
                let offset = head_len + tail.len();
                head.extend_from_slice(&word_from_u256(U256::from(offset)));
                tail.extend_from_slice(&word_from_u256(U256::from(words.len())));
                for word in words {
                    tail.extend_from_slice(word);
                }
            }
        }
    }

    let mut out = Vec::with_capacity(4 + head_len + tail.len());
    out.extend_from_slice(&selector);
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    out
}

pub fn erc20_balance_of(account: Address) -> Vec<u8> {
    encode_call(SEL_ERC20_BALANCE_OF, &[Arg::Word(word_from_address(account))])
}

pub fn erc20_transfer(to: Address, amount: U256) -> Vec<u8> {
    encode_call(
        SEL_ERC20_TRANSFER,
        &[Arg::Word(word_from_address(to)), Arg::Word(word_from_u256(amount))],
    )
}

/// ERC-20 `transferFrom(from, to, amount)` and ERC-721
/// `transferFrom(from, to, tokenId)` share one signature.
pub fn transfer_from(from: Address, to: Address, value_or_id: U256) -> Vec<u8> {
    encode_call(
        SEL_TRANSFER_FROM,
        &[
            Arg::Word(word_from_address(from)),
            Arg::Word(word_from_address(to)),
            Arg::Word(word_from_u256(value_or_id)),
        ],
    )
}

pub fn erc721_owner_of(token_id: U256) -> Vec<u8> {
    encode_call(SEL_ERC721_OWNER_OF, &[Arg::Word(word_from_u256(token_id))])
}

pub fn decode_u256(ret: &[u8]) -> Result<U256, ()> {
    if ret.len() < 32 {
        return Err(());
    }
    Ok(U256::from_be_slice(&ret[0..32]))
}

pub fn decode_address(ret: &[u8]) -> Result<Address, ()> {
    if ret.len() < 32 {
        return Err(());
    }
    Ok(Address::from_slice(&ret[12..32]))
}

/// ERC-20 `transfer`/`transferFrom` success convention: older tokens
/// return nothing, compliant ones return a bool word.
pub fn erc20_call_succeeded(ret: &[u8]) -> bool {
    ret.is_empty() || (ret.len() >= 32 && U256::from_be_slice(&ret[0..32]) != U256::ZERO)
}

pub fn address_words(addresses: &[Address]) -> Vec<[u8; 32]> {
    addresses.iter().map(|a| word_from_address(*a)).collect()
}

pub fn u256_words(values: &[U256]) -> Vec<[u8; 32]> {
    values.iter().map(|v| word_from_u256(*v)).collect()
}
