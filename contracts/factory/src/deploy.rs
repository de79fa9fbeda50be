//! Minimal-proxy deployment of will clones.
//!
//! Every will shares one canonical implementation; `createWill` deploys a
//! 55-byte EIP-1167 proxy delegating to it, optionally endowed with the
//! owner's opening native-coin balance.

use alloc::vec::Vec;

use stylus_sdk::{
    alloy_primitives::{Address, U256},
    deploy::RawDeploy,
};

// EIP-1167 init code: creation prologue + runtime prefix, then the
// implementation address, then the runtime suffix.
const PROXY_PREFIX: [u8; 20] = [
    0x3d, 0x60, 0x2d, 0x80, 0x60, 0x0a, 0x3d, 0x39, 0x81, 0xf3, 0x36, 0x3d, 0x3d, 0x37, 0x3d,
    0x3d, 0x3d, 0x36, 0x3d, 0x73,
];
const PROXY_SUFFIX: [u8; 15] = [
    0x5a, 0xf4, 0x3d, 0x82, 0x80, 0x3e, 0x90, 0x3d, 0x91, 0x60, 0x2b, 0x57, 0xfd, 0x5b, 0xf3,
];

/// Init code for a minimal proxy delegating to `implementation`.
pub fn clone_init_code(implementation: Address) -> Vec<u8> {
    let mut code = Vec::with_capacity(PROXY_PREFIX.len() + 20 + PROXY_SUFFIX.len());
    code.extend_from_slice(&PROXY_PREFIX);
    code.extend_from_slice(implementation.as_slice());
    code.extend_from_slice(&PROXY_SUFFIX);
    code
}

/// Deploy a clone endowed with `endowment` wei.
pub fn deploy_clone(implementation: Address, endowment: U256) -> Result<Address, ()> {
    let code = clone_init_code(implementation);
    unsafe { RawDeploy::new().deploy(&code, endowment) }.map_err(|_| ())
}
