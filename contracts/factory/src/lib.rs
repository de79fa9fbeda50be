#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]
//! Hereditas will factory: enforces one will per owner, deploys wills as
//! minimal-proxy clones, pulls opening assets into them, and owns fee and
//! executor governance.

extern crate alloc;

pub mod calls;
pub mod deploy;
pub mod factory;
pub mod interfaces;
pub mod ledger;

pub use factory::WillFactory;

mod tests;
