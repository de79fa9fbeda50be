#![cfg_attr(not(any(test, feature = "export-abi")), no_std)]
//! Hereditas will contract: a per-owner escrow that releases its assets to
//! designated heirs after a period of owner inactivity.
//!
//! Each will is deployed as a minimal-proxy clone by the factory, bound to
//! its owner via `initialize`, and reports its terminal transition back to
//! the factory's registry.

extern crate alloc;

pub mod distribution;
pub mod interfaces;
pub mod ledger;
pub mod will;

pub use will::Will;
