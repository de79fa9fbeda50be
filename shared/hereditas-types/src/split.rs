//! Integer split math for distributions.
//!
//! Every divisible asset class is divided the same way: a basis-point
//! platform fee off the top, then each heir's percentage of the remainder,
//! floor division per heir computed independently from the same
//! distributable amount. The accumulated rounding residue stays in the
//! will as accepted dust.

use alloc::vec::Vec;

use alloy_primitives::U256;

/// Heir percentages are whole percents summing to exactly this.
pub const PERCENT_DENOMINATOR: u64 = 100;
/// Fee rates are expressed in basis points.
pub const BPS_DENOMINATOR: u64 = 10_000;

/// One computed distribution of a single asset balance.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitPlan {
    pub fee: U256,
    /// Parallel to the percentage list the plan was built from.
    pub payouts: Vec<U256>,
}

/// Floor of `balance * fee_bps / 10_000`.
pub fn fee_amount(balance: U256, fee_bps: u16) -> U256 {
    balance * U256::from(fee_bps) / U256::from(BPS_DENOMINATOR)
}

/// Floor of `distributable * percent / 100`.
pub fn heir_amount(distributable: U256, percent: U256) -> U256 {
    distributable * percent / U256::from(PERCENT_DENOMINATOR)
}

/// Split `balance` into the platform fee and one payout per percentage.
///
/// `fee + sum(payouts) <= balance`; the shortfall is bounded by one minor
/// unit per recipient plus one for the fee.
pub fn split_balance(balance: U256, fee_bps: u16, percents: &[U256]) -> SplitPlan {
    let fee = fee_amount(balance, fee_bps);
    let distributable = balance - fee;
    let payouts = percents
        .iter()
        .map(|percent| heir_amount(distributable, *percent))
        .collect();
    SplitPlan { fee, payouts }
}
