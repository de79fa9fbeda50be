//! Distribution engine: fee-then-split payout of every asset class.
//!
//! Kept generic over `Ledger` so the payout and return flows can run
//! against an in-memory mock in tests; the contract binds them to the
//! RawCall-backed on-chain ledger.

use alloc::vec::Vec;

use stylus_sdk::alloy_primitives::{Address, U256};

use hereditas_types::{split, Ledger, LedgerError};

/// One escrowed non-fungible: its contract, token id and designated heir.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NftEntry {
    pub contract: Address,
    pub token_id: U256,
    pub heir: Address,
}

/// A will's asset book, read out of storage before distribution.
pub struct AssetBook {
    pub heirs: Vec<Address>,
    pub percents: Vec<U256>,
    /// Fungible token contracts; amounts are read live, never cached.
    pub tokens: Vec<Address>,
    pub nfts: Vec<NftEntry>,
}

/// Pay out every asset class and return the native fee actually charged.
///
/// The native coin and each fungible balance get the proportional
/// fee-then-per-heir split; non-fungibles go straight to their named heir,
/// fee-exempt and indivisible. Zero-amount transfers are skipped; any
/// failing transfer aborts.
pub fn distribute<L: Ledger>(
    ledger: &mut L,
    will: Address,
    native_balance: U256,
    fee_bps: u16,
    fee_recipient: Address,
    book: &AssetBook,
) -> Result<U256, LedgerError> {
    let native = split::split_balance(native_balance, fee_bps, &book.percents);
    if native.fee > U256::ZERO {
        ledger.native_transfer(fee_recipient, native.fee)?;
    }
    for (heir, amount) in book.heirs.iter().zip(native.payouts.iter()) {
        if *amount > U256::ZERO {
            ledger.native_transfer(*heir, *amount)?;
        }
    }

    for token in &book.tokens {
        let balance = ledger.erc20_balance_of(*token, will)?;
        let plan = split::split_balance(balance, fee_bps, &book.percents);
        if plan.fee > U256::ZERO {
            ledger.erc20_transfer(*token, fee_recipient, plan.fee)?;
        }
        for (heir, amount) in book.heirs.iter().zip(plan.payouts.iter()) {
            if *amount > U256::ZERO {
                ledger.erc20_transfer(*token, *heir, *amount)?;
            }
        }
    }

    for nft in &book.nfts {
        ledger.erc721_transfer_from(nft.contract, will, nft.heir, nft.token_id)?;
    }

    Ok(native.fee)
}

/// Return every held asset to `owner` (empty-for-edit and cancellation).
pub fn return_to_owner<L: Ledger>(
    ledger: &mut L,
    will: Address,
    native_balance: U256,
    owner: Address,
    tokens: &[Address],
    nfts: &[NftEntry],
) -> Result<(), LedgerError> {
    if native_balance > U256::ZERO {
        ledger.native_transfer(owner, native_balance)?;
    }
    for token in tokens {
        let balance = ledger.erc20_balance_of(*token, will)?;
        if balance > U256::ZERO {
            ledger.erc20_transfer(*token, owner, balance)?;
        }
    }
    for nft in nfts {
        ledger.erc721_transfer_from(nft.contract, will, owner, nft.token_id)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    const ETH: u64 = 1_000_000_000_000_000_000;

    fn addr(n: u8) -> Address {
        Address::with_last_byte(n)
    }

    /// In-memory ledger: credits recipients, debits token holders, moves
    /// NFT ownership, and can be told to fail a given token.
    #[derive(Default)]
    struct MockLedger {
        native: BTreeMap<Address, U256>,
        erc20: BTreeMap<(Address, Address), U256>,
        nft_owner: BTreeMap<(Address, U256), Address>,
        failing_token: Option<Address>,
    }

    impl MockLedger {
        fn erc20_credit(&mut self, token: Address, holder: Address, amount: U256) {
            *self.erc20.entry((token, holder)).or_insert(U256::ZERO) += amount;
        }

        fn native_of(&self, account: Address) -> U256 {
            self.native.get(&account).copied().unwrap_or(U256::ZERO)
        }

        fn erc20_of(&self, token: Address, holder: Address) -> U256 {
            self.erc20.get(&(token, holder)).copied().unwrap_or(U256::ZERO)
        }
    }

    impl Ledger for MockLedger {
        fn native_transfer(&mut self, to: Address, amount: U256) -> Result<(), LedgerError> {
            *self.native.entry(to).or_insert(U256::ZERO) += amount;
            Ok(())
        }

        fn erc20_balance_of(&self, token: Address, account: Address) -> Result<U256, LedgerError> {
            Ok(self.erc20_of(token, account))
        }

        fn erc20_transfer(
            &mut self,
            token: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), LedgerError> {
            if self.failing_token == Some(token) {
                return Err(LedgerError::TransferRejected { token });
            }
            *self.erc20.entry((token, to)).or_insert(U256::ZERO) += amount;
            Ok(())
        }

        fn erc20_transfer_from(
            &mut self,
            token: Address,
            from: Address,
            to: Address,
            amount: U256,
        ) -> Result<(), LedgerError> {
            let held = self.erc20_of(token, from);
            if held < amount {
                return Err(LedgerError::TransferRejected { token });
            }
            self.erc20.insert((token, from), held - amount);
            *self.erc20.entry((token, to)).or_insert(U256::ZERO) += amount;
            Ok(())
        }

        fn erc721_owner_of(&self, token: Address, token_id: U256) -> Result<Address, LedgerError> {
            self.nft_owner
                .get(&(token, token_id))
                .copied()
                .ok_or(LedgerError::CallFailed { target: token })
        }

        fn erc721_transfer_from(
            &mut self,
            token: Address,
            from: Address,
            to: Address,
            token_id: U256,
        ) -> Result<(), LedgerError> {
            if self.erc721_owner_of(token, token_id)? != from {
                return Err(LedgerError::CallFailed { target: token });
            }
            self.nft_owner.insert((token, token_id), to);
            Ok(())
        }
    }

    fn book(heirs: &[Address], percents: &[u64]) -> AssetBook {
        AssetBook {
            heirs: heirs.to_vec(),
            percents: percents.iter().map(|p| U256::from(*p)).collect(),
            tokens: Vec::new(),
            nfts: Vec::new(),
        }
    }

    #[test]
    fn native_distribution_pays_fee_then_heir() {
        // 1 coin, one heir at 100%, 0.5% fee: 0.005 to the recipient,
        // 0.995 to the heir.
        let mut ledger = MockLedger::default();
        let (will, recipient, heir) = (addr(1), addr(2), addr(3));
        let fee = distribute(
            &mut ledger,
            will,
            U256::from(ETH),
            50,
            recipient,
            &book(&[heir], &[100]),
        )
        .unwrap();
        assert_eq!(fee, U256::from(5_000_000_000_000_000u64));
        assert_eq!(ledger.native_of(recipient), fee);
        assert_eq!(ledger.native_of(heir), U256::from(995_000_000_000_000_000u64));
    }

    #[test]
    fn token_distribution_reads_live_balance() {
        // 100 token units split 60/40: the balance is whatever sits in the
        // will at execution time, not a configured amount.
        let mut ledger = MockLedger::default();
        let (will, recipient, token) = (addr(1), addr(2), addr(9));
        let (heir_a, heir_b) = (addr(3), addr(4));
        ledger.erc20_credit(token, will, U256::from(100u64) * U256::from(ETH));

        let mut assets = book(&[heir_a, heir_b], &[60, 40]);
        assets.tokens.push(token);

        let fee = distribute(&mut ledger, will, U256::ZERO, 50, recipient, &assets).unwrap();
        assert_eq!(fee, U256::ZERO);
        assert_eq!(ledger.erc20_of(token, recipient), U256::from(ETH) / U256::from(2));
        assert_eq!(
            ledger.erc20_of(token, heir_a),
            U256::from(597u64) * U256::from(ETH / 10)
        );
        assert_eq!(
            ledger.erc20_of(token, heir_b),
            U256::from(398u64) * U256::from(ETH / 10)
        );
    }

    #[test]
    fn nfts_go_to_their_named_heir_without_fee() {
        let mut ledger = MockLedger::default();
        let (will, recipient, collection) = (addr(1), addr(2), addr(8));
        let (heir_a, heir_b) = (addr(3), addr(4));
        ledger.nft_owner.insert((collection, U256::from(7)), will);
        ledger.nft_owner.insert((collection, U256::from(11)), will);

        let mut assets = book(&[heir_a], &[100]);
        assets.nfts.push(NftEntry { contract: collection, token_id: U256::from(7), heir: heir_b });
        assets.nfts.push(NftEntry { contract: collection, token_id: U256::from(11), heir: heir_a });

        distribute(&mut ledger, will, U256::ZERO, 50, recipient, &assets).unwrap();
        assert_eq!(ledger.nft_owner[&(collection, U256::from(7))], heir_b);
        assert_eq!(ledger.nft_owner[&(collection, U256::from(11))], heir_a);
    }

    #[test]
    fn zero_token_balance_moves_nothing() {
        let mut ledger = MockLedger::default();
        let token = addr(9);
        let mut assets = book(&[addr(3)], &[100]);
        assets.tokens.push(token);

        distribute(&mut ledger, addr(1), U256::ZERO, 50, addr(2), &assets).unwrap();
        assert_eq!(ledger.erc20_of(token, addr(2)), U256::ZERO);
        assert_eq!(ledger.erc20_of(token, addr(3)), U256::ZERO);
    }

    #[test]
    fn failed_token_transfer_aborts() {
        let mut ledger = MockLedger::default();
        let (will, token) = (addr(1), addr(9));
        ledger.erc20_credit(token, will, U256::from(1_000u64));
        ledger.failing_token = Some(token);

        let mut assets = book(&[addr(3)], &[100]);
        assets.tokens.push(token);

        let err = distribute(&mut ledger, will, U256::ZERO, 50, addr(2), &assets).unwrap_err();
        assert_eq!(err, LedgerError::TransferRejected { token });
    }

    #[test]
    fn return_to_owner_hands_everything_back() {
        let mut ledger = MockLedger::default();
        let (will, owner, token, collection) = (addr(1), addr(5), addr(9), addr(8));
        ledger.erc20_credit(token, will, U256::from(250u64));
        ledger.nft_owner.insert((collection, U256::from(1)), will);
        let nfts = [NftEntry { contract: collection, token_id: U256::from(1), heir: addr(3) }];

        return_to_owner(&mut ledger, will, U256::from(40u64), owner, &[token], &nfts).unwrap();
        assert_eq!(ledger.native_of(owner), U256::from(40u64));
        assert_eq!(ledger.erc20_of(token, owner), U256::from(250u64));
        // NFTs return to the owner, not the configured heir.
        assert_eq!(ledger.nft_owner[&(collection, U256::from(1))], owner);
    }
}
