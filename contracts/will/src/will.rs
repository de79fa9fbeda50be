//! The will contract: escrow, heartbeat and distribution state machine.
//!
//! Lifecycle: `Empty` (deferred creation or emptied-for-edit) →
//! `Active` (configured, counting down) → `Executed` (terminal, reached by
//! either cancellation or distribution). Eligibility is checked lazily at
//! call time against `last_activity + interval`; there is no scheduler.

use alloc::{vec, vec::Vec};

use stylus_sdk::{
    alloy_primitives::{
        aliases::{U16, U64, U8},
        Address, U256,
    },
    call::RawCall,
    evm,
    prelude::*,
    storage::Erase,
};

use alloy_sol_types::sol;
use stylus_sdk::stylus_proc::SolidityError;

use hereditas_types::{
    abi::{self, Arg},
    split, Ledger, WillState,
};

use crate::{
    distribution::{self, AssetBook, NftEntry},
    ledger::{selector, OnchainLedger},
};

/// First claim on execution is reserved for the executor snapshot for this
/// long after the grace period ends; afterwards anyone may execute and
/// takes the fee themselves.
pub const EXECUTOR_WINDOW_SECS: u64 = 86_400;

sol! {
    event Configured(address indexed owner, uint64 interval);
    event Ping(uint64 newTimestamp);
    event Emptied(address indexed owner);
    event Cancelled(address indexed owner, uint256 feeCharged);
    event Executed(address caller, uint256 nativeFeeCharged, address feeRecipient);

    #[derive(Debug)]
    error AlreadyBound();
    #[derive(Debug)]
    error Unauthorized(address caller);
    #[derive(Debug)]
    error BadState(uint8 state);
    #[derive(Debug)]
    error GraceNotOver(uint64 secondsRemaining);
    #[derive(Debug)]
    error ExecutorOnly(address executor);
    #[derive(Debug)]
    error Reentered();
    #[derive(Debug)]
    error LengthMismatch();
    #[derive(Debug)]
    error NoHeirs();
    #[derive(Debug)]
    error BadPercents(uint256 total);
    #[derive(Debug)]
    error ZeroInterval();
    #[derive(Debug)]
    error NftNotHeld(address token, uint256 tokenId);
    #[derive(Debug)]
    error CallFailed(address target);
    #[derive(Debug)]
    error TransferRejected(address token);
    #[derive(Debug)]
    error MalformedReturn();
}

#[derive(SolidityError, Debug)]
pub enum WillError {
    AlreadyBound(AlreadyBound),
    Unauthorized(Unauthorized),
    BadState(BadState),
    GraceNotOver(GraceNotOver),
    ExecutorOnly(ExecutorOnly),
    Reentered(Reentered),
    LengthMismatch(LengthMismatch),
    NoHeirs(NoHeirs),
    BadPercents(BadPercents),
    ZeroInterval(ZeroInterval),
    NftNotHeld(NftNotHeld),
    CallFailed(CallFailed),
    TransferRejected(TransferRejected),
    MalformedReturn(MalformedReturn),
}

sol_storage! {
    /// Per-owner escrow. Deployed as a minimal-proxy clone by the factory
    /// and bound exactly once via `initialize`.
    #[entrypoint]
    pub struct Will {
        /// Address with exclusive administrative rights. Not reassignable;
        /// changing owners means cancelling and creating a new will.
        address owner;
        /// Registry this will reports its terminal transition to.
        address factory;
        /// Executor snapshot taken at creation. Later changes to the
        /// factory's default executor do not reach deployed wills.
        address executor;
        /// `WillState` discriminant.
        uint8 state;
        /// Busy latch; rejects reentrant calls during external transfers.
        bool entered;
        /// Required inactivity duration, seconds.
        uint64 interval;
        /// Last owner heartbeat or (re)configuration.
        uint64 last_activity;
        /// Distribution fee, basis points of each divisible asset balance.
        uint16 fee_bps;
        /// Cancellation fee policy, basis points of the native balance.
        uint16 cancel_fee_bps;
        address[] heirs;
        /// Whole percents, parallel to `heirs`, summing to 100.
        uint256[] percents;
        /// Fungible token contracts; balances are read live at payout time.
        address[] tokens;
        address[] nft_contracts;
        uint256[] nft_ids;
        /// Designated heir per NFT, independent of the percentage table.
        address[] nft_heirs;
    }
}

#[public]
impl Will {
    /// Bind the clone to its owner. The caller becomes the registry this
    /// will deregisters itself from on its terminal transition.
    pub fn initialize(
        &mut self,
        owner: Address,
        executor: Address,
        fee_bps: u16,
        cancel_fee_bps: u16,
    ) -> Result<(), WillError> {
        if self.owner.get() != Address::ZERO {
            return Err(AlreadyBound {}.into());
        }
        self.owner.set(owner);
        self.factory.set(self.vm().msg_sender());
        self.executor.set(executor);
        self.fee_bps.set(U16::from(fee_bps));
        self.cancel_fee_bps.set(U16::from(cancel_fee_bps));
        self.state.set(U8::from(WillState::Empty.as_u8()));
        Ok(())
    }

    /// Configure heirs, percentages and the asset book: Empty → Active.
    ///
    /// Callable by the factory during creation and by the owner in the
    /// deferred flow. Listed NFTs must already sit in the will; the
    /// funding flows pull first, then configure.
    #[allow(clippy::too_many_arguments)]
    pub fn configure(
        &mut self,
        heirs: Vec<Address>,
        percents: Vec<U256>,
        interval: u64,
        tokens: Vec<Address>,
        nft_contracts: Vec<Address>,
        nft_ids: Vec<U256>,
        nft_heirs: Vec<Address>,
    ) -> Result<(), WillError> {
        self.check_not_entered()?;
        let caller = self.vm().msg_sender();
        if caller != self.owner.get() && caller != self.factory.get() {
            return Err(Unauthorized { caller }.into());
        }
        self.require_state(WillState::Empty)?;
        self.apply_configuration(
            heirs,
            percents,
            interval,
            tokens,
            nft_contracts,
            nft_ids,
            nft_heirs,
        )
    }

    /// Owner variant of `configure` that first pulls the listed ERC-20
    /// amounts and NFTs from the owner. Requires prior approvals granted
    /// to this will; their absence is a caller precondition, not something
    /// the will can default around.
    #[payable]
    #[allow(clippy::too_many_arguments)]
    pub fn fund_and_configure(
        &mut self,
        heirs: Vec<Address>,
        percents: Vec<U256>,
        interval: u64,
        tokens: Vec<Address>,
        amounts: Vec<U256>,
        nft_contracts: Vec<Address>,
        nft_ids: Vec<U256>,
        nft_heirs: Vec<Address>,
    ) -> Result<(), WillError> {
        self.check_not_entered()?;
        let caller = self.vm().msg_sender();
        if caller != self.owner.get() {
            return Err(Unauthorized { caller }.into());
        }
        self.require_state(WillState::Empty)?;
        if tokens.len() != amounts.len() {
            return Err(LengthMismatch {}.into());
        }
        self.entered.set(true);

        let me = self.vm().contract_address();
        let mut ledger = OnchainLedger;
        for (token, amount) in tokens.iter().zip(amounts.iter()) {
            if *amount > U256::ZERO {
                ledger
                    .erc20_transfer_from(*token, caller, me, *amount)
                    .map_err(ledger_err)?;
            }
        }
        for (contract, token_id) in nft_contracts.iter().zip(nft_ids.iter()) {
            ledger
                .erc721_transfer_from(*contract, caller, me, *token_id)
                .map_err(ledger_err)?;
        }

        self.apply_configuration(
            heirs,
            percents,
            interval,
            tokens,
            nft_contracts,
            nft_ids,
            nft_heirs,
        )?;
        self.entered.set(false);
        Ok(())
    }

    /// Owner heartbeat: restart the inactivity countdown.
    pub fn ping(&mut self) -> Result<(), WillError> {
        self.check_not_entered()?;
        self.only_owner()?;
        self.require_state(WillState::Active)?;
        let now = self.vm().block_timestamp();
        self.last_activity.set(U64::from(now));
        evm::log(Ping { newTimestamp: now });
        Ok(())
    }

    /// Return everything to the owner and go back to Empty, so the owner
    /// can rewrite the will without an inconsistent intermediate state.
    pub fn empty_for_edit(&mut self) -> Result<(), WillError> {
        self.check_not_entered()?;
        self.only_owner()?;
        self.require_state(WillState::Active)?;
        self.entered.set(true);

        let owner = self.owner.get();
        let me = self.vm().contract_address();
        let native = self.vm().balance(me);
        let tokens = self.tokens_vec();
        let nfts = self.nft_entries();
        distribution::return_to_owner(&mut OnchainLedger, me, native, owner, &tokens, &nfts)
            .map_err(ledger_err)?;

        self.clear_configuration();
        self.interval.set(U64::ZERO);
        self.last_activity.set(U64::from(self.vm().block_timestamp()));
        self.state.set(U8::from(WillState::Empty.as_u8()));
        evm::log(Emptied { owner });
        self.entered.set(false);
        Ok(())
    }

    /// Owner escape hatch: return everything, charge the cancellation-fee
    /// policy (canonically zero), go terminal and deregister.
    pub fn cancel_and_withdraw(&mut self) -> Result<(), WillError> {
        self.check_not_entered()?;
        self.only_owner()?;
        if self.will_state() == WillState::Executed {
            return Err(BadState { state: self.state.get().to::<u8>() }.into());
        }
        self.entered.set(true);

        let owner = self.owner.get();
        let me = self.vm().contract_address();
        let native = self.vm().balance(me);
        let tokens = self.tokens_vec();
        let nfts = self.nft_entries();

        // Terminal before any external transfer.
        self.state.set(U8::from(WillState::Executed.as_u8()));

        let fee = split::fee_amount(native, self.cancel_fee_bps.get().to::<u16>());
        let mut ledger = OnchainLedger;
        if fee > U256::ZERO {
            ledger
                .native_transfer(self.factory.get(), fee)
                .map_err(ledger_err)?;
        }
        distribution::return_to_owner(&mut ledger, me, native - fee, owner, &tokens, &nfts)
            .map_err(ledger_err)?;

        self.notify_cleared()?;
        evm::log(Cancelled { owner, feeCharged: fee });
        self.entered.set(false);
        Ok(())
    }

    /// Distribute the estate.
    ///
    /// Before `last_activity + interval`: rejected. For the next
    /// `EXECUTOR_WINDOW_SECS`: only the executor snapshot may call, and
    /// the fee goes to the factory. Afterwards anyone may call and the
    /// caller takes the fee — whoever did the work is paid.
    pub fn execute(&mut self) -> Result<(), WillError> {
        self.check_not_entered()?;
        self.require_state(WillState::Active)?;

        let now = self.vm().block_timestamp();
        let grace_end = self.grace_end();
        if now < grace_end {
            return Err(GraceNotOver { secondsRemaining: grace_end - now }.into());
        }
        let caller = self.vm().msg_sender();
        let in_window = now < grace_end.saturating_add(EXECUTOR_WINDOW_SECS);
        if in_window && caller != self.executor.get() {
            return Err(ExecutorOnly { executor: self.executor.get() }.into());
        }
        let fee_recipient = if in_window { self.factory.get() } else { caller };

        // Latch and terminal state both committed before any external
        // transfer.
        self.entered.set(true);
        self.state.set(U8::from(WillState::Executed.as_u8()));

        let me = self.vm().contract_address();
        let native = self.vm().balance(me);
        let book = AssetBook {
            heirs: self.heirs_vec(),
            percents: self.percents_vec(),
            tokens: self.tokens_vec(),
            nfts: self.nft_entries(),
        };
        let native_fee = distribution::distribute(
            &mut OnchainLedger,
            me,
            native,
            self.fee_bps.get().to::<u16>(),
            fee_recipient,
            &book,
        )
        .map_err(ledger_err)?;

        self.notify_cleared()?;
        evm::log(Executed { caller, nativeFeeCharged: native_fee, feeRecipient: fee_recipient },
        );
        self.entered.set(false);
        Ok(())
    }

    /// Accept direct native-coin deposits while the will is live.
    #[receive]
    #[payable]
    pub fn receive(&mut self) -> Result<(), Vec<u8>> {
        if self.will_state() == WillState::Executed {
            return Err(WillError::BadState(BadState {
                state: WillState::Executed.as_u8(),
            })
            .into());
        }
        Ok(())
    }

    // --- views ---

    pub fn owner(&self) -> Address {
        self.owner.get()
    }

    pub fn factory_address(&self) -> Address {
        self.factory.get()
    }

    pub fn executor_address(&self) -> Address {
        self.executor.get()
    }

    pub fn state(&self) -> u8 {
        self.state.get().to::<u8>()
    }

    pub fn interval(&self) -> u64 {
        self.interval.get().to::<u64>()
    }

    pub fn last_activity(&self) -> u64 {
        self.last_activity.get().to::<u64>()
    }

    pub fn heir_count(&self) -> U256 {
        U256::from(self.heirs.len())
    }

    pub fn heir_at(&self, index: U256) -> (Address, U256) {
        let i = clamp_index(index);
        (
            self.heirs.get(i).unwrap_or_default(),
            self.percents.get(i).unwrap_or_default(),
        )
    }

    pub fn token_count(&self) -> U256 {
        U256::from(self.tokens.len())
    }

    pub fn token_at(&self, index: U256) -> Address {
        self.tokens.get(clamp_index(index)).unwrap_or_default()
    }

    pub fn nft_count(&self) -> U256 {
        U256::from(self.nft_contracts.len())
    }

    pub fn nft_at(&self, index: U256) -> (Address, U256, Address) {
        let i = clamp_index(index);
        (
            self.nft_contracts.get(i).unwrap_or_default(),
            self.nft_ids.get(i).unwrap_or_default(),
            self.nft_heirs.get(i).unwrap_or_default(),
        )
    }

    /// Whether the grace period has elapsed on an active will.
    pub fn can_execute(&self) -> bool {
        self.will_state() == WillState::Active
            && self.vm().block_timestamp() >= self.grace_end()
    }

    /// Seconds until execution becomes eligible; 0 once eligible,
    /// `u64::MAX` when the will is not counting down.
    pub fn seconds_until_eligible(&self) -> u64 {
        if self.will_state() != WillState::Active {
            return u64::MAX;
        }
        self.grace_end().saturating_sub(self.vm().block_timestamp())
    }
}

impl Will {
    fn will_state(&self) -> WillState {
        // Unknown discriminants cannot be stored; fail closed to terminal.
        WillState::try_from(self.state.get().to::<u8>()).unwrap_or(WillState::Executed)
    }

    fn require_state(&self, expected: WillState) -> Result<(), WillError> {
        if self.will_state() != expected {
            return Err(BadState { state: self.state.get().to::<u8>() }.into());
        }
        Ok(())
    }

    fn only_owner(&self) -> Result<(), WillError> {
        let caller = self.vm().msg_sender();
        if caller != self.owner.get() {
            return Err(Unauthorized { caller }.into());
        }
        Ok(())
    }

    fn check_not_entered(&self) -> Result<(), WillError> {
        if self.entered.get() {
            return Err(Reentered {}.into());
        }
        Ok(())
    }

    fn grace_end(&self) -> u64 {
        self.last_activity
            .get()
            .to::<u64>()
            .saturating_add(self.interval.get().to::<u64>())
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_configuration(
        &mut self,
        heirs: Vec<Address>,
        percents: Vec<U256>,
        interval: u64,
        tokens: Vec<Address>,
        nft_contracts: Vec<Address>,
        nft_ids: Vec<U256>,
        nft_heirs: Vec<Address>,
    ) -> Result<(), WillError> {
        if heirs.len() != percents.len()
            || nft_contracts.len() != nft_ids.len()
            || nft_contracts.len() != nft_heirs.len()
        {
            return Err(LengthMismatch {}.into());
        }
        if heirs.is_empty() {
            return Err(NoHeirs {}.into());
        }
        if interval == 0 {
            return Err(ZeroInterval {}.into());
        }
        let total: U256 = percents.iter().copied().fold(U256::ZERO, |acc, p| acc + p);
        if total != U256::from(split::PERCENT_DENOMINATOR) {
            return Err(BadPercents { total }.into());
        }

        // Listed NFTs must be in custody already, so execution and
        // cancellation can never find one missing.
        let me = self.vm().contract_address();
        let ledger = OnchainLedger;
        for (contract, token_id) in nft_contracts.iter().zip(nft_ids.iter()) {
            let holder = ledger
                .erc721_owner_of(*contract, *token_id)
                .map_err(ledger_err)?;
            if holder != me {
                return Err(NftNotHeld { token: *contract, tokenId: *token_id }.into());
            }
        }

        self.clear_configuration();
        for heir in heirs {
            self.heirs.push(heir);
        }
        for percent in percents {
            self.percents.push(percent);
        }
        for token in tokens {
            self.tokens.push(token);
        }
        for contract in nft_contracts {
            self.nft_contracts.push(contract);
        }
        for token_id in nft_ids {
            self.nft_ids.push(token_id);
        }
        for heir in nft_heirs {
            self.nft_heirs.push(heir);
        }

        self.interval.set(U64::from(interval));
        self.last_activity.set(U64::from(self.vm().block_timestamp()));
        self.state.set(U8::from(WillState::Active.as_u8()));
        evm::log(Configured { owner: self.owner.get(), interval });
        Ok(())
    }

    fn clear_configuration(&mut self) {
        self.heirs.erase();
        self.percents.erase();
        self.tokens.erase();
        self.nft_contracts.erase();
        self.nft_ids.erase();
        self.nft_heirs.erase();
    }

    fn heirs_vec(&self) -> Vec<Address> {
        (0..self.heirs.len())
            .map(|i| self.heirs.get(i).unwrap_or_default())
            .collect()
    }

    fn percents_vec(&self) -> Vec<U256> {
        (0..self.percents.len())
            .map(|i| self.percents.get(i).unwrap_or_default())
            .collect()
    }

    fn tokens_vec(&self) -> Vec<Address> {
        (0..self.tokens.len())
            .map(|i| self.tokens.get(i).unwrap_or_default())
            .collect()
    }

    fn nft_entries(&self) -> Vec<NftEntry> {
        (0..self.nft_contracts.len())
            .map(|i| NftEntry {
                contract: self.nft_contracts.get(i).unwrap_or_default(),
                token_id: self.nft_ids.get(i).unwrap_or_default(),
                heir: self.nft_heirs.get(i).unwrap_or_default(),
            })
            .collect()
    }

    /// Self-service deregistration from the factory's registry, issued on
    /// every terminal transition.
    fn notify_cleared(&mut self) -> Result<(), WillError> {
        let factory = self.factory.get();
        let data = abi::encode_call(
            selector("clearWillRecord(address)"),
            &[Arg::Word(abi::word_from_address(self.owner.get()))],
        );
        unsafe { RawCall::new().call(factory, &data) }
            .map_err(|_| CallFailed { target: factory })?;
        Ok(())
    }
}

/// Out-of-range indices resolve to misses, not reverts.
fn clamp_index(index: U256) -> usize {
    if index > U256::from(u64::MAX) {
        usize::MAX
    } else {
        index.to::<u64>() as usize
    }
}

fn ledger_err(err: hereditas_types::LedgerError) -> WillError {
    use hereditas_types::LedgerError;
    match err {
        LedgerError::CallFailed { target } => CallFailed { target }.into(),
        LedgerError::TransferRejected { token } => TransferRejected { token }.into(),
        LedgerError::MalformedReturn => MalformedReturn {}.into(),
    }
}
