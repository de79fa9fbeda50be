//! The will factory: registry, clone deployment and fee governance.
//!
//! The registry holds at most one live will per owner and is mutated only
//! by the factory itself on creation and by a registered will
//! deregistering itself on its terminal transition. Governance is
//! two-party (founder and partner, each with a primary and a backup
//! address); either party may act on shared parameters, and withdrawn
//! fees split 90/10 between them.

use alloc::{vec, vec::Vec};

use stylus_sdk::{
    alloy_primitives::{aliases::U16, Address, U256},
    evm,
    prelude::*,
};

use alloy_sol_types::sol;
use stylus_sdk::stylus_proc::SolidityError;

use hereditas_types::{split, Ledger};

use crate::{calls, deploy, ledger::OnchainLedger};

/// Distribution fee stamped into newly created wills, basis points.
pub const DEFAULT_FEE_BPS: u16 = 50;
/// Founder share of withdrawn fees, basis points; the partner gets the rest.
pub const FOUNDER_SHARE_BPS: u64 = 9_000;

sol! {
    event WillCreated(address indexed owner, address will, bool deferred);
    event WillCleared(address indexed owner, address will);
    event FeesWithdrawn(address caller, uint256 founderAmount, uint256 partnerAmount);
    event TokenFeesWithdrawn(address caller, address token, uint256 founderAmount, uint256 partnerAmount);
    event ExecutorUpdated(address executor);
    event FeesUpdated(uint256 baseFee, uint256 diaryFee, uint16 feeBps, uint16 cancelFeeBps);
    event FounderUpdated(address primary, address backup);
    event PartnerUpdated(address primary, address backup);
    event WillImplementationUpdated(address implementation);

    #[derive(Debug)]
    error AlreadyInitialized();
    #[derive(Debug)]
    error NotInitialized();
    #[derive(Debug)]
    error NotGovernor(address caller);
    #[derive(Debug)]
    error WillAlreadyRegistered(address owner, address will);
    #[derive(Debug)]
    error NotRegisteredWill(address caller);
    #[derive(Debug)]
    error FeeTooLow(uint256 required, uint256 provided);
    #[derive(Debug)]
    error LengthMismatch();
    #[derive(Debug)]
    error ZeroInterval();
    #[derive(Debug)]
    error ZeroAddress();
    #[derive(Debug)]
    error BadFeeRate(uint16 feeBps);
    #[derive(Debug)]
    error DeployFailed();
    #[derive(Debug)]
    error CallFailed(address target);
    #[derive(Debug)]
    error TransferRejected(address token);
    #[derive(Debug)]
    error MalformedReturn();
    #[derive(Debug)]
    error Reentered();
}

#[derive(SolidityError, Debug)]
pub enum FactoryError {
    AlreadyInitialized(AlreadyInitialized),
    NotInitialized(NotInitialized),
    NotGovernor(NotGovernor),
    WillAlreadyRegistered(WillAlreadyRegistered),
    NotRegisteredWill(NotRegisteredWill),
    FeeTooLow(FeeTooLow),
    LengthMismatch(LengthMismatch),
    ZeroInterval(ZeroInterval),
    ZeroAddress(ZeroAddress),
    BadFeeRate(BadFeeRate),
    DeployFailed(DeployFailed),
    CallFailed(CallFailed),
    TransferRejected(TransferRejected),
    MalformedReturn(MalformedReturn),
    Reentered(Reentered),
}

sol_storage! {
    #[entrypoint]
    pub struct WillFactory {
        bool initialized;
        /// Busy latch; rejects reentrant calls during external transfers.
        bool entered;
        /// Canonical will program cloned for each user.
        address will_impl;
        address founder;
        address founder_backup;
        address partner;
        address partner_backup;
        /// Default executor stamped into newly created wills. Changing it
        /// never reaches already-deployed wills.
        address executor;
        /// Creation fee for the standard tier, wei.
        uint256 base_fee;
        /// Creation fee for the deferred ("diary") tier, wei.
        uint256 diary_fee;
        /// Distribution fee stamped into new wills, basis points.
        uint16 fee_bps;
        /// Cancellation fee stamped into new wills, basis points.
        uint16 cancel_fee_bps;
        /// owner => live will. Cleared only by the registered will itself.
        mapping(address => address) wills;
    }
}

#[public]
impl WillFactory {
    /// One-shot setup; the caller becomes the founder governor.
    pub fn initialize(
        &mut self,
        will_impl: Address,
        executor: Address,
        partner: Address,
        diary_fee: U256,
    ) -> Result<(), FactoryError> {
        if self.initialized.get() {
            return Err(AlreadyInitialized {}.into());
        }
        if will_impl == Address::ZERO || executor == Address::ZERO || partner == Address::ZERO {
            return Err(ZeroAddress {}.into());
        }
        self.will_impl.set(will_impl);
        self.founder.set(self.vm().msg_sender());
        self.partner.set(partner);
        self.executor.set(executor);
        self.base_fee.set(U256::ZERO);
        self.diary_fee.set(diary_fee);
        self.fee_bps.set(U16::from(DEFAULT_FEE_BPS));
        self.cancel_fee_bps.set(U16::ZERO);
        self.initialized.set(true);
        Ok(())
    }

    /// Create, fund and activate a will for the caller in one transaction.
    ///
    /// Value above the creation fee becomes the will's opening native
    /// balance. Listed ERC-20 amounts and NFTs are pulled from the caller
    /// using approvals previously granted to this factory; a missing
    /// approval is the caller's precondition to fix, not something the
    /// factory can default around.
    #[payable]
    #[allow(clippy::too_many_arguments)]
    pub fn create_will(
        &mut self,
        heirs: Vec<Address>,
        percents: Vec<U256>,
        interval: u64,
        tokens: Vec<Address>,
        amounts: Vec<U256>,
        nft_contracts: Vec<Address>,
        nft_ids: Vec<U256>,
        nft_heirs: Vec<Address>,
    ) -> Result<(), FactoryError> {
        self.check_not_entered()?;
        self.require_initialized()?;
        let owner = self.vm().msg_sender();
        self.ensure_unregistered(owner)?;

        let fee = self.base_fee.get();
        let paid = self.vm().msg_value();
        if paid < fee {
            return Err(FeeTooLow { required: fee, provided: paid }.into());
        }
        if tokens.len() != amounts.len()
            || nft_contracts.len() != nft_ids.len()
            || nft_contracts.len() != nft_heirs.len()
        {
            return Err(LengthMismatch {}.into());
        }
        self.entered.set(true);

        let will = deploy::deploy_clone(self.will_impl.get(), paid - fee)
            .map_err(|_| DeployFailed {})?;
        self.register(owner, will)?;
        calls::initialize_will(
            will,
            owner,
            self.executor.get(),
            self.fee_bps.get().to::<u16>(),
            self.cancel_fee_bps.get().to::<u16>(),
        )
        .map_err(|_| CallFailed { target: will })?;

        let mut ledger = OnchainLedger;
        for (token, amount) in tokens.iter().zip(amounts.iter()) {
            if *amount > U256::ZERO {
                ledger
                    .erc20_transfer_from(*token, owner, will, *amount)
                    .map_err(ledger_err)?;
            }
        }
        for (contract, token_id) in nft_contracts.iter().zip(nft_ids.iter()) {
            ledger
                .erc721_transfer_from(*contract, owner, will, *token_id)
                .map_err(ledger_err)?;
        }

        calls::configure_will(
            will,
            &heirs,
            &percents,
            interval,
            &tokens,
            &nft_contracts,
            &nft_ids,
            &nft_heirs,
        )
        .map_err(|_| CallFailed { target: will })?;

        evm::log(WillCreated { owner, will, deferred: false });
        self.entered.set(false);
        Ok(())
    }

    /// Deferred ("diary") tier: deploy an empty will the owner configures
    /// later, directly against the will contract.
    #[payable]
    pub fn create_deferred_will(&mut self, interval: u64) -> Result<(), FactoryError> {
        self.check_not_entered()?;
        self.require_initialized()?;
        let owner = self.vm().msg_sender();
        self.ensure_unregistered(owner)?;

        let fee = self.diary_fee.get();
        let paid = self.vm().msg_value();
        if paid < fee {
            return Err(FeeTooLow { required: fee, provided: paid }.into());
        }
        // The binding interval is the one supplied at configure time; a
        // zero here is still a malformed request.
        if interval == 0 {
            return Err(ZeroInterval {}.into());
        }
        self.entered.set(true);

        let will = deploy::deploy_clone(self.will_impl.get(), paid - fee)
            .map_err(|_| DeployFailed {})?;
        self.register(owner, will)?;
        calls::initialize_will(
            will,
            owner,
            self.executor.get(),
            self.fee_bps.get().to::<u16>(),
            self.cancel_fee_bps.get().to::<u16>(),
        )
        .map_err(|_| CallFailed { target: will })?;

        evm::log(WillCreated { owner, will, deferred: true });
        self.entered.set(false);
        Ok(())
    }

    /// Self-service deregistration: only the will currently registered for
    /// `owner` may clear its own record.
    pub fn clear_will_record(&mut self, owner: Address) -> Result<(), FactoryError> {
        let caller = self.vm().msg_sender();
        let registered = self.wills.get(owner);
        if registered == Address::ZERO || registered != caller {
            return Err(NotRegisteredWill { caller }.into());
        }
        self.wills.insert(owner, Address::ZERO);
        evm::log(WillCleared { owner, will: registered });
        Ok(())
    }

    /// Pay out the factory's accumulated native-coin fees 90/10 between
    /// founder and partner.
    pub fn withdraw_fees(&mut self) -> Result<(), FactoryError> {
        self.check_not_entered()?;
        self.only_governor()?;
        self.entered.set(true);
        let balance = self.vm().balance(self.vm().contract_address());
        let founder_amount =
            balance * U256::from(FOUNDER_SHARE_BPS) / U256::from(split::BPS_DENOMINATOR);
        let partner_amount = balance - founder_amount;

        let mut ledger = OnchainLedger;
        if founder_amount > U256::ZERO {
            ledger
                .native_transfer(self.founder.get(), founder_amount)
                .map_err(ledger_err)?;
        }
        if partner_amount > U256::ZERO {
            ledger
                .native_transfer(self.partner.get(), partner_amount)
                .map_err(ledger_err)?;
        }

        evm::log(FeesWithdrawn {
                caller: self.vm().msg_sender(),
                founderAmount: founder_amount,
                partnerAmount: partner_amount,
            },
        );
        self.entered.set(false);
        Ok(())
    }

    /// Execution fees routed here during the executor window arrive in
    /// ERC-20 form too; same 90/10 split over the live token balance.
    pub fn withdraw_token_fees(&mut self, token: Address) -> Result<(), FactoryError> {
        self.check_not_entered()?;
        self.only_governor()?;
        self.entered.set(true);
        let mut ledger = OnchainLedger;
        let balance = ledger
            .erc20_balance_of(token, self.vm().contract_address())
            .map_err(ledger_err)?;
        let founder_amount =
            balance * U256::from(FOUNDER_SHARE_BPS) / U256::from(split::BPS_DENOMINATOR);
        let partner_amount = balance - founder_amount;

        if founder_amount > U256::ZERO {
            ledger
                .erc20_transfer(token, self.founder.get(), founder_amount)
                .map_err(ledger_err)?;
        }
        if partner_amount > U256::ZERO {
            ledger
                .erc20_transfer(token, self.partner.get(), partner_amount)
                .map_err(ledger_err)?;
        }

        evm::log(TokenFeesWithdrawn {
                caller: self.vm().msg_sender(),
                token,
                founderAmount: founder_amount,
                partnerAmount: partner_amount,
            },
        );
        self.entered.set(false);
        Ok(())
    }

    // --- governance setters ---

    /// New default executor for wills created from now on.
    pub fn set_executor(&mut self, executor: Address) -> Result<(), FactoryError> {
        self.only_governor()?;
        if executor == Address::ZERO {
            return Err(ZeroAddress {}.into());
        }
        self.executor.set(executor);
        evm::log(ExecutorUpdated { executor });
        Ok(())
    }

    pub fn set_base_fee(&mut self, fee: U256) -> Result<(), FactoryError> {
        self.only_governor()?;
        self.base_fee.set(fee);
        self.log_fees();
        Ok(())
    }

    pub fn set_diary_fee(&mut self, fee: U256) -> Result<(), FactoryError> {
        self.only_governor()?;
        self.diary_fee.set(fee);
        self.log_fees();
        Ok(())
    }

    pub fn set_fee_bps(&mut self, fee_bps: u16) -> Result<(), FactoryError> {
        self.only_governor()?;
        // A rate above the denominator would underflow the split.
        if u64::from(fee_bps) > split::BPS_DENOMINATOR {
            return Err(BadFeeRate { feeBps: fee_bps }.into());
        }
        self.fee_bps.set(U16::from(fee_bps));
        self.log_fees();
        Ok(())
    }

    pub fn set_cancel_fee_bps(&mut self, fee_bps: u16) -> Result<(), FactoryError> {
        self.only_governor()?;
        if u64::from(fee_bps) > split::BPS_DENOMINATOR {
            return Err(BadFeeRate { feeBps: fee_bps }.into());
        }
        self.cancel_fee_bps.set(U16::from(fee_bps));
        self.log_fees();
        Ok(())
    }

    /// Rotate the founder pair; only the founder side may do this.
    pub fn set_founder(&mut self, primary: Address, backup: Address) -> Result<(), FactoryError> {
        let caller = self.vm().msg_sender();
        if caller != self.founder.get() && caller != self.founder_backup.get() {
            return Err(NotGovernor { caller }.into());
        }
        if primary == Address::ZERO {
            return Err(ZeroAddress {}.into());
        }
        self.founder.set(primary);
        self.founder_backup.set(backup);
        evm::log(FounderUpdated { primary, backup });
        Ok(())
    }

    /// Rotate the partner pair; only the partner side may do this.
    pub fn set_partner(&mut self, primary: Address, backup: Address) -> Result<(), FactoryError> {
        let caller = self.vm().msg_sender();
        if caller != self.partner.get() && caller != self.partner_backup.get() {
            return Err(NotGovernor { caller }.into());
        }
        if primary == Address::ZERO {
            return Err(ZeroAddress {}.into());
        }
        self.partner.set(primary);
        self.partner_backup.set(backup);
        evm::log(PartnerUpdated { primary, backup });
        Ok(())
    }

    pub fn set_will_implementation(&mut self, implementation: Address) -> Result<(), FactoryError> {
        self.only_governor()?;
        if implementation == Address::ZERO {
            return Err(ZeroAddress {}.into());
        }
        self.will_impl.set(implementation);
        evm::log(WillImplementationUpdated { implementation });
        Ok(())
    }

    /// Accept the native-coin execution fees wills route here.
    #[receive]
    #[payable]
    pub fn receive(&mut self) -> Result<(), Vec<u8>> {
        Ok(())
    }

    // --- views ---

    pub fn will_of(&self, owner: Address) -> Address {
        self.wills.get(owner)
    }

    pub fn has_will(&self, owner: Address) -> bool {
        self.wills.get(owner) != Address::ZERO
    }

    pub fn is_governor(&self, account: Address) -> bool {
        self.is_governor_account(account)
    }

    pub fn executor_address(&self) -> Address {
        self.executor.get()
    }

    pub fn will_implementation(&self) -> Address {
        self.will_impl.get()
    }

    pub fn base_fee(&self) -> U256 {
        self.base_fee.get()
    }

    pub fn diary_fee(&self) -> U256 {
        self.diary_fee.get()
    }

    pub fn fee_bps(&self) -> u16 {
        self.fee_bps.get().to::<u16>()
    }

    pub fn cancel_fee_bps(&self) -> u16 {
        self.cancel_fee_bps.get().to::<u16>()
    }
}

impl WillFactory {
    fn require_initialized(&self) -> Result<(), FactoryError> {
        if !self.initialized.get() {
            return Err(NotInitialized {}.into());
        }
        Ok(())
    }

    fn is_governor_account(&self, account: Address) -> bool {
        account != Address::ZERO
            && (account == self.founder.get()
                || account == self.founder_backup.get()
                || account == self.partner.get()
                || account == self.partner_backup.get())
    }

    fn only_governor(&self) -> Result<(), FactoryError> {
        let caller = self.vm().msg_sender();
        if !self.is_governor_account(caller) {
            return Err(NotGovernor { caller }.into());
        }
        Ok(())
    }

    fn check_not_entered(&self) -> Result<(), FactoryError> {
        if self.entered.get() {
            return Err(Reentered {}.into());
        }
        Ok(())
    }

    fn ensure_unregistered(&self, owner: Address) -> Result<(), FactoryError> {
        let existing = self.wills.get(owner);
        if existing != Address::ZERO {
            return Err(WillAlreadyRegistered { owner, will: existing }.into());
        }
        Ok(())
    }

    /// Claim the owner's registry slot for `will`.
    pub(crate) fn register(&mut self, owner: Address, will: Address) -> Result<(), FactoryError> {
        self.ensure_unregistered(owner)?;
        self.wills.insert(owner, will);
        Ok(())
    }

    fn log_fees(&mut self) {
        evm::log(FeesUpdated {
                baseFee: self.base_fee.get(),
                diaryFee: self.diary_fee.get(),
                feeBps: self.fee_bps.get().to::<u16>(),
                cancelFeeBps: self.cancel_fee_bps.get().to::<u16>(),
            },
        );
    }
}

fn ledger_err(err: hereditas_types::LedgerError) -> FactoryError {
    use hereditas_types::LedgerError;
    match err {
        LedgerError::CallFailed { target } => CallFailed { target }.into(),
        LedgerError::TransferRejected { token } => TransferRejected { token }.into(),
        LedgerError::MalformedReturn => MalformedReturn {}.into(),
    }
}
