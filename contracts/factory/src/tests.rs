#![cfg(test)]

use alloy_primitives::{keccak256, Address, U256};
use stylus_sdk::testing::*;

use hereditas_types::abi;

use crate::factory::{FactoryError, WillFactory, DEFAULT_FEE_BPS};

fn founder() -> Address {
    Address::with_last_byte(0x11)
}
fn partner() -> Address {
    Address::with_last_byte(0x22)
}
fn backup() -> Address {
    Address::with_last_byte(0x23)
}
fn executor() -> Address {
    Address::with_last_byte(0x33)
}
fn alice() -> Address {
    Address::with_last_byte(0x44)
}
fn stranger() -> Address {
    Address::with_last_byte(0x55)
}
fn will_a() -> Address {
    Address::with_last_byte(0xa1)
}
fn will_b() -> Address {
    Address::with_last_byte(0xa2)
}
fn will_impl() -> Address {
    Address::with_last_byte(0xee)
}
fn token() -> Address {
    Address::with_last_byte(0x77)
}
fn factory_addr() -> Address {
    Address::with_last_byte(0xfa)
}

const DIARY_FEE: u64 = 1_000_000;

fn topic0(sig: &str) -> [u8; 32] {
    keccak256(sig.as_bytes()).0
}

fn ok_bool() -> Vec<u8> {
    abi::word_from_u256(U256::from(1)).to_vec()
}

fn make_vm() -> TestVM {
    TestVMBuilder::new()
        .sender(founder())
        .contract_address(factory_addr())
        .build()
}

fn initialized(vm: &TestVM) -> WillFactory {
    let mut factory = WillFactory::from(vm);
    vm.set_sender(founder());
    factory
        .initialize(will_impl(), executor(), partner(), U256::from(DIARY_FEE))
        .unwrap();
    factory
}

#[test]
fn initialize_seeds_governance_once() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    assert_eq!(factory.executor_address(), executor());
    assert_eq!(factory.will_implementation(), will_impl());
    assert_eq!(factory.base_fee(), U256::ZERO);
    assert_eq!(factory.diary_fee(), U256::from(DIARY_FEE));
    assert_eq!(factory.fee_bps(), DEFAULT_FEE_BPS);
    assert_eq!(factory.cancel_fee_bps(), 0);
    assert!(factory.is_governor(founder()));
    assert!(factory.is_governor(partner()));
    assert!(!factory.is_governor(stranger()));

    let err = factory
        .initialize(will_impl(), executor(), partner(), U256::ZERO)
        .unwrap_err();
    assert!(matches!(err, FactoryError::AlreadyInitialized(_)));
}

#[test]
fn initialize_rejects_zero_addresses() {
    let vm = make_vm();
    let mut factory = WillFactory::from(&vm);
    let err = factory
        .initialize(Address::ZERO, executor(), partner(), U256::ZERO)
        .unwrap_err();
    assert!(matches!(err, FactoryError::ZeroAddress(_)));
}

#[test]
fn create_will_requires_initialization() {
    let vm = make_vm();
    let mut factory = WillFactory::from(&vm);
    vm.set_sender(alice());
    let err = factory
        .create_will(
            vec![stranger()],
            vec![U256::from(100)],
            3600,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::NotInitialized(_)));
}

#[test]
fn create_will_rejects_an_owner_with_a_live_will() {
    let vm = make_vm();
    let mut factory = initialized(&vm);
    factory.register(alice(), will_a()).unwrap();

    vm.set_sender(alice());
    // Payment does not matter; the registry conflict wins.
    vm.set_value(U256::from(10u64 * DIARY_FEE));
    let err = factory
        .create_will(
            vec![stranger()],
            vec![U256::from(100)],
            3600,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::WillAlreadyRegistered(_)));
}

#[test]
fn create_will_rejects_underpayment_and_bad_shapes() {
    let vm = make_vm();
    let mut factory = initialized(&vm);
    factory.set_base_fee(U256::from(100u64)).unwrap();

    vm.set_sender(alice());
    vm.set_value(U256::from(99u64));
    let err = factory
        .create_will(
            vec![stranger()],
            vec![U256::from(100)],
            3600,
            vec![],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::FeeTooLow(_)));

    vm.set_value(U256::from(100u64));
    let err = factory
        .create_will(
            vec![stranger()],
            vec![U256::from(100)],
            3600,
            vec![token()],
            vec![],
            vec![],
            vec![],
            vec![],
        )
        .unwrap_err();
    assert!(matches!(err, FactoryError::LengthMismatch(_)));
}

#[test]
fn deferred_creation_validates_fee_and_interval() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(alice());
    vm.set_value(U256::from(DIARY_FEE - 1));
    let err = factory.create_deferred_will(3600).unwrap_err();
    assert!(matches!(err, FactoryError::FeeTooLow(_)));

    vm.set_value(U256::from(DIARY_FEE));
    let err = factory.create_deferred_will(0).unwrap_err();
    assert!(matches!(err, FactoryError::ZeroInterval(_)));
}

#[test]
fn registry_holds_one_will_per_owner_until_cleared() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    factory.register(alice(), will_a()).unwrap();
    assert!(factory.has_will(alice()));
    assert_eq!(factory.will_of(alice()), will_a());

    let err = factory.register(alice(), will_b()).unwrap_err();
    assert!(matches!(err, FactoryError::WillAlreadyRegistered(_)));

    // Only the registered will may clear its own record.
    vm.set_sender(stranger());
    let err = factory.clear_will_record(alice()).unwrap_err();
    assert!(matches!(err, FactoryError::NotRegisteredWill(_)));

    vm.set_sender(will_a());
    factory.clear_will_record(alice()).unwrap();
    assert!(!factory.has_will(alice()));
    let logs = vm.get_emitted_logs();
    let (topics, _) = logs.last().unwrap().clone();
    assert_eq!(topics[0].0, topic0("WillCleared(address,address)"));

    // The owner is immediately free to hold a new will.
    factory.register(alice(), will_b()).unwrap();
    assert_eq!(factory.will_of(alice()), will_b());
}

#[test]
fn clearing_an_unregistered_owner_rejects() {
    let vm = make_vm();
    let mut factory = initialized(&vm);
    vm.set_sender(will_a());
    let err = factory.clear_will_record(alice()).unwrap_err();
    assert!(matches!(err, FactoryError::NotRegisteredWill(_)));
}

#[test]
fn either_party_governs_shared_parameters() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(stranger());
    let err = factory.set_executor(stranger()).unwrap_err();
    assert!(matches!(err, FactoryError::NotGovernor(_)));

    vm.set_sender(partner());
    factory.set_executor(Address::with_last_byte(0x34)).unwrap();
    assert_eq!(factory.executor_address(), Address::with_last_byte(0x34));

    vm.set_sender(founder());
    factory.set_base_fee(U256::from(42u64)).unwrap();
    factory.set_fee_bps(75).unwrap();
    factory.set_cancel_fee_bps(25).unwrap();
    assert_eq!(factory.base_fee(), U256::from(42u64));
    assert_eq!(factory.fee_bps(), 75);
    assert_eq!(factory.cancel_fee_bps(), 25);

    let err = factory.set_fee_bps(10_001).unwrap_err();
    assert!(matches!(err, FactoryError::BadFeeRate(_)));
}

#[test]
fn governor_pairs_rotate_only_their_own_side() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(partner());
    let err = factory.set_founder(stranger(), Address::ZERO).unwrap_err();
    assert!(matches!(err, FactoryError::NotGovernor(_)));

    vm.set_sender(founder());
    factory.set_founder(founder(), backup()).unwrap();
    assert!(factory.is_governor(backup()));

    // The backup address can act for its side afterwards.
    vm.set_sender(backup());
    factory.set_founder(backup(), Address::ZERO).unwrap();
    assert!(!factory.is_governor(founder()));
    assert!(factory.is_governor(backup()));

    vm.set_sender(partner());
    factory.set_partner(partner(), Address::with_last_byte(0x24)).unwrap();
    assert!(factory.is_governor(Address::with_last_byte(0x24)));
}

#[test]
fn set_will_implementation_is_guarded() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(founder());
    let err = factory.set_will_implementation(Address::ZERO).unwrap_err();
    assert!(matches!(err, FactoryError::ZeroAddress(_)));

    factory
        .set_will_implementation(Address::with_last_byte(0xef))
        .unwrap();
    assert_eq!(
        factory.will_implementation(),
        Address::with_last_byte(0xef)
    );
}

#[test]
fn withdraw_fees_splits_ninety_ten() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(stranger());
    let err = factory.withdraw_fees().unwrap_err();
    assert!(matches!(err, FactoryError::NotGovernor(_)));

    vm.set_balance(factory_addr(), U256::from(1_000u64));
    vm.set_sender(founder());
    vm.mock_call(founder(), vec![], Ok(vec![]));
    vm.mock_call(partner(), vec![], Ok(vec![]));
    factory.withdraw_fees().unwrap();

    let logs = vm.get_emitted_logs();
    let (topics, data) = logs.last().unwrap().clone();
    assert_eq!(topics[0].0, topic0("FeesWithdrawn(address,uint256,uint256)"));
    assert_eq!(abi::decode_address(&data[0..32]).unwrap(), founder());
    assert_eq!(abi::decode_u256(&data[32..64]).unwrap(), U256::from(900u64));
    assert_eq!(abi::decode_u256(&data[64..96]).unwrap(), U256::from(100u64));
}

#[test]
fn withdraw_token_fees_splits_the_live_balance() {
    let vm = make_vm();
    let mut factory = initialized(&vm);

    vm.set_sender(partner());
    vm.mock_call(
        token(),
        abi::erc20_balance_of(factory_addr()),
        Ok(abi::word_from_u256(U256::from(1_000u64)).to_vec()),
    );
    vm.mock_call(
        token(),
        abi::erc20_transfer(founder(), U256::from(900u64)),
        Ok(ok_bool()),
    );
    vm.mock_call(
        token(),
        abi::erc20_transfer(partner(), U256::from(100u64)),
        Ok(ok_bool()),
    );
    factory.withdraw_token_fees(token()).unwrap();

    let logs = vm.get_emitted_logs();
    let (topics, data) = logs.last().unwrap().clone();
    assert_eq!(
        topics[0].0,
        topic0("TokenFeesWithdrawn(address,address,uint256,uint256)")
    );
    assert_eq!(abi::decode_address(&data[32..64]).unwrap(), token());
    assert_eq!(abi::decode_u256(&data[64..96]).unwrap(), U256::from(900u64));
    assert_eq!(abi::decode_u256(&data[96..128]).unwrap(), U256::from(100u64));
}
