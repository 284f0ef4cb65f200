use evm_recon::prelude::*;

use quickcheck_macros::quickcheck;

fn run(bytecode: &str) -> (Emulator, Emulation) {
    let mut emulator = Emulator::new(bytecode).expect("valid bytecode");
    let emulation = emulator.emulate(&CallInfo::default(), VmState::new());

    (emulator, emulation)
}

fn u256(limbs: (u64, u64, u64, u64)) -> U256 {
    U256([limbs.0, limbs.1, limbs.2, limbs.3])
}

#[test]
fn storage_round_trips_through_sstore_and_sload() {
    // PUSH1 0x42; PUSH1 0; SSTORE; PUSH1 0; SLOAD; then an unassigned byte.
    let (_, emulation) = run("0x60426000556000545f");

    assert_eq!(emulation.state().stack(), &[U256::from(0x42)]);
    assert_eq!(
        emulation.state().storage().sload(&U256::zero()),
        U256::from(0x42)
    );
    assert_eq!(emulation.state().storage().len(), 1);
    assert_eq!(emulation.halt(), &HaltReason::InvalidInstruction);
}

#[test]
fn memory_round_trips_through_mstore_and_mload() {
    // PUSH1 0x42; PUSH1 0; MSTORE; PUSH1 0; MLOAD
    let (_, emulation) = run("0x6042600052600051");

    assert_eq!(emulation.state().stack(), &[U256::from(0x42)]);
    assert_eq!(emulation.state().memory().len(), 32);
}

#[test]
fn mload_of_untouched_memory_is_zero() {
    let memory = Memory::new();

    assert_eq!(memory.mload(0), U256::zero());
    assert_eq!(memory.mload(1000), U256::zero());
    assert_eq!(memory.read_range(64, 16), vec![0; 16]);
}

#[test]
fn mstore8_writes_the_low_byte() {
    let mut memory = Memory::new();
    memory.mstore8(5, U256::from(0xabcd));

    assert_eq!(memory.as_slice()[5], 0xcd);
    // One chunk is enough to cover offset 5.
    assert_eq!(memory.len(), 32);
}

#[test]
fn memory_grows_in_chunks() {
    let mut memory = Memory::new();
    memory.mstore(10, U256::one());

    // 10 + 32 bytes round up to two chunks.
    assert_eq!(memory.len(), 64);
}

#[test]
fn unaligned_mload_sees_the_stored_word_shifted() {
    let mut memory = Memory::new();
    memory.mstore(0, U256::from(0x42));

    // Reading 16 bytes past the write splits the word.
    assert_eq!(memory.mload(16), U256::from(0x42) << 128);
}

#[test]
fn mload_beyond_the_ceiling_faults() {
    // PUSH32 2^256-1; MLOAD
    let bytecode = format!("0x7f{}51", "ff".repeat(32));
    let (_, emulation) = run(&bytecode);

    match emulation.halt() {
        HaltReason::Fault(fault) => {
            assert_eq!(fault.op(), Opcode::MLOAD);
            assert_eq!(
                fault.reason(),
                &FaultReason::MemoryLimitExceeded { at: U256::MAX }
            );
        }
        halt => panic!("expected a memory fault, got {halt:?}"),
    }
}

#[test]
fn storage_is_carried_between_runs_through_the_seed_state() {
    // PUSH1 0x42; PUSH1 0; SSTORE; STOP
    let mut emulator = Emulator::new("0x604260005500").expect("valid bytecode");
    let first = emulator.emulate(&CallInfo::default(), VmState::new());

    // PUSH1 0; SLOAD; STOP against the carried storage.
    let mut reader = Emulator::new("0x60005400").expect("valid bytecode");
    let second = reader.emulate(&CallInfo::default(), first.into_state());

    assert_eq!(second.state().stack(), &[U256::from(0x42)]);
}

#[test]
fn calldata_feeds_calldataload_and_calldatasize() {
    // CALLDATASIZE; PUSH1 0; CALLDATALOAD
    let mut emulator = Emulator::new("0x3660003500").expect("valid bytecode");
    let calldata = vec![0x11; 4];
    let callinfo = CallInfo::new(calldata, U256::zero());
    let emulation = emulator.emulate(&callinfo, VmState::new());

    // The 4 bytes sit in the high end of the loaded word.
    let word = U256::from(0x11111111u64) << 224;
    assert_eq!(emulation.state().stack(), &[U256::from(4), word]);
}

#[test]
fn callvalue_is_concrete_and_unmodeled_queries_are_sentinels() {
    // CALLVALUE; CALLER; NUMBER; STOP
    let mut emulator = Emulator::new("0x34334300").expect("valid bytecode");
    let callinfo = CallInfo::new(Vec::new(), U256::from(7));
    let emulation = emulator.emulate(&callinfo, VmState::new());

    let sentinel = U256::from(0xBADBEEFu64);
    assert_eq!(
        emulation.state().stack(),
        &[U256::from(7), sentinel, sentinel]
    );
}

#[test]
fn codecopy_writes_program_bytes() {
    // PUSH1 4 (len); PUSH1 0 (src); PUSH1 0 (dest); CODECOPY; STOP
    let (_, emulation) = run("0x6004600060003900");

    assert_eq!(
        emulation.state().memory().read_range(0, 4),
        vec![0x60, 0x04, 0x60, 0x00]
    );
}

#[test]
fn return_captures_the_returned_range() {
    // PUSH1 0x42; PUSH1 0; MSTORE; PUSH1 32 (len); PUSH1 0 (offset); RETURN
    let (_, emulation) = run("0x604260005260206000f3");

    assert_eq!(emulation.halt(), &HaltReason::Return);
    let mut expected = vec![0; 32];
    expected[31] = 0x42;
    assert_eq!(emulation.state().last_returned(), expected.as_slice());
}

#[quickcheck]
fn storage_round_trip_holds(key: (u64, u64, u64, u64), value: (u64, u64, u64, u64)) -> bool {
    let (key, value) = (u256(key), u256(value));
    let mut storage = Storage::new();
    storage.sstore(key, value);

    storage.sload(&key) == value && storage.sload(&(key ^ U256::MAX)) == U256::zero()
}

#[quickcheck]
fn memory_round_trip_holds_at_aligned_offsets(offset: u16, value: (u64, u64, u64, u64)) -> bool {
    let offset = offset as usize * 32;
    let value = u256(value);
    let mut memory = Memory::new();
    memory.mstore(offset, value);

    memory.mload(offset) == value
}

#[quickcheck]
fn stacks_stay_in_lock_step_on_arbitrary_bytecode(bytes: Vec<u8>) -> bool {
    let emulator = Emulator::new(&hex::encode(&bytes));
    let mut emulator = match emulator {
        Ok(emulator) => emulator.with_step_limit(4096),
        // Truncated PUSH immediates are rejected up front.
        Err(_) => return true,
    };

    let callinfo = CallInfo::new(vec![0xaa; 36], U256::one());
    let emulation = emulator.emulate(&callinfo, VmState::new());

    emulation.state().stack().len() == emulation.state().ssa_stack().len()
}
