use evm_recon::cfg::{enumerate_blocks, enumerate_functions};
use evm_recon::disassembler::Disassembler;
use evm_recon::prelude::*;

use quickcheck_macros::quickcheck;

// PUSH1 0; CALLDATALOAD; PUSH4 0xaabbccdd; EQ; PUSH1 0x0c; JUMPI;
// JUMPDEST (0x0c); STOP
const DISPATCHER: &str = "0x60003563aabbccdd14600c575b00";

fn signatures() -> SignatureDb {
    let mut signatures = SignatureDb::new();
    signatures.insert(0xaabbccdd, "transfer(address,uint256)");
    signatures
}

#[test]
fn dispatcher_pattern_declares_a_function() {
    let cfg = Cfg::from_static(DISPATCHER, &signatures()).expect("valid bytecode");

    let matches: Vec<_> = cfg
        .functions()
        .iter()
        .filter(|f| f.selector() == Some(0xaabbccdd))
        .collect();
    assert_eq!(matches.len(), 1);

    let function = matches[0];
    assert_eq!(function.start_offset(), 0x0c);
    assert_eq!(function.name(), "func_aabbccdd");
    assert_eq!(function.preferred_name(), Some("transfer(address,uint256)"));
    assert_eq!(function.display_name(), "transfer(address,uint256)");
}

#[test]
fn the_first_instruction_seeds_the_dispatcher() {
    let cfg = Cfg::from_static(DISPATCHER, &signatures()).expect("valid bytecode");

    let dispatcher = &cfg.functions()[0];
    assert_eq!(dispatcher.start_offset(), 0);
    assert_eq!(dispatcher.name(), "Dispatcher");
    assert_eq!(dispatcher.selector(), None);
}

#[test]
fn unknown_selectors_have_no_preferred_name() {
    let cfg = Cfg::from_static(DISPATCHER, &SignatureDb::new()).expect("valid bytecode");

    let function = cfg
        .functions()
        .iter()
        .find(|f| f.selector().is_some())
        .expect("discovered function");
    assert_eq!(function.preferred_name(), None);
    assert_eq!(function.display_name(), "func_aabbccdd");
}

#[test]
fn non_matching_push4_sequences_are_ignored() {
    // PUSH4 0xaabbccdd; EQ; PUSH3 ...; JUMPI — wrong entry-push width.
    let cfg = Cfg::from_static("0x63aabbccdd1462000c005700", &SignatureDb::new())
        .expect("valid bytecode");

    assert_eq!(cfg.functions().len(), 1); // dispatcher only
}

#[test]
fn matches_without_a_decodable_entry_are_ignored() {
    // Entry 0xff points past the end of the program.
    let cfg =
        Cfg::from_static("0x63aabbccdd1460ff5700", &SignatureDb::new()).expect("valid bytecode");

    assert_eq!(cfg.functions().len(), 1);
}

#[test]
fn blocks_partition_the_instruction_sequence() {
    // PUSH1 5; JUMP | STOP | STOP | JUMPDEST; STOP
    let instructions = Disassembler::new("0x60055600005b00")
        .expect("valid bytecode")
        .disassemble()
        .expect("well-formed program");
    let blocks = enumerate_blocks(&instructions);

    let starts: Vec<_> = blocks.iter().map(|b| b.start_offset()).collect();
    assert_eq!(starts, vec![0, 3, 4, 5]);

    let rebuilt: Vec<_> = blocks
        .iter()
        .flat_map(|b| b.instructions().iter().cloned())
        .collect();
    assert_eq!(rebuilt, instructions);
}

#[test]
fn a_block_splits_before_every_jumpdest() {
    // PUSH1 1; JUMPDEST; STOP
    let instructions = Disassembler::new("0x60015b00")
        .expect("valid bytecode")
        .disassemble()
        .expect("well-formed program");
    let blocks = enumerate_blocks(&instructions);

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].last().opcode(), Opcode::PUSH(1));
    assert_eq!(blocks[1].first().opcode(), Opcode::JUMPDEST);
    assert_eq!(blocks[1].name(), "block_2");
}

#[test]
fn plain_splits_carry_a_fallthrough_edge() {
    let cfg = Cfg::from_static("0x60015b00", &SignatureDb::new()).expect("valid bytecode");

    assert_eq!(
        cfg.edges(),
        &[Edge::new(0, 2, EdgeKind::Fallthrough)]
    );
}

#[test]
fn emulated_dispatch_records_both_branch_edges() {
    // Selector right-aligned in the first calldata word makes EQ true.
    let mut calldata = vec![0u8; 28];
    calldata.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);
    let callinfo = CallInfo::new(calldata, U256::zero());

    let cfg = Cfg::from_emulation(DISPATCHER, &callinfo, &signatures()).expect("valid bytecode");

    let true_edge = Edge::new(0, 0x0c, EdgeKind::ConditionalTrue);
    let false_edge = Edge::new(0, 0x0c, EdgeKind::ConditionalFalse);
    assert!(cfg.edges().contains(&true_edge));
    assert!(cfg.edges().contains(&false_edge));
}

#[test]
fn resolved_branch_edges_point_at_jumpdest_blocks() {
    let mut calldata = vec![0u8; 28];
    calldata.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0xdd]);
    let callinfo = CallInfo::new(calldata, U256::zero());

    let cfg = Cfg::from_emulation(DISPATCHER, &callinfo, &signatures()).expect("valid bytecode");

    for edge in cfg.edges() {
        if matches!(
            edge.kind(),
            EdgeKind::ConditionalTrue | EdgeKind::Unconditional
        ) {
            let target = cfg.block_at(edge.to()).expect("target block");
            assert_eq!(target.start_offset(), edge.to());
            assert_eq!(target.first().opcode(), Opcode::JUMPDEST);
        }
    }
}

#[test]
fn repeated_emulation_does_not_duplicate_edges() {
    let mut emulator = Emulator::new("0x6001600657005b00").expect("valid bytecode");
    emulator.emulate(&CallInfo::default(), VmState::new());
    emulator.emulate(&CallInfo::default(), VmState::new());

    let cfg = Cfg::from_emulator(&emulator, &SignatureDb::new());
    let true_edges = cfg
        .edges()
        .iter()
        .filter(|e| e.kind() == EdgeKind::ConditionalTrue)
        .count();

    assert_eq!(true_edges, 1);
}

#[test]
fn empty_bytecode_yields_an_empty_graph() {
    let cfg = Cfg::from_static("0x", &SignatureDb::new()).expect("valid bytecode");

    assert!(cfg.instructions().is_empty());
    assert!(cfg.blocks().is_empty());
    assert!(cfg.functions().is_empty());
    assert!(cfg.edges().is_empty());
}

#[test]
fn functions_enumerate_directly_from_instructions() {
    let instructions = Disassembler::new(DISPATCHER)
        .expect("valid bytecode")
        .disassemble()
        .expect("well-formed program");
    let functions = enumerate_functions(&instructions, &SignatureDb::new());

    assert_eq!(functions.len(), 2);
}

#[quickcheck]
fn blocks_cover_arbitrary_programs_exactly(bytes: Vec<u8>) -> bool {
    let instructions = match Disassembler::from_bytes(bytes).disassemble() {
        Ok(instructions) => instructions,
        // Truncated PUSH immediates are rejected up front.
        Err(_) => return true,
    };
    let blocks = enumerate_blocks(&instructions);

    let rebuilt: Vec<_> = blocks
        .iter()
        .flat_map(|b| b.instructions().iter().cloned())
        .collect();

    rebuilt == instructions
}
