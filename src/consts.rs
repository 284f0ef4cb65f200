//! VM parameters

/// Maximum depth of the machine stack.
pub const VM_MAX_STACK_DEPTH: usize = 1024;

/// Maximum VM memory, in bytes.
pub const VM_MAX_MEMORY: usize = 1 << 24;

/// Memory grows in zero-filled chunks of this size.
pub const MEM_CHUNK_SIZE: usize = 32;

/// Length of a machine word, in bytes.
pub const WORD_SIZE: usize = 32;

/// Placeholder pushed for environmental and block-information queries the
/// emulator does not model.
pub const ENV_SENTINEL: u64 = 0xBADBEEF;

/// Initial gas budget of a fresh state. Informational only; a unit charge
/// per executed instruction is the only cost applied.
pub const INITIAL_GAS: u64 = 1_000_000;

/// Advisory cap on nested emulation paths.
pub const DEFAULT_MAX_DEPTH: usize = 20;

/// Ceiling on executed instructions per emulation, so bytecode with a
/// constant-target loop cannot hang an analysis run.
pub const DEFAULT_STEP_LIMIT: usize = 1 << 20;

/// Byte width of a function selector.
pub const SELECTOR_SIZE: usize = 4;
