//! Bytecode representation: the instruction set and the per-function
//! compiled block that holds it (§3, §4.1).

pub mod block;
pub mod constants;
pub mod opcode;

pub use block::{BlockFlags, ByteCodeBlock, ControlFlowRecord, ControlFlowReason, LiteralData, StructureCacheSlot};
pub use constants::{
    DEFAULT_CODE_CACHE_TRIM_THRESHOLD, DEFAULT_MAX_CALL_STACK_DEPTH, NO_REGISTER, REGULAR_REGISTER_LIMIT,
    UNRESOLVED_JUMP, VARIABLE_LIMIT,
};
pub use opcode::{BinaryOp, ControlFlowRecordIndex, Instr, UnaryOp};
