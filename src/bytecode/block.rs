//! The Bytecode Block (§3, §4.1).
//!
//! A `ByteCodeBlock` is created once per `CodeBlock` (function or
//! top-level script), mutated only during emission and the register
//! rewrite pass, and thereafter immutable. The original engine backs
//! it with a raw byte buffer of variable-width instruction records;
//! here the buffer is simply `Vec<Instr>` (see [`crate::bytecode::opcode`]
//! for why that's the right translation of the C++ shape), so
//! `push_code`/`peek_code` become plain `Vec` indexing instead of
//! pointer arithmetic.

use crate::bytecode::constants::UNRESOLVED_JUMP;
use crate::bytecode::opcode::Instr;

/// A literal held alive in a block's literal pool: numeric and string
/// constants, compiled regex patterns, error messages kept for
/// `ThrowStaticErrorOperation`, and `ControlFlowRecord`s installed by
/// the fixup table when a jump is morphed into a complex case (§4.2).
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralData {
    /// A string literal or identifier name.
    Str(String),
    /// A compiled regular expression (pattern, flags).
    Regex { pattern: String, flags: String },
    /// A message string retained for a static throw.
    ErrorMessage(String),
    /// An unwinding descriptor installed by a complex jump (§4.2).
    ControlFlowRecord(ControlFlowRecord),
    /// `undefined`, pooled like any other literal rather than encoded
    /// as a sentinel `literal_index` (§4.4 FunctionNode step (b)).
    Undefined,
}

/// Why a `ControlFlowRecord` exists: the original engine has a single
/// reason today (`NeedsJump`), used whenever a break/continue needs to
/// run intervening `finally`/`with` teardown before transferring
/// control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlowReason {
    /// Unwind intervening scopes, then jump to `target_position`.
    NeedsJump,
}

/// Directs the unwinder when a break/continue crosses a `try`/`with`/
/// `for-of` scope (§3 Job/§4.2). Installed into the literal pool by
/// [`crate::codegen::fixup::FixupTable::morph_into_complex_case`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlFlowRecord {
    /// Why this record exists.
    pub reason: ControlFlowReason,
    /// Final jump target once unwinding completes.
    pub target_position: usize,
    /// Number of scopes to unwind, recorded when the break/continue
    /// was first emitted.
    pub recorded_unwind_count: usize,
    /// Scope-nesting depth of the boundary the jump is crossing,
    /// recorded at `consume*` time.
    pub outer_limit_count: usize,
}

/// A structure-cache slot seeded for an object-shape-dependent
/// instruction (`GetObjectPreComputedCase`/`SetObjectPreComputedCase`,
/// §3). The actual inline-cache payload belongs to the (external)
/// interpreter/object model; the block only reserves the slot index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StructureCacheSlot {
    /// Opaque cached shape identifier, populated by the interpreter
    /// on first execution. `None` until then.
    pub cached_shape_id: Option<u64>,
}

/// Per-block behavior flags (§3).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockFlags {
    /// Generated for a direct/indirect `eval()` call.
    pub is_eval_mode: bool,
    /// Top-level code executing directly against the global scope.
    pub is_on_global: bool,
    /// The activation protocol should scrub the native stack after
    /// this block returns (a GC-safety requirement, §4.5 step 11).
    pub should_clear_stack: bool,
}

/// The compiled form of a `CodeBlock`: a linear instruction buffer
/// plus side tables (§3, §4.1).
#[derive(Debug, Clone, Default)]
pub struct ByteCodeBlock {
    code: Vec<Instr>,
    /// `code[i]`'s originating source offset, for stack-trace reconstruction.
    loc_table: Vec<usize>,
    literal_data: Vec<LiteralData>,
    numeral_literal_data: Vec<f64>,
    structure_cache: Vec<StructureCacheSlot>,
    /// Positions of every `GetObject` instruction, for inline-cache seeding.
    get_object_positions: Vec<usize>,
    /// Required physical register file size, computed during emission
    /// (filled in by [`crate::codegen::context::ByteCodeGenerateContext`]
    /// once the temporary-register counter peaks).
    pub required_register_file_size: u32,
    /// Number of distinct stack-allocated identifier slots the
    /// emitter used (`stackVariableSize` in §3's rewrite formula).
    pub identifiers_on_stack_count: u32,
    pub flags: BlockFlags,
}

impl ByteCodeBlock {
    /// A fresh, empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an instruction, recording its source offset, and return
    /// the position it was stored at (for later patching via
    /// [`Self::peek_code_mut`]).
    pub fn push_code(&mut self, instr: Instr, source_index: usize) -> usize {
        let pos = self.code.len();
        self.code.push(instr);
        self.loc_table.push(source_index);
        if let Instr::GetObject { .. } = self.code[pos] {
            self.get_object_positions.push(pos);
        }
        pos
    }

    /// Read the instruction at `position`.
    pub fn peek_code(&self, position: usize) -> &Instr {
        &self.code[position]
    }

    /// Edit an already-emitted instruction in place — used for jump
    /// resolution and for morphing a `Jump` into a `JumpComplexCase`.
    pub fn peek_code_mut(&mut self, position: usize) -> &mut Instr {
        &mut self.code[position]
    }

    /// The position of the most recently emitted instruction matching
    /// `predicate`, if any (the C++ original's `lastCodePosition<T>()`,
    /// specialized at the call site instead of at the type level).
    pub fn last_code_position(&self, predicate: impl Fn(&Instr) -> bool) -> Option<usize> {
        self.code.iter().rposition(|i| predicate(i))
    }

    /// Current instruction count — the position the *next* `push_code`
    /// call will return.
    pub fn current_position(&self) -> usize {
        self.code.len()
    }

    /// Add a literal and return its pool index.
    pub fn push_literal(&mut self, literal: LiteralData) -> u32 {
        let idx = self.literal_data.len() as u32;
        self.literal_data.push(literal);
        idx
    }

    /// Add a numeric literal and return its index in the numeral
    /// region (the virtual-register range beyond `stackBase +
    /// VARIABLE_LIMIT`, §3).
    pub fn push_numeral_literal(&mut self, value: f64) -> u32 {
        let idx = self.numeral_literal_data.len() as u32;
        self.numeral_literal_data.push(value);
        idx
    }

    /// Reserve a fresh structure-cache slot and return its index.
    pub fn alloc_cache_slot(&mut self) -> u32 {
        let idx = self.structure_cache.len() as u32;
        self.structure_cache.push(StructureCacheSlot::default());
        idx
    }

    pub fn code(&self) -> &[Instr] {
        &self.code
    }

    pub fn code_mut(&mut self) -> &mut [Instr] {
        &mut self.code
    }

    pub fn loc_table(&self) -> &[usize] {
        &self.loc_table
    }

    pub fn literal_data(&self) -> &[LiteralData] {
        &self.literal_data
    }

    pub fn numeral_literal_data(&self) -> &[f64] {
        &self.numeral_literal_data
    }

    pub fn get_object_positions(&self) -> &[usize] {
        &self.get_object_positions
    }

    pub fn structure_cache_len(&self) -> usize {
        self.structure_cache.len()
    }

    /// Replace this block's code with a single static throw, used
    /// when AST lowering fails (§4.4 "Error handling"). `generate`
    /// itself never fails observably: the caller gets back a usable
    /// block that throws the syntax error the first time it runs.
    pub fn replace_with_static_error(
        &mut self,
        kind: crate::error::ErrorKind,
        message: String,
        source_index: usize,
    ) {
        self.code.clear();
        self.loc_table.clear();
        self.literal_data.clear();
        let message_index = self.push_literal(LiteralData::ErrorMessage(message));
        self.push_code(
            Instr::ThrowStaticErrorOperation { kind, message_index },
            source_index,
        );
    }

    /// §8 invariant 2: every jump in the block has a resolved target.
    pub fn all_jumps_resolved(&self) -> bool {
        self.code.iter().all(|i| match i {
            Instr::Jump { jump_position }
            | Instr::JumpComplexCase { jump_position, .. }
            | Instr::JumpIfTrue { jump_position, .. }
            | Instr::JumpIfFalse { jump_position, .. } => *jump_position != UNRESOLVED_JUMP,
            _ => true,
        })
    }
}
