//! `ByteCodeGenerateContext`: per-function emission state (§4.2, §4.4).
//!
//! Combines the jump fixup table with the temporary-register bump
//! allocator and the handful of emission-mode flags the lowering
//! visitor needs (strictness, global/eval scope, `with` nesting depth).
//! One context exists per `CodeBlock` being compiled; it is consumed
//! by [`crate::codegen::lower`] and discarded once [`ByteCodeGenerator::generate`]
//! has finished filling in the owning [`ByteCodeBlock`].

use rustc_hash::FxHashMap;

use crate::bytecode::block::ByteCodeBlock;
use crate::bytecode::constants::{REGULAR_REGISTER_LIMIT, VARIABLE_LIMIT};
use crate::codegen::fixup::FixupTable;

/// Static facts about the unit being compiled, threaded through
/// emission (mirrors the original `ParserContextInformation`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ParserContextInformation {
    pub is_eval_mode: bool,
    pub is_global_scope: bool,
    pub is_strict: bool,
    pub is_in_with_scope: bool,
}

/// Per-function bytecode generation context: owns the fixup table and
/// the temporary-register allocator, and records the handful of
/// post-emission facts ([`Self::get_object_positions`],
/// [`Self::keep_numeral_literals_in_register_file`]) that
/// `ByteCodeGenerator::generate` moves onto the finished block.
pub struct ByteCodeGenerateContext {
    pub fixup: FixupTable,
    pub info: ParserContextInformation,
    /// Whether debug line/column data should be recorded (the original
    /// engine skips this for lazily-recompiled functions).
    pub should_generate_loc_data: bool,
    /// Current `with`/`try`/`for-of` nesting depth — a break/continue
    /// emitted while this is nonzero and crossing such a boundary is
    /// marked as a complex case (§4.2, §4.4).
    pub scope_nesting_depth: usize,
    /// Set once emission decides there are too many numeral literals
    /// to pool efficiently (mirrors `m_hasManyNumeralLiteral` deciding
    /// whether numerals are kept inline in the register file).
    pub keep_numeral_literals_in_register_file: bool,

    next_temp_register: u32,
    max_temp_register: u32,
    next_identifier_slot: u32,
    /// Maps a numeral literal's bit pattern to the region-3 virtual
    /// register it was already assigned, so repeated occurrences of
    /// the same literal value share one pool slot (§4.4 step (c))
    /// instead of growing the pool once per occurrence.
    numeral_literal_registers: FxHashMap<u64, u32>,
}

impl ByteCodeGenerateContext {
    pub fn new(info: ParserContextInformation) -> Self {
        Self {
            fixup: FixupTable::new(),
            info,
            should_generate_loc_data: true,
            scope_nesting_depth: 0,
            keep_numeral_literals_in_register_file: true,
            next_temp_register: 0,
            max_temp_register: 0,
            next_identifier_slot: 0,
            numeral_literal_registers: FxHashMap::default(),
        }
    }

    /// Allocate the next free temporary register (physical range,
    /// `[0, REGULAR_REGISTER_LIMIT)`).
    pub fn alloc_temp(&mut self) -> u32 {
        let r = self.next_temp_register;
        assert!(r < REGULAR_REGISTER_LIMIT, "exhausted the temporary register range");
        self.next_temp_register += 1;
        if self.next_temp_register > self.max_temp_register {
            self.max_temp_register = self.next_temp_register;
        }
        r
    }

    /// Release a temporary once its value has been consumed. Expression
    /// lowering follows a stack discipline, so this only actually frees
    /// the slot when `r` is the most recently allocated temp; releasing
    /// anything else is a no-op (the slot stays reserved, which is safe,
    /// just not maximally compact).
    pub fn release_temp(&mut self, r: u32) {
        if r + 1 == self.next_temp_register {
            self.next_temp_register = r;
        }
    }

    /// Allocate a virtual register for the `index`'th stack-allocated
    /// identifier (§3 region 2: `[REGULAR_REGISTER_LIMIT,
    /// REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT)`).
    pub fn identifier_register(&mut self, index: u32) -> u32 {
        assert!(index < VARIABLE_LIMIT, "exhausted the stack-identifier virtual range");
        if index >= self.next_identifier_slot {
            self.next_identifier_slot = index + 1;
        }
        REGULAR_REGISTER_LIMIT + index
    }

    /// Allocate the next unused stack-identifier virtual register and
    /// return it along with its slot index.
    pub fn alloc_identifier_register(&mut self) -> (u32, u32) {
        let index = self.next_identifier_slot;
        (self.identifier_register(index), index)
    }

    /// Virtual register for the `index`'th numeral literal (§3 region
    /// 3, beyond `REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT`).
    pub fn literal_register(&self, index: u32) -> u32 {
        REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT + index
    }

    /// Return the region-3 virtual register holding `value`, pushing it
    /// into `block`'s numeral pool the first time it's seen. Repeated
    /// occurrences of the same literal value share one pool slot (§4.4
    /// step (c)) — the activation protocol materializes each pooled
    /// numeral into its region-3 register file slot once per call
    /// (§4.5 step 6), so callers address this register directly
    /// instead of emitting a `LoadLiteral` at each use site.
    pub fn push_numeral_literal(&mut self, block: &mut ByteCodeBlock, value: f64) -> u32 {
        let key = value.to_bits();
        if let Some(&reg) = self.numeral_literal_registers.get(&key) {
            return reg;
        }
        let index = block.push_numeral_literal(value);
        let reg = self.literal_register(index);
        self.numeral_literal_registers.insert(key, reg);
        reg
    }

    /// The peak temporary-register count observed so far — becomes
    /// the block's `required_register_file_size` once emission finishes.
    pub fn required_register_file_size(&self) -> u32 {
        self.max_temp_register
    }

    /// Number of distinct stack-allocated identifier slots in use.
    pub fn identifiers_on_stack_count(&self) -> u32 {
        self.next_identifier_slot
    }

    /// Enter a scope that requires unwinding support for jumps that
    /// cross it (`try`, `with`, `for-of`); returns the previous depth
    /// so the caller can restore it on exit.
    pub fn enter_unwind_scope(&mut self) -> usize {
        let prev = self.scope_nesting_depth;
        self.scope_nesting_depth += 1;
        prev
    }

    pub fn exit_unwind_scope(&mut self, prev_depth: usize) {
        self.scope_nesting_depth = prev_depth;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_allocation_follows_stack_discipline() {
        let mut ctx = ByteCodeGenerateContext::new(ParserContextInformation::default());
        let a = ctx.alloc_temp();
        let b = ctx.alloc_temp();
        assert_eq!((a, b), (0, 1));
        assert_eq!(ctx.required_register_file_size(), 2);

        ctx.release_temp(b);
        let c = ctx.alloc_temp();
        assert_eq!(c, 1, "releasing the top temp should let it be reused");
        assert_eq!(ctx.required_register_file_size(), 2, "peak size never shrinks");
    }

    #[test]
    fn releasing_a_non_top_temp_is_a_noop() {
        let mut ctx = ByteCodeGenerateContext::new(ParserContextInformation::default());
        let a = ctx.alloc_temp();
        let _b = ctx.alloc_temp();
        ctx.release_temp(a);
        let c = ctx.alloc_temp();
        assert_eq!(c, 2, "non-top release must not reopen a hole");
    }

    #[test]
    fn identifier_registers_land_in_the_virtual_stack_region() {
        let mut ctx = ByteCodeGenerateContext::new(ParserContextInformation::default());
        let (r0, idx0) = ctx.alloc_identifier_register();
        let (r1, idx1) = ctx.alloc_identifier_register();
        assert_eq!((idx0, idx1), (0, 1));
        assert_eq!(r0, REGULAR_REGISTER_LIMIT);
        assert_eq!(r1, REGULAR_REGISTER_LIMIT + 1);
        assert_eq!(ctx.identifiers_on_stack_count(), 2);
    }
}
