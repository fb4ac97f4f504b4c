//! Label & Jump Fixup Table (§3 "Fixup Table", §4.2).
//!
//! Tracks, during emission of a loop/switch/labeled-statement, the
//! offsets of `Jump` instructions whose target isn't known yet. Each
//! `consume*` call is the single point where a loop/switch/label
//! "closes out": every recorded offset gets its target patched, and
//! any of those offsets that cross a `try`/`with`/`for-of` scope gets
//! morphed into a `JumpComplexCase` carrying a `ControlFlowRecord`.
//!
//! Invariant (§3): `consume*` runs exactly once per loop/switch/labeled
//! statement boundary, in the same order the AST visitor descended
//! into it.

use rustc_hash::FxHashMap;

use crate::bytecode::block::{ByteCodeBlock, ControlFlowRecord, ControlFlowReason, LiteralData};
use crate::bytecode::constants::UNRESOLVED_JUMP;
use crate::bytecode::opcode::Instr;

/// Accumulates unresolved break/continue jump positions and the set of
/// "complex" jumps that need unwinding support when they're resolved.
#[derive(Debug, Default)]
pub struct FixupTable {
    break_positions: Vec<usize>,
    continue_positions: Vec<usize>,
    labeled_break_positions: Vec<(String, usize)>,
    labeled_continue_positions: Vec<(String, usize)>,
    /// code position -> recorded unwind count, for jumps that cross a
    /// `try`/`with`/`for-of` boundary and must become `JumpComplexCase`.
    complex_case_positions: FxHashMap<usize, usize>,
}

impl FixupTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_break(&mut self, offset: usize) {
        self.break_positions.push(offset);
    }

    pub fn push_continue(&mut self, offset: usize) {
        self.continue_positions.push(offset);
    }

    pub fn push_labeled_break(&mut self, label: impl Into<String>, offset: usize) {
        self.labeled_break_positions.push((label.into(), offset));
    }

    pub fn push_labeled_continue(&mut self, label: impl Into<String>, offset: usize) {
        self.labeled_continue_positions.push((label.into(), offset));
    }

    /// Mark a previously-pushed jump offset as crossing a scope that
    /// requires unwinding. `recorded_unwind_count` is the scope-nesting
    /// depth measured when the break/continue was first emitted.
    pub fn mark_complex_case(&mut self, offset: usize, recorded_unwind_count: usize) {
        self.complex_case_positions.insert(offset, recorded_unwind_count);
    }

    /// Patch every pending `break` jump in this scope to `position`,
    /// morphing any complex ones, then clear the list.
    pub fn consume_break(&mut self, block: &mut ByteCodeBlock, position: usize, outer_limit_count: usize) {
        let positions = std::mem::take(&mut self.break_positions);
        for offset in positions {
            Self::patch_jump_target(block, offset, position);
            self.morph_into_complex_case(block, offset, outer_limit_count);
        }
    }

    /// Symmetric to [`Self::consume_break`] for `continue` jumps.
    pub fn consume_continue(&mut self, block: &mut ByteCodeBlock, position: usize, outer_limit_count: usize) {
        let positions = std::mem::take(&mut self.continue_positions);
        for offset in positions {
            Self::patch_jump_target(block, offset, position);
            self.morph_into_complex_case(block, offset, outer_limit_count);
        }
    }

    /// Patch every pending labeled `break lbl` jump matching `label`.
    pub fn consume_labeled_break(
        &mut self,
        block: &mut ByteCodeBlock,
        position: usize,
        label: &str,
        outer_limit_count: usize,
    ) {
        let mut remaining = Vec::with_capacity(self.labeled_break_positions.len());
        for (lbl, offset) in std::mem::take(&mut self.labeled_break_positions) {
            if lbl == label {
                Self::patch_jump_target(block, offset, position);
                self.morph_into_complex_case(block, offset, outer_limit_count);
            } else {
                remaining.push((lbl, offset));
            }
        }
        self.labeled_break_positions = remaining;
    }

    /// Patch every pending labeled `continue lbl` jump matching `label`.
    pub fn consume_labeled_continue(
        &mut self,
        block: &mut ByteCodeBlock,
        position: usize,
        label: &str,
        outer_limit_count: usize,
    ) {
        let mut remaining = Vec::with_capacity(self.labeled_continue_positions.len());
        for (lbl, offset) in std::mem::take(&mut self.labeled_continue_positions) {
            if lbl == label {
                Self::patch_jump_target(block, offset, position);
                self.morph_into_complex_case(block, offset, outer_limit_count);
            } else {
                remaining.push((lbl, offset));
            }
        }
        self.labeled_continue_positions = remaining;
    }

    fn patch_jump_target(block: &mut ByteCodeBlock, offset: usize, position: usize) {
        match block.peek_code_mut(offset) {
            Instr::Jump { jump_position } => *jump_position = position,
            other => panic!("fixup target at {offset} is not a plain Jump: {other:?}"),
        }
    }

    fn morph_into_complex_case(&mut self, block: &mut ByteCodeBlock, code_pos: usize, outer_limit_count: usize) {
        let Some(recorded_unwind_count) = self.complex_case_positions.remove(&code_pos) else {
            return;
        };
        let target_position = match block.peek_code(code_pos) {
            Instr::Jump { jump_position } => *jump_position,
            other => panic!("complex-case target at {code_pos} is not a plain Jump: {other:?}"),
        };
        let record = ControlFlowRecord {
            reason: ControlFlowReason::NeedsJump,
            target_position,
            recorded_unwind_count,
            outer_limit_count,
        };
        let record_index = block.push_literal(LiteralData::ControlFlowRecord(record));
        *block.peek_code_mut(code_pos) = Instr::JumpComplexCase {
            jump_position: target_position,
            control_flow_record: record_index,
        };
    }

    /// `true` once every pending list has been consumed by its owning
    /// scope (§3 invariant: fixups never outlive the scope that pushed
    /// them).
    pub fn is_fully_consumed(&self) -> bool {
        self.break_positions.is_empty()
            && self.continue_positions.is_empty()
            && self.labeled_break_positions.is_empty()
            && self.labeled_continue_positions.is_empty()
    }

    /// Emit a placeholder unconditional jump and register its offset
    /// as a pending `break`, returning the offset for use with
    /// [`Self::mark_complex_case`] if the break turns out to cross a
    /// scope boundary.
    pub fn emit_pending_break(block: &mut ByteCodeBlock, source_index: usize) -> usize {
        let offset = block.push_code(Instr::Jump { jump_position: UNRESOLVED_JUMP }, source_index);
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consume_break_patches_all_pending_jumps() {
        let mut block = ByteCodeBlock::new();
        let mut table = FixupTable::new();

        let b1 = FixupTable::emit_pending_break(&mut block, 0);
        let b2 = FixupTable::emit_pending_break(&mut block, 1);
        table.push_break(b1);
        table.push_break(b2);

        table.consume_break(&mut block, 42, 0);

        assert_eq!(block.peek_code(b1), &Instr::Jump { jump_position: 42 });
        assert_eq!(block.peek_code(b2), &Instr::Jump { jump_position: 42 });
        assert!(table.is_fully_consumed());
    }

    #[test]
    fn complex_case_jump_is_morphed_with_a_control_flow_record() {
        let mut block = ByteCodeBlock::new();
        let mut table = FixupTable::new();

        let offset = FixupTable::emit_pending_break(&mut block, 0);
        table.push_break(offset);
        table.mark_complex_case(offset, 2);

        table.consume_break(&mut block, 100, 1);

        match block.peek_code(offset) {
            Instr::JumpComplexCase { jump_position, control_flow_record } => {
                assert_eq!(*jump_position, 100);
                match &block.literal_data()[*control_flow_record as usize] {
                    LiteralData::ControlFlowRecord(record) => {
                        assert_eq!(record.reason, ControlFlowReason::NeedsJump);
                        assert_eq!(record.target_position, 100);
                        assert_eq!(record.recorded_unwind_count, 2);
                        assert_eq!(record.outer_limit_count, 1);
                    }
                    other => panic!("expected a ControlFlowRecord literal, got {other:?}"),
                }
            }
            other => panic!("expected JumpComplexCase, got {other:?}"),
        }
    }

    #[test]
    fn labeled_break_only_consumes_matching_label() {
        let mut block = ByteCodeBlock::new();
        let mut table = FixupTable::new();

        let outer = FixupTable::emit_pending_break(&mut block, 0);
        let inner = FixupTable::emit_pending_break(&mut block, 1);
        table.push_labeled_break("outer", outer);
        table.push_labeled_break("inner", inner);

        table.consume_labeled_break(&mut block, 10, "outer", 0);

        assert_eq!(block.peek_code(outer), &Instr::Jump { jump_position: 10 });
        assert_eq!(block.peek_code(inner), &Instr::Jump { jump_position: UNRESOLVED_JUMP });
    }
}
