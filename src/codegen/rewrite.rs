//! Register Allocator / Rewriter post-pass (§3, §4.3, §8 invariant 1).
//!
//! Input: a fully emitted bytecode buffer whose register operands use
//! the three virtual regions described in §3. Output: the same buffer
//! with every operand rewritten into the physical register file.
//!
//! The original engine also converts `Jump` targets from
//! buffer-relative offsets to absolute addresses when the interpreter
//! uses threaded dispatch (§4.3, §9 design note). This port targets a
//! plain `match`-dispatched interpreter, so jump targets are left as
//! resolved instruction indices — per §9, that's a valid starting
//! point that doesn't change this pass's contract.

use thiserror::Error;

use crate::bytecode::block::ByteCodeBlock;
use crate::bytecode::constants::{NO_REGISTER, REGULAR_REGISTER_LIMIT, VARIABLE_LIMIT};
use crate::bytecode::opcode::Instr;

/// Fatal invariant violations raised by the rewrite pass. In safe Rust
/// an "unknown opcode" can't occur (the `match` below is exhaustive),
/// so the only live variant here guards against a generator bug that
/// produced an out-of-range operand.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RewriteError {
    /// A register operand exceeded `[0, physical_size)` after rewriting.
    #[error("register {register} at instruction {position} is out of bounds (physical size {physical_size})")]
    RegisterOutOfBounds {
        position: usize,
        register: u32,
        physical_size: u32,
    },
}

/// Apply §3's rewrite formula to a single register operand in place.
/// The sentinel [`NO_REGISTER`] ("no register") is never rewritten.
pub fn assign_stack_index_if_needed(register_index: &mut u32, stack_base: u32, stack_base_will_be: u32, stack_variable_size: u32) {
    if *register_index == NO_REGISTER {
        return;
    }
    if *register_index >= stack_base {
        if *register_index >= stack_base + VARIABLE_LIMIT {
            *register_index = stack_base_will_be + stack_variable_size + (*register_index - (stack_base + VARIABLE_LIMIT));
        } else {
            *register_index = stack_base_will_be + (*register_index - stack_base);
        }
    }
}

/// Walk every instruction in `block` and rewrite its register operands
/// from the virtual regions of §3 into the physical register file.
///
/// `identifiers_on_stack_count` is `CodeBlock::identifierOnStackCount()`
/// in the original design — the number of stack-allocated identifier
/// slots the enclosing `CodeBlock` declared, which together with
/// `block.required_register_file_size` (filled in by the emitter)
/// determines `stackBaseWillBe`/`stackVariableSize`.
pub fn rewrite_registers(block: &mut ByteCodeBlock, identifiers_on_stack_count: u32) -> Result<(), RewriteError> {
    let stack_base = REGULAR_REGISTER_LIMIT;
    let stack_base_will_be = block.required_register_file_size;
    let stack_variable_size = identifiers_on_stack_count;
    let physical_size = stack_base_will_be + stack_variable_size + (block.numeral_literal_data().len() as u32);

    tracing::trace!(
        stack_base,
        stack_base_will_be,
        stack_variable_size,
        physical_size,
        "rewriting bytecode registers"
    );

    for instr in block.code_mut() {
        let assign = |r: &mut u32| assign_stack_index_if_needed(r, stack_base, stack_base_will_be, stack_variable_size);
        match instr {
            Instr::LoadLiteral { register_index, .. }
            | Instr::LoadRegexp { register_index, .. }
            | Instr::LoadByName { register_index, .. }
            | Instr::StoreByName { register_index, .. }
            | Instr::LoadByHeapIndex { register_index, .. }
            | Instr::StoreByHeapIndex { register_index, .. }
            | Instr::CreateFunction { register_index, .. }
            | Instr::CreateObject { register_index }
            | Instr::CreateArray { register_index, .. }
            | Instr::ReturnFunctionWithValue { register_index }
            | Instr::ReturnFunctionSlowCase { register_index }
            | Instr::GetGlobalObject { register_index, .. }
            | Instr::SetGlobalObject { register_index, .. }
            | Instr::ThrowOperation { register_index }
            | Instr::WithOperation { register_index }
            | Instr::BindingCalleeIntoRegister { register_index }
            | Instr::JumpIfTrue { register_index, .. }
            | Instr::JumpIfFalse { register_index, .. } => assign(register_index),

            Instr::GetObject {
                store_register_index,
                object_register_index,
                property_register_index,
            } => {
                assign(store_register_index);
                assign(object_register_index);
                assign(property_register_index);
            }
            Instr::SetObject {
                object_register_index,
                property_register_index,
                load_register_index,
            }
            | Instr::ObjectDefineOwnPropertyOperation {
                object_register_index,
                property_register_index,
                load_register_index,
            } => {
                assign(object_register_index);
                assign(property_register_index);
                assign(load_register_index);
            }
            Instr::ObjectDefineOwnPropertyWithNameOperation {
                object_register_index,
                load_register_index,
                ..
            } => {
                // §9 open question: the original rewrote `load_register_index`
                // twice; absent evidence of a second distinct operand, this
                // is treated as a single field with a single rewrite.
                assign(object_register_index);
                assign(load_register_index);
            }
            Instr::ArrayDefineOwnPropertyOperation {
                object_register_index,
                load_register_indexes,
            } => {
                assign(object_register_index);
                for idx in load_register_indexes.iter_mut() {
                    assign(idx);
                }
            }
            Instr::GetObjectPreComputedCase {
                object_register_index,
                store_register_index,
                ..
            } => {
                assign(object_register_index);
                assign(store_register_index);
            }
            Instr::SetObjectPreComputedCase {
                object_register_index,
                load_register_index,
                ..
            } => {
                assign(object_register_index);
                assign(load_register_index);
            }
            Instr::Move { register_index0, register_index1 } => {
                assign(register_index0);
                assign(register_index1);
            }
            Instr::ObjectDefineGetter {
                object_register_index,
                object_property_name_register_index,
                object_property_value_register_index,
            }
            | Instr::ObjectDefineSetter {
                object_register_index,
                object_property_name_register_index,
                object_property_value_register_index,
            } => {
                assign(object_register_index);
                assign(object_property_name_register_index);
                assign(object_property_value_register_index);
            }
            Instr::Unary { src_index, dst_index, .. } | Instr::UnaryTypeof { src_index, dst_index } => {
                assign(src_index);
                assign(dst_index);
            }
            Instr::UnaryDelete { src_index0, src_index1, dst_index } => {
                assign(src_index0);
                assign(src_index1);
                assign(dst_index);
            }
            Instr::Binary {
                src_index0, src_index1, dst_index, ..
            } => {
                assign(src_index0);
                assign(src_index1);
                assign(dst_index);
            }
            Instr::CallFunction {
                callee_index,
                arguments_start_index,
                result_index,
                ..
            } => {
                assign(callee_index);
                assign(arguments_start_index);
                assign(result_index);
            }
            Instr::CallFunctionWithReceiver {
                receiver_index,
                callee_index,
                arguments_start_index,
                result_index,
                ..
            } => {
                assign(receiver_index);
                assign(callee_index);
                assign(arguments_start_index);
                assign(result_index);
            }
            Instr::CallEvalFunction {
                arguments_start_index,
                result_index,
                ..
            }
            | Instr::CallFunctionInWithScope {
                arguments_start_index,
                result_index,
                ..
            } => {
                assign(arguments_start_index);
                assign(result_index);
            }
            Instr::NewOperation {
                callee_index,
                arguments_start_index,
                result_index,
                ..
            } => {
                assign(callee_index);
                assign(arguments_start_index);
                assign(result_index);
            }
            Instr::EnumerateObject { object_register_index } => assign(object_register_index),

            // Jump targets are already resolved instruction indices, not
            // register operands; nothing to rewrite (see module doc).
            Instr::Jump { .. } | Instr::JumpComplexCase { .. } => {}
            Instr::ThrowStaticErrorOperation { .. }
            | Instr::DeclareFunctionDeclarations
            | Instr::ReturnFunction
            | Instr::Nop
            | Instr::End => {}
        }
    }

    verify_bounds(block, physical_size)
}

fn verify_bounds(block: &ByteCodeBlock, physical_size: u32) -> Result<(), RewriteError> {
    for (position, instr) in block.code().iter().enumerate() {
        for register in registers_of(instr) {
            if register != NO_REGISTER && register >= physical_size {
                return Err(RewriteError::RegisterOutOfBounds {
                    position,
                    register,
                    physical_size,
                });
            }
        }
    }
    Ok(())
}

/// All register operands an instruction carries, post-rewrite, for
/// §8 invariant 4 verification.
fn registers_of(instr: &Instr) -> Vec<u32> {
    match instr {
        Instr::LoadLiteral { register_index, .. }
        | Instr::LoadRegexp { register_index, .. }
        | Instr::LoadByName { register_index, .. }
        | Instr::StoreByName { register_index, .. }
        | Instr::LoadByHeapIndex { register_index, .. }
        | Instr::StoreByHeapIndex { register_index, .. }
        | Instr::CreateFunction { register_index, .. }
        | Instr::CreateObject { register_index }
        | Instr::CreateArray { register_index, .. }
        | Instr::ReturnFunctionWithValue { register_index }
        | Instr::ReturnFunctionSlowCase { register_index }
        | Instr::GetGlobalObject { register_index, .. }
        | Instr::SetGlobalObject { register_index, .. }
        | Instr::ThrowOperation { register_index }
        | Instr::WithOperation { register_index }
        | Instr::BindingCalleeIntoRegister { register_index }
        | Instr::JumpIfTrue { register_index, .. }
        | Instr::JumpIfFalse { register_index, .. } => vec![*register_index],

        Instr::GetObject {
            store_register_index,
            object_register_index,
            property_register_index,
        } => vec![*store_register_index, *object_register_index, *property_register_index],
        Instr::SetObject {
            object_register_index,
            property_register_index,
            load_register_index,
        }
        | Instr::ObjectDefineOwnPropertyOperation {
            object_register_index,
            property_register_index,
            load_register_index,
        } => vec![*object_register_index, *property_register_index, *load_register_index],
        Instr::ObjectDefineOwnPropertyWithNameOperation {
            object_register_index,
            load_register_index,
            ..
        } => vec![*object_register_index, *load_register_index],
        Instr::ArrayDefineOwnPropertyOperation {
            object_register_index,
            load_register_indexes,
        } => {
            let mut v = vec![*object_register_index];
            v.extend(load_register_indexes.iter().copied());
            v
        }
        Instr::GetObjectPreComputedCase {
            object_register_index,
            store_register_index,
            ..
        } => vec![*object_register_index, *store_register_index],
        Instr::SetObjectPreComputedCase {
            object_register_index,
            load_register_index,
            ..
        } => vec![*object_register_index, *load_register_index],
        Instr::Move { register_index0, register_index1 } => vec![*register_index0, *register_index1],
        Instr::ObjectDefineGetter {
            object_register_index,
            object_property_name_register_index,
            object_property_value_register_index,
        }
        | Instr::ObjectDefineSetter {
            object_register_index,
            object_property_name_register_index,
            object_property_value_register_index,
        } => vec![
            *object_register_index,
            *object_property_name_register_index,
            *object_property_value_register_index,
        ],
        Instr::Unary { src_index, dst_index, .. } | Instr::UnaryTypeof { src_index, dst_index } => {
            vec![*src_index, *dst_index]
        }
        Instr::UnaryDelete { src_index0, src_index1, dst_index } => vec![*src_index0, *src_index1, *dst_index],
        Instr::Binary { src_index0, src_index1, dst_index, .. } => vec![*src_index0, *src_index1, *dst_index],
        Instr::CallFunction {
            callee_index,
            arguments_start_index,
            result_index,
            ..
        } => vec![*callee_index, *arguments_start_index, *result_index],
        Instr::CallFunctionWithReceiver {
            receiver_index,
            callee_index,
            arguments_start_index,
            result_index,
            ..
        } => vec![*receiver_index, *callee_index, *arguments_start_index, *result_index],
        Instr::CallEvalFunction {
            arguments_start_index,
            result_index,
            ..
        }
        | Instr::CallFunctionInWithScope {
            arguments_start_index,
            result_index,
            ..
        } => vec![*arguments_start_index, *result_index],
        Instr::NewOperation {
            callee_index,
            arguments_start_index,
            result_index,
            ..
        } => vec![*callee_index, *arguments_start_index, *result_index],
        Instr::EnumerateObject { object_register_index } => vec![*object_register_index],
        Instr::Jump { .. }
        | Instr::JumpComplexCase { .. }
        | Instr::ThrowStaticErrorOperation { .. }
        | Instr::DeclareFunctionDeclarations
        | Instr::ReturnFunction
        | Instr::Nop
        | Instr::End => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stack_region_operand_maps_past_temporaries() {
        let mut block = ByteCodeBlock::new();
        block.required_register_file_size = 4;
        block.push_code(
            Instr::LoadLiteral {
                register_index: REGULAR_REGISTER_LIMIT, // first stack identifier
                literal_index: 0,
            },
            0,
        );
        rewrite_registers(&mut block, 2).unwrap();
        assert_eq!(
            block.peek_code(0),
            &Instr::LoadLiteral { register_index: 4, literal_index: 0 }
        );
    }

    #[test]
    fn literal_region_operand_maps_past_stack_identifiers() {
        let mut block = ByteCodeBlock::new();
        block.required_register_file_size = 4;
        block.push_code(
            Instr::LoadLiteral {
                register_index: REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT, // first numeral literal
                literal_index: 0,
            },
            0,
        );
        rewrite_registers(&mut block, 2).unwrap();
        // stackBaseWillBe(4) + stackVariableSize(2) + 0
        assert_eq!(
            block.peek_code(0),
            &Instr::LoadLiteral { register_index: 6, literal_index: 0 }
        );
    }

    #[test]
    fn temporary_region_operand_is_left_untouched() {
        let mut block = ByteCodeBlock::new();
        block.required_register_file_size = 4;
        block.push_code(Instr::LoadLiteral { register_index: 1, literal_index: 0 }, 0);
        rewrite_registers(&mut block, 2).unwrap();
        assert_eq!(block.peek_code(0), &Instr::LoadLiteral { register_index: 1, literal_index: 0 });
    }

    #[test]
    fn no_register_sentinel_is_never_rewritten() {
        let mut block = ByteCodeBlock::new();
        block.required_register_file_size = 4;
        block.push_code(
            Instr::CallEvalFunction {
                arguments_start_index: REGULAR_REGISTER_LIMIT,
                argument_count: 0,
                result_index: NO_REGISTER,
            },
            0,
        );
        rewrite_registers(&mut block, 2).unwrap();
        assert_eq!(
            block.peek_code(0),
            &Instr::CallEvalFunction {
                arguments_start_index: 4,
                argument_count: 0,
                result_index: NO_REGISTER,
            }
        );
    }

    #[test]
    fn out_of_bounds_operand_is_rejected() {
        let mut block = ByteCodeBlock::new();
        block.required_register_file_size = 1;
        // A register index that doesn't belong to any declared region
        // still passes through untouched (it's < stack_base), so to
        // exercise the bounds check we craft a post-rewrite violation
        // directly by asking for more stack identifiers than exist.
        block.push_code(
            Instr::LoadLiteral {
                register_index: REGULAR_REGISTER_LIMIT + VARIABLE_LIMIT,
                literal_index: 0,
            },
            0,
        );
        // identifiers_on_stack_count correct, numeral pool empty ->
        // physical_size = 1 (required) + 0 (idents) + 0 (numerals) = 1,
        // but our rewritten target is 1 + 0 + 0 = 1, which is == physical_size,
        // i.e. out of bounds (valid indices are < physical_size).
        let err = rewrite_registers(&mut block, 0).unwrap_err();
        assert!(matches!(err, RewriteError::RegisterOutOfBounds { .. }));
    }
}
