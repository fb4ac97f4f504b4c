//! Bytecode generation: fixup table, per-function emission context,
//! the AST lowering visitor, and the register-rewrite post-pass
//! (§4.2–§4.4).

pub mod context;
pub mod fixup;
pub mod lower;
pub mod rewrite;

pub use context::{ByteCodeGenerateContext, ParserContextInformation};
pub use fixup::FixupTable;
pub use lower::GenerateError;
pub use rewrite::RewriteError;

use crate::ast::FunctionNode;
use crate::bytecode::block::ByteCodeBlock;

/// Run the full generate -> rewrite pipeline for `func` and return a
/// finished, physically-addressed [`ByteCodeBlock`] (§2 "Control and
/// data flow").
///
/// `identifiers_on_stack_count` matches `func.identifiers`'s count of
/// stack-allocated slots; callers that already tracked this during
/// scope analysis may pass it directly, but computing it here keeps
/// the public surface to a single function call for the common case.
pub fn generate(func: &FunctionNode) -> Result<ByteCodeBlock, RewriteError> {
    let mut block = lower::generate_bytecode(func);
    let identifiers_on_stack_count = block.identifiers_on_stack_count;
    rewrite::rewrite_registers(&mut block, identifiers_on_stack_count)?;
    debug_assert!(block.all_jumps_resolved());
    Ok(block)
}
