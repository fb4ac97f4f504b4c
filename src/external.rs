//! External collaborator interfaces (§6): the parser, the interpreter,
//! and the GC are consumed by this crate but implemented outside it.
//! Each is a trait so the activation protocol and the test suite can
//! be exercised against a stub without a real parser or VM attached.

use std::rc::Rc;

use thiserror::Error;

use crate::ast::FunctionNode;
use crate::bytecode::block::ByteCodeBlock;
use crate::error::EngineError;
use crate::runtime::value::Value;

/// A parse failure (§6 "`{script | error{name, message, index, line,
/// column, description, errorCode}}`").
#[derive(Debug, Clone, Error)]
#[error("{name} at {line}:{column}: {message}")]
pub struct ParseError {
    pub name: String,
    pub message: String,
    pub index: usize,
    pub line: u32,
    pub column: u32,
    pub description: String,
    pub error_code: i32,
}

/// The parser interface the activation protocol's lazy-compile step
/// (§4.5 step 3) consumes to obtain a function's AST on first call.
pub trait Parser {
    /// `parseFunction(codeBlock, stackBudget) -> (rootNode, scopeContext)`.
    /// The scope context is folded into the returned `FunctionNode`
    /// in this port rather than kept as a second value, since this
    /// crate's `FunctionNode` already carries the identifier/parameter
    /// descriptors §3 attributes to `CodeBlock`.
    fn parse_function(&self, function_name: &str, stack_budget: usize) -> Result<FunctionNode, ParseError>;
}

/// The interpreter interface the activation protocol dispatches to in
/// its final step (§4.5 step 11, §6 "`interpret(state, byteCodeBlock,
/// startOffset, registerFile) -> Value`, throwing on error").
pub trait Interpreter {
    fn interpret(
        &self,
        byte_code_block: &ByteCodeBlock,
        start_offset: usize,
        register_file: &mut [Value],
    ) -> Result<Value, EngineError>;
}

/// The GC interface (§6): allocation and finalizer registration for
/// heap objects, plus a `collect()` entry point with an "unmap" option
/// used by `CleanupSomeJob` (§4.6).
pub trait GarbageCollector {
    fn register_finalizer(&self, handle: crate::runtime::value::ObjectHandle, callback: Rc<dyn Fn()>);
    /// `collect(unmap: true)` forces an eager return of freed pages to
    /// the OS; `CleanupSomeJob` calls this three times in a row to
    /// drain finalizer queues (§4.6, grounded on the original's
    /// `GC_gcollect_and_unmap()` triple call).
    fn collect(&self, unmap: bool);
}
