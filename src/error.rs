//! Runtime error kinds (§7).
//!
//! Errors carry a message string and, for runtime errors, a stack
//! trace assembled from the active execution-context chain at throw
//! time. Bytecode-generation errors are a separate, narrower kind
//! (see [`crate::codegen::GenerateError`]) because `generate` never
//! fails observably: a generation error is turned into a block that
//! throws at runtime instead of propagating out of the generator.

use thiserror::Error;

/// The runtime error kinds a thrown value may carry.
///
/// These are the ECMAScript native error constructors, plus a
/// catch-all for values thrown by user code that are not one of the
/// built-in kinds (e.g. a plain object or string thrown via `throw`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A bytecode-generation-time syntax error, surfaced as a runtime throw.
    SyntaxError,
    /// `eval()` misuse.
    EvalError,
    /// Numeric range violations, including stack overflow.
    RangeError,
    /// Reference to an unresolved binding.
    ReferenceError,
    /// Operation attempted on a value of the wrong type.
    TypeError,
    /// Malformed URI component.
    UriError,
}

impl ErrorKind {
    /// The conventional `name` property ECMAScript error objects expose.
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::UriError => "URIError",
        }
    }
}

/// A single frame in a captured stack trace, assembled from the
/// execution-context chain at throw time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Name of the function this frame belongs to (empty for top-level code).
    pub function_name: String,
    /// Source offset within the owning bytecode block.
    pub source_index: usize,
}

/// A runtime exception: an error kind, a message, and the stack trace
/// captured at the point it was thrown.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}", kind = self.kind.name())]
pub struct EngineError {
    /// The native error kind.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Captured call-stack frames, innermost first.
    pub stack: Vec<StackFrame>,
}

impl EngineError {
    /// Construct a new error with an empty stack trace; callers
    /// typically fill `stack` in once a capturing execution context is
    /// available.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: Vec::new(),
        }
    }

    /// Convenience constructor matching the engine's own
    /// `"Maximum call stack size exceeded"` wording (§4.5 step 1).
    pub fn stack_overflow() -> Self {
        Self::new(ErrorKind::RangeError, "Maximum call stack size exceeded")
    }

    /// Attach captured stack frames, returning `self` for chaining.
    pub fn with_stack(mut self, stack: Vec<StackFrame>) -> Self {
        self.stack = stack;
        self
    }
}
