//! Promise capability (§3 "Job", §6 "Capability").

use std::rc::Rc;

use crate::error::StackFrame;
use crate::runtime::value::{ObjectHandle, Value};

/// A resolving-function pair bundled with the promise they resolve,
/// plus whatever saved stack trace the debug surface (§6) wants
/// restored once the job that captured it completes.
#[derive(Clone)]
pub struct Capability {
    pub promise: Option<ObjectHandle>,
    pub resolve_function: Option<Rc<dyn Fn(Value)>>,
    pub reject_function: Option<Rc<dyn Fn(Value)>>,
    pub saved_stack_trace: Option<Vec<StackFrame>>,
}

impl std::fmt::Debug for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capability")
            .field("promise", &self.promise)
            .field("has_resolve", &self.resolve_function.is_some())
            .field("has_reject", &self.reject_function.is_some())
            .field("saved_stack_trace", &self.saved_stack_trace.is_some())
            .finish()
    }
}

impl Capability {
    pub fn resolve(&self, value: Value) {
        if let Some(f) = &self.resolve_function {
            f(value);
        }
    }

    pub fn reject(&self, value: Value) {
        if let Some(f) = &self.reject_function {
            f(value);
        }
    }
}

/// A reaction handler: either a user callback, or one of the two
/// sentinels the original engine uses for `Promise.prototype.then`'s
/// default pass-through reactions (§3 "`handler` may be the sentinel
/// `Identity` or `Thrower`").
#[derive(Clone)]
pub enum Handler {
    Identity,
    Thrower,
    Callback(Rc<dyn Fn(Value) -> Result<Value, crate::error::EngineError>>),
}

impl std::fmt::Debug for Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Handler::Identity => f.write_str("Identity"),
            Handler::Thrower => f.write_str("Thrower"),
            Handler::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}
