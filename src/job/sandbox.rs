//! Sandbox: the scoped exception boundary every job and top-level
//! evaluation runs inside (§4.6, §7).

use std::cell::RefCell;

use crate::error::EngineError;
use crate::runtime::value::Value;

/// The `{result, error}` pair a sandboxed evaluation produces (§4.6).
#[derive(Debug, Clone)]
pub struct SandboxOutcome {
    pub result: Option<Value>,
    pub error: Option<EngineError>,
}

impl SandboxOutcome {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// A scoped evaluation boundary. Catches every runtime exception
/// raised inside [`Sandbox::run`] and reports it as a value instead of
/// propagating it further, recording it as the "last thrown exception"
/// (§7) for introspection. Nesting a sandbox inside another (§4.6
/// `PromiseReactionJob`) lets the outer one observe an error that
/// escapes the inner one uncaught.
#[derive(Default)]
pub struct Sandbox {
    last_error: RefCell<Option<EngineError>>,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `body` inside this sandbox's boundary.
    pub fn run(&self, body: impl FnOnce() -> Result<Value, EngineError>) -> SandboxOutcome {
        match body() {
            Ok(value) => SandboxOutcome { result: Some(value), error: None },
            Err(err) => {
                *self.last_error.borrow_mut() = Some(err.clone());
                SandboxOutcome { result: None, error: Some(err) }
            }
        }
    }

    pub fn last_error(&self) -> Option<EngineError> {
        self.last_error.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn successful_body_has_no_error() {
        let sandbox = Sandbox::new();
        let outcome = sandbox.run(|| Ok(Value::Number(1.0)));
        assert!(!outcome.is_error());
    }

    #[test]
    fn failing_body_is_caught_and_recorded() {
        let sandbox = Sandbox::new();
        let outcome = sandbox.run(|| Err(EngineError::new(ErrorKind::TypeError, "boom")));
        assert!(outcome.is_error());
        assert_eq!(sandbox.last_error().unwrap().kind, ErrorKind::TypeError);
    }
}
