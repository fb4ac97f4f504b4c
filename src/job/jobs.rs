//! Job variants: `PromiseReactionJob`, `PromiseResolveThenableJob`,
//! `CleanupSomeJob` (§3 "Job", §4.6).
//!
//! Grounded directly on the original engine's `Job.cpp`: the
//! before/after Promise hooks, the `Identity`/`Thrower` handler
//! sentinels, the nested-sandbox error escalation rule (reject if a
//! reject function exists, otherwise propagate to the outer sandbox),
//! and `CleanupSomeJob`'s swap-collect-restore sequence.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::EngineError;
use crate::job::capability::{Capability, Handler};
use crate::job::sandbox::Sandbox;
use crate::runtime::value::{Callable, ObjectHandle, Value};

fn error_to_value(err: &EngineError) -> Value {
    // Constructing a real `Error` object is object-model territory
    // (§1 Non-goals); jobs that need to hand a thrown value to a
    // reject function get its string rendering instead.
    Value::Str(err.to_string().into())
}

/// Host "before"/"after" Promise hooks and the saved-stack-trace
/// restore hook (§4.6, §6 "Debug surface").
#[derive(Default, Clone)]
pub struct JobHooks {
    pub on_promise_before: Option<Rc<dyn Fn()>>,
    pub on_promise_after: Option<Rc<dyn Fn()>>,
    pub on_saved_stack_trace: Option<Rc<dyn Fn(Option<Vec<crate::error::StackFrame>>)>>,
}

/// A pending Promise reaction: handler plus the settled value it
/// reacts to and the capability it resolves/rejects (§3 "Job").
pub struct Reaction {
    pub handler: Handler,
    pub argument: Value,
    pub capability: Capability,
}

/// `PromiseReactionJob.run` (§4.6).
pub fn run_promise_reaction_job(hooks: &JobHooks, reaction: &Reaction) {
    if let Some(f) = &hooks.on_promise_before {
        f();
    }

    let outer = Sandbox::new();
    let outcome = outer.run(|| match &reaction.handler {
        Handler::Identity => {
            reaction.capability.resolve(reaction.argument.clone());
            Ok(Value::Undefined)
        }
        Handler::Thrower => {
            reaction.capability.reject(reaction.argument.clone());
            Ok(Value::Undefined)
        }
        Handler::Callback(callback) => {
            let inner = Sandbox::new();
            let inner_outcome = inner.run(|| callback(reaction.argument.clone()));
            match (inner_outcome.result, inner_outcome.error) {
                (Some(res), None) => {
                    if reaction.capability.promise.is_none() {
                        Ok(Value::Undefined)
                    } else {
                        reaction.capability.resolve(res);
                        Ok(Value::Undefined)
                    }
                }
                (None, Some(err)) => {
                    if reaction.capability.reject_function.is_some() {
                        reaction.capability.reject(error_to_value(&err));
                        Ok(Value::Undefined)
                    } else {
                        tracing::error!(error = %err, "promise reaction error escaped to outer sandbox with no reject function");
                        Err(err)
                    }
                }
                _ => unreachable!("Sandbox::run always produces exactly one of result/error"),
            }
        }
    });

    if let Some(f) = &hooks.on_promise_after {
        f();
    }
    if outcome.is_error() {
        tracing::debug!("promise reaction job completed with an escaped error");
    }
    if let Some(restore) = &hooks.on_saved_stack_trace {
        restore(reaction.capability.saved_stack_trace.clone());
    }
}

/// `PromiseResolveThenableJob.run` (§4.6). `then` receives the
/// thenable as its receiver and `[resolve, reject]` as arguments.
pub fn run_promise_resolve_thenable_job(
    then: &dyn Fn(Value, &[Value]) -> Result<Value, EngineError>,
    thenable: Value,
    capability: &Capability,
) {
    let resolve = capability.resolve_function.clone();
    let reject = capability.reject_function.clone();

    let resolve_value = Value::Function(
        ObjectHandle(0),
        Callable::Native(Rc::new(move |_receiver, args: &[Value]| {
            if let Some(f) = &resolve {
                f(args.first().cloned().unwrap_or(Value::Undefined));
            }
            Ok(Value::Undefined)
        })),
    );
    let reject_value = Value::Function(
        ObjectHandle(0),
        Callable::Native(Rc::new(move |_receiver, args: &[Value]| {
            if let Some(f) = &reject {
                f(args.first().cloned().unwrap_or(Value::Undefined));
            }
            Ok(Value::Undefined)
        })),
    );

    let inner = Sandbox::new();
    let outcome = inner.run(|| then(thenable, &[resolve_value, reject_value]));
    if let Some(err) = outcome.error {
        capability.reject(error_to_value(&err));
    }
}

/// A registry exposing a swappable cleanup callback, the minimal
/// surface `CleanupSomeJob` needs (standing in for the full
/// `FinalizationRegistry` object model, out of scope per §1).
#[derive(Default)]
pub struct CleanupRegistry {
    pub cleanup_callback: RefCell<Option<Rc<dyn Fn()>>>,
}

/// `CleanupSomeJob.run` (§4.6): swap in `callback`, force the GC to
/// drain finalizer queues, then restore the previous callback.
pub fn run_cleanup_some_job(gc: &dyn crate::external::GarbageCollector, registry: &CleanupRegistry, callback: Rc<dyn Fn()>) -> Value {
    let previous = registry.cleanup_callback.replace(Some(callback));
    gc.collect(true);
    gc.collect(true);
    gc.collect(true);
    *registry.cleanup_callback.borrow_mut() = previous;
    Value::Undefined
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::cell::Cell;

    #[test]
    fn identity_handler_resolves_the_capability() {
        let resolved = Rc::new(Cell::new(None));
        let r = Rc::clone(&resolved);
        let capability = Capability {
            promise: Some(ObjectHandle(1)),
            resolve_function: Some(Rc::new(move |v: Value| r.set(Some(format!("{v:?}"))))),
            reject_function: None,
            saved_stack_trace: None,
        };
        let reaction = Reaction { handler: Handler::Identity, argument: Value::Number(2.0), capability };
        run_promise_reaction_job(&JobHooks::default(), &reaction);
        assert!(resolved.take().is_some());
    }

    #[test]
    fn callback_error_without_reject_escapes_to_outer_sandbox() {
        let capability = Capability { promise: Some(ObjectHandle(1)), resolve_function: None, reject_function: None, saved_stack_trace: None };
        let handler = Handler::Callback(Rc::new(|_v| Err(EngineError::new(ErrorKind::TypeError, "nope"))));
        let reaction = Reaction { handler, argument: Value::Undefined, capability };
        // Should not panic: the error is caught by the outer sandbox.
        run_promise_reaction_job(&JobHooks::default(), &reaction);
    }

    #[test]
    fn callback_error_with_reject_rejects_exactly_once() {
        let rejected = Rc::new(Cell::new(0));
        let r = Rc::clone(&rejected);
        let capability = Capability {
            promise: Some(ObjectHandle(1)),
            resolve_function: None,
            reject_function: Some(Rc::new(move |_v| r.set(r.get() + 1))),
            saved_stack_trace: None,
        };
        let handler = Handler::Callback(Rc::new(|_v| Err(EngineError::new(ErrorKind::TypeError, "nope"))));
        let reaction = Reaction { handler, argument: Value::Undefined, capability };
        run_promise_reaction_job(&JobHooks::default(), &reaction);
        assert_eq!(rejected.get(), 1);
    }
}
