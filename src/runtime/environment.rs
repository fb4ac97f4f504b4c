//! Environment Records and the lexical/execution-context chain (§3
//! "Environment Record", §4.5 step 5).

use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::runtime::codeblock::CodeBlock;
use crate::runtime::value::Value;

/// One of the three environment-record shapes (§3). The choice between
/// them is made once, per `CodeBlock`, by capture analysis external to
/// this crate (`can_allocate_environment_on_stack` /
/// `can_use_indexed_variable_storage`); the activation protocol just
/// acts on those flags (§4.5 step 5).
#[derive(Debug)]
pub enum FunctionEnvironmentRecord {
    /// No heap allocation: bindings live directly in the caller's
    /// register file. Valid only while the owning activation's stack
    /// frame is live (§3 invariant 5) — enforced here by giving it no
    /// independent lifetime: it is constructed and dropped within
    /// [`crate::runtime::activation::Activation::call`].
    Simple,
    /// Indexed heap storage: bindings addressed by integer slot.
    OnHeap { slots: Vec<Value> },
    /// Named heap storage, used when indexed storage isn't available
    /// (e.g. a `with`-scope-adjacent function or one whose bindings
    /// can't be statically indexed).
    NotIndexed { bindings: FxHashMap<Rc<str>, Value> },
}

impl FunctionEnvironmentRecord {
    pub fn new_on_heap(slot_count: usize) -> Self {
        FunctionEnvironmentRecord::OnHeap {
            slots: vec![Value::Undefined; slot_count],
        }
    }

    pub fn new_not_indexed() -> Self {
        FunctionEnvironmentRecord::NotIndexed {
            bindings: FxHashMap::default(),
        }
    }

    pub fn get_indexed(&self, index: u32) -> Value {
        match self {
            FunctionEnvironmentRecord::OnHeap { slots } => slots[index as usize].clone(),
            _ => panic!("get_indexed on a non-indexed environment record"),
        }
    }

    pub fn set_indexed(&mut self, index: u32, value: Value) {
        match self {
            FunctionEnvironmentRecord::OnHeap { slots } => slots[index as usize] = value,
            _ => panic!("set_indexed on a non-indexed environment record"),
        }
    }

    pub fn get_named(&self, name: &str) -> Value {
        match self {
            FunctionEnvironmentRecord::NotIndexed { bindings } => bindings.get(name).cloned().unwrap_or(Value::Undefined),
            _ => panic!("get_named on an indexed environment record"),
        }
    }

    pub fn set_named(&mut self, name: impl Into<Rc<str>>, value: Value) {
        match self {
            FunctionEnvironmentRecord::NotIndexed { bindings } => {
                bindings.insert(name.into(), value);
            }
            _ => panic!("set_named on an indexed environment record"),
        }
    }
}

/// Pairs an environment record with its outer lexical environment.
#[derive(Debug)]
pub struct LexicalEnvironment {
    pub record: FunctionEnvironmentRecord,
    pub outer: Option<Rc<LexicalEnvironment>>,
}

/// Pairs a lexical environment with its caller context, the owning
/// script/function's `CodeBlock`, and the strictness it executes
/// under (§3).
#[derive(Debug)]
pub struct ExecutionContext {
    pub lexical_environment: Rc<LexicalEnvironment>,
    pub caller: Option<Rc<ExecutionContext>>,
    pub code_block: Rc<CodeBlock>,
    pub is_strict: bool,
}

impl ExecutionContext {
    /// Walk this context's caller chain, innermost first, yielding
    /// every distinct `CodeBlock` reachable from it — the set the
    /// code-cache trim pass (§4.5 step 4) must not drop.
    pub fn reachable_code_blocks(self: &Rc<Self>) -> Vec<Rc<CodeBlock>> {
        let mut out = Vec::new();
        let mut cur = Some(Rc::clone(self));
        while let Some(ctx) = cur {
            out.push(Rc::clone(&ctx.code_block));
            cur = ctx.caller.clone();
        }
        out
    }
}
