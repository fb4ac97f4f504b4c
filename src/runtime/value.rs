//! The engine's value representation (§6 "Host embedding", §4.5).
//!
//! The object model itself (shapes, prototypes, the full `Object`/
//! `ArrayObject`/`FunctionObject` hierarchy) is external collaborator
//! territory per §1 — out of scope for this crate. What the activation
//! protocol and the job scheduler need is a small closed value type to
//! drive receiver coercion, parameter binding, and Promise resolution
//! against, plus a handle type standing in for anything GC-managed.

use std::rc::Rc;

use rustc_hash::FxHashMap;

/// An opaque reference to a heap object managed by the (external) GC
/// interface (§6). Equality is by identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub u64);

/// A callable value: either a closure over a compiled `CodeBlock` or a
/// host-provided native callback (§6 "a bridge for registering host
/// callbacks that appear as native-backed function objects").
#[derive(Clone)]
pub enum Callable {
    Closure(Rc<crate::runtime::codeblock::CodeBlock>),
    Native(Rc<dyn Fn(Value, &[Value]) -> Result<Value, crate::error::EngineError>>),
}

impl std::fmt::Debug for Callable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Callable::Closure(cb) => f.debug_tuple("Closure").field(&cb.name).finish(),
            Callable::Native(_) => f.write_str("Native(..)"),
        }
    }
}

/// An ECMAScript value (§6 conversion helpers operate on this type).
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    /// An arbitrary-precision integer, held as its decimal digit
    /// string rather than a fixed-width type (§6 "Persisted state
    /// layout" scalar tags).
    BigInt(Rc<str>),
    /// A symbol obtained from the global symbol registry by string
    /// key, rather than a freshly allocated `Symbol` (the object model
    /// itself is out of scope, §1). Grounded on
    /// `Symbol::fromGlobalSymbolRegistry`: such a symbol is identified
    /// entirely by its registry key, so that key is all this crate's
    /// value model needs to carry.
    SymbolKey(Rc<str>),
    Object(ObjectHandle),
    Function(ObjectHandle, Callable),
}

impl Value {
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// `ToBoolean` (§6 `toBoolean`).
    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Str(s) => !s.is_empty(),
            Value::BigInt(digits) => digits.as_ref() != "0",
            Value::SymbolKey(_) => true,
            Value::Object(_) | Value::Function(..) => true,
        }
    }

    /// `ToObject` (§6 `toObject`), used by sloppy-mode receiver
    /// coercion (§4.5 step 10). Primitives are out of scope for boxing
    /// here (no `Object`/`ArrayObject` model in this crate); callers
    /// that need boxed primitives are an external concern, so this
    /// returns the handle unchanged for object-ish values and `None`
    /// otherwise.
    pub fn as_object_handle(&self) -> Option<ObjectHandle> {
        match self {
            Value::Object(h) | Value::Function(h, _) => Some(*h),
            _ => None,
        }
    }
}

/// An ordinary (non-function) object, backing global bindings and
/// plain property storage for the test-tooling stub interpreter. Real
/// shape/prototype machinery is out of scope (§1); this is the minimal
/// `get`/`set`/`defineDataProperty` surface §6 names.
#[derive(Debug, Clone, Default)]
pub struct PlainObject {
    properties: FxHashMap<Rc<str>, Value>,
}

impl PlainObject {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Value {
        self.properties.get(name).cloned().unwrap_or(Value::Undefined)
    }

    pub fn define_data_property(&mut self, name: impl Into<Rc<str>>, value: Value) {
        self.properties.insert(name.into(), value);
    }

    pub fn get_own_property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }
}
