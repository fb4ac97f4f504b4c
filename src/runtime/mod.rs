//! Function activation, environment records, and the value model
//! (§3, §4.5).

pub mod activation;
pub mod codeblock;
pub mod environment;
pub mod value;

pub use activation::{Activation, ActivationError, EngineLimits};
pub use codeblock::{BindingLocation, CodeBlock, FunctionNameSaveInfo, IdentifierInfo, ParameterInfo};
pub use environment::{ExecutionContext, FunctionEnvironmentRecord, LexicalEnvironment};
pub use value::{Callable, ObjectHandle, PlainObject, Value};
