//! End-to-end: AST -> generate -> rewrite -> activation -> a stub
//! interpreter executing the resulting bytecode, in the style of the
//! corpus's `tests/*_integration.rs` files.

use std::rc::Rc;

use ember_core::ast::{Expr, FunctionNode, Stmt};
use ember_core::bytecode::block::{ByteCodeBlock, LiteralData};
use ember_core::bytecode::opcode::{BinaryOp, Instr};
use ember_core::error::EngineError;
use ember_core::external::{Interpreter, Parser};
use ember_core::runtime::activation::{Activation, EngineLimits};
use ember_core::runtime::codeblock::{BindingLocation, CodeBlock, FunctionNameSaveInfo, IdentifierInfo, ParameterInfo};
use ember_core::runtime::value::Value;

/// Never consulted in these tests: every `CodeBlock` below is built
/// with bytecode already attached, so the activation protocol's lazy
/// compile step (§4.5 step 3) never needs to run.
struct UnusedParser;

impl Parser for UnusedParser {
    fn parse_function(&self, function_name: &str, _stack_budget: usize) -> Result<FunctionNode, ember_core::external::ParseError> {
        panic!("lazy compile should not run for {function_name}: bytecode was pre-attached");
    }
}

/// A small interpreter covering exactly the opcodes the two functions
/// under test emit: loads, a move, one binary op, and the two return
/// forms. Anything else is unreachable for these programs.
struct StubInterpreter;

impl Interpreter for StubInterpreter {
    fn interpret(&self, byte_code_block: &ByteCodeBlock, start_offset: usize, register_file: &mut [Value]) -> Result<Value, EngineError> {
        let mut pc = start_offset;
        loop {
            match byte_code_block.peek_code(pc) {
                Instr::LoadLiteral { register_index, literal_index } => {
                    register_file[*register_index as usize] = match &byte_code_block.literal_data()[*literal_index as usize] {
                        LiteralData::Undefined => Value::Undefined,
                        LiteralData::Str(s) => Value::Str(s.as_str().into()),
                        other => panic!("stub interpreter hit an unsupported literal: {other:?}"),
                    };
                    pc += 1;
                }
                Instr::Move { register_index0, register_index1 } => {
                    register_file[*register_index0 as usize] = register_file[*register_index1 as usize].clone();
                    pc += 1;
                }
                Instr::BindingCalleeIntoRegister { .. } => {
                    pc += 1;
                }
                Instr::Binary { op, src_index0, src_index1, dst_index } => {
                    let a = &register_file[*src_index0 as usize];
                    let b = &register_file[*src_index1 as usize];
                    let result = match (op, a, b) {
                        (BinaryOp::Plus, Value::Number(x), Value::Number(y)) => Value::Number(x + y),
                        (BinaryOp::StrictEqual, Value::Number(x), Value::Number(y)) => Value::Bool(x == y),
                        _ => panic!("unsupported binary op in stub interpreter"),
                    };
                    register_file[*dst_index as usize] = result;
                    pc += 1;
                }
                Instr::ReturnFunctionWithValue { register_index } => {
                    return Ok(register_file[*register_index as usize].clone());
                }
                Instr::ReturnFunction => return Ok(Value::Undefined),
                other => panic!("stub interpreter hit an unsupported opcode: {other:?}"),
            }
        }
    }
}

fn identity_function() -> FunctionNode {
    FunctionNode {
        name: "identity".into(),
        parameters: vec![ParameterInfo { name: "x".into(), location: BindingLocation::Stack { slot: 0 } }],
        identifiers: vec![],
        block_infos: vec![],
        function_body_block_index: 0,
        body: vec![Stmt::Return(Some(Expr::Identifier("x".to_string())))],
        is_strict: false,
        is_generator: false,
        uses_arguments_object: false,
        needs_complex_parameter_copy: false,
        can_use_indexed_variable_storage: true,
        can_allocate_environment_on_stack: true,
        function_name_save_info: FunctionNameSaveInfo::default(),
    }
}

fn addition_function() -> FunctionNode {
    FunctionNode {
        name: "addTwo".into(),
        parameters: vec![],
        identifiers: vec![],
        block_infos: vec![],
        function_body_block_index: 0,
        body: vec![Stmt::Return(Some(Expr::Binary {
            op: BinaryOp::Plus,
            left: Box::new(Expr::NumberLiteral(1.0)),
            right: Box::new(Expr::NumberLiteral(2.0)),
        }))],
        is_strict: false,
        is_generator: false,
        uses_arguments_object: false,
        needs_complex_parameter_copy: false,
        can_use_indexed_variable_storage: true,
        can_allocate_environment_on_stack: true,
        function_name_save_info: FunctionNameSaveInfo::default(),
    }
}

/// A local variable that is declared but never assigned before being
/// read, exercising FunctionNode step (b)'s undefined-initialization
/// path for a genuine `is_parameter_name: false` stack identifier.
fn uninitialized_local_function() -> FunctionNode {
    FunctionNode {
        name: "uninitializedLocal".into(),
        parameters: vec![],
        identifiers: vec![IdentifierInfo {
            name: "local".into(),
            location: BindingLocation::Stack { slot: 0 },
            is_parameter_name: false,
            is_explicitly_declared_or_parameter_name: true,
        }],
        block_infos: vec![],
        function_body_block_index: 0,
        body: vec![Stmt::Return(Some(Expr::Identifier("local".to_string())))],
        is_strict: false,
        is_generator: false,
        uses_arguments_object: false,
        needs_complex_parameter_copy: false,
        can_use_indexed_variable_storage: true,
        can_allocate_environment_on_stack: true,
        function_name_save_info: FunctionNameSaveInfo::default(),
    }
}

fn code_block_for(func: &FunctionNode, parameters: Vec<ParameterInfo>) -> Rc<CodeBlock> {
    let byte_code = ember_core::codegen::generate(func).expect("generation and rewrite should succeed");
    Rc::new(CodeBlock {
        name: Rc::clone(&func.name),
        parameters,
        identifiers: func.identifiers.clone(),
        child_blocks: vec![],
        block_infos: func.block_infos.clone(),
        function_body_block_index: func.function_body_block_index,
        is_strict: func.is_strict,
        can_use_indexed_variable_storage: func.can_use_indexed_variable_storage,
        can_allocate_environment_on_stack: func.can_allocate_environment_on_stack,
        uses_arguments_object: func.uses_arguments_object,
        needs_complex_parameter_copy: func.needs_complex_parameter_copy,
        is_generator: func.is_generator,
        function_name_save_info: func.function_name_save_info,
        byte_code: std::cell::RefCell::new(Some(Rc::new(byte_code))),
        native: None,
    })
}

#[test]
fn calling_the_identity_function_returns_its_argument() {
    let func = identity_function();
    let code_block = code_block_for(&func, func.parameters.clone());
    let activation = Activation::new(EngineLimits::default(), StubInterpreter, UnusedParser);

    let result = activation
        .call(&code_block, None, Value::Undefined, &[Value::Number(42.0)])
        .expect("call should succeed");

    match result {
        Value::Number(n) => assert_eq!(n, 42.0),
        other => panic!("expected Number(42), got {other:?}"),
    }
}

#[test]
fn addition_function_executes_its_binary_op() {
    let func = addition_function();
    let code_block = code_block_for(&func, vec![]);
    let activation = Activation::new(EngineLimits::default(), StubInterpreter, UnusedParser);

    let result = activation.call(&code_block, None, Value::Undefined, &[]).expect("call should succeed");

    match result {
        Value::Number(n) => assert_eq!(n, 3.0),
        other => panic!("expected Number(3), got {other:?}"),
    }
}

#[test]
fn uninitialized_local_reads_back_as_undefined() {
    let func = uninitialized_local_function();
    let code_block = code_block_for(&func, vec![]);
    let activation = Activation::new(EngineLimits::default(), StubInterpreter, UnusedParser);

    let result = activation.call(&code_block, None, Value::Undefined, &[]).expect("call should succeed");

    assert!(matches!(result, Value::Undefined), "expected Undefined, got {result:?}");
}

#[test]
fn stack_guard_rejects_calls_past_the_configured_depth() {
    let func = identity_function();
    let code_block = code_block_for(&func, func.parameters.clone());
    let limits = EngineLimits { max_call_stack_depth: 0, code_cache_trim_threshold: EngineLimits::default().code_cache_trim_threshold };
    let activation = Activation::new(limits, StubInterpreter, UnusedParser);

    let err = activation
        .call(&code_block, None, Value::Undefined, &[Value::Number(1.0)])
        .expect_err("depth limit of 0 should reject every call");

    assert!(matches!(err, ember_core::runtime::activation::ActivationError::Engine(e) if e.kind == ember_core::error::ErrorKind::RangeError));
}

#[test]
fn native_fast_path_bypasses_bytecode_entirely() {
    let code_block = Rc::new(CodeBlock {
        name: "nativeAdd".into(),
        parameters: vec![],
        identifiers: vec![],
        child_blocks: vec![],
        block_infos: vec![],
        function_body_block_index: 0,
        is_strict: true,
        can_use_indexed_variable_storage: true,
        can_allocate_environment_on_stack: true,
        uses_arguments_object: false,
        needs_complex_parameter_copy: false,
        is_generator: false,
        function_name_save_info: FunctionNameSaveInfo::default(),
        byte_code: std::cell::RefCell::new(None),
        native: Some(Rc::new(|_receiver, argv| match argv {
            [Value::Number(a), Value::Number(b)] => Ok(Value::Number(a + b)),
            _ => Ok(Value::Undefined),
        })),
    });
    let activation = Activation::new(EngineLimits::default(), StubInterpreter, UnusedParser);

    let result = activation
        .call(&code_block, None, Value::Undefined, &[Value::Number(10.0), Value::Number(5.0)])
        .expect("native call should succeed without ever touching the parser");

    match result {
        Value::Number(n) => assert_eq!(n, 15.0),
        other => panic!("expected Number(15), got {other:?}"),
    }
}
