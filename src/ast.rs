//! A lightweight in-crate AST (§2.1 "a lightweight in-crate AST
//! builder... stand in for the external parser").
//!
//! The real parser/AST is an external collaborator (§1, §6); this
//! module provides just enough node shape to drive and test the
//! lowering visitor (§4.4) against the illustrative node families the
//! distilled specification names: `FunctionNode`, `BreakStatement`/
//! `ContinueStatement`, `BlockStatement`/`IfStatement`/loops/
//! `SwitchStatement`/`TryStatement`/`WithStatement`, and expressions.

use std::rc::Rc;

use crate::bytecode::opcode::{BinaryOp, UnaryOp};
use crate::runtime::codeblock::{BlockInfo, FunctionNameSaveInfo, IdentifierInfo, ParameterInfo};

#[derive(Debug, Clone)]
pub enum Expr {
    NumberLiteral(f64),
    StringLiteral(String),
    Identifier(String),
    Binary { op: BinaryOp, left: Box<Expr>, right: Box<Expr> },
    Unary { op: UnaryOp, arg: Box<Expr> },
    Typeof(Box<Expr>),
    Delete { object: Box<Expr>, property: Box<Expr> },
    Assign { target: String, value: Box<Expr> },
    Member { object: Box<Expr>, property: Box<Expr> },
    Call { callee: Box<Expr>, args: Vec<Expr>, is_eval: bool },
    New { callee: Box<Expr>, args: Vec<Expr> },
}

#[derive(Debug, Clone)]
pub enum Stmt {
    Expr(Expr),
    Block(Vec<Stmt>),
    If { test: Expr, consequent: Box<Stmt>, alternate: Option<Box<Stmt>> },
    While { test: Expr, body: Box<Stmt> },
    Break(Option<String>),
    Continue(Option<String>),
    Labeled { label: String, body: Box<Stmt> },
    Return(Option<Expr>),
    Throw(Expr),
    Try {
        block: Box<Stmt>,
        catch_body: Option<Box<Stmt>>,
        finally_body: Option<Box<Stmt>>,
    },
    With { object: Expr, body: Box<Stmt> },
    Switch { discriminant: Expr, cases: Vec<(Option<Expr>, Vec<Stmt>)> },
}

/// The static + behavioral facts the lowering visitor needs about a
/// function, standing in for the parser's combined `(rootNode,
/// scopeContext)` result (§4.4 FunctionNode, §6 `parseFunction`).
#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub name: Rc<str>,
    pub parameters: Vec<ParameterInfo>,
    pub identifiers: Vec<IdentifierInfo>,
    pub block_infos: Vec<BlockInfo>,
    pub function_body_block_index: usize,
    pub body: Vec<Stmt>,
    pub is_strict: bool,
    pub is_generator: bool,
    pub uses_arguments_object: bool,
    pub needs_complex_parameter_copy: bool,
    pub can_use_indexed_variable_storage: bool,
    pub can_allocate_environment_on_stack: bool,
    pub function_name_save_info: FunctionNameSaveInfo,
}
