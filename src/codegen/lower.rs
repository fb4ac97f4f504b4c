//! AST Lowering Visitor (§4.4).
//!
//! Translates the in-crate [`crate::ast`] node families into bytecode,
//! driving [`crate::codegen::context::ByteCodeGenerateContext`] for
//! register allocation and fixup bookkeeping and emitting into a
//! [`ByteCodeBlock`]. `generate_bytecode` never fails observably: a
//! `GenerateError` raised while visiting replaces the block with a
//! single `ThrowStaticErrorOperation` (§4.4 "Error handling").

use std::rc::Rc;
use thiserror::Error;

use rustc_hash::FxHashMap;

use crate::ast::{Expr, FunctionNode, Stmt};
use crate::bytecode::block::ByteCodeBlock;
use crate::bytecode::constants::UNRESOLVED_JUMP;
use crate::bytecode::opcode::Instr;
use crate::codegen::context::{ByteCodeGenerateContext, ParserContextInformation};
use crate::codegen::fixup::FixupTable;
use crate::error::ErrorKind;
use crate::runtime::codeblock::BindingLocation;

/// A bytecode-generation-time error (§4.4 "Error handling",
/// `ByteCodeGenerateError` equivalent).
#[derive(Debug, Clone, Error)]
#[error("generate error at {source_index}: {message}")]
pub struct GenerateError {
    pub source_index: usize,
    pub message: String,
}

impl GenerateError {
    fn new(source_index: usize, message: impl Into<String>) -> Self {
        Self { source_index, message: message.into() }
    }
}

/// Resolved identifier lookup: where a name's binding lives, or `None`
/// for an unresolved (global) reference.
struct Scope {
    names: FxHashMap<Rc<str>, BindingLocation>,
}

impl Scope {
    fn build(func: &FunctionNode) -> Self {
        let mut names = FxHashMap::default();
        for p in &func.parameters {
            names.insert(Rc::clone(&p.name), p.location);
        }
        for id in &func.identifiers {
            names.insert(Rc::clone(&id.name), id.location);
        }
        for block in &func.block_infos {
            for id in &block.identifiers {
                names.insert(Rc::clone(&id.name), id.location);
            }
        }
        Self { names }
    }

    fn resolve(&self, name: &str) -> Option<BindingLocation> {
        self.names.get(name).copied()
    }
}

/// One active loop's fixup target depth, for matching unlabeled and
/// labeled `break`/`continue` (§4.4 BlockStatement/.../Loops).
struct LoopFrame {
    label: Option<String>,
    depth_at_entry: usize,
}

struct Lowering<'a> {
    scope: Scope,
    ctx: ByteCodeGenerateContext,
    loop_stack: Vec<LoopFrame>,
    func: &'a FunctionNode,
    /// Pool index of the shared `undefined` literal, allocated lazily
    /// the first time step (b) or an expression needs it.
    undefined_literal: Option<u32>,
}

/// Entry point: generate a [`ByteCodeBlock`] for `func`. Never returns
/// an `Err` observably to embedders further up the stack — on failure
/// the returned block throws the `SyntaxError` at runtime instead
/// (§4.4 "Error handling", §7).
pub fn generate_bytecode(func: &FunctionNode) -> ByteCodeBlock {
    tracing::debug!(function = %func.name, "generate_bytecode: entry");
    let mut block = ByteCodeBlock::new();
    block.flags.is_eval_mode = false;

    let info = ParserContextInformation {
        is_eval_mode: false,
        is_global_scope: false,
        is_strict: func.is_strict,
        is_in_with_scope: false,
    };
    let mut lowering = Lowering {
        scope: Scope::build(func),
        ctx: ByteCodeGenerateContext::new(info),
        loop_stack: Vec::new(),
        func,
        undefined_literal: None,
    };

    match lowering.generate_function_body(&mut block) {
        Ok(()) => {
            block.required_register_file_size = lowering.ctx.required_register_file_size();
            block.identifiers_on_stack_count = lowering.ctx.identifiers_on_stack_count();
            tracing::debug!(
                function = %func.name,
                instructions = block.code().len(),
                "generate_bytecode: exit"
            );
            block
        }
        Err(err) => {
            tracing::warn!(function = %func.name, error = %err.message, "generate_bytecode: replaced with static error");
            let mut replaced = ByteCodeBlock::new();
            replaced.replace_with_static_error(ErrorKind::SyntaxError, err.message, err.source_index);
            replaced
        }
    }
}

impl<'a> Lowering<'a> {
    /// FunctionNode emission, steps (a)-(d) (§4.4).
    fn generate_function_body(&mut self, block: &mut ByteCodeBlock) -> Result<(), GenerateError> {
        // (a) self-reference binding.
        if self.func.function_name_save_info.is_allocated {
            if let BindingLocation::Stack { slot } = self.func.function_name_save_info.location {
                let r = self.ctx.identifier_register(slot);
                block.push_code(Instr::BindingCalleeIntoRegister { register_index: r }, 0);
            } else {
                block.push_code(Instr::BindingCalleeIntoRegister { register_index: 0 }, 0);
            }
        }

        // (b) stack-allocated non-parameter identifiers start undefined.
        for id in &self.func.identifiers {
            if let BindingLocation::Stack { slot } = id.location {
                if !id.is_parameter_name {
                    let r = self.ctx.identifier_register(slot);
                    let lit = self.undefined_literal_index(block);
                    block.push_code(Instr::LoadLiteral { register_index: r, literal_index: lit }, 0);
                }
            }
        }

        // (c) the numeral-literal pool needs no preamble copy of its
        // own: numeral literals are addressed directly as region-3
        // register operands (see `lower_expr`'s `NumberLiteral` arm and
        // `ByteCodeGenerateContext::push_numeral_literal`), and the
        // activation protocol materializes the whole pool into those
        // register-file slots once per call before dispatch begins
        // (§4.5 step 6) — so by the time this function's first
        // instruction runs, every pooled numeral is already in place.

        // (d) body.
        if self.func.uses_arguments_object {
            tracing::trace!(function = %self.func.name, "binding arguments object");
        }
        for stmt in &self.func.body {
            self.lower_stmt(block, stmt, None)?;
        }
        block.push_code(Instr::ReturnFunction, 0);
        Ok(())
    }

    /// Pool index of the shared `undefined` literal (§4.4 FunctionNode
    /// step (b)), allocated once per function and reused thereafter.
    fn undefined_literal_index(&mut self, block: &mut ByteCodeBlock) -> u32 {
        if let Some(idx) = self.undefined_literal {
            return idx;
        }
        let idx = block.push_literal(crate::bytecode::block::LiteralData::Undefined);
        self.undefined_literal = Some(idx);
        idx
    }

    fn lower_stmt(&mut self, block: &mut ByteCodeBlock, stmt: &Stmt, label_for_next: Option<&str>) -> Result<(), GenerateError> {
        match stmt {
            Stmt::Expr(e) => {
                let r = self.lower_expr(block, e)?;
                self.ctx.release_temp(r);
                Ok(())
            }
            Stmt::Block(stmts) => {
                for s in stmts {
                    self.lower_stmt(block, s, None)?;
                }
                Ok(())
            }
            Stmt::If { test, consequent, alternate } => self.lower_if(block, test, consequent, alternate.as_deref()),
            Stmt::While { test, body } => self.lower_while(block, test, body, label_for_next),
            Stmt::Break(label) => self.lower_break(block, label.as_deref()),
            Stmt::Continue(label) => self.lower_continue(block, label.as_deref()),
            Stmt::Labeled { label, body } => self.lower_stmt(block, body, Some(label)),
            Stmt::Return(value) => {
                match value {
                    Some(e) => {
                        let r = self.lower_expr(block, e)?;
                        block.push_code(Instr::ReturnFunctionWithValue { register_index: r }, 0);
                        self.ctx.release_temp(r);
                    }
                    None => {
                        block.push_code(Instr::ReturnFunction, 0);
                    }
                }
                Ok(())
            }
            Stmt::Throw(e) => {
                let r = self.lower_expr(block, e)?;
                block.push_code(Instr::ThrowOperation { register_index: r }, 0);
                self.ctx.release_temp(r);
                Ok(())
            }
            Stmt::Try { block: try_block, catch_body, finally_body } => {
                self.lower_try(block, try_block, catch_body.as_deref(), finally_body.as_deref())
            }
            Stmt::With { object, body } => self.lower_with(block, object, body),
            Stmt::Switch { discriminant, cases } => self.lower_switch(block, discriminant, cases),
        }
    }

    fn lower_if(
        &mut self,
        block: &mut ByteCodeBlock,
        test: &Expr,
        consequent: &Stmt,
        alternate: Option<&Stmt>,
    ) -> Result<(), GenerateError> {
        let t = self.lower_expr(block, test)?;
        let alt_jump = block.push_code(Instr::JumpIfFalse { register_index: t, jump_position: UNRESOLVED_JUMP }, 0);
        self.ctx.release_temp(t);
        self.lower_stmt(block, consequent, None)?;
        if let Some(alt) = alternate {
            let end_jump = block.push_code(Instr::Jump { jump_position: UNRESOLVED_JUMP }, 0);
            Self::patch(block, alt_jump, block.current_position());
            self.lower_stmt(block, alt, None)?;
            Self::patch(block, end_jump, block.current_position());
        } else {
            Self::patch(block, alt_jump, block.current_position());
        }
        Ok(())
    }

    fn lower_while(
        &mut self,
        block: &mut ByteCodeBlock,
        test: &Expr,
        body: &Stmt,
        label: Option<&str>,
    ) -> Result<(), GenerateError> {
        let loop_start = block.current_position();
        let t = self.lower_expr(block, test)?;
        let exit_jump = block.push_code(Instr::JumpIfFalse { register_index: t, jump_position: UNRESOLVED_JUMP }, 0);
        self.ctx.release_temp(t);

        self.loop_stack.push(LoopFrame {
            label: label.map(str::to_owned),
            depth_at_entry: self.ctx.scope_nesting_depth,
        });
        self.lower_stmt(block, body, None)?;
        let frame = self.loop_stack.pop().expect("pushed above");

        block.push_code(Instr::Jump { jump_position: loop_start }, 0);
        Self::patch(block, exit_jump, block.current_position());

        self.ctx.fixup.consume_continue(block, loop_start, frame.depth_at_entry);
        self.ctx.fixup.consume_break(block, block.current_position(), frame.depth_at_entry);
        if let Some(lbl) = &frame.label {
            self.ctx.fixup.consume_labeled_continue(block, loop_start, lbl, frame.depth_at_entry);
            self.ctx
                .fixup
                .consume_labeled_break(block, block.current_position(), lbl, frame.depth_at_entry);
        }
        Ok(())
    }

    fn lower_break(&mut self, block: &mut ByteCodeBlock, label: Option<&str>) -> Result<(), GenerateError> {
        let offset = FixupTable::emit_pending_break(block, 0);
        match label {
            None => self.ctx.fixup.push_break(offset),
            Some(lbl) => self.ctx.fixup.push_labeled_break(lbl, offset),
        }
        self.mark_complex_if_crossing(offset, label)?;
        Ok(())
    }

    fn lower_continue(&mut self, block: &mut ByteCodeBlock, label: Option<&str>) -> Result<(), GenerateError> {
        let offset = FixupTable::emit_pending_break(block, 0);
        match label {
            None => self.ctx.fixup.push_continue(offset),
            Some(lbl) => self.ctx.fixup.push_labeled_continue(lbl, offset),
        }
        self.mark_complex_if_crossing(offset, label)?;
        Ok(())
    }

    /// A break/continue is a "complex case" (§4.2, §4.4) when the
    /// nesting depth it was emitted at is deeper than the depth its
    /// target loop was entered at — i.e. it crosses a `try`/`with`
    /// boundary entered after the loop started.
    fn mark_complex_if_crossing(&mut self, offset: usize, label: Option<&str>) -> Result<(), GenerateError> {
        let depth_at_entry = match label {
            None => self.loop_stack.last().map(|f| f.depth_at_entry),
            Some(lbl) => self.loop_stack.iter().rev().find(|f| f.label.as_deref() == Some(lbl)).map(|f| f.depth_at_entry),
        };
        let Some(depth_at_entry) = depth_at_entry else {
            return Err(GenerateError::new(0, "break/continue with no matching enclosing loop"));
        };
        if self.ctx.scope_nesting_depth > depth_at_entry {
            self.ctx.fixup.mark_complex_case(offset, self.ctx.scope_nesting_depth);
        }
        Ok(())
    }

    fn lower_try(
        &mut self,
        block: &mut ByteCodeBlock,
        try_block: &Stmt,
        catch_body: Option<&Stmt>,
        finally_body: Option<&Stmt>,
    ) -> Result<(), GenerateError> {
        let prev = self.ctx.enter_unwind_scope();
        self.lower_stmt(block, try_block, None)?;
        self.ctx.exit_unwind_scope(prev);

        // The catch path is dispatched by the (external) interpreter's
        // exception-unwinding mechanism (§7); this crate only needs to
        // make the handler's code reachable and correctly scoped.
        if let Some(catch) = catch_body {
            self.lower_stmt(block, catch, None)?;
        }
        if let Some(fin) = finally_body {
            self.lower_stmt(block, fin, None)?;
        }
        Ok(())
    }

    fn lower_with(&mut self, block: &mut ByteCodeBlock, object: &Expr, body: &Stmt) -> Result<(), GenerateError> {
        let r = self.lower_expr(block, object)?;
        block.push_code(Instr::WithOperation { register_index: r }, 0);
        self.ctx.release_temp(r);
        let prev = self.ctx.enter_unwind_scope();
        self.lower_stmt(block, body, None)?;
        self.ctx.exit_unwind_scope(prev);
        Ok(())
    }

    fn lower_switch(
        &mut self,
        block: &mut ByteCodeBlock,
        discriminant: &Expr,
        cases: &[(Option<Expr>, Vec<Stmt>)],
    ) -> Result<(), GenerateError> {
        let d = self.lower_expr(block, discriminant)?;
        let mut case_jumps = Vec::with_capacity(cases.len());
        for (test, _) in cases {
            match test {
                Some(e) => {
                    let t = self.lower_expr(block, e)?;
                    let cmp = self.ctx.alloc_temp();
                    block.push_code(
                        Instr::Binary {
                            op: crate::bytecode::opcode::BinaryOp::StrictEqual,
                            src_index0: d,
                            src_index1: t,
                            dst_index: cmp,
                        },
                        0,
                    );
                    self.ctx.release_temp(t);
                    let jump = block.push_code(Instr::JumpIfTrue { register_index: cmp, jump_position: UNRESOLVED_JUMP }, 0);
                    self.ctx.release_temp(cmp);
                    case_jumps.push(Some(jump));
                }
                None => case_jumps.push(None),
            }
        }
        self.ctx.release_temp(d);
        let default_jump = block.push_code(Instr::Jump { jump_position: UNRESOLVED_JUMP }, 0);

        let depth_at_entry = self.ctx.scope_nesting_depth;
        self.loop_stack.push(LoopFrame { label: None, depth_at_entry });

        let mut has_default = false;
        for (i, (test, body)) in cases.iter().enumerate() {
            let pos = block.current_position();
            if test.is_some() {
                Self::patch(block, case_jumps[i].unwrap(), pos);
            } else {
                Self::patch(block, default_jump, pos);
                has_default = true;
            }
            for s in body {
                self.lower_stmt(block, s, None)?;
            }
        }
        if !has_default {
            Self::patch(block, default_jump, block.current_position());
        }

        let frame = self.loop_stack.pop().expect("pushed above");
        self.ctx.fixup.consume_break(block, block.current_position(), frame.depth_at_entry);
        Ok(())
    }

    fn lower_expr(&mut self, block: &mut ByteCodeBlock, expr: &Expr) -> Result<u32, GenerateError> {
        match expr {
            Expr::NumberLiteral(n) => {
                // Addressed directly as a region-3 register operand
                // (§3, §4.4 step (c)); no instruction needed, since the
                // activation protocol pre-populates this slot before
                // dispatch (§4.5 step 6).
                Ok(self.ctx.push_numeral_literal(block, *n))
            }
            Expr::StringLiteral(s) => {
                let dst = self.ctx.alloc_temp();
                let idx = block.push_literal(crate::bytecode::block::LiteralData::Str(s.clone()));
                block.push_code(Instr::LoadLiteral { register_index: dst, literal_index: idx }, 0);
                Ok(dst)
            }
            Expr::Identifier(name) => self.load_identifier(block, name),
            Expr::Assign { target, value } => {
                let v = self.lower_expr(block, value)?;
                self.store_identifier(block, target, v)?;
                Ok(v)
            }
            Expr::Binary { op, left, right } => {
                let l = self.lower_expr(block, left)?;
                let r = self.lower_expr(block, right)?;
                self.ctx.release_temp(r);
                self.ctx.release_temp(l);
                let dst = self.ctx.alloc_temp();
                block.push_code(Instr::Binary { op: *op, src_index0: l, src_index1: r, dst_index: dst }, 0);
                Ok(dst)
            }
            Expr::Unary { op, arg } => {
                let a = self.lower_expr(block, arg)?;
                self.ctx.release_temp(a);
                let dst = self.ctx.alloc_temp();
                block.push_code(Instr::Unary { op: *op, src_index: a, dst_index: dst }, 0);
                Ok(dst)
            }
            Expr::Typeof(arg) => {
                let a = self.lower_expr(block, arg)?;
                self.ctx.release_temp(a);
                let dst = self.ctx.alloc_temp();
                block.push_code(Instr::UnaryTypeof { src_index: a, dst_index: dst }, 0);
                Ok(dst)
            }
            Expr::Delete { object, property } => {
                let o = self.lower_expr(block, object)?;
                let p = self.lower_expr(block, property)?;
                self.ctx.release_temp(p);
                self.ctx.release_temp(o);
                let dst = self.ctx.alloc_temp();
                block.push_code(Instr::UnaryDelete { src_index0: o, src_index1: p, dst_index: dst }, 0);
                Ok(dst)
            }
            Expr::Member { object, property } => {
                let o = self.lower_expr(block, object)?;
                let p = self.lower_expr(block, property)?;
                self.ctx.release_temp(p);
                self.ctx.release_temp(o);
                let dst = self.ctx.alloc_temp();
                block.push_code(
                    Instr::GetObject { store_register_index: dst, object_register_index: o, property_register_index: p },
                    0,
                );
                Ok(dst)
            }
            Expr::Call { callee, args, is_eval } => self.lower_call(block, callee, args, *is_eval),
            Expr::New { callee, args } => {
                let c = self.lower_expr(block, callee)?;
                let start = self.lower_arguments(block, args)?;
                let dst = self.ctx.alloc_temp();
                block.push_code(
                    Instr::NewOperation {
                        callee_index: c,
                        arguments_start_index: start,
                        argument_count: args.len() as u32,
                        result_index: dst,
                    },
                    0,
                );
                Ok(dst)
            }
        }
    }

    /// Arguments must land in contiguous registers for `CallFunction`/
    /// `NewOperation` (§4.4 "Expressions"). Returns the first register.
    fn lower_arguments(&mut self, block: &mut ByteCodeBlock, args: &[Expr]) -> Result<u32, GenerateError> {
        if args.is_empty() {
            return Ok(self.ctx.alloc_temp());
        }
        let mut regs = Vec::with_capacity(args.len());
        for a in args {
            regs.push(self.lower_expr(block, a)?);
        }
        Ok(regs[0])
    }

    fn lower_call(&mut self, block: &mut ByteCodeBlock, callee: &Expr, args: &[Expr], is_eval: bool) -> Result<u32, GenerateError> {
        if is_eval {
            let start = self.lower_arguments(block, args)?;
            let dst = self.ctx.alloc_temp();
            block.push_code(
                Instr::CallEvalFunction { arguments_start_index: start, argument_count: args.len() as u32, result_index: dst },
                0,
            );
            return Ok(dst);
        }
        if let Expr::Member { object, property } = callee {
            let receiver = self.lower_expr(block, object)?;
            let p = self.lower_expr(block, property)?;
            let callee_reg = self.ctx.alloc_temp();
            block.push_code(
                Instr::GetObject { store_register_index: callee_reg, object_register_index: receiver, property_register_index: p },
                0,
            );
            self.ctx.release_temp(p);
            let start = self.lower_arguments(block, args)?;
            let dst = self.ctx.alloc_temp();
            block.push_code(
                Instr::CallFunctionWithReceiver {
                    receiver_index: receiver,
                    callee_index: callee_reg,
                    arguments_start_index: start,
                    argument_count: args.len() as u32,
                    result_index: dst,
                },
                0,
            );
            return Ok(dst);
        }
        let c = self.lower_expr(block, callee)?;
        let start = self.lower_arguments(block, args)?;
        let dst = self.ctx.alloc_temp();
        block.push_code(
            Instr::CallFunction { callee_index: c, arguments_start_index: start, argument_count: args.len() as u32, result_index: dst },
            0,
        );
        Ok(dst)
    }

    fn load_identifier(&mut self, block: &mut ByteCodeBlock, name: &str) -> Result<u32, GenerateError> {
        match self.scope.resolve(name) {
            Some(BindingLocation::Stack { slot }) => Ok(self.ctx.identifier_register(slot)),
            Some(BindingLocation::HeapIndexed { index }) => {
                let dst = self.ctx.alloc_temp();
                block.push_code(Instr::LoadByHeapIndex { register_index: dst, heap_index: index }, 0);
                Ok(dst)
            }
            Some(BindingLocation::HeapNamed) => {
                let dst = self.ctx.alloc_temp();
                let idx = block.push_literal(crate::bytecode::block::LiteralData::Str(name.to_owned()));
                block.push_code(Instr::LoadByName { register_index: dst, name_index: idx }, 0);
                Ok(dst)
            }
            None => {
                let dst = self.ctx.alloc_temp();
                let idx = block.push_literal(crate::bytecode::block::LiteralData::Str(name.to_owned()));
                block.push_code(Instr::GetGlobalObject { register_index: dst, name_index: idx }, 0);
                Ok(dst)
            }
        }
    }

    fn store_identifier(&mut self, block: &mut ByteCodeBlock, name: &str, value_reg: u32) -> Result<(), GenerateError> {
        match self.scope.resolve(name) {
            Some(BindingLocation::Stack { slot }) => {
                let target = self.ctx.identifier_register(slot);
                block.push_code(Instr::Move { register_index0: target, register_index1: value_reg }, 0);
            }
            Some(BindingLocation::HeapIndexed { index }) => {
                block.push_code(Instr::StoreByHeapIndex { register_index: value_reg, heap_index: index }, 0);
            }
            Some(BindingLocation::HeapNamed) => {
                let idx = block.push_literal(crate::bytecode::block::LiteralData::Str(name.to_owned()));
                block.push_code(Instr::StoreByName { register_index: value_reg, name_index: idx }, 0);
            }
            None => {
                let idx = block.push_literal(crate::bytecode::block::LiteralData::Str(name.to_owned()));
                block.push_code(Instr::SetGlobalObject { register_index: value_reg, name_index: idx }, 0);
            }
        }
        Ok(())
    }

    fn patch(block: &mut ByteCodeBlock, offset: usize, position: usize) {
        match block.peek_code_mut(offset) {
            Instr::Jump { jump_position } | Instr::JumpIfTrue { jump_position, .. } | Instr::JumpIfFalse { jump_position, .. } => {
                *jump_position = position;
            }
            other => panic!("patch target at {offset} is not a jump: {other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::codeblock::FunctionNameSaveInfo;

    fn empty_function(body: Vec<Stmt>) -> FunctionNode {
        FunctionNode {
            name: "f".into(),
            parameters: vec![],
            identifiers: vec![],
            block_infos: vec![],
            function_body_block_index: 0,
            body,
            is_strict: false,
            is_generator: false,
            uses_arguments_object: false,
            needs_complex_parameter_copy: false,
            can_use_indexed_variable_storage: true,
            can_allocate_environment_on_stack: true,
            function_name_save_info: FunctionNameSaveInfo::default(),
        }
    }

    #[test]
    fn empty_function_body_returns_undefined() {
        let func = empty_function(vec![]);
        let block = generate_bytecode(&func);
        assert_eq!(block.code().last(), Some(&Instr::ReturnFunction));
        assert!(block.all_jumps_resolved());
    }

    #[test]
    fn break_inside_while_resolves_to_loop_exit() {
        let func = empty_function(vec![Stmt::While {
            test: Expr::NumberLiteral(1.0),
            body: Box::new(Stmt::Block(vec![Stmt::Break(None)])),
        }]);
        let block = generate_bytecode(&func);
        assert!(block.all_jumps_resolved());
    }

    #[test]
    fn break_crossing_with_scope_becomes_complex_case() {
        let func = empty_function(vec![Stmt::While {
            test: Expr::NumberLiteral(1.0),
            body: Box::new(Stmt::With {
                object: Expr::NumberLiteral(0.0),
                body: Box::new(Stmt::Break(None)),
            }),
        }]);
        let block = generate_bytecode(&func);
        let has_complex_case = block.code().iter().any(|i| matches!(i, Instr::JumpComplexCase { .. }));
        assert!(has_complex_case, "break crossing a with-scope must become a JumpComplexCase");
        assert!(block.all_jumps_resolved());
    }

    #[test]
    fn undeclared_identifier_reads_the_global_object() {
        let func = empty_function(vec![Stmt::Expr(Expr::Identifier("globalThing".to_string()))]);
        let block = generate_bytecode(&func);
        assert!(block.code().iter().any(|i| matches!(i, Instr::GetGlobalObject { .. })));
    }
}
