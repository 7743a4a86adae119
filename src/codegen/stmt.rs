use itertools::Itertools;

use crate::{
    asm::Instruction,
    ast::{Expr, Stmt, Var, VarDecl},
    code::CodeSeq,
    common::Location,
    frame::{self, compute_enclosing_frame, pop_into_reg, WordKind},
    machine::Register::*,
    types::Type,
};

use super::{displacement, expect_type, frame_offset, word_kind, CodeGenerator, Result};

impl CodeGenerator {
    pub fn gen_stmt(&mut self, stmt: &Stmt) -> Result<CodeSeq> {
        match stmt {
            Stmt::Assign(var, expr, loc) => self.gen_assign_stmt(var, expr, loc),
            Stmt::Begin(var_decls, stmts, loc) => self.gen_begin_stmt(var_decls, stmts, loc),
            Stmt::If {
                cond,
                then,
                els,
                loc,
            } => self.gen_if_stmt(cond, then, els.as_deref(), loc),
            Stmt::While(cond, body, loc) => self.gen_while_stmt(cond, body, loc),
            Stmt::Read(var, loc) => self.gen_read_stmt(var, loc),
            Stmt::Write(expr, loc) => self.gen_write_stmt(expr, loc),
            Stmt::Skip(_) => Ok(CodeSeq::empty()),
        }
    }

    /// The statements' code, concatenated in order.
    pub fn gen_stmts(&mut self, stmts: &[Stmt]) -> Result<CodeSeq> {
        stmts
            .iter()
            .map(|stmt| self.gen_stmt(stmt))
            .fold_ok(CodeSeq::empty(), CodeSeq::concat)
    }

    fn gen_assign_stmt(&mut self, var: &Var, expr: &Expr, loc: &Location) -> Result<CodeSeq> {
        let kind = word_kind(var.ty(), &var.loc)?;
        expect_type(var.ty(), expr.ty(), loc)?;
        let offset = frame_offset(var)?;

        Ok(self
            .gen_expr(expr)?
            .concat(pop_into_reg(V0, kind))
            .concat(compute_enclosing_frame(T9, var.idu.levels_outward))
            .add_to_end(kind.store(T9, V0, offset)))
    }

    /// A nested block: the enclosing frame pointer becomes the static link.
    fn gen_begin_stmt(
        &mut self,
        var_decls: &[VarDecl],
        stmts: &[Stmt],
        loc: &Location,
    ) -> Result<CodeSeq> {
        let frame = self.frame_for(var_decls)?;
        let dealloc = self.deallocate(&frame, loc)?;

        Ok(frame
            .alloc_locals()
            .add_to_end(Instruction::add(Zero, Fp, A0))
            .concat(frame::save_frame())
            .concat(self.gen_stmts(stmts)?)
            .concat(frame::restore_frame())
            .concat(dealloc))
    }

    fn gen_if_stmt(
        &mut self,
        cond: &Expr,
        then: &Stmt,
        els: Option<&Stmt>,
        loc: &Location,
    ) -> Result<CodeSeq> {
        let test = self.gen_test(cond)?;
        let then_code = self.gen_stmt(then)?;

        match els {
            None => {
                let skip_then = displacement(then_code.size(), loc)?;
                Ok(test
                    .add_to_end(Instruction::beq(V0, Zero, skip_then))
                    .concat(then_code))
            }
            Some(els) => {
                let else_code = self.gen_stmt(els)?;
                let skip_then = displacement(then_code.size() + 1, loc)?;
                let skip_else = displacement(else_code.size(), loc)?;
                Ok(test
                    .add_to_end(Instruction::beq(V0, Zero, skip_then))
                    .concat(then_code)
                    .add_to_end(Instruction::jump(skip_else))
                    .concat(else_code))
            }
        }
    }

    fn gen_while_stmt(&mut self, cond: &Expr, body: &Stmt, loc: &Location) -> Result<CodeSeq> {
        let test = self.gen_test(cond)?;
        let body = self.gen_stmt(body)?;

        let exit = displacement(body.size() + 1, loc)?;
        // Back to the first instruction of the test, from just past the jump.
        let back = -displacement(test.size() + 1 + body.size() + 1, loc)?;

        Ok(test
            .add_to_end(Instruction::beq(V0, Zero, exit))
            .concat(body)
            .add_to_end(Instruction::jump(back)))
    }

    fn gen_read_stmt(&mut self, var: &Var, loc: &Location) -> Result<CodeSeq> {
        expect_type(Type::Float, var.ty(), loc)?;
        let offset = frame_offset(var)?;

        Ok(CodeSeq::singleton(Instruction::rflt())
            .concat(compute_enclosing_frame(T9, var.idu.levels_outward))
            .add_to_end(Instruction::fsw(T9, V0, offset)))
    }

    fn gen_write_stmt(&mut self, expr: &Expr, loc: &Location) -> Result<CodeSeq> {
        expect_type(Type::Float, expr.ty(), loc)?;

        Ok(self
            .gen_expr(expr)?
            .concat(pop_into_reg(A0, WordKind::Float))
            .add_to_end(Instruction::pflt()))
    }

    /// The condition popped into `$v0`.
    fn gen_test(&mut self, cond: &Expr) -> Result<CodeSeq> {
        Ok(self
            .gen_condition(cond)?
            .concat(pop_into_reg(V0, WordKind::Bool)))
    }
}
