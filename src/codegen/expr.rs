use crate::{
    asm::{Instruction, RegFunc},
    ast::{Expr, Number, Operator, Var},
    code::CodeSeq,
    common::Location,
    frame::{compute_enclosing_frame, pop_into_reg, push_reg, WordKind},
    machine::Register::*,
    types::Type,
};

use super::{cond::gen_rel_op, frame_offset, word_kind, CodeGenerator, Error, ErrorKind, Result};

impl CodeGenerator {
    /// Code that evaluates `expr` and pushes its value.
    pub fn gen_expr(&mut self, expr: &Expr) -> Result<CodeSeq> {
        match expr {
            Expr::Op(op, lhs, rhs, loc) => self.gen_binary_op_expr(*op, lhs, rhs, loc),
            Expr::Var(var) => self.gen_var_expr(var),
            Expr::Number(num) => self.gen_number_expr(num),
            Expr::Not(operand, loc) => self.gen_logical_not_expr(operand, loc),
        }
    }

    fn gen_var_expr(&mut self, var: &Var) -> Result<CodeSeq> {
        let kind = word_kind(var.ty(), &var.loc)?;
        let offset = frame_offset(var)?;

        Ok(compute_enclosing_frame(T9, var.idu.levels_outward)
            .add_to_end(kind.load(T9, V0, offset))
            .concat(push_reg(V0, kind)))
    }

    fn gen_number_expr(&mut self, num: &Number) -> Result<CodeSeq> {
        let offset = self.literals.lookup(&num.text, num.value);
        let offset = i16::try_from(offset)
            .map_err(|_| Error::new(&num.loc, ErrorKind::LiteralOffsetOutOfRange(offset)))?;

        Ok(CodeSeq::singleton(Instruction::flw(Gp, V0, offset))
            .concat(push_reg(V0, WordKind::Float)))
    }

    fn gen_binary_op_expr(
        &mut self,
        op: Operator,
        lhs: &Expr,
        rhs: &Expr,
        loc: &Location,
    ) -> Result<CodeSeq> {
        let kind = word_kind(lhs.ty(), lhs.loc())?;
        word_kind(rhs.ty(), rhs.loc())?;
        if lhs.ty() != rhs.ty() {
            return Err(Error::new_mismatched_operands(loc, op, lhs.ty(), rhs.ty()));
        }

        let operands = self.gen_expr(lhs)?.concat(self.gen_expr(rhs)?);
        if op.is_arith() {
            if kind != WordKind::Float {
                return Err(Error::new_type_mismatch(loc, Type::Float, lhs.ty()));
            }
            Ok(operands.concat(gen_arith_op(op, loc)?))
        } else {
            Ok(operands.concat(gen_rel_op(op, kind, loc)?))
        }
    }
}

/// Pops the right operand into `$at` and the left into `$v0`, combines them
/// into `$v0`, and pushes the result.
fn gen_arith_op(op: Operator, loc: &Location) -> Result<CodeSeq> {
    let func = match op {
        Operator::Plus => RegFunc::FAdd,
        Operator::Minus => RegFunc::FSub,
        Operator::Mul => RegFunc::FMul,
        Operator::Div => RegFunc::FDiv,
        _ => {
            return Err(Error::new_unexpected_discriminant(
                loc,
                "arithmetic operator",
                op as u32,
            ))
        }
    };

    Ok(pop_into_reg(At, WordKind::Float)
        .concat(pop_into_reg(V0, WordKind::Float))
        .add_to_end(Instruction::reg_op(func, V0, At, V0))
        .concat(push_reg(V0, WordKind::Float)))
}
