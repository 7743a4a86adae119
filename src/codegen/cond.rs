//! Relational operators, logical negation and the tests of `if`/`while`.
//!
//! The machine has no set-on-condition instruction, so a truth value is
//! materialized in `$at` by a branch around two constant loads.

use crate::{
    asm::{BranchOp, Instruction, RegFunc},
    ast::{Expr, Operator},
    code::CodeSeq,
    common::Location,
    frame::{pop_into_reg, push_reg, WordKind},
    machine::Register::*,
    types::Type,
};

use super::{expect_type, CodeGenerator, Error, Result};

impl CodeGenerator {
    /// Code that pushes the truth value of a statement's condition.
    pub fn gen_condition(&mut self, cond: &Expr) -> Result<CodeSeq> {
        expect_type(Type::Bool, cond.ty(), cond.loc())?;
        self.gen_expr(cond)
    }

    pub(super) fn gen_logical_not_expr(&mut self, operand: &Expr, loc: &Location) -> Result<CodeSeq> {
        expect_type(Type::Bool, operand.ty(), loc)?;

        let test = materialize_bool(|skip| {
            Ok(CodeSeq::singleton(Instruction::beq(V0, Zero, skip)))
        })?;
        Ok(self
            .gen_expr(operand)?
            .concat(pop_into_reg(V0, WordKind::Bool))
            .concat(test))
    }
}

/// Compares the two operands on top of the stack and replaces them with
/// the result.
pub(super) fn gen_rel_op(op: Operator, kind: WordKind, loc: &Location) -> Result<CodeSeq> {
    let operands = pop_into_reg(At, kind).concat(pop_into_reg(V0, kind));
    Ok(operands.concat(materialize_bool(|skip| {
        rel_test(op, kind, skip).ok_or_else(|| {
            Error::new_unexpected_discriminant(loc, "relational operator", op as u32)
        })
    })?))
}

/// The comparison of `$v0` (left) with `$at` (right), ending in a branch
/// taken when the relation holds.
fn rel_test(op: Operator, kind: WordKind, skip: i16) -> Option<CodeSeq> {
    let branch = |branch_op| Instruction::branch(branch_op, V0, At, skip);
    let sign_test = |branch_op| {
        let diff = match kind {
            WordKind::Float => Instruction::reg_op(RegFunc::FSub, V0, At, V0),
            WordKind::Bool => Instruction::sub(V0, At, V0),
        };
        CodeSeq::singleton(diff).add_to_end(Instruction::branch(branch_op, V0, Zero, skip))
    };

    let code = match (op, kind) {
        (Operator::Eq, WordKind::Float) => CodeSeq::singleton(branch(BranchOp::Bfeq)),
        (Operator::Eq, WordKind::Bool) => CodeSeq::singleton(branch(BranchOp::Beq)),
        (Operator::Neq, WordKind::Float) => CodeSeq::singleton(branch(BranchOp::Bfne)),
        (Operator::Neq, WordKind::Bool) => CodeSeq::singleton(branch(BranchOp::Bne)),
        (Operator::Lt, WordKind::Float) => sign_test(BranchOp::Bfltz),
        (Operator::Lt, WordKind::Bool) => sign_test(BranchOp::Bltz),
        (Operator::Le, WordKind::Float) => sign_test(BranchOp::Bflez),
        (Operator::Le, WordKind::Bool) => sign_test(BranchOp::Blez),
        (Operator::Gt, WordKind::Float) => sign_test(BranchOp::Bfgtz),
        (Operator::Gt, WordKind::Bool) => sign_test(BranchOp::Bgtz),
        (Operator::Ge, WordKind::Float) => sign_test(BranchOp::Bfgez),
        (Operator::Ge, WordKind::Bool) => sign_test(BranchOp::Bgez),
        (Operator::Plus | Operator::Minus | Operator::Mul | Operator::Div, _) => return None,
    };
    Some(code)
}

/// `test` followed by the false arm (`$at = 0`) and the true arm
/// (`$at = 1`), then a push of `$at`. `test` receives the displacement
/// its final branch needs to reach the true arm.
fn materialize_bool<F>(test: F) -> Result<CodeSeq>
where
    F: FnOnce(i16) -> Result<CodeSeq>,
{
    let true_arm = CodeSeq::singleton(Instruction::addi(Zero, At, 1));
    let false_arm = CodeSeq::singleton(Instruction::add(Zero, Zero, At))
        .add_to_end(Instruction::jump(true_arm.size() as i16));

    Ok(test(false_arm.size() as i16)?
        .concat(false_arm)
        .concat(true_arm)
        .concat(push_reg(At, WordKind::Bool)))
}
