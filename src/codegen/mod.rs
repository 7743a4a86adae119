//! Lowering of the resolved AST into [`CodeSeq`]s.
//!
//! Every expression generator returns code that pushes exactly one word on
//! the runtime stack, using `$v0` and `$at` as scratch and `$t9` for frame
//! addresses. Statements leave the stack as they found it.

mod cond;
mod expr;
mod stmt;

use std::fmt::Display;

use log::debug;
use thiserror::Error;

use crate::{
    asm::Instruction,
    ast::{Operator, Program, Var, VarDecl},
    code::CodeSeq,
    common::Location,
    frame::{self, Frame, WordKind},
    literal::LiteralPool,
    types::Type,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, PartialEq, Eq)]
pub struct Error {
    loc: Option<Location>,
    kind: ErrorKind,
}

impl Error {
    fn new(loc: &Location, kind: ErrorKind) -> Self {
        Self {
            loc: Some(loc.clone()),
            kind,
        }
    }

    fn new_type_mismatch(loc: &Location, expected: Type, found: Type) -> Self {
        Self::new(loc, ErrorKind::TypeMismatch(expected, found))
    }

    fn new_mismatched_operands(loc: &Location, op: Operator, lhs: Type, rhs: Type) -> Self {
        Self::new(loc, ErrorKind::MismatchedOperands(op, lhs, rhs))
    }

    fn new_unexpected_discriminant(loc: &Location, what: &'static str, value: u32) -> Self {
        Self::new(loc, ErrorKind::UnexpectedDiscriminant(what, value))
    }

    pub fn loc(&self) -> Option<&Location> {
        self.loc.as_ref()
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Whether the error comes from a defect in an earlier pass rather than
    /// from the program being compiled.
    pub fn is_internal(&self) -> bool {
        matches!(self.kind, ErrorKind::UnexpectedDiscriminant(..))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(loc) = &self.loc {
            writeln!(f, "{}", loc)?;
        }
        write!(f, "{}", self.kind)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[error("type mismatch: expected {0}, found {1}")]
    TypeMismatch(Type, Type),
    #[error("operands of `{0}` have different types: {1} and {2}")]
    MismatchedOperands(Operator, Type, Type),
    #[error("frame offset {1} of `{0}` does not fit in a 16-bit displacement")]
    FrameOffsetOutOfRange(String, u32),
    #[error("literal pool offset {0} does not fit in a 16-bit displacement")]
    LiteralOffsetOutOfRange(u32),
    #[error("branch over {0} instructions does not fit in a 16-bit displacement")]
    BranchOutOfRange(usize),
    #[error("{0} bytes of locals cannot be released by a single stack adjustment")]
    FrameTooLarge(u32),
    #[error("unexpected {0} discriminant ({1}) reached code generation")]
    UnexpectedDiscriminant(&'static str, u32),
}

/// Per-compilation state of the generator.
#[derive(Debug, Default)]
pub struct CodeGenerator {
    literals: LiteralPool,
}

impl CodeGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn literals(&self) -> &LiteralPool {
        &self.literals
    }

    /// Code for the whole program: its block, then a halt.
    ///
    /// The program's record has no static link to load, otherwise it is laid
    /// out like any other block.
    pub fn gen_program(&mut self, program: &Program) -> Result<CodeSeq> {
        let frame = self.frame_for(&program.var_decls)?;
        let dealloc = self.deallocate(&frame, &program.loc)?;

        let code = frame
            .alloc_locals()
            .concat(frame::save_frame())
            .concat(self.gen_stmt(&program.stmt)?)
            .concat(frame::restore_frame())
            .concat(dealloc)
            .add_to_end(Instruction::exit());

        debug!(
            "program: {} locals, {} instructions, {} literals",
            frame.local_count(),
            code.size(),
            self.literals.size()
        );
        Ok(code)
    }

    fn frame_for(&self, var_decls: &[VarDecl]) -> Result<Frame> {
        let mut locals = Vec::new();
        for decl in var_decls {
            let kind = word_kind(decl.ty, &decl.loc)?;
            locals.extend(decl.idents.iter().map(|_| kind));
        }
        Ok(Frame::new(locals))
    }

    fn deallocate(&self, frame: &Frame, loc: &Location) -> Result<CodeSeq> {
        let bytes = frame.locals_size();
        let bytes = i16::try_from(bytes).map_err(|_| Error::new(loc, ErrorKind::FrameTooLarge(bytes)))?;
        Ok(frame::deallocate_locals(bytes))
    }
}

fn word_kind(ty: Type, loc: &Location) -> Result<WordKind> {
    WordKind::try_from(ty).map_err(|ty| Error::new_unexpected_discriminant(loc, "type", ty as u32))
}

/// Fails unless `found` is `expected`, telling an unresolved type apart
/// from a genuine mismatch.
fn expect_type(expected: Type, found: Type, loc: &Location) -> Result<()> {
    word_kind(found, loc)?;
    if found != expected {
        return Err(Error::new_type_mismatch(loc, expected, found));
    }
    Ok(())
}

fn frame_offset(var: &Var) -> Result<i16> {
    let offset = var.idu.attrs.offset_count;
    i16::try_from(offset).map_err(|_| {
        Error::new(
            &var.loc,
            ErrorKind::FrameOffsetOutOfRange(var.name.clone(), offset),
        )
    })
}

/// Displacement for a branch that skips `count` instructions.
fn displacement(count: usize, loc: &Location) -> Result<i16> {
    i16::try_from(count).map_err(|_| Error::new(loc, ErrorKind::BranchOutOfRange(count)))
}
