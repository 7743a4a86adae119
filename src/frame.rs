//! Activation records of FLOAT blocks and the stack discipline around them.
//!
//! Layout of a block's record, in words relative to `$fp`:
//!
//! ```text
//!   fp + k   local k (declaration order)
//!   fp - 1   caller's frame pointer
//!   fp - 2   static link (frame pointer of the enclosing block)
//! ```
//!
//! `$sp` always points at the top element of the stack.

use crate::{
    asm::Instruction,
    code::CodeSeq,
    machine::{Register, STATIC_LINK_SLOT, WORD_SIZE},
    types::Type,
};

use Register::*;

/// How a word is moved between a register and memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WordKind {
    Bool,
    Float,
}

impl TryFrom<Type> for WordKind {
    type Error = Type;

    fn try_from(ty: Type) -> Result<Self, Self::Error> {
        match ty {
            Type::Bool => Ok(WordKind::Bool),
            Type::Float => Ok(WordKind::Float),
            Type::Unknown => Err(ty),
        }
    }
}

impl WordKind {
    pub fn load(self, base: Register, target: Register, offset: i16) -> Instruction {
        match self {
            WordKind::Bool => Instruction::lw(base, target, offset),
            WordKind::Float => Instruction::flw(base, target, offset),
        }
    }

    pub fn store(self, base: Register, target: Register, offset: i16) -> Instruction {
        match self {
            WordKind::Bool => Instruction::sw(base, target, offset),
            WordKind::Float => Instruction::fsw(base, target, offset),
        }
    }
}

/// Locals of one block, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    locals: Vec<WordKind>,
}

impl Frame {
    pub fn new(locals: Vec<WordKind>) -> Self {
        Self { locals }
    }

    pub fn local_count(&self) -> usize {
        self.locals.len()
    }

    /// Bytes occupied by the locals.
    pub fn locals_size(&self) -> u32 {
        self.locals.len() as u32 * WORD_SIZE
    }

    /// Pushes one zeroed word per local. The last declared is pushed first,
    /// so local `k` ends up at `fp + k` once [`save_frame`] has run.
    pub fn alloc_locals(&self) -> CodeSeq {
        self.locals
            .iter()
            .rev()
            .fold(CodeSeq::empty(), |seq, kind| {
                seq.add_to_end(Instruction::addi(Sp, Sp, -(WORD_SIZE as i16)))
                    .add_to_end(kind.store(Sp, Zero, 0))
            })
    }
}

pub fn push_reg(reg: Register, kind: WordKind) -> CodeSeq {
    CodeSeq::singleton(Instruction::addi(Sp, Sp, -(WORD_SIZE as i16)))
        .add_to_end(kind.store(Sp, reg, 0))
}

pub fn pop_into_reg(reg: Register, kind: WordKind) -> CodeSeq {
    CodeSeq::singleton(kind.load(Sp, reg, 0)).add_to_end(Instruction::addi(
        Sp,
        Sp,
        WORD_SIZE as i16,
    ))
}

/// Saves the caller's `$fp`, records the static link held in `$a0`, and
/// points `$fp` at the locals allocated just before.
pub fn save_frame() -> CodeSeq {
    CodeSeq::singleton(Instruction::add(Zero, Sp, At))
        .concat(push_reg(Fp, WordKind::Bool))
        .concat(push_reg(A0, WordKind::Bool))
        .add_to_end(Instruction::add(Zero, At, Fp))
}

/// Undoes [`save_frame`]: drops the static link and reloads the caller's `$fp`.
pub fn restore_frame() -> CodeSeq {
    CodeSeq::singleton(Instruction::addi(Sp, Sp, WORD_SIZE as i16))
        .concat(pop_into_reg(Fp, WordKind::Bool))
}

pub fn deallocate_locals(byte_count: i16) -> CodeSeq {
    if byte_count == 0 {
        CodeSeq::empty()
    } else {
        CodeSeq::singleton(Instruction::addi(Sp, Sp, byte_count))
    }
}

/// Leaves in `target` the frame pointer `levels_outward` static links up.
pub fn compute_enclosing_frame(target: Register, levels_outward: u32) -> CodeSeq {
    (0..levels_outward).fold(
        CodeSeq::singleton(Instruction::add(Zero, Fp, target)),
        |seq, _| seq.add_to_end(Instruction::lw(target, target, STATIC_LINK_SLOT)),
    )
}
