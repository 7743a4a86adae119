//! Instruction model of the FLOAT SRM.
//!
//! Every instruction is one machine word. The variant of [`Instruction`]
//! fixes which register slots are meaningful and how the immediate field is
//! tagged, so a well-typed value is always encodable.

use std::fmt::Display;

use strum::FromRepr;
use thiserror::Error;

use crate::machine::Register;

const SYSCALL_FUNC: u32 = 12;
const REG_MASK: u32 = 0x1F;
const SYSCALL_CODE_MASK: u32 = 0xF_FFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpClass {
    Register,
    ImmedArith,
    LoadStore,
    Branch,
    Syscall,
    Nop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImmedKind {
    Signed,
    Unsigned,
    Offset,
    None,
}

/// The tagged 16-bit (or syscall code) payload of an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Immediate {
    Signed(i16),
    Unsigned(u16),
    Offset(i16),
    None,
}

impl Immediate {
    pub fn kind(&self) -> ImmedKind {
        match self {
            Immediate::Signed(_) => ImmedKind::Signed,
            Immediate::Unsigned(_) => ImmedKind::Unsigned,
            Immediate::Offset(_) => ImmedKind::Offset,
            Immediate::None => ImmedKind::None,
        }
    }

    fn bits(&self) -> u32 {
        match *self {
            Immediate::Signed(i) | Immediate::Offset(i) => u32::from(i as u16),
            Immediate::Unsigned(u) => u32::from(u),
            Immediate::None => 0,
        }
    }
}

impl Display for Immediate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Immediate::Signed(i) | Immediate::Offset(i) => write!(f, "{}", i),
            Immediate::Unsigned(u) => write!(f, "{}", u),
            Immediate::None => Ok(()),
        }
    }
}

/// Function codes of register-register instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum RegFunc {
    Add = 33,
    Sub = 35,
    And = 36,
    Bor = 37,
    Xor = 38,
    Nor = 39,
    FAdd = 48,
    FSub = 49,
    FMul = 50,
    FDiv = 51,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum ImmedOp {
    Addi = 9,
    Andi = 12,
    Bori = 13,
    Xori = 14,
}

impl ImmedOp {
    pub fn immediate_kind(self) -> ImmedKind {
        match self {
            ImmedOp::Addi => ImmedKind::Signed,
            ImmedOp::Andi | ImmedOp::Bori | ImmedOp::Xori => ImmedKind::Unsigned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum MemOp {
    Lw = 35,
    Sw = 43,
    Flw = 49,
    Fsw = 57,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum BranchOp {
    Bgez = 1,
    Beq = 4,
    Bne = 5,
    Blez = 6,
    Bgtz = 7,
    Bltz = 8,
    Bfgez = 17,
    Bfeq = 20,
    Bfne = 21,
    Bflez = 22,
    Bfgtz = 23,
    Bfltz = 24,
}

impl BranchOp {
    /// Whether the test reads both `rs` and `rt` (otherwise it compares `rs` with zero).
    pub fn compares_two(self) -> bool {
        matches!(
            self,
            BranchOp::Beq | BranchOp::Bne | BranchOp::Bfeq | BranchOp::Bfne
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRepr, strum::Display)]
#[repr(u32)]
#[strum(serialize_all = "lowercase")]
pub enum SyscallCode {
    /// Print the float in `$a0`.
    Pflt = 2,
    /// Read a float into `$v0`.
    Rflt = 6,
    Exit = 10,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown opcode ({0})")]
    UnknownOpcode(u32),
    #[error("unknown register function code ({0})")]
    UnknownFunction(u32),
    #[error("unknown syscall code ({0})")]
    UnknownSyscall(u32),
    #[error("{0} tests one register but its second register field is {1}")]
    StrayRegister(BranchOp, u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Reg {
        func: RegFunc,
        rs: Register,
        rt: Register,
        rd: Register,
    },
    Immed {
        op: ImmedOp,
        rs: Register,
        rt: Register,
        immed: Immediate,
    },
    Mem {
        op: MemOp,
        base: Register,
        target: Register,
        offset: i16,
    },
    Branch {
        op: BranchOp,
        rs: Register,
        rt: Register,
        offset: i16,
    },
    Syscall(SyscallCode),
    Nop,
}

impl Instruction {
    pub fn reg_op(func: RegFunc, rs: Register, rt: Register, rd: Register) -> Self {
        Instruction::Reg { func, rs, rt, rd }
    }

    /// # Panics
    ///
    /// Panics if the tag of `immed` is not the one `op` takes.
    pub fn immed_arith(op: ImmedOp, rs: Register, rt: Register, immed: Immediate) -> Self {
        assert_eq!(
            op.immediate_kind(),
            immed.kind(),
            "{} cannot take immediate {:?}",
            op,
            immed
        );
        Instruction::Immed { op, rs, rt, immed }
    }

    pub fn load_store(op: MemOp, base: Register, target: Register, offset: i16) -> Self {
        Instruction::Mem {
            op,
            base,
            target,
            offset,
        }
    }

    /// # Panics
    ///
    /// Panics if a one-register test is given a second register.
    pub fn branch(op: BranchOp, rs: Register, rt: Register, offset: i16) -> Self {
        assert!(
            op.compares_two() || rt == Register::Zero,
            "{} only tests one register",
            op
        );
        Instruction::Branch { op, rs, rt, offset }
    }

    pub fn syscall(code: SyscallCode) -> Self {
        Instruction::Syscall(code)
    }

    pub fn nop() -> Self {
        Instruction::Nop
    }

    pub fn add(rs: Register, rt: Register, rd: Register) -> Self {
        Self::reg_op(RegFunc::Add, rs, rt, rd)
    }

    pub fn sub(rs: Register, rt: Register, rd: Register) -> Self {
        Self::reg_op(RegFunc::Sub, rs, rt, rd)
    }

    pub fn addi(rs: Register, rt: Register, immed: i16) -> Self {
        Self::immed_arith(ImmedOp::Addi, rs, rt, Immediate::Signed(immed))
    }

    pub fn lw(base: Register, target: Register, offset: i16) -> Self {
        Self::load_store(MemOp::Lw, base, target, offset)
    }

    pub fn sw(base: Register, target: Register, offset: i16) -> Self {
        Self::load_store(MemOp::Sw, base, target, offset)
    }

    pub fn flw(base: Register, target: Register, offset: i16) -> Self {
        Self::load_store(MemOp::Flw, base, target, offset)
    }

    pub fn fsw(base: Register, target: Register, offset: i16) -> Self {
        Self::load_store(MemOp::Fsw, base, target, offset)
    }

    pub fn beq(rs: Register, rt: Register, offset: i16) -> Self {
        Self::branch(BranchOp::Beq, rs, rt, offset)
    }

    /// Unconditional relative jump (`beq $0, $0, offset`).
    pub fn jump(offset: i16) -> Self {
        Self::beq(Register::Zero, Register::Zero, offset)
    }

    pub fn exit() -> Self {
        Self::syscall(SyscallCode::Exit)
    }

    pub fn pflt() -> Self {
        Self::syscall(SyscallCode::Pflt)
    }

    pub fn rflt() -> Self {
        Self::syscall(SyscallCode::Rflt)
    }

    pub fn class(&self) -> OpClass {
        match self {
            Instruction::Reg { .. } => OpClass::Register,
            Instruction::Immed { .. } => OpClass::ImmedArith,
            Instruction::Mem { .. } => OpClass::LoadStore,
            Instruction::Branch { .. } => OpClass::Branch,
            Instruction::Syscall(_) => OpClass::Syscall,
            Instruction::Nop => OpClass::Nop,
        }
    }

    /// The meaningful register operands, in slot order.
    pub fn registers(&self) -> Vec<Register> {
        match *self {
            Instruction::Reg { rs, rt, rd, .. } => vec![rs, rt, rd],
            Instruction::Immed { rs, rt, .. } => vec![rs, rt],
            Instruction::Mem { base, target, .. } => vec![base, target],
            Instruction::Branch { op, rs, rt, .. } => {
                if op.compares_two() {
                    vec![rs, rt]
                } else {
                    vec![rs]
                }
            }
            Instruction::Syscall(_) | Instruction::Nop => vec![],
        }
    }

    pub fn immediate(&self) -> Immediate {
        match *self {
            Instruction::Reg { .. } | Instruction::Nop => Immediate::None,
            Instruction::Immed { immed, .. } => immed,
            Instruction::Mem { offset, .. } | Instruction::Branch { offset, .. } => {
                Immediate::Offset(offset)
            }
            Instruction::Syscall(code) => Immediate::Unsigned(code as u16),
        }
    }

    pub fn encode(&self) -> u32 {
        match *self {
            Instruction::Reg { func, rs, rt, rd } => {
                (rs.index() << 21) | (rt.index() << 16) | (rd.index() << 11) | func as u32
            }
            Instruction::Immed { op, rs, rt, immed } => {
                i_format(op as u32, rs, rt, immed.bits())
            }
            Instruction::Mem {
                op,
                base,
                target,
                offset,
            } => i_format(op as u32, base, target, u32::from(offset as u16)),
            Instruction::Branch { op, rs, rt, offset } => {
                i_format(op as u32, rs, rt, u32::from(offset as u16))
            }
            Instruction::Syscall(code) => ((code as u32) << 6) | SYSCALL_FUNC,
            Instruction::Nop => 0,
        }
    }

    pub fn decode(word: u32) -> Result<Self, DecodeError> {
        if word == 0 {
            return Ok(Instruction::Nop);
        }

        let op = word >> 26;
        let rs = reg_field(word, 21);
        let rt = reg_field(word, 16);
        let low = (word & 0xFFFF) as u16;

        if op == 0 {
            let func = word & 0x3F;
            if func == SYSCALL_FUNC {
                let code = (word >> 6) & SYSCALL_CODE_MASK;
                return SyscallCode::from_repr(code)
                    .map(Instruction::Syscall)
                    .ok_or(DecodeError::UnknownSyscall(code));
            }
            let func = RegFunc::from_repr(func as u8).ok_or(DecodeError::UnknownFunction(func))?;
            return Ok(Instruction::Reg {
                func,
                rs,
                rt,
                rd: reg_field(word, 11),
            });
        }

        // Opcodes are at most 6 bits wide, so the narrowing below is lossless.
        let op_byte = op as u8;
        if let Some(op) = ImmedOp::from_repr(op_byte) {
            let immed = match op.immediate_kind() {
                ImmedKind::Signed => Immediate::Signed(low as i16),
                _ => Immediate::Unsigned(low),
            };
            return Ok(Instruction::Immed { op, rs, rt, immed });
        }
        if let Some(op) = MemOp::from_repr(op_byte) {
            return Ok(Instruction::Mem {
                op,
                base: rs,
                target: rt,
                offset: low as i16,
            });
        }
        if let Some(op) = BranchOp::from_repr(op_byte) {
            if !op.compares_two() && rt != Register::Zero {
                return Err(DecodeError::StrayRegister(op, rt.index()));
            }
            return Ok(Instruction::Branch {
                op,
                rs,
                rt,
                offset: low as i16,
            });
        }

        Err(DecodeError::UnknownOpcode(op))
    }
}

fn i_format(op: u32, rs: Register, rt: Register, immed: u32) -> u32 {
    (op << 26) | (rs.index() << 21) | (rt.index() << 16) | (immed & 0xFFFF)
}

fn reg_field(word: u32, shift: u32) -> Register {
    // A 5-bit field always names one of the 32 registers.
    Register::from_index((word >> shift) & REG_MASK).unwrap_or(Register::Zero)
}

impl Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Reg { func, rs, rt, rd } => write!(f, "{} {}, {}, {}", func, rs, rt, rd),
            Instruction::Immed { op, rs, rt, immed } => {
                write!(f, "{} {}, {}, {}", op, rs, rt, immed)
            }
            Instruction::Mem {
                op,
                base,
                target,
                offset,
            } => write!(f, "{} {}, {}, {}", op, base, target, offset),
            Instruction::Branch { op, rs, rt, offset } => {
                if op.compares_two() {
                    write!(f, "{} {}, {}, {}", op, rs, rt, offset)
                } else {
                    write!(f, "{} {}, {}", op, rs, offset)
                }
            }
            Instruction::Syscall(code) => write!(f, "{}", code),
            Instruction::Nop => write!(f, "nop"),
        }
    }
}
