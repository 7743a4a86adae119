//! Code sequences: the intermediate representation every generator returns.
//!
//! A sequence is built bottom-up and only ever consumed by concatenation, so
//! its [`CodeSeq::size`] is final once a generator hands it back. Branches
//! over a sub-sequence must be built after that sub-sequence exists.

use crate::asm::Instruction;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeSeq {
    instrs: Vec<Instruction>,
}

impl CodeSeq {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn singleton(instr: Instruction) -> Self {
        Self {
            instrs: vec![instr],
        }
    }

    /// `self` followed by `other`.
    pub fn concat(mut self, mut other: CodeSeq) -> Self {
        self.instrs.append(&mut other.instrs);
        self
    }

    pub fn add_to_end(mut self, instr: Instruction) -> Self {
        self.instrs.push(instr);
        self
    }

    /// Number of instructions (words) in the sequence.
    pub fn size(&self) -> usize {
        self.instrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instrs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instrs.iter()
    }
}

impl From<Vec<Instruction>> for CodeSeq {
    fn from(instrs: Vec<Instruction>) -> Self {
        Self { instrs }
    }
}

impl IntoIterator for CodeSeq {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.into_iter()
    }
}

impl<'a> IntoIterator for &'a CodeSeq {
    type Item = &'a Instruction;
    type IntoIter = std::slice::Iter<'a, Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instrs.iter()
    }
}
