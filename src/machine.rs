//! Constants and registers of the FLOAT stack/register machine.

use std::fmt::Display;

use strum::{EnumIter, FromRepr, IntoStaticStr};

/// Machine word size in bytes.
pub const WORD_SIZE: u32 = 4;

/// The data section never starts below this byte address (plus one word).
pub const PAGE_FLOOR: u32 = 1024;

/// Bytes reserved between the end of the static sections and the stack bottom.
pub const RUNTIME_MARGIN: u32 = 4096;

/// Word offset from a frame pointer to the static link.
pub const STATIC_LINK_SLOT: i16 = -2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, FromRepr, IntoStaticStr)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
pub enum Register {
    #[strum(serialize = "0")]
    Zero,
    At,
    V0,
    V1,
    A0,
    A1,
    A2,
    A3,
    T0,
    T1,
    T2,
    T3,
    T4,
    T5,
    T6,
    T7,
    S0,
    S1,
    S2,
    S3,
    S4,
    S5,
    S6,
    S7,
    T8,
    T9,
    K0,
    K1,
    Gp,
    Sp,
    Fp,
    Ra,
}

impl Register {
    /// 5-bit index used in instruction encodings.
    pub fn index(self) -> u32 {
        self as u32
    }

    pub fn from_index(index: u32) -> Option<Self> {
        u8::try_from(index).ok().and_then(Self::from_repr)
    }
}

impl Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "${}", name)
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    #[test]
    fn test_indices_cover_five_bits() {
        let all: Vec<_> = Register::iter().collect();
        assert_eq!(all.len(), 32);
        for (idx, reg) in all.into_iter().enumerate() {
            assert_eq!(reg.index(), idx as u32);
            assert_eq!(Register::from_index(idx as u32), Some(reg));
        }
        assert_eq!(Register::from_index(32), None);
    }

    #[test]
    fn test_names() {
        assert_eq!(Register::Zero.to_string(), "$0");
        assert_eq!(Register::At.to_string(), "$at");
        assert_eq!(Register::T9.to_string(), "$t9");
        assert_eq!(Register::Fp.to_string(), "$fp");
    }
}
