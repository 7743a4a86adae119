//! The binary object file (BOF) read by the FLOAT virtual machine.
//!
//! A file is a 28-byte header followed by the text section (one word per
//! instruction) and the data section (integer words, then float words).
//! Every word is little-endian.

use log::info;
use thiserror::Error;

use crate::{
    asm::{DecodeError, Instruction},
    code::CodeSeq,
    literal::LiteralPool,
    machine::{PAGE_FLOOR, RUNTIME_MARGIN, WORD_SIZE},
};

pub const MAGIC: [u8; 4] = *b"FBF\0";
pub const HEADER_SIZE: usize = 7 * WORD_SIZE as usize;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("bad magic number {0:02x?}")]
    BadMagic([u8; 4]),
    #[error("file is truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: u64, actual: usize },
    #[error("{section} length {length} is not a multiple of the word size")]
    Misaligned { section: &'static str, length: u32 },
    #[error("{0} unexpected bytes after the data section")]
    TrailingBytes(usize),
    #[error("invalid instruction at byte address {address}: {source}")]
    InvalidInstruction {
        address: u32,
        #[source]
        source: DecodeError,
    },
}

pub trait Encode {
    fn encode(&self, sink: &mut Vec<u8>);
}

impl<T: Encode + ?Sized> Encode for &'_ T {
    fn encode(&self, sink: &mut Vec<u8>) {
        (*self).encode(sink)
    }
}

/// Sections carry no length prefix; the header holds their lengths.
impl<T: Encode> Encode for [T] {
    fn encode(&self, sink: &mut Vec<u8>) {
        for item in self.iter() {
            item.encode(sink);
        }
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, sink: &mut Vec<u8>) {
        self.as_slice().encode(sink)
    }
}

impl Encode for u32 {
    fn encode(&self, sink: &mut Vec<u8>) {
        sink.extend_from_slice(&self.to_le_bytes());
    }
}

impl Encode for Instruction {
    fn encode(&self, sink: &mut Vec<u8>) {
        Instruction::encode(self).encode(sink)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BofHeader {
    pub magic: [u8; 4],
    pub text_start_address: u32,
    pub text_length: u32,
    pub data_start_address: u32,
    pub ints_length: u32,
    pub floats_length: u32,
    pub stack_bottom_addr: u32,
}

impl BofHeader {
    /// Header of a file holding `instruction_count` instructions and
    /// `literal_count` float literals.
    pub fn for_program(instruction_count: usize, literal_count: usize) -> Self {
        let text_length = instruction_count as u32 * WORD_SIZE;
        let data_start_address = text_length.max(PAGE_FLOOR) + WORD_SIZE;
        let ints_length = 0;
        let floats_length = literal_count as u32 * WORD_SIZE;
        let stack_bottom_addr =
            data_start_address + ints_length + floats_length + text_length + RUNTIME_MARGIN;

        Self {
            magic: MAGIC,
            text_start_address: 0,
            text_length,
            data_start_address,
            ints_length,
            floats_length,
            stack_bottom_addr,
        }
    }

    /// Widened so that lengths read from a file cannot overflow.
    pub fn data_length(&self) -> u64 {
        u64::from(self.ints_length) + u64::from(self.floats_length)
    }

    /// Size of the whole file described by this header.
    pub fn file_size(&self) -> u64 {
        HEADER_SIZE as u64 + u64::from(self.text_length) + self.data_length()
    }

    fn decode(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_SIZE {
            return Err(Error::Truncated {
                expected: HEADER_SIZE as u64,
                actual: bytes.len(),
            });
        }

        let mut magic = [0; 4];
        magic.copy_from_slice(&bytes[..4]);
        if magic != MAGIC {
            return Err(Error::BadMagic(magic));
        }

        let mut fields = read_words(&bytes[4..HEADER_SIZE]);
        let mut next = || fields.next().unwrap_or_default();
        let header = Self {
            magic,
            text_start_address: next(),
            text_length: next(),
            data_start_address: next(),
            ints_length: next(),
            floats_length: next(),
            stack_bottom_addr: next(),
        };

        for (section, length) in [
            ("text", header.text_length),
            ("int data", header.ints_length),
            ("float data", header.floats_length),
        ] {
            if length % WORD_SIZE != 0 {
                return Err(Error::Misaligned { section, length });
            }
        }
        Ok(header)
    }
}

impl Encode for BofHeader {
    fn encode(&self, sink: &mut Vec<u8>) {
        sink.extend_from_slice(&self.magic);
        [
            self.text_start_address,
            self.text_length,
            self.data_start_address,
            self.ints_length,
            self.floats_length,
            self.stack_bottom_addr,
        ]
        .encode(sink);
    }
}

/// A complete object file, sections held as raw words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectFile {
    pub header: BofHeader,
    pub text: Vec<u32>,
    pub ints: Vec<u32>,
    pub floats: Vec<u32>,
}

impl ObjectFile {
    /// Lays out generated code and its literal pool. The header is computed
    /// from the final sizes before any section is stored.
    pub fn new(code: &CodeSeq, literals: &LiteralPool) -> Self {
        let header = BofHeader::for_program(code.size(), literals.size());
        info!(
            "object file: text {} bytes at {}, data {} bytes at {}, stack bottom {}",
            header.text_length,
            header.text_start_address,
            header.data_length(),
            header.data_start_address,
            header.stack_bottom_addr
        );

        Self {
            header,
            text: code.iter().map(Instruction::encode).collect(),
            ints: Vec::new(),
            floats: literals.words().collect(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.header.file_size() as usize);
        self.encode(&mut bytes);
        bytes
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, Error> {
        let header = BofHeader::decode(bytes)?;

        let expected = header.file_size();
        let expected = match usize::try_from(expected) {
            Ok(size) if size <= bytes.len() => size,
            _ => {
                return Err(Error::Truncated {
                    expected,
                    actual: bytes.len(),
                })
            }
        };
        if bytes.len() > expected {
            return Err(Error::TrailingBytes(bytes.len() - expected));
        }

        // Every section now lies within `bytes`.

        let text_end = HEADER_SIZE + header.text_length as usize;
        let ints_end = text_end + header.ints_length as usize;
        Ok(Self {
            header,
            text: read_words(&bytes[HEADER_SIZE..text_end]).collect(),
            ints: read_words(&bytes[text_end..ints_end]).collect(),
            floats: read_words(&bytes[ints_end..]).collect(),
        })
    }

    /// The text section decoded into instructions.
    pub fn instructions(&self) -> Result<Vec<Instruction>, Error> {
        self.text
            .iter()
            .zip((self.header.text_start_address..).step_by(WORD_SIZE as usize))
            .map(|(&word, address)| {
                Instruction::decode(word)
                    .map_err(|source| Error::InvalidInstruction { address, source })
            })
            .collect()
    }

    pub fn float_values(&self) -> impl Iterator<Item = f32> + '_ {
        self.floats.iter().map(|&bits| f32::from_bits(bits))
    }
}

impl Encode for ObjectFile {
    fn encode(&self, sink: &mut Vec<u8>) {
        self.header.encode(sink);
        self.text.encode(sink);
        self.ints.encode(sink);
        self.floats.encode(sink);
    }
}

fn read_words(bytes: &[u8]) -> impl Iterator<Item = u32> + '_ {
    bytes
        .chunks_exact(WORD_SIZE as usize)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Register::*;

    #[test]
    fn test_header_small_program() {
        let header = BofHeader::for_program(10, 2);
        assert_eq!(header.text_length, 40);
        assert_eq!(header.data_start_address, 1028);
        assert_eq!(header.ints_length, 0);
        assert_eq!(header.floats_length, 8);
        assert_eq!(header.stack_bottom_addr, 1028 + 8 + 40 + 4096);
    }

    #[test]
    fn test_header_large_program() {
        let header = BofHeader::for_program(300, 0);
        assert_eq!(header.text_length, 1200);
        assert_eq!(header.data_start_address, 1204);
        assert_eq!(header.stack_bottom_addr, 1204 + 1200 + 4096);
    }

    #[test]
    fn test_layout() {
        let code = CodeSeq::singleton(Instruction::addi(Sp, Sp, -4)).add_to_end(Instruction::exit());
        let mut pool = LiteralPool::new();
        pool.lookup("1.5", 1.5);

        let bytes = ObjectFile::new(&code, &pool).to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE + 8 + 4);
        assert_eq!(&bytes[..4], b"FBF\0");
        assert_eq!(&bytes[8..12], &8u32.to_le_bytes());
        assert_eq!(&bytes[28..32], &0x27BD_FFFCu32.to_le_bytes());
        assert_eq!(&bytes[36..40], &1.5f32.to_bits().to_le_bytes());
    }

    #[test]
    fn test_decode_rejects_bad_magic() {
        let mut bytes = ObjectFile::new(&CodeSeq::empty(), &LiteralPool::new()).to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            ObjectFile::decode(&bytes),
            Err(Error::BadMagic([b'X', b'B', b'F', 0]))
        ));
    }

    #[test]
    fn test_decode_rejects_bad_lengths() {
        let code = CodeSeq::singleton(Instruction::exit());
        let bytes = ObjectFile::new(&code, &LiteralPool::new()).to_bytes();

        assert_eq!(
            ObjectFile::decode(&bytes[..bytes.len() - 1]),
            Err(Error::Truncated {
                expected: 32,
                actual: 31
            })
        );

        let mut longer = bytes.clone();
        longer.push(0);
        assert_eq!(ObjectFile::decode(&longer), Err(Error::TrailingBytes(1)));

        let mut misaligned = bytes;
        misaligned[8..12].copy_from_slice(&3u32.to_le_bytes());
        assert!(matches!(
            ObjectFile::decode(&misaligned),
            Err(Error::Misaligned { section: "text", .. })
        ));
    }

    #[test]
    fn test_decode_rejects_lengths_past_the_word_range() {
        let mut bytes = ObjectFile::new(&CodeSeq::empty(), &LiteralPool::new()).to_bytes();
        bytes[16..20].copy_from_slice(&4u32.to_le_bytes());
        bytes[20..24].copy_from_slice(&0xFFFF_FFFCu32.to_le_bytes());

        assert_eq!(
            ObjectFile::decode(&bytes),
            Err(Error::Truncated {
                expected: HEADER_SIZE as u64 + (1 << 32),
                actual: HEADER_SIZE
            })
        );

        bytes[8..12].copy_from_slice(&0xFFFF_FFFCu32.to_le_bytes());
        bytes[16..20].copy_from_slice(&0xFFFF_FFFCu32.to_le_bytes());
        assert!(matches!(
            ObjectFile::decode(&bytes),
            Err(Error::Truncated { actual: HEADER_SIZE, .. })
        ));
    }

    #[test]
    fn test_invalid_instruction_address() {
        let mut object = ObjectFile::new(
            &CodeSeq::from(vec![Instruction::nop(), Instruction::exit()]),
            &LiteralPool::new(),
        );
        object.text[1] = 63 << 26;
        assert_eq!(
            object.instructions(),
            Err(Error::InvalidInstruction {
                address: 4,
                source: DecodeError::UnknownOpcode(63)
            })
        );
    }
}
