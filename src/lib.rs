pub mod asm;
pub mod ast;
pub mod bof;
pub mod code;
pub mod codegen;
pub mod common;
pub mod disasm;
pub mod frame;
pub mod literal;
pub mod machine;
pub mod types;

use std::{
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{ast::Program, bof::ObjectFile, codegen::CodeGenerator};

pub struct Compiler<W: Write> {
    w: W,
    options: CompilerOption,
}

impl<W: Write> Compiler<W> {
    pub fn new(w: W) -> Self {
        Self {
            w,
            options: CompilerOption::default(),
        }
    }

    pub fn with_options(mut self, options: CompilerOption) -> Self {
        self.options = options;
        self
    }

    /// Generates the whole unit before writing anything to the sink.
    pub fn compile(mut self, program: &Program) -> Result<(), Error> {
        let bytes = render(program, &self.options)?;
        self.w.write_all(&bytes)?;
        self.w.flush()?;
        Ok(())
    }
}

#[derive(Debug, Default, Clone)]
pub struct CompilerOption {
    listing: bool,
}

impl CompilerOption {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit the assembly listing instead of the object file.
    pub fn listing(mut self, listing: bool) -> Self {
        self.listing = listing;
        self
    }
}

/// Generates code for `program` and lays it out as an object file.
pub fn generate(program: &Program) -> Result<ObjectFile, Error> {
    let mut generator = CodeGenerator::new();
    let code = generator.gen_program(program)?;
    Ok(ObjectFile::new(&code, generator.literals()))
}

/// Compiles `program` into the file at `path`.
///
/// The file is created only once generation has succeeded, and removed
/// again if writing it fails.
pub fn compile_to_path<P: AsRef<Path>>(
    program: &Program,
    path: P,
    options: CompilerOption,
) -> Result<(), Error> {
    let path = path.as_ref();
    let bytes = render(program, &options)?;

    let written = File::create(path).and_then(|mut file| {
        file.write_all(&bytes)?;
        file.sync_all()
    });
    written.map_err(|source| {
        let _ = fs::remove_file(path);
        Error::OutputError {
            path: path.to_path_buf(),
            source,
        }
    })
}

fn render(program: &Program, options: &CompilerOption) -> Result<Vec<u8>, Error> {
    let object = generate(program)?;
    if options.listing {
        let mut listing = Vec::new();
        disasm::disassemble(&object, &mut listing)?;
        Ok(listing)
    } else {
        Ok(object.to_bytes())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    CodegenError(#[from] codegen::Error),

    #[error("{0}")]
    BofError(#[from] bof::Error),

    #[error("failed to write {}: {source}", path.display())]
    OutputError { path: PathBuf, source: io::Error },

    #[error("io error: {0}")]
    IoError(#[from] io::Error),
}
