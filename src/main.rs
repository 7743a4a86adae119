use std::{fs, io, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use floatgen::{bof::ObjectFile, disasm};

/// Print the assembly listing of a FLOAT binary object file.
#[derive(Parser)]
struct Args {
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let filepath = args.file;
    let bytes = fs::read(&filepath)
        .with_context(|| format!("failed to read file {}", filepath.display()))?;
    let object = ObjectFile::decode(&bytes)
        .with_context(|| format!("{} is not a valid object file", filepath.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    disasm::disassemble(&object, &mut out)
        .with_context(|| format!("failed to disassemble {}", filepath.display()))
}
