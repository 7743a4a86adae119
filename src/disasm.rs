//! Assembly listing of an object file.

use std::io::Write;

use crate::{bof::ObjectFile, machine::WORD_SIZE, Error};

pub fn disassemble<W: Write>(object: &ObjectFile, out: &mut W) -> Result<(), Error> {
    let header = &object.header;
    let instructions = object.instructions()?;

    writeln!(out, ".text {}", header.text_start_address)?;
    let addresses = (header.text_start_address..).step_by(WORD_SIZE as usize);
    for (address, instr) in addresses.zip(&instructions) {
        writeln!(out, "a{}:\t{}", address, instr)?;
    }

    writeln!(out, ".data {}", header.data_start_address)?;
    // Data words share one counter for their generated names.
    let mut names = (0u32..).map(|n| format!("w{:x}", n));
    for &word in &object.ints {
        let name = names.next().unwrap_or_default();
        writeln!(out, "INT {} = {}", name, word as i32)?;
    }
    for value in object.float_values() {
        let name = names.next().unwrap_or_default();
        writeln!(out, "FLOAT {} = {:.6}", name, value)?;
    }

    writeln!(out, ".stack {}", header.stack_bottom_addr)?;
    writeln!(out, ".end")?;
    Ok(())
}
