//! Debug utilities for smol→CHIP-8 compilation
//!
//! Tools for inspecting IR and encoded ROMs.

use std::fmt::Write as _;

use super::bytecode::{decode_instruction, encode_instruction};
use super::ir::{Instruction, IrProgram};

/// One IR listing line: address, raw word (if any) and mnemonic
pub fn format_instruction(address: Option<u16>, instruction: &Instruction) -> String {
    match (address, encode_instruction(instruction)) {
        (Some(address), Some(word)) => format!(
            "{:#05x}: {:02X}{:02X}  {}",
            address, word[0], word[1], instruction
        ),
        _ => format!("   data:       {}", instruction),
    }
}

/// Human-readable listing of an IR program
pub fn dump_ir(program: &IrProgram, origin: u16) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    let _ = writeln!(out, "                    IR DUMP");
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");

    for entry in program.functions.entries() {
        let _ = writeln!(out, "fn {} @ {:#05x}", entry.name, entry.address);
    }
    for region in program.memory.regions() {
        let _ = writeln!(
            out,
            "mem {} @ +{:#05x} ({} byte{}) = {:#04x}",
            region.name,
            region.address,
            region.size,
            if region.size == 1 { "" } else { "s" },
            region.value
        );
    }
    for (index, register) in program.registers.iter() {
        if let Some(owner) = &register.owner {
            let _ = writeln!(out, "V{:X} = {} ({})", index, owner, register.value);
        }
    }
    let _ = writeln!(out, "───────────────────────────────────────────────────────────");

    let mut address = origin;
    for instruction in &program.instructions {
        if instruction.is_opcode() {
            let _ = writeln!(out, "{}", format_instruction(Some(address), instruction));
            address = address.wrapping_add(2);
        } else {
            let _ = writeln!(out, "{}", format_instruction(None, instruction));
        }
    }
    for warning in &program.warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    let _ = writeln!(out, "═══════════════════════════════════════════════════════════");
    out
}

/// Decodes a ROM image back into a listing
///
/// Runs of zero words are folded into a single `...` line.
pub fn disassemble(rom: &[u8], origin: u16) -> Vec<String> {
    let mut lines = Vec::new();
    let mut in_zero_run = false;

    for (i, chunk) in rom.chunks(2).enumerate() {
        let address = origin.wrapping_add((i * 2) as u16);
        let word = [chunk[0], chunk.get(1).copied().unwrap_or(0)];

        if word == [0, 0] {
            if !in_zero_run {
                lines.push("...".to_string());
                in_zero_run = true;
            }
            continue;
        }
        in_zero_run = false;

        let text = match decode_instruction(word) {
            Some(instruction) => instruction.to_string(),
            None => format!("DW {:#06x}", u16::from_be_bytes(word)),
        };
        lines.push(format!(
            "{:#05x}: {:02X}{:02X}  {}",
            address, word[0], word[1], text
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disassemble_folds_zero_runs() {
        let rom = [0x60, 0x05, 0x00, 0x00, 0x00, 0x00, 0x12, 0x00];
        let lines = disassemble(&rom, 0x200);
        assert_eq!(
            lines,
            vec![
                "0x200: 6005  LD V0, #0x05".to_string(),
                "...".to_string(),
                "0x206: 1200  JP 0x200".to_string(),
            ]
        );
    }

    #[test]
    fn test_dump_ir_lists_addresses() {
        let mut program = IrProgram::default();
        program.emit(Instruction::SetRegister {
            register: 0,
            value: 0,
        });
        program.emit(Instruction::Jump { target: 0x200 });
        let dump = dump_ir(&program, 0x200);
        assert!(dump.contains("0x200: 6000  LD V0, #0x00"));
        assert!(dump.contains("0x202: 1200  JP 0x200"));
    }
}
