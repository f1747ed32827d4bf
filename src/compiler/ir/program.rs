//! IR program: instruction stream plus the tables built while lowering

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::function_table::FunctionTable;
use super::instruction::{Instruction, PatchHandle};
use super::memory_table::MemoryTable;
use super::register_table::RegisterTable;
use crate::compiler::target::CpuLayout;
use crate::error::{Error, Result};

/// Complete IR program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrProgram {
    /// All instructions in emission order
    pub instructions: Vec<Instruction>,
    /// Register file state at the end of lowering
    pub registers: RegisterTable,
    /// Variable-space allocations
    pub memory: MemoryTable,
    /// Function entry addresses
    pub functions: FunctionTable,
    /// Non-fatal diagnostics
    pub warnings: Vec<String>,
    /// Opcodes emitted so far (excludes `RawMemSet`)
    code_len: usize,
}

impl IrProgram {
    /// Empty program for `layout`
    pub fn new(layout: &CpuLayout) -> Self {
        IrProgram {
            instructions: Vec::new(),
            registers: RegisterTable::new(
                layout.first_reserved_register,
                layout.index_register,
            ),
            memory: MemoryTable::new(layout.variable_window.clone()),
            functions: FunctionTable::new(),
            warnings: Vec::new(),
            code_len: 0,
        }
    }

    /// Appends an instruction
    pub fn emit(&mut self, instruction: Instruction) -> PatchHandle {
        trace!(%instruction, "emit");
        if instruction.is_opcode() {
            self.code_len += 1;
        }
        self.instructions.push(instruction);
        PatchHandle(self.instructions.len() - 1)
    }

    /// Absolute address the next opcode will be loaded at
    pub fn next_address(&self, origin: u16) -> u16 {
        origin.wrapping_add((self.code_len * 2) as u16)
    }

    /// Retargets a previously emitted jump
    pub fn patch_jump(&mut self, handle: PatchHandle, target: u16) -> Result<()> {
        match self.instructions.get_mut(handle.0) {
            Some(Instruction::Jump { target: slot }) => {
                trace!(index = handle.0, target, "patch jump");
                *slot = target;
                Ok(())
            }
            Some(other) => Err(Error::InvalidPatch {
                index: handle.0,
                found: other.name().to_string(),
            }),
            None => Err(Error::InvalidPatch {
                index: handle.0,
                found: "nothing".to_string(),
            }),
        }
    }

    /// Number of opcodes in the program
    pub fn code_len(&self) -> usize {
        self.code_len
    }

    /// Origin-relative end of the code, in bytes
    pub fn code_end(&self) -> usize {
        self.code_len * 2
    }

    /// Records a non-fatal diagnostic
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Fails when the code runs into variable space or past memory
    pub fn check_layout(&self, layout: &CpuLayout) -> Result<()> {
        let code_end = self.code_end();
        let used = self.memory.regions();
        let data_start = used
            .iter()
            .map(|r| r.address as usize)
            .min()
            .unwrap_or(layout.variable_window.start as usize);
        let limit = data_start.min(layout.memory_size);
        if code_end > limit {
            return Err(Error::ProgramTooLarge { code_end, limit });
        }
        let data_end = used
            .iter()
            .map(|r| r.address as usize + r.size)
            .max()
            .unwrap_or(0);
        if data_end > layout.memory_size {
            return Err(Error::ProgramTooLarge {
                code_end: data_end,
                limit: layout.memory_size,
            });
        }
        Ok(())
    }
}

impl Default for IrProgram {
    fn default() -> Self {
        Self::new(&CpuLayout::chip8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addresses_skip_raw_mem_set() {
        let mut program = IrProgram::default();
        assert_eq!(program.next_address(0x200), 0x200);
        program.emit(Instruction::Return);
        program.emit(Instruction::RawMemSet {
            value: 0x80,
            address: 0xCA0,
        });
        program.emit(Instruction::Return);
        assert_eq!(program.next_address(0x200), 0x204);
        assert_eq!(program.code_end(), 4);
    }

    #[test]
    fn test_patch_jump() {
        let mut program = IrProgram::default();
        let jump = program.emit(Instruction::Jump { target: 0 });
        let ret = program.emit(Instruction::Return);
        program.patch_jump(jump, 0x206).unwrap();
        assert_eq!(program.instructions[0], Instruction::Jump { target: 0x206 });
        assert!(matches!(
            program.patch_jump(ret, 0x200),
            Err(Error::InvalidPatch { index: 1, .. })
        ));
    }

    #[test]
    fn test_layout_check() {
        let layout = CpuLayout::chip8();
        let mut program = IrProgram::new(&layout);
        program.emit(Instruction::Return);
        assert!(program.check_layout(&layout).is_ok());

        for _ in 0..0xCA0 / 2 {
            program.emit(Instruction::Return);
        }
        assert!(matches!(
            program.check_layout(&layout),
            Err(Error::ProgramTooLarge { .. })
        ));
    }
}
