//! # smol Compiler - source to CHIP-8 ROM
//!
//! Lowers smol programs to the CHIP-8 instruction set and packs them into a
//! ROM image loadable at `0x200`.
//!
//! ## Architecture
//!
//! ```text
//! smol source → tokens → AST → IR (+ register/memory/function tables)
//!             → [compaction] → layout check → ROM bytes
//! ```
//!
//! ## Usage
//!
//! ```
//! use smolc::compiler::{Compiler, CompileOptions};
//!
//! let compiler = Compiler::new(CompileOptions::default());
//! let result = compiler.compile("Uint8 A = 0\nwhileNot(A, 3):\n INC A\nend")?;
//! assert_eq!(&result.rom[..2], &[0x60, 0x00]);
//! # Ok::<(), smolc::Error>(())
//! ```

pub mod bytecode;
pub mod debug;
pub mod ir;
pub mod target;

pub use bytecode::{
    decode_instruction, encode_instruction, encode_program, write_rom, BytecodeEncoder,
};
pub use debug::{disassemble, dump_ir, format_instruction};
pub use ir::{Instruction, IrGenerator, IrProgram};
pub use target::{CpuLayout, TargetCpu};

use tracing::{debug, info};

use crate::{Parser, Program, Result, Scanner};

/// Compilation options
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// CPU to generate code for
    pub target: TargetCpu,
    /// Move variable space directly behind the code
    pub compact_memory: bool,
    /// Save and restore caller registers around function bodies
    pub preserve_registers: bool,
}

/// Compilation result with metadata
#[derive(Debug, Clone)]
pub struct CompileResult {
    /// ROM image, first byte loads at the code origin
    pub rom: Vec<u8>,
    /// Lowered program with its tables
    pub program: IrProgram,
    /// Bytes of executable code
    pub code_size: usize,
    /// Warnings generated during compilation
    pub warnings: Vec<String>,
}

/// smol to CHIP-8 compiler
pub struct Compiler {
    options: CompileOptions,
}

impl Compiler {
    /// Create a new compiler with options
    pub fn new(options: CompileOptions) -> Self {
        Self { options }
    }

    /// Compile smol source code to a ROM image
    pub fn compile(&self, source: &str) -> Result<CompileResult> {
        let tokens = Scanner::new(source).scan_tokens()?;
        let program = Parser::new(tokens).parse()?;
        self.compile_program(&program)
    }

    /// Compile an already parsed program
    pub fn compile_program(&self, program: &Program) -> Result<CompileResult> {
        let layout = CpuLayout::for_target(self.options.target)?;
        info!(
            target = layout.name,
            statements = program.statements.len(),
            "compiling"
        );

        let mut generator = IrGenerator::new(layout.clone())
            .with_register_preservation(self.options.preserve_registers);
        generator.generate(&program.statements)?;
        if self.options.compact_memory {
            generator.compact_memory()?;
        }
        let ir_program = generator.finish();
        ir_program.check_layout(&layout)?;

        let rom = encode_program(&ir_program.instructions)?;
        let code_size = ir_program.code_end();
        debug!(code_size, rom_size = rom.len(), "compiled");

        Ok(CompileResult {
            rom,
            code_size,
            warnings: ir_program.warnings.clone(),
            program: ir_program,
        })
    }

    /// Options this compiler was built with
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_compile_loop() {
        let result = Compiler::new(CompileOptions::default())
            .compile("Uint8 A = 0\nwhileNot(A, 3):\n INC A\nend")
            .unwrap();
        assert_eq!(
            result.rom,
            vec![0x60, 0x00, 0x70, 0x01, 0x8C, 0x00, 0x3C, 0x03, 0x12, 0x02]
        );
        assert_eq!(result.code_size, 10);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_gameboy_rejected() {
        let options = CompileOptions {
            target: TargetCpu::GameBoy,
            ..CompileOptions::default()
        };
        assert!(matches!(
            Compiler::new(options).compile("Uint8 A = 1"),
            Err(Error::UnsupportedTarget { .. })
        ));
    }
}
