//! CHIP-8 bytecode encoder
//!
//! Every opcode is two bytes, big-endian, with the opcode class in the high
//! nibble of the first byte:
//!
//! ```text
//! 1NNN  JP addr          6XNN  LD VX, NN       8XY0  LD VX, VY
//! 2NNN  CALL addr        7XNN  ADD VX, NN      8XY4  ADD VX, VY
//! 3XNN  SE VX, NN        ANNN  LD I, addr      8XY5  SUB VX, VY
//! 4XNN  SNE VX, NN       DXYN  DRW VX, VY, N   FX55  LD [I], V0..VX
//! 5XY0  SE VX, VY        00EE  RET             FX65  LD V0..VX, [I]
//! 9XY0  SNE VX, VY
//! ```
//!
//! `RawMemSet` is not an opcode: its byte is written at its own offset in the
//! ROM image, after which the stream returns to where the code left off.

use std::io::{Cursor, Seek, SeekFrom, Write};
use std::path::Path;

use tracing::{debug, trace};

use super::ir::{Instruction, SkipCondition, SkipOperand};
use crate::error::Result;

/// Absolute address the ROM image is loaded at
pub const CODE_ORIGIN: u16 = 0x200;

#[inline]
fn pack_xnn(class: u8, x: u8, nn: u8) -> [u8; 2] {
    [(class << 4) | (x & 0xF), nn]
}

#[inline]
fn pack_xyn(class: u8, x: u8, y: u8, n: u8) -> [u8; 2] {
    [(class << 4) | (x & 0xF), ((y & 0xF) << 4) | (n & 0xF)]
}

#[inline]
fn pack_nnn(class: u8, nnn: u16) -> [u8; 2] {
    [(class << 4) | ((nnn >> 8) as u8 & 0xF), nnn as u8]
}

/// Machine word for an instruction, `None` for `RawMemSet`
///
/// Register operands are assumed to be validated by the generator.
pub fn encode_instruction(instruction: &Instruction) -> Option<[u8; 2]> {
    let word = match *instruction {
        Instruction::SetRegister { register, value } => pack_xnn(0x6, register, value),
        Instruction::RegisterCopy { from, to } => pack_xyn(0x8, to, from, 0x0),
        Instruction::Add { register, amount } => pack_xnn(0x7, register, amount),
        Instruction::AddRegister { target, source } => pack_xyn(0x8, target, source, 0x4),
        Instruction::Sub {
            target,
            amount_register,
        } => pack_xyn(0x8, target, amount_register, 0x5),
        Instruction::ConditionalSkip {
            lhs,
            rhs,
            condition,
        } => match (rhs, condition) {
            (SkipOperand::Immediate(nn), SkipCondition::Equal) => pack_xnn(0x3, lhs, nn),
            (SkipOperand::Immediate(nn), SkipCondition::NotEqual) => pack_xnn(0x4, lhs, nn),
            (SkipOperand::Register(y), SkipCondition::Equal) => pack_xyn(0x5, lhs, y, 0),
            (SkipOperand::Register(y), SkipCondition::NotEqual) => pack_xyn(0x9, lhs, y, 0),
        },
        Instruction::Jump { target } => pack_nnn(0x1, target),
        Instruction::Call { address } => pack_nnn(0x2, address),
        Instruction::Return => [0x00, 0xEE],
        Instruction::SetIndex { address } => pack_nnn(0xA, address.wrapping_add(CODE_ORIGIN)),
        Instruction::RegisterDump { count, .. } => pack_xnn(0xF, count.saturating_sub(1), 0x55),
        Instruction::RegisterLoad { count, .. } => pack_xnn(0xF, count.saturating_sub(1), 0x65),
        Instruction::Plot { x, y, height } => pack_xyn(0xD, x, y, height),
        Instruction::RawMemSet { .. } => return None,
    };
    Some(word)
}

/// Inverse of [`encode_instruction`] for the opcodes this compiler emits
///
/// `FX55`/`FX65` decode with a zero address since the address lives in `I`.
pub fn decode_instruction(word: [u8; 2]) -> Option<Instruction> {
    let class = word[0] >> 4;
    let x = word[0] & 0xF;
    let y = word[1] >> 4;
    let n = word[1] & 0xF;
    let nn = word[1];
    let nnn = (u16::from(x) << 8) | u16::from(nn);

    let instruction = match (class, n) {
        (0x0, _) if word == [0x00, 0xEE] => Instruction::Return,
        (0x1, _) => Instruction::Jump { target: nnn },
        (0x2, _) => Instruction::Call { address: nnn },
        (0x3, _) | (0x4, _) => Instruction::ConditionalSkip {
            lhs: x,
            rhs: SkipOperand::Immediate(nn),
            condition: if class == 0x3 {
                SkipCondition::Equal
            } else {
                SkipCondition::NotEqual
            },
        },
        (0x5, 0) | (0x9, 0) => Instruction::ConditionalSkip {
            lhs: x,
            rhs: SkipOperand::Register(y),
            condition: if class == 0x5 {
                SkipCondition::Equal
            } else {
                SkipCondition::NotEqual
            },
        },
        (0x6, _) => Instruction::SetRegister {
            register: x,
            value: nn,
        },
        (0x7, _) => Instruction::Add {
            register: x,
            amount: nn,
        },
        (0x8, 0x0) => Instruction::RegisterCopy { from: y, to: x },
        (0x8, 0x4) => Instruction::AddRegister {
            target: x,
            source: y,
        },
        (0x8, 0x5) => Instruction::Sub {
            target: x,
            amount_register: y,
        },
        (0xA, _) => Instruction::SetIndex {
            address: nnn.wrapping_sub(CODE_ORIGIN),
        },
        (0xD, _) => Instruction::Plot { x, y, height: n },
        (0xF, _) if nn == 0x55 => Instruction::RegisterDump {
            start_address: 0,
            count: x + 1,
        },
        (0xF, _) if nn == 0x65 => Instruction::RegisterLoad {
            start_address: 0,
            count: x + 1,
        },
        _ => return None,
    };
    Some(instruction)
}

/// Streams encoded instructions into a seekable sink
pub struct BytecodeEncoder<W: Write + Seek> {
    out: W,
    written: usize,
}

impl<W: Write + Seek> BytecodeEncoder<W> {
    /// Encoder writing from the current position of `out`
    pub fn new(out: W) -> Self {
        BytecodeEncoder { out, written: 0 }
    }

    /// Writes one instruction
    pub fn encode(&mut self, instruction: &Instruction) -> Result<()> {
        match (encode_instruction(instruction), instruction) {
            (Some(word), _) => {
                trace!(%instruction, word = ?word, "encode");
                self.out.write_all(&word)?;
                self.written += 1;
            }
            (None, Instruction::RawMemSet { value, address }) => {
                let resume = self.out.stream_position()?;
                self.out.seek(SeekFrom::Start(u64::from(*address)))?;
                self.out.write_all(&[*value])?;
                self.out.seek(SeekFrom::Start(resume))?;
                trace!(address, value, "raw memory set");
            }
            (None, _) => {}
        }
        Ok(())
    }

    /// Writes every instruction in order
    pub fn encode_all(&mut self, instructions: &[Instruction]) -> Result<()> {
        for instruction in instructions {
            self.encode(instruction)?;
        }
        self.out.flush()?;
        Ok(())
    }

    /// Number of opcodes written so far
    pub fn opcodes_written(&self) -> usize {
        self.written
    }

    /// Returns the underlying sink
    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Encodes a whole instruction stream into a ROM image
pub fn encode_program(instructions: &[Instruction]) -> Result<Vec<u8>> {
    let mut encoder = BytecodeEncoder::new(Cursor::new(Vec::new()));
    encoder.encode_all(instructions)?;
    let opcodes = encoder.opcodes_written();
    let rom = encoder.into_inner().into_inner();
    debug!(opcodes, bytes = rom.len(), "encoded ROM image");
    Ok(rom)
}

/// Writes a ROM image to disk
pub fn write_rom(path: impl AsRef<Path>, rom: &[u8]) -> Result<()> {
    let path = path.as_ref();
    std::fs::write(path, rom)?;
    debug!(path = %path.display(), bytes = rom.len(), "wrote ROM");
    Ok(())
}
