//! IR instruction definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Right-hand side of a conditional skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipOperand {
    /// Compare against a byte constant
    Immediate(u8),
    /// Compare against another register
    Register(u8),
}

/// Relation under which a conditional skip skips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipCondition {
    /// Skip the next instruction when both sides are equal
    Equal,
    /// Skip the next instruction when the sides differ
    NotEqual,
}

/// Handle to an emitted instruction that is patched later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PatchHandle(pub usize);

/// IR instruction
///
/// Every variant except [`Instruction::RawMemSet`] is exactly one 2-byte
/// opcode. Register operands are indices into the 16-slot register file;
/// memory addresses are relative to the code origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// `6XNN`: VX = NN
    SetRegister {
        /// Destination register
        register: u8,
        /// Immediate value
        value: u8,
    },
    /// `8XY0`: VX = VY
    RegisterCopy {
        /// Source register (Y)
        from: u8,
        /// Destination register (X)
        to: u8,
    },
    /// `7XNN`: VX += NN
    Add {
        /// Register incremented
        register: u8,
        /// Immediate amount
        amount: u8,
    },
    /// `8XY4`: VX += VY
    AddRegister {
        /// Register receiving the sum
        target: u8,
        /// Register added
        source: u8,
    },
    /// `8XY5`: VX -= VY
    Sub {
        /// Register receiving the difference
        target: u8,
        /// Register holding the subtrahend
        amount_register: u8,
    },
    /// `3XNN`, `4XNN`, `5XY0`, `9XY0`
    ConditionalSkip {
        /// Left-hand register
        lhs: u8,
        /// Right-hand side
        rhs: SkipOperand,
        /// Relation that causes the skip
        condition: SkipCondition,
    },
    /// `1NNN`: unconditional jump to an absolute address
    Jump {
        /// Absolute target address
        target: u16,
    },
    /// `2NNN`: call the subroutine at an absolute address
    Call {
        /// Absolute entry address
        address: u16,
    },
    /// `00EE`: return from subroutine
    Return,
    /// `ANNN`: I = NNN
    SetIndex {
        /// Origin-relative address
        address: u16,
    },
    /// `FX55`: store V0..=VX at I
    RegisterDump {
        /// Origin-relative address the registers are stored at
        start_address: u16,
        /// Number of registers stored, starting with V0
        count: u8,
    },
    /// `FX65`: load V0..=VX from I
    RegisterLoad {
        /// Origin-relative address the registers are read from
        start_address: u16,
        /// Number of registers loaded, starting with V0
        count: u8,
    },
    /// `DXYN`: draw an N-row sprite from I at (VX, VY)
    Plot {
        /// Register holding X
        x: u8,
        /// Register holding Y
        y: u8,
        /// Sprite height in rows
        height: u8,
    },
    /// Raw byte stored in variable space, not an opcode
    RawMemSet {
        /// Byte value
        value: u8,
        /// Origin-relative address
        address: u16,
    },
}

impl Instruction {
    /// Mnemonic tag
    pub fn name(&self) -> &'static str {
        match self {
            Instruction::SetRegister { .. } => "SetRegister",
            Instruction::RegisterCopy { .. } => "RegisterCopy",
            Instruction::Add { .. } => "Add",
            Instruction::AddRegister { .. } => "AddRegister",
            Instruction::Sub { .. } => "Sub",
            Instruction::ConditionalSkip { .. } => "ConditionalSkip",
            Instruction::Jump { .. } => "Jump",
            Instruction::Call { .. } => "Call",
            Instruction::Return => "Return",
            Instruction::SetIndex { .. } => "SetIndex",
            Instruction::RegisterDump { .. } => "RegisterDump",
            Instruction::RegisterLoad { .. } => "RegisterLoad",
            Instruction::Plot { .. } => "Plot",
            Instruction::RawMemSet { .. } => "RawMemSet",
        }
    }

    /// Whether the instruction maps onto exactly one machine opcode
    pub fn is_opcode(&self) -> bool {
        !self.uses_variable_space()
    }

    /// Whether the instruction lives in variable space rather than code
    pub fn uses_variable_space(&self) -> bool {
        matches!(self, Instruction::RawMemSet { .. })
    }

    /// Origin-relative memory address the instruction refers to
    pub fn memory_address(&self) -> Option<u16> {
        match self {
            Instruction::SetIndex { address } | Instruction::RawMemSet { address, .. } => {
                Some(*address)
            }
            Instruction::RegisterDump { start_address, .. }
            | Instruction::RegisterLoad { start_address, .. } => Some(*start_address),
            _ => None,
        }
    }

    /// Rewrites the memory address returned by [`Instruction::memory_address`]
    pub fn set_memory_address(&mut self, new: u16) {
        match self {
            Instruction::SetIndex { address } | Instruction::RawMemSet { address, .. } => {
                *address = new
            }
            Instruction::RegisterDump { start_address, .. }
            | Instruction::RegisterLoad { start_address, .. } => *start_address = new,
            _ => {}
        }
    }
}

impl fmt::Display for SkipOperand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SkipOperand::Immediate(n) => write!(f, "#{:#04x}", n),
            SkipOperand::Register(r) => write!(f, "V{:X}", r),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Instruction::SetRegister { register, value } => {
                write!(f, "LD V{:X}, #{:#04x}", register, value)
            }
            Instruction::RegisterCopy { from, to } => write!(f, "LD V{:X}, V{:X}", to, from),
            Instruction::Add { register, amount } => {
                write!(f, "ADD V{:X}, #{:#04x}", register, amount)
            }
            Instruction::AddRegister { target, source } => {
                write!(f, "ADD V{:X}, V{:X}", target, source)
            }
            Instruction::Sub {
                target,
                amount_register,
            } => write!(f, "SUB V{:X}, V{:X}", target, amount_register),
            Instruction::ConditionalSkip {
                lhs,
                rhs,
                condition,
            } => {
                let mnemonic = match condition {
                    SkipCondition::Equal => "SE",
                    SkipCondition::NotEqual => "SNE",
                };
                write!(f, "{} V{:X}, {}", mnemonic, lhs, rhs)
            }
            Instruction::Jump { target } => write!(f, "JP {:#05x}", target),
            Instruction::Call { address } => write!(f, "CALL {:#05x}", address),
            Instruction::Return => write!(f, "RET"),
            Instruction::SetIndex { address } => write!(f, "LD I, +{:#05x}", address),
            Instruction::RegisterDump {
                start_address,
                count,
            } => write!(f, "LD [+{:#05x}], V0..{}", start_address, count),
            Instruction::RegisterLoad {
                start_address,
                count,
            } => write!(f, "LD V0..{}, [+{:#05x}]", count, start_address),
            Instruction::Plot { x, y, height } => {
                write!(f, "DRW V{:X}, V{:X}, {}", x, y, height)
            }
            Instruction::RawMemSet { value, address } => {
                write!(f, "DB +{:#05x}, #{:#04x}", address, value)
            }
        }
    }
}
