//! Target CPU selection and per-target constant tables

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use crate::error::{Error, Result};

/// CPUs the compiler knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetCpu {
    /// CHIP-8 virtual machine
    #[default]
    Chip8,
    /// Game Boy (Z80-like); no layout is defined yet
    GameBoy,
}

impl FromStr for TargetCpu {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "chip8" | "ch8" | "chip-8" => Ok(TargetCpu::Chip8),
            "gameboy" | "gb" => Ok(TargetCpu::GameBoy),
            other => Err(Error::UnsupportedTarget {
                target: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for TargetCpu {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TargetCpu::Chip8 => write!(f, "chip8"),
            TargetCpu::GameBoy => write!(f, "gameboy"),
        }
    }
}

/// Constant table describing one target
///
/// Memory addresses held here are relative to `code_origin`; the encoder adds
/// the origin back where the machine needs an absolute address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CpuLayout {
    /// Human readable name
    pub name: &'static str,
    /// Absolute address the first instruction is loaded at
    pub code_origin: u16,
    /// Bytes available to a program
    pub memory_size: usize,
    /// Origin-relative, half-open window holding variable space
    pub variable_window: Range<u16>,
    /// Register staging the left-hand side of comparisons
    pub compare_register: u8,
    /// Register holding the Y coordinate for `plot`
    pub plot_y_register: u8,
    /// Register holding the X coordinate for `plot`
    pub plot_x_register: u8,
    /// Register slot that tracks the index register `I`
    pub index_register: u8,
    /// First register index that user variables may not occupy
    pub first_reserved_register: u8,
    /// Sprite row with a single lit pixel
    pub pixel_sprite: u8,
}

impl CpuLayout {
    /// CHIP-8 layout
    pub fn chip8() -> Self {
        CpuLayout {
            name: "CHIP-8",
            code_origin: 0x200,
            memory_size: 4096 - 0x200,
            variable_window: 0xCA0..0xD00,
            compare_register: 0xC,
            plot_y_register: 0xD,
            plot_x_register: 0xE,
            index_register: 0xF,
            first_reserved_register: 0xC,
            pixel_sprite: 0x80,
        }
    }

    /// Layout of `target`, if one exists
    pub fn for_target(target: TargetCpu) -> Result<Self> {
        match target {
            TargetCpu::Chip8 => Ok(Self::chip8()),
            TargetCpu::GameBoy => Err(Error::UnsupportedTarget {
                target: target.to_string(),
            }),
        }
    }

    /// Size of the variable window in bytes
    pub fn variable_space(&self) -> usize {
        self.variable_window.len()
    }

    /// Absolute form of an origin-relative address
    pub fn absolute(&self, relative: u16) -> u16 {
        relative.wrapping_add(self.code_origin)
    }
}

impl Default for CpuLayout {
    fn default() -> Self {
        Self::chip8()
    }
}
