//! Fixed 16-slot register file bookkeeping

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::{Error, Result};

/// Number of general purpose registers (`V0`..`VF`)
pub const REGISTER_COUNT: usize = 16;

/// Owner tag of the slot caching the index register
pub const INDEX_OWNER: &str = "I";

/// One register slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Register {
    /// Value the compiler knows the register holds
    pub value: u16,
    /// Variable currently living in the register
    pub owner: Option<String>,
}

/// Compile-time view of the register file
///
/// Slots `first_reserved..index_slot` are staging registers for comparisons
/// and `plot`; they are written with `put` but never handed out by
/// `find_empty`. Slot `index_slot` mirrors the index register `I` and can only
/// be touched through [`RegisterTable::load_index`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterTable {
    registers: Vec<Register>,
    first_reserved: u8,
    index_slot: u8,
}

impl RegisterTable {
    /// All slots empty, user allocation limited to `0..first_reserved`,
    /// `I` cached in `index_slot`
    pub fn new(first_reserved: u8, index_slot: u8) -> Self {
        RegisterTable {
            registers: vec![Register::default(); REGISTER_COUNT],
            first_reserved,
            index_slot,
        }
    }

    /// Register owned by `name`
    pub fn find(&self, name: &str) -> Option<u8> {
        self.registers
            .iter()
            .take(self.first_reserved as usize)
            .position(|r| r.owner.as_deref() == Some(name))
            .map(|i| i as u8)
    }

    /// First allocatable register without an owner
    pub fn find_empty(&self) -> Result<u8> {
        self.registers
            .iter()
            .take(self.first_reserved as usize)
            .position(|r| r.owner.is_none())
            .map(|i| i as u8)
            .ok_or(Error::OutOfRegisters {
                available: self.first_reserved as usize,
            })
    }

    /// Writes a slot directly
    pub fn put(&mut self, index: u8, value: u16, owner: Option<String>) -> Result<()> {
        if index >= self.index_slot || index as usize >= REGISTER_COUNT {
            return Err(Error::IllegalRegisterAccess { index });
        }
        trace!(register = index, value, owner = ?owner, "register put");
        self.registers[index as usize] = Register { value, owner };
        Ok(())
    }

    /// Slot contents
    pub fn get(&self, index: u8) -> Option<&Register> {
        self.registers.get(index as usize)
    }

    /// Releases a slot for reuse
    pub fn free(&mut self, index: u8) -> Result<()> {
        self.put(index, 0, None)
    }

    /// Records that `I` now points at `address`
    pub fn load_index(&mut self, address: u16) {
        if let Some(slot) = self.registers.get_mut(self.index_slot as usize) {
            *slot = Register {
                value: address,
                owner: Some(INDEX_OWNER.to_string()),
            };
        }
    }

    /// Address `I` is known to hold
    pub fn index_value(&self) -> Option<u16> {
        let slot = self.registers.get(self.index_slot as usize)?;
        slot.owner.as_ref().map(|_| slot.value)
    }

    /// Forgets the cached value of `I`
    pub fn invalidate_index(&mut self) {
        if let Some(slot) = self.registers.get_mut(self.index_slot as usize) {
            *slot = Register::default();
        }
    }

    /// Highest allocatable register that currently has an owner
    pub fn highest_owned(&self) -> Option<u8> {
        self.registers
            .iter()
            .take(self.first_reserved as usize)
            .rposition(|r| r.owner.is_some())
            .map(|i| i as u8)
    }

    /// Iterates slots with their index
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Register)> {
        self.registers.iter().enumerate().map(|(i, r)| (i as u8, r))
    }
}

impl Default for RegisterTable {
    fn default() -> Self {
        Self::new(0xC, 0xF)
    }
}
