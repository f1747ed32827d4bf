//! Variable-space bump allocator

use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, trace};

use crate::error::{Error, Result};

/// Name of the one-pixel sprite row shared by every `plot`
pub const PIXEL_SPRITE: &str = "__pixel";

/// A named block of variable space
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    /// Owning name
    pub name: String,
    /// Origin-relative start address
    pub address: u16,
    /// Size in bytes
    pub size: usize,
    /// Initial value of the first byte
    pub value: u8,
}

impl MemoryRegion {
    /// Addresses covered by the region
    pub fn span(&self) -> Range<u16> {
        self.address..self.address + self.size as u16
    }
}

/// Regions allocated in the variable window, in allocation order
///
/// Allocation is monotonic: a region is never freed within one compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryTable {
    window: Range<u16>,
    regions: Vec<MemoryRegion>,
    used: usize,
}

impl MemoryTable {
    /// Empty table over an origin-relative window
    pub fn new(window: Range<u16>) -> Self {
        MemoryTable {
            window,
            regions: Vec::new(),
            used: 0,
        }
    }

    /// Allocates `size` bytes for `name` at the next free address
    pub fn put(&mut self, name: &str, value: u8, size: usize) -> Result<MemoryRegion> {
        let available = self.window.len();
        if self.used + size > available {
            return Err(Error::OutOfMemory {
                requested: size,
                available: available - self.used,
            });
        }
        if self.regions.iter().any(|r| r.name == name) {
            return Err(Error::compiler(format!(
                "memory region '{}' allocated twice",
                name
            )));
        }

        let region = MemoryRegion {
            name: name.to_string(),
            address: self.window.start + self.used as u16,
            size,
            value,
        };
        debug!(name, address = region.address, size, "memory put");
        self.used += size;
        self.regions.push(region.clone());
        Ok(region)
    }

    /// Region owned by `name`
    ///
    /// A silent lookup turns a miss into `Ok(None)`; otherwise a miss is
    /// `UndefinedVariable`.
    pub fn lookup(&self, name: &str, silent: bool) -> Result<Option<MemoryRegion>> {
        match self.regions.iter().find(|r| r.name == name) {
            Some(region) => Ok(Some(region.clone())),
            None if silent => Ok(None),
            None => Err(Error::UndefinedVariable {
                name: name.to_string(),
            }),
        }
    }

    /// Name of the region starting at `address`
    pub fn find_by_address(&self, address: u16) -> Result<String> {
        self.regions
            .iter()
            .find(|r| r.address == address)
            .map(|r| r.name.clone())
            .ok_or(Error::UnassignedMemoryLookup { address })
    }

    /// Relocates a region
    ///
    /// Internal moves of an unknown name are ignored.
    pub fn move_region(&mut self, name: &str, address: u16, internal: bool) -> Result<()> {
        match self.regions.iter_mut().find(|r| r.name == name) {
            Some(region) => {
                trace!(name, from = region.address, to = address, "memory move");
                region.address = address;
                Ok(())
            }
            None if internal => {
                debug!(name, "ignoring internal move of unknown region");
                Ok(())
            }
            None => Err(Error::UndefinedVariable {
                name: name.to_string(),
            }),
        }
    }

    /// Allocated regions in allocation order
    pub fn regions(&self) -> &[MemoryRegion] {
        &self.regions
    }

    /// Bytes allocated so far
    pub fn used(&self) -> usize {
        self.used
    }

    /// Window the allocator hands addresses out of
    pub fn window(&self) -> Range<u16> {
        self.window.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MemoryTable {
        MemoryTable::new(0xCA0..0xD00)
    }

    #[test]
    fn test_bump_allocation() {
        let mut mem = table();
        let a = mem.put("a", 1, 1).unwrap();
        let b = mem.put("b", 2, 4).unwrap();
        let c = mem.put("c", 3, 1).unwrap();
        assert_eq!(a.address, 0xCA0);
        assert_eq!(b.address, 0xCA1);
        assert_eq!(c.address, 0xCA5);
        assert_eq!(mem.used(), 6);
    }

    #[test]
    fn test_window_exhaustion_is_exact() {
        let mut mem = table();
        mem.put("big", 0, 95).unwrap();
        mem.put("last", 0, 1).unwrap();
        assert!(matches!(
            mem.put("over", 0, 1),
            Err(Error::OutOfMemory {
                requested: 1,
                available: 0
            })
        ));
    }

    #[test]
    fn test_lookup_modes() {
        let mut mem = table();
        mem.put(PIXEL_SPRITE, 0x80, 1).unwrap();
        assert!(mem.lookup(PIXEL_SPRITE, false).unwrap().is_some());
        assert_eq!(mem.lookup("x", true).unwrap(), None);
        assert!(matches!(
            mem.lookup("x", false),
            Err(Error::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_find_by_address_and_move() {
        let mut mem = table();
        mem.put("a", 0, 1).unwrap();
        assert_eq!(mem.find_by_address(0xCA0).unwrap(), "a");
        assert!(matches!(
            mem.find_by_address(0xCA1),
            Err(Error::UnassignedMemoryLookup { address: 0xCA1 })
        ));

        mem.move_region("a", 0x10, false).unwrap();
        assert_eq!(mem.find_by_address(0x10).unwrap(), "a");
        assert!(mem.move_region("ghost", 0x20, true).is_ok());
        assert!(mem.move_region("ghost", 0x20, false).is_err());
    }

    #[test]
    fn test_duplicate_name_is_internal() {
        let mut mem = table();
        mem.put("a", 0, 1).unwrap();
        assert!(mem.put("a", 0, 1).unwrap_err().is_internal());
    }
}
