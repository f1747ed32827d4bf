//! Function entry addresses

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Entry point of one lowered function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionAddress {
    /// Function name
    pub name: String,
    /// Absolute address of the first body instruction
    pub address: u16,
}

/// Function name to entry address bindings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTable {
    entries: Vec<FunctionAddress>,
}

impl FunctionTable {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `name` to `address`, replacing an earlier definition
    pub fn register(&mut self, name: &str, address: u16) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            warn!(name, old = entry.address, new = address, "function redefined");
            entry.address = address;
            return;
        }
        debug!(name, address, "function registered");
        self.entries.push(FunctionAddress {
            name: name.to_string(),
            address,
        });
    }

    /// Entry address of `name`
    pub fn lookup(&self, name: &str) -> Result<u16> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.address)
            .ok_or_else(|| Error::UnknownFunctionName {
                name: name.to_string(),
            })
    }

    /// Entries in definition order
    pub fn entries(&self) -> &[FunctionAddress] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let mut table = FunctionTable::new();
        table.register("draw", 0x204);
        assert_eq!(table.lookup("draw").unwrap(), 0x204);
        assert!(matches!(
            table.lookup("missing"),
            Err(Error::UnknownFunctionName { .. })
        ));
    }

    #[test]
    fn test_redefinition_overwrites() {
        let mut table = FunctionTable::new();
        table.register("f", 0x202);
        table.register("f", 0x210);
        assert_eq!(table.lookup("f").unwrap(), 0x210);
        assert_eq!(table.entries().len(), 1);
    }
}
