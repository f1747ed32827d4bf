//! Variable-space compaction
//!
//! Slides every memory region down to sit right after the last opcode so the
//! ROM no longer has to reach up to the fixed variable window.

use std::collections::HashMap;

use tracing::debug;

use super::generator::IrGenerator;
use super::instruction::Instruction;
use crate::error::{Error, Result};

impl IrGenerator {
    /// Relocates variable space to the end of the code
    ///
    /// A `JP origin` is appended first so execution never runs into the data.
    /// Instructions that address a moved region are rewritten in place.
    pub fn compact_memory(&mut self) -> Result<()> {
        let origin = self.layout().code_origin;
        let memory_size = self.layout().memory_size;
        let program = self.program_mut();
        program.emit(Instruction::Jump { target: origin });

        let too_large = |end: usize| Error::ProgramTooLarge {
            code_end: end,
            limit: memory_size,
        };
        let end = program.code_end();
        let code_end = u16::try_from(end).map_err(|_| too_large(end))?;

        // Resolve names before moving anything; a new address may collide
        // with an old one.
        let mut plan = Vec::with_capacity(program.memory.regions().len());
        let mut next = code_end;
        for region in program.memory.regions() {
            let name = program.memory.find_by_address(region.address)?;
            plan.push((name, region.address, next));
            next = u16::try_from(region.size)
                .ok()
                .and_then(|size| next.checked_add(size))
                .ok_or_else(|| too_large(usize::from(next) + region.size))?;
        }

        let mut relocated = HashMap::with_capacity(plan.len());
        for (name, old, new) in plan {
            program.memory.move_region(&name, new, true)?;
            relocated.insert(old, new);
        }

        let mut rewritten = 0usize;
        for instruction in &mut program.instructions {
            if let Some(new) = instruction
                .memory_address()
                .and_then(|old| relocated.get(&old))
            {
                instruction.set_memory_address(*new);
                rewritten += 1;
            }
        }
        program.registers.invalidate_index();

        debug!(
            code_end,
            regions = relocated.len(),
            rewritten,
            "compacted variable space"
        );
        Ok(())
    }
}
