//! # Intermediate Representation (IR) for CHIP-8 Compilation
//!
//! The IR sits one level above machine opcodes: each [`Instruction`] except
//! [`Instruction::RawMemSet`] is exactly one 2-byte opcode, so byte addresses
//! are known while lowering and never recovered from the encoded output.
//!
//! ## Module Structure
//!
//! ```text
//! ir/
//! ├── mod.rs             # This file - module definition and re-exports
//! ├── register_table.rs  # 16-slot register file bookkeeping
//! ├── memory_table.rs    # Variable-space bump allocator
//! ├── function_table.rs  # Function name → entry address
//! ├── instruction.rs     # Instruction enum, skip operands, patch handles
//! ├── program.rs         # IrProgram: instruction stream + tables
//! ├── generator.rs       # IrGenerator: AST → IR lowering
//! └── compactor.rs       # Optional variable-space compaction pass
//! ```
//!
//! ## Register Roles
//!
//! | Register | Role |
//! |----------|------|
//! | `V0`–`VB` | User variables, scratch for immediate subtraction |
//! | `VC` | Comparison left-hand side |
//! | `VD` | `plot` Y coordinate |
//! | `VE` | `plot` X coordinate |
//! | `VF` | Mirrors the index register `I` (never allocated) |

mod compactor;
mod function_table;
mod generator;
mod instruction;
mod memory_table;
mod program;
mod register_table;

pub use function_table::{FunctionAddress, FunctionTable};
pub use generator::{IrGenerator, FRAME_PREFIX};
pub use instruction::{Instruction, PatchHandle, SkipCondition, SkipOperand};
pub use memory_table::{MemoryRegion, MemoryTable, PIXEL_SPRITE};
pub use program::IrProgram;
pub use register_table::{Register, RegisterTable, INDEX_OWNER, REGISTER_COUNT};
