//! # smolc - the smol language toolchain
//!
//! A tiny statement-oriented scripting language with two backends: a
//! tree-walking interpreter and a compiler that emits CHIP-8 ROMs.
//!
//! ## Quick Start
//!
//! ### Interpreting
//!
//! ```rust
//! use smolc::{Interpreter, Parser, Scanner};
//!
//! # fn main() -> smolc::Result<()> {
//! let code = r#"
//!     Uint8 A = 0
//!     whileNot(A, 3):
//!         PRI A
//!         INC A
//!     end
//! "#;
//!
//! // Tokenize (scan)
//! let tokens = Scanner::new(code).scan_tokens()?;
//!
//! // Parse into AST
//! let program = Parser::new(tokens).parse()?;
//!
//! // Execute, capturing output
//! let mut interpreter = Interpreter::with_output(Vec::new());
//! interpreter.execute(&program)?;
//!
//! assert_eq!(interpreter.output().as_slice(), b"012");
//! # Ok(())
//! # }
//! ```
//!
//! ### Compiling
//!
//! ```rust
//! use smolc::{CompileOptions, Compiler};
//!
//! # fn main() -> smolc::Result<()> {
//! let result = Compiler::new(CompileOptions::default()).compile("plot(3, 4)")?;
//!
//! // LD I, sprite / LD VE, 3 / LD VD, 4 / DRW VE, VD, 1
//! assert_eq!(&result.rom[..8], &[0xAE, 0xA0, 0x6E, 0x03, 0x6D, 0x04, 0xDE, 0xD1]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! - **Declarations**: `Uint8 A = 10`, `Bool F = True`
//! - **Assignment**: `set A B`, `free A`
//! - **Arithmetic**: `INC A`, `A++`, `A--`, `ADD A 5`, `SUB A B`, `MUL`, `DIV`, `POW`
//! - **Output**: `PRI A`, `PRU 65`, `BRK`, `print(A)`
//! - **Graphics**: `plot(x, y)`
//! - **Control flow**: `whileNot(a, b): … end`, `eq/neq/lt/gt(a, b): … end`,
//!   `switch(v): case 1: … end default: … end end`
//! - **Functions**: `def name(params): … end`, `name(args)`
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST ─┬→ Interpreter → output
//!                                                └→ IrGenerator → IR → BytecodeEncoder → ROM
//! ```
//!
//! ### Main Components
//!
//! - [`Scanner`] - Tokenizes source code into tokens
//! - [`Parser`] - Parses tokens into an Abstract Syntax Tree (AST)
//! - [`Interpreter`] - Executes the AST directly
//! - [`Compiler`] - Lowers the AST to a CHIP-8 ROM
//! - [`Value`] - Runtime value representation
//! - [`Environment`] - Variable storage with scoping

// Allow specific clippy warnings that are intentional design choices
#![allow(clippy::new_without_default)] // Generators are built from an explicit layout
#![allow(clippy::upper_case_acronyms)] // Opcode mnemonics

/// Version of the smol toolchain
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod compiler;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;

// Re-export main types
pub use compiler::{CompileOptions, CompileResult, Compiler, TargetCpu};
pub use error::{Error, ErrorCategory, ErrorSeverity, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{Operand, Parser, Program, Statement};
pub use runtime::{Environment, Interpreter, InterpreterOptions, Value};
