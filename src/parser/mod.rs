//! smol parser module
//!
//! Turns the token stream into an AST of statement and operand variants.

mod ast;
mod smol_parser;

pub use ast::{
    BuiltinOp, CompareOp, DirectOp, MathOp, Operand, Program, Statement, SwitchCase,
};
pub use smol_parser::Parser;
