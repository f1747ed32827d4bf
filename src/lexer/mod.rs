//! Lexical analysis for smol
//!
//! Converts source text into a flat stream of typed tokens with line and column info.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind, TYPE_NAMES};
