use serde::{Deserialize, Serialize};

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }
}

/// All possible token types in smol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Decimal integer literal
    Integer(i64),
    /// String literal
    String(String),
    /// `True`
    True,
    /// `False`
    False,

    /// Identifier (variable or function name)
    Identifier(String),
    /// Variable type annotation (`Uint8`, `Bool`, ...)
    TypeName(String),

    // Keywords
    /// `def`
    Def,
    /// `end`
    End,
    /// `set`
    Set,
    /// `free`
    Free,
    /// `plot`
    Plot,
    /// `print`
    Print,
    /// `whileNot`
    WhileNot,
    /// `switch`
    Switch,
    /// `case`
    Case,
    /// `default`
    Default,
    /// `eq`
    Eq,
    /// `neq`
    Neq,
    /// `lt`
    Lt,
    /// `gt`
    Gt,

    // Builtin statements
    /// `INC` increment
    Inc,
    /// `PRI` print value
    Pri,
    /// `PRU` print value as character
    Pru,
    /// `BRK` newline
    Brk,

    // Math statements
    /// `ADD`
    Add,
    /// `SUB`
    Sub,
    /// `MUL`
    Mul,
    /// `DIV`
    Div,
    /// `POW`
    Pow,

    // Punctuation
    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:` opens a block
    Colon,
    /// `=`
    Assign,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,

    /// End of input
    Eof,
}

/// Type names accepted in variable declarations
pub const TYPE_NAMES: &[&str] = &[
    "Uint8", "Uint16", "Uint32", "Uint64", "Bool", "Char", "String",
];

impl TokenKind {
    /// Check if this token kind is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Def
                | TokenKind::End
                | TokenKind::Set
                | TokenKind::Free
                | TokenKind::Plot
                | TokenKind::Print
                | TokenKind::WhileNot
                | TokenKind::Switch
                | TokenKind::Case
                | TokenKind::Default
                | TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Inc
                | TokenKind::Pri
                | TokenKind::Pru
                | TokenKind::Brk
                | TokenKind::Add
                | TokenKind::Sub
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::Pow
                | TokenKind::True
                | TokenKind::False
        )
    }

    /// Get keyword from string. Keywords are case sensitive.
    pub fn keyword(s: &str) -> Option<TokenKind> {
        let kind = match s {
            "def" => TokenKind::Def,
            "end" => TokenKind::End,
            "set" => TokenKind::Set,
            "free" => TokenKind::Free,
            "plot" => TokenKind::Plot,
            "print" => TokenKind::Print,
            "whileNot" => TokenKind::WhileNot,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "eq" => TokenKind::Eq,
            "neq" => TokenKind::Neq,
            "lt" => TokenKind::Lt,
            "gt" => TokenKind::Gt,
            "INC" => TokenKind::Inc,
            "PRI" => TokenKind::Pri,
            "PRU" => TokenKind::Pru,
            "BRK" => TokenKind::Brk,
            "ADD" => TokenKind::Add,
            "SUB" => TokenKind::Sub,
            "MUL" => TokenKind::Mul,
            "DIV" => TokenKind::Div,
            "POW" => TokenKind::Pow,
            "True" => TokenKind::True,
            "False" => TokenKind::False,
            s if TYPE_NAMES.contains(&s) => TokenKind::TypeName(s.to_string()),
            _ => return None,
        };
        Some(kind)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Integer(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            TokenKind::TypeName(name) => write!(f, "{}", name),
            TokenKind::LeftParen => write!(f, "'('"),
            TokenKind::RightParen => write!(f, "')'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semicolon => write!(f, "';'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Assign => write!(f, "'='"),
            TokenKind::PlusPlus => write!(f, "'++'"),
            TokenKind::MinusMinus => write!(f, "'--'"),
            TokenKind::Eof => write!(f, "end of file"),
            _ => write!(f, "{:?}", self),
        }
    }
}
