use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete smol program
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Program {
    /// Top-level statements in the program
    pub statements: Vec<Statement>,
}

impl Program {
    /// Wraps a list of statements
    pub fn new(statements: Vec<Statement>) -> Self {
        Program { statements }
    }
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Variable declaration: `Uint8 A = 10`
    VariableDecl {
        /// Declared type name
        var_type: String,
        /// Name of the new variable
        name: String,
        /// Initial value (literal or another variable)
        value: Operand,
    },

    /// Function definition: `def name(params): ... end`
    Function {
        /// Function name
        name: String,
        /// Parameter names
        params: Vec<String>,
        /// Statements in the function body
        body: Vec<Statement>,
    },

    /// Function call: `name(args)`
    FunctionCall {
        /// Called function
        name: String,
        /// Argument operands
        args: Vec<Operand>,
    },

    /// `A++` / `A--`
    DirectOperation {
        /// Operand the operation applies to
        target: Operand,
        /// Increment or decrement
        op: DirectOp,
    },

    /// `set dst src`
    Set {
        /// Destination, must be a variable
        target: Operand,
        /// New value
        value: Operand,
    },

    /// `free A` releases the binding of a variable
    Free {
        /// Variable to release
        target: Operand,
    },

    /// `plot(x, y)` draws a single pixel
    Plot {
        /// X coordinate
        x: Operand,
        /// Y coordinate
        y: Operand,
    },

    /// Builtin one-operand statements: `INC`, `PRI`, `PRU`, `print(...)`, and `BRK`
    Builtin {
        /// Which builtin
        op: BuiltinOp,
        /// Operand (absent for `BRK`)
        operand: Option<Operand>,
    },

    /// Math statement: `ADD A 5`
    Math {
        /// Arithmetic operation
        op: MathOp,
        /// Receiver of the result, must be a variable
        receiver: Operand,
        /// Right hand side
        value: Operand,
    },

    /// Loop running its body until `lhs == rhs`: `whileNot(A, 3): ... end`
    WhileNot {
        /// Left hand side, re-read after each iteration
        lhs: Operand,
        /// Right hand side
        rhs: Operand,
        /// Loop body
        body: Vec<Statement>,
    },

    /// Conditional block: `eq(A, 3): ... end`
    Comparison {
        /// Relation tested
        op: CompareOp,
        /// Left hand side
        lhs: Operand,
        /// Right hand side
        rhs: Operand,
        /// Statements run when the relation holds
        body: Vec<Statement>,
    },

    /// Switch statement with cases and an optional default body
    Switch {
        /// Value matched against each case
        value: Operand,
        /// Cases in source order
        cases: Vec<SwitchCase>,
        /// Body run when no case matches
        default: Option<Vec<Statement>>,
    },
}

impl Statement {
    /// Short name of the node kind, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::VariableDecl { .. } => "variable declaration",
            Statement::Function { .. } => "function definition",
            Statement::FunctionCall { .. } => "function call",
            Statement::DirectOperation { .. } => "direct operation",
            Statement::Set { .. } => "set statement",
            Statement::Free { .. } => "free statement",
            Statement::Plot { .. } => "plot statement",
            Statement::Builtin { .. } => "builtin statement",
            Statement::Math { .. } => "math statement",
            Statement::WhileNot { .. } => "whileNot loop",
            Statement::Comparison { .. } => "comparison",
            Statement::Switch { .. } => "switch statement",
        }
    }
}

/// One `case` arm of a switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    /// Value this case matches
    pub value: Operand,
    /// Statements run on a match
    pub body: Vec<Statement>,
}

/// Statement operand: a literal or a variable reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Decimal integer literal
    Number(i64),
    /// Reference to a variable by name
    Variable(String),
    /// String literal
    Str(String),
    /// `True` / `False`
    Bool(bool),
}

impl Operand {
    /// Name of the referenced variable, if this is a variable
    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Operand::Variable(name) => Some(name),
            _ => None,
        }
    }

    /// True for anything that is not a variable reference
    pub fn is_literal(&self) -> bool {
        !matches!(self, Operand::Variable(_))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Number(n) => write!(f, "{}", n),
            Operand::Variable(name) => write!(f, "{}", name),
            Operand::Str(s) => write!(f, "\"{}\"", s),
            Operand::Bool(true) => write!(f, "True"),
            Operand::Bool(false) => write!(f, "False"),
        }
    }
}

/// `++` or `--`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirectOp {
    /// `++`
    Increment,
    /// `--`
    Decrement,
}

/// Builtin one-word statements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuiltinOp {
    /// `INC`
    Inc,
    /// `PRI` and `print(...)`
    Print,
    /// `PRU`
    PrintChar,
    /// `BRK`
    Newline,
}

/// Math statement operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MathOp {
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
}

/// Comparison block relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    /// `eq`
    Equal,
    /// `neq`
    NotEqual,
    /// `lt`
    LessThan,
    /// `gt`
    GreaterThan,
}

impl CompareOp {
    /// Evaluates the relation on two integers
    pub fn holds(&self, lhs: i64, rhs: i64) -> bool {
        match self {
            CompareOp::Equal => lhs == rhs,
            CompareOp::NotEqual => lhs != rhs,
            CompareOp::LessThan => lhs < rhs,
            CompareOp::GreaterThan => lhs > rhs,
        }
    }
}

impl fmt::Display for BuiltinOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BuiltinOp::Inc => write!(f, "INC"),
            BuiltinOp::Print => write!(f, "PRI"),
            BuiltinOp::PrintChar => write!(f, "PRU"),
            BuiltinOp::Newline => write!(f, "BRK"),
        }
    }
}

impl fmt::Display for MathOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MathOp::Add => write!(f, "ADD"),
            MathOp::Sub => write!(f, "SUB"),
            MathOp::Mul => write!(f, "MUL"),
            MathOp::Div => write!(f, "DIV"),
            MathOp::Pow => write!(f, "POW"),
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompareOp::Equal => write!(f, "eq"),
            CompareOp::NotEqual => write!(f, "neq"),
            CompareOp::LessThan => write!(f, "lt"),
            CompareOp::GreaterThan => write!(f, "gt"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operand_helpers() {
        assert_eq!(Operand::Variable("A".to_string()).as_variable(), Some("A"));
        assert!(Operand::Number(3).is_literal());
        assert!(!Operand::Variable("A".to_string()).is_literal());
        assert_eq!(Operand::Bool(true).to_string(), "True");
    }

    #[test]
    fn test_compare_relations() {
        assert!(CompareOp::Equal.holds(2, 2));
        assert!(CompareOp::NotEqual.holds(2, 3));
        assert!(CompareOp::LessThan.holds(2, 3));
        assert!(!CompareOp::GreaterThan.holds(2, 3));
    }
}
