//! Error types for the smol scanner, parser, interpreter and compiler

use thiserror::Error;

/// smol errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Parse errors
    /// Syntax error encountered while scanning or parsing
    ///
    /// **Triggered by:** Unknown characters, unterminated strings, malformed statements
    /// **Example:** `whileNot(A 3):` (missing comma)
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Unexpected end of file during parsing
    ///
    /// **Triggered by:** A block opened with `:` that is never closed with `end`
    #[error("Unexpected end of file: {context}")]
    UnexpectedEof {
        /// What the parser was reading when the input ran out
        context: String,
    },

    // Resource exhaustion
    /// Every allocatable register already has an owner
    ///
    /// **Triggered by:** More than twelve live variables in a compiled program
    /// **Prevention:** `free` variables that are no longer needed
    #[error("Out of registers: all {available} general purpose registers are in use")]
    OutOfRegisters {
        /// Number of registers user variables may occupy
        available: usize,
    },

    /// The variable space memory window is exhausted
    #[error("Out of memory: requested {requested} byte(s), {available} byte(s) left in variable space")]
    OutOfMemory {
        /// Size of the failed allocation
        requested: usize,
        /// Bytes still free in the window
        available: usize,
    },

    /// Emitted code does not fit below the variable space window
    #[error("Program too large: code ends at 0x{code_end:03X}, limit is 0x{limit:03X}")]
    ProgramTooLarge {
        /// First address after the emitted code
        code_end: usize,
        /// First address the code may not reach
        limit: usize,
    },

    // Unresolved references
    /// Reference to undefined variable
    ///
    /// **Triggered by:** Using a variable before declaring it, or after `free`
    /// **Example:** `INC B` when `B` was never declared
    #[error("Undefined variable: {name}")]
    UndefinedVariable {
        /// Variable name
        name: String,
    },

    /// Call to a function that is not in the function address table
    ///
    /// **Triggered by:** Calling a function before its `def` in a compiled program
    #[error("Unknown function name: {name}")]
    UnknownFunctionName {
        /// Function name
        name: String,
    },

    /// Reverse lookup of a memory address that no region occupies
    #[error("Unassigned memory lookup at address 0x{address:03X}")]
    UnassignedMemoryLookup {
        /// Address that was looked up
        address: u16,
    },

    // Invalid operand shape
    /// Increment or decrement applied to a literal
    ///
    /// **Example:** `INC 4`
    #[error("Cannot increment a literal value: {literal}")]
    LitIncrement {
        /// The literal as written
        literal: String,
    },

    /// Assignment into a literal
    ///
    /// **Example:** `set 5 A`
    #[error("Cannot assign a new value to literal value: {literal}")]
    LitAssign {
        /// The literal as written
        literal: String,
    },

    /// `free` applied to a literal
    #[error("Cannot free a literal value: {literal}")]
    LitFree {
        /// The literal as written
        literal: String,
    },

    /// Math statement whose receiver is not a variable
    ///
    /// **Example:** `ADD 3 A`
    #[error("Left hand side of mathematical operation must be a variable, got {receiver}")]
    MathInvalidReceiver {
        /// The receiver as written
        receiver: String,
    },

    /// Immediate operand that does not fit in a single byte
    #[error("Immediate value {value} does not fit in a byte")]
    ImmediateOutOfRange {
        /// The offending value
        value: i64,
    },

    /// Construct the CHIP-8 backend cannot lower
    ///
    /// **Triggered by:** `PRI`, `PRU`, `BRK`, `print`, `lt`/`gt`, `MUL`/`DIV`/`POW`, string literals
    #[error("Unsupported for compilation: {construct}")]
    UnsupportedForCompilation {
        /// Description of the construct
        construct: String,
    },

    /// Compile target without a CPU layout
    #[error("Unsupported compile target: {target}")]
    UnsupportedTarget {
        /// Target name
        target: String,
    },

    // Internal invariant violations
    /// Register index outside the addressable range
    #[error("Illegal register access: V{index:X}")]
    IllegalRegisterAccess {
        /// Register index
        index: u8,
    },

    /// Jump patch aimed at an instruction that is not a jump
    #[error("Invalid jump patch at instruction {index}: found {found}")]
    InvalidPatch {
        /// Instruction index of the handle
        index: usize,
        /// Name of the instruction found there
        found: String,
    },

    /// General compiler error
    #[error("Compiler error: {0}")]
    CompilerError(String),

    // Runtime errors
    /// Call to a function the interpreter never saw defined
    #[error("Cannot find function with name: {name}")]
    UndefinedFunction {
        /// Function name
        name: String,
    },

    /// Call with the wrong number of arguments
    #[error("Function \"{name}\" requires {expected} argument(s), got {given}")]
    IncorrectParamCount {
        /// Function name
        name: String,
        /// Declared parameter count
        expected: usize,
        /// Arguments supplied
        given: usize,
    },

    /// Type mismatch error
    ///
    /// **Triggered by:** Arithmetic on strings, `PRU` of a value that is not a character code
    #[error("Type error: expected {expected}, got {got}")]
    TypeError {
        /// Expected type
        expected: String,
        /// Actual type
        got: String,
    },

    /// Division by zero error
    #[error("Division by zero")]
    DivisionByZero,

    /// Too many loop iterations
    #[error("Too many iterations (limit: {limit})")]
    TooManyIterations {
        /// Maximum allowed iterations
        limit: usize,
    },

    /// General runtime error
    #[error("Runtime error: {0}")]
    RuntimeError(String),

    // External errors
    /// Reading source or writing the ROM failed
    #[error("I/O error: {message}")]
    IoError {
        /// Error message
        message: String,
    },
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Fatal error that cannot be recovered from
    Fatal,
    /// Recoverable error that may be retried
    Recoverable,
    /// Warning that doesn't prevent execution
    Warning,
}

/// Which part of the error taxonomy an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Malformed source text
    Syntax,
    /// Out of registers, memory, or address space
    ResourceExhaustion,
    /// A symbol was used that was never bound
    UnresolvedReference,
    /// A language rule was broken by the shape of an operand
    InvalidOperand,
    /// The generator broke one of its own invariants
    Internal,
    /// Failure while interpreting a program
    Runtime,
    /// Failure of the underlying file system
    Io,
}

impl Error {
    /// Create a runtime error with a message
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::RuntimeError(msg.into())
    }

    /// Create a compiler error with a message
    pub fn compiler(msg: impl Into<String>) -> Self {
        Error::CompilerError(msg.into())
    }

    /// Create an unsupported-construct error
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Error::UnsupportedForCompilation {
            construct: construct.into(),
        }
    }

    /// Taxonomy bucket of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::SyntaxError { .. } | Error::UnexpectedEof { .. } => ErrorCategory::Syntax,

            Error::OutOfRegisters { .. }
            | Error::OutOfMemory { .. }
            | Error::ProgramTooLarge { .. } => ErrorCategory::ResourceExhaustion,

            Error::UndefinedVariable { .. }
            | Error::UnknownFunctionName { .. }
            | Error::UnassignedMemoryLookup { .. }
            | Error::UndefinedFunction { .. } => ErrorCategory::UnresolvedReference,

            Error::LitIncrement { .. }
            | Error::LitAssign { .. }
            | Error::LitFree { .. }
            | Error::MathInvalidReceiver { .. }
            | Error::ImmediateOutOfRange { .. }
            | Error::UnsupportedForCompilation { .. }
            | Error::UnsupportedTarget { .. }
            | Error::IncorrectParamCount { .. } => ErrorCategory::InvalidOperand,

            Error::IllegalRegisterAccess { .. }
            | Error::InvalidPatch { .. }
            | Error::CompilerError(_) => ErrorCategory::Internal,

            Error::TypeError { .. }
            | Error::DivisionByZero
            | Error::TooManyIterations { .. }
            | Error::RuntimeError(_) => ErrorCategory::Runtime,

            Error::IoError { .. } => ErrorCategory::Io,
        }
    }

    /// True when the error points at a generator bug rather than bad input
    pub fn is_internal(&self) -> bool {
        self.category() == ErrorCategory::Internal
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Io => ErrorSeverity::Recoverable,
            ErrorCategory::ResourceExhaustion => match self {
                // a caller could free registers and retry
                Error::OutOfRegisters { .. } => ErrorSeverity::Recoverable,
                _ => ErrorSeverity::Fatal,
            },
            _ => ErrorSeverity::Fatal,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type for smol operations
pub type Result<T> = std::result::Result<T, Error>;
