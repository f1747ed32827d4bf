use std::fmt;

use crate::error::{Error, Result};
use crate::parser::Operand;

/// Runtime value representation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// 64-bit integer value
    Int(i64),
    /// Boolean value
    Bool(bool),
    /// String value
    String(String),
}

impl Value {
    /// Value of a literal operand; `None` for variable references
    pub fn from_literal(operand: &Operand) -> Option<Self> {
        match operand {
            Operand::Number(n) => Some(Value::Int(*n)),
            Operand::Bool(b) => Some(Value::Bool(*b)),
            Operand::Str(s) => Some(Value::String(s.clone())),
            Operand::Variable(_) => None,
        }
    }

    /// Returns the type name of this value as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
        }
    }

    /// Integer view of the value; booleans count as 0 and 1
    pub fn as_int(&self) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::String(_) => Err(Error::TypeError {
                expected: "int".to_string(),
                got: self.type_name().to_string(),
            }),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::String(s) => write!(f, "{}", s),
        }
    }
}
