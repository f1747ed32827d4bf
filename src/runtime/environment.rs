use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::runtime::Value;

/// Environment for variable scoping
///
/// Scopes form a stack; lookups walk from the innermost scope outwards, so a
/// called function sees the variables of its caller.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Stack of nested scopes, global scope first
    scopes: Vec<HashMap<String, Value>>,
}

impl Environment {
    /// Creates a new environment with a global scope
    pub fn new() -> Self {
        Environment {
            scopes: vec![HashMap::new()],
        }
    }

    /// Enters a new nested scope
    pub fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    /// Enters a new nested scope pre-populated with bindings
    pub fn enter_scope_with(&mut self, bindings: HashMap<String, Value>) {
        self.scopes.push(bindings);
    }

    /// Exits the current scope and returns to parent scope
    pub fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    /// Defines a variable in the current scope, shadowing outer bindings
    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.into(), value);
        }
    }

    /// Gets the value of a variable by name
    pub fn get(&self, name: &str) -> Result<Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name))
            .cloned()
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Updates an existing variable in the innermost scope that holds it
    pub fn assign(&mut self, name: &str, value: Value) -> Result<()> {
        match self
            .scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
        {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(Error::UndefinedVariable {
                name: name.to_string(),
            }),
        }
    }

    /// Removes the innermost binding of a variable
    pub fn remove(&mut self, name: &str) -> Result<Value> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.remove(name))
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
            })
    }

    /// Returns the current scope depth (1 for global scope)
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Drops every scope above `depth`
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_define_and_get() {
        let mut env = Environment::new();
        env.define("x", Value::Int(42));

        assert_eq!(env.get("x").unwrap(), Value::Int(42));
    }

    #[test]
    fn test_undefined_variable() {
        let env = Environment::new();
        assert!(matches!(
            env.get("undefined"),
            Err(Error::UndefinedVariable { .. })
        ));
    }

    #[test]
    fn test_variable_scoping() {
        let mut env = Environment::new();
        env.define("x", Value::Int(10));

        env.enter_scope();
        env.define("x", Value::Int(20));
        env.define("y", Value::Int(30));
        assert_eq!(env.get("x").unwrap(), Value::Int(20));

        env.exit_scope();
        assert_eq!(env.get("x").unwrap(), Value::Int(10));
        assert!(env.get("y").is_err());
    }

    #[test]
    fn test_assign_updates_outer_scope() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.enter_scope();
        env.assign("x", Value::Int(2)).unwrap();
        env.exit_scope();
        assert_eq!(env.get("x").unwrap(), Value::Int(2));
        assert!(env.assign("nope", Value::Int(0)).is_err());
    }

    #[test]
    fn test_remove_and_global_scope_survives_exit() {
        let mut env = Environment::new();
        env.define("x", Value::Int(1));
        env.exit_scope();
        assert_eq!(env.scope_depth(), 1);
        assert_eq!(env.remove("x").unwrap(), Value::Int(1));
        assert!(env.get("x").is_err());
    }
}
