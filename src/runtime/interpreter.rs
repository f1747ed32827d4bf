use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::parser::{BuiltinOp, DirectOp, MathOp, Operand, Program, Statement, SwitchCase};
use crate::runtime::{Environment, Value};

/// Width of the plot framebuffer in pixels
pub const DISPLAY_WIDTH: usize = 64;
/// Height of the plot framebuffer in pixels
pub const DISPLAY_HEIGHT: usize = 32;

/// Default cap on `whileNot` iterations
pub const DEFAULT_MAX_LOOP_ITERATIONS: usize = 10_000_000;

/// Interpreter limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpreterOptions {
    /// Iterations a single `whileNot` loop may run before it is aborted
    pub max_loop_iterations: usize,
}

impl InterpreterOptions {
    /// Defaults, with the loop cap overridable through `SMOL_MAX_ITERATIONS`
    pub fn from_env() -> Self {
        let max_loop_iterations = std::env::var("SMOL_MAX_ITERATIONS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_LOOP_ITERATIONS);
        InterpreterOptions {
            max_loop_iterations,
        }
    }
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions {
            max_loop_iterations: DEFAULT_MAX_LOOP_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone)]
struct FunctionDef {
    params: Vec<String>,
    body: Vec<Statement>,
}

/// Tree-walking interpreter
///
/// Executes statements top-down against a scoped [`Environment`]. Printing
/// builtins write to the output sink `W`; `plot` toggles pixels in a 64x32
/// monochrome framebuffer.
pub struct Interpreter<W: Write = io::Stdout> {
    env: Environment,
    functions: HashMap<String, FunctionDef>,
    output: W,
    framebuffer: Vec<bool>,
    options: InterpreterOptions,
}

impl<W: Write> fmt::Debug for Interpreter<W> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut functions: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        functions.sort_unstable();
        f.debug_struct("Interpreter")
            .field("env", &self.env)
            .field("functions", &functions)
            .field("lit_pixels", &self.framebuffer.iter().filter(|p| **p).count())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Interpreter<io::Stdout> {
    /// Interpreter printing to stdout
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    /// Interpreter printing to an arbitrary sink
    pub fn with_output(output: W) -> Self {
        Interpreter {
            env: Environment::new(),
            functions: HashMap::new(),
            output,
            framebuffer: vec![false; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            options: InterpreterOptions::default(),
        }
    }

    /// Replaces the interpreter limits
    pub fn with_options(mut self, options: InterpreterOptions) -> Self {
        self.options = options;
        self
    }

    /// Executes a whole program; state persists across calls
    pub fn execute(&mut self, program: &Program) -> Result<()> {
        debug!(
            statements = program.statements.len(),
            "interpreting program"
        );
        self.execute_block(&program.statements)?;
        self.output.flush()?;
        Ok(())
    }

    /// Variable environment
    pub fn env(&self) -> &Environment {
        &self.env
    }

    /// Output sink
    pub fn output(&self) -> &W {
        &self.output
    }

    /// Consumes the interpreter and returns its output sink
    pub fn into_output(self) -> W {
        self.output
    }

    /// Current framebuffer, row-major, `true` for a lit pixel
    pub fn framebuffer(&self) -> &[bool] {
        &self.framebuffer
    }

    /// Whether the pixel at `(x, y)` is lit
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        self.framebuffer[(y % DISPLAY_HEIGHT) * DISPLAY_WIDTH + (x % DISPLAY_WIDTH)]
    }

    fn execute_block(&mut self, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.execute_statement(statement)?;
        }
        Ok(())
    }

    /// Runs `statements` in a fresh scope, dropping it even on error
    fn execute_scoped(
        &mut self,
        bindings: Option<HashMap<String, Value>>,
        statements: &[Statement],
    ) -> Result<()> {
        let depth = self.env.scope_depth();
        match bindings {
            Some(bindings) => self.env.enter_scope_with(bindings),
            None => self.env.enter_scope(),
        }
        let result = self.execute_block(statements);
        self.env.truncate(depth);
        result
    }

    fn execute_statement(&mut self, statement: &Statement) -> Result<()> {
        trace!(kind = statement.kind_name(), "execute");
        match statement {
            Statement::VariableDecl { name, value, .. } => {
                let value = self.resolve(value)?;
                self.env.define(name.clone(), value);
            }

            Statement::Function { name, params, body } => {
                self.functions.insert(
                    name.clone(),
                    FunctionDef {
                        params: params.clone(),
                        body: body.clone(),
                    },
                );
            }

            Statement::FunctionCall { name, args } => self.call_function(name, args)?,

            Statement::DirectOperation { target, op } => {
                let delta = match op {
                    DirectOp::Increment => 1,
                    DirectOp::Decrement => -1,
                };
                self.increment(target, delta)?;
            }

            Statement::Set { target, value } => {
                let name = target.as_variable().ok_or_else(|| Error::LitAssign {
                    literal: target.to_string(),
                })?;
                let value = self.resolve(value)?;
                self.env.assign(name, value)?;
            }

            Statement::Free { target } => {
                let name = target.as_variable().ok_or_else(|| Error::LitFree {
                    literal: target.to_string(),
                })?;
                self.env.remove(name)?;
            }

            Statement::Plot { x, y } => {
                let x = self.resolve(x)?.as_int()?.rem_euclid(DISPLAY_WIDTH as i64) as usize;
                let y = self.resolve(y)?.as_int()?.rem_euclid(DISPLAY_HEIGHT as i64) as usize;
                let pixel = &mut self.framebuffer[y * DISPLAY_WIDTH + x];
                *pixel = !*pixel;
            }

            Statement::Builtin { op, operand } => self.execute_builtin(*op, operand.as_ref())?,

            Statement::Math {
                op,
                receiver,
                value,
            } => self.execute_math(*op, receiver, value)?,

            Statement::WhileNot { lhs, rhs, body } => {
                let mut iterations = 0;
                while self.resolve(lhs)? != self.resolve(rhs)? {
                    iterations += 1;
                    if iterations > self.options.max_loop_iterations {
                        return Err(Error::TooManyIterations {
                            limit: self.options.max_loop_iterations,
                        });
                    }
                    self.execute_scoped(None, body)?;
                }
            }

            Statement::Comparison { op, lhs, rhs, body } => {
                let lhs = self.resolve(lhs)?.as_int()?;
                let rhs = self.resolve(rhs)?.as_int()?;
                if op.holds(lhs, rhs) {
                    self.execute_scoped(None, body)?;
                }
            }

            Statement::Switch {
                value,
                cases,
                default,
            } => self.execute_switch(value, cases, default.as_deref())?,
        }
        Ok(())
    }

    fn execute_builtin(&mut self, op: BuiltinOp, operand: Option<&Operand>) -> Result<()> {
        match (op, operand) {
            (BuiltinOp::Newline, _) => writeln!(self.output)?,
            (BuiltinOp::Inc, Some(target)) => self.increment(target, 1)?,
            (BuiltinOp::Print, Some(operand)) => {
                let value = self.resolve(operand)?;
                write!(self.output, "{}", value)?;
            }
            (BuiltinOp::PrintChar, Some(operand)) => {
                let code = self.resolve(operand)?.as_int()?;
                let c = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| Error::TypeError {
                        expected: "character code".to_string(),
                        got: code.to_string(),
                    })?;
                write!(self.output, "{}", c)?;
            }
            (op, None) => return Err(Error::runtime(format!("{} requires an operand", op))),
        }
        Ok(())
    }

    fn increment(&mut self, target: &Operand, delta: i64) -> Result<()> {
        let name = target.as_variable().ok_or_else(|| Error::LitIncrement {
            literal: target.to_string(),
        })?;
        let current = self.env.get(name)?.as_int()?;
        let next = current
            .checked_add(delta)
            .ok_or_else(|| Error::runtime(format!("arithmetic overflow on {}", name)))?;
        self.env.assign(name, Value::Int(next))
    }

    fn execute_math(&mut self, op: MathOp, receiver: &Operand, value: &Operand) -> Result<()> {
        let name = receiver
            .as_variable()
            .ok_or_else(|| Error::MathInvalidReceiver {
                receiver: receiver.to_string(),
            })?;
        let lhs = self.env.get(name)?.as_int()?;
        let rhs = self.resolve(value)?.as_int()?;

        let result = match op {
            MathOp::Add => lhs.checked_add(rhs),
            MathOp::Sub => lhs.checked_sub(rhs),
            MathOp::Mul => lhs.checked_mul(rhs),
            MathOp::Div => {
                if rhs == 0 {
                    return Err(Error::DivisionByZero);
                }
                lhs.checked_div(rhs)
            }
            MathOp::Pow => {
                let exponent = u32::try_from(rhs).map_err(|_| {
                    Error::runtime(format!("POW exponent must be non-negative, got {}", rhs))
                })?;
                lhs.checked_pow(exponent)
            }
        }
        .ok_or_else(|| Error::runtime(format!("arithmetic overflow in {} {}", op, name)))?;

        self.env.assign(name, Value::Int(result))
    }

    fn execute_switch(
        &mut self,
        value: &Operand,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) -> Result<()> {
        let value = self.resolve(value)?;
        for case in cases {
            if self.resolve(&case.value)? == value {
                return self.execute_scoped(None, &case.body);
            }
        }
        if let Some(body) = default {
            self.execute_scoped(None, body)?;
        }
        Ok(())
    }

    fn call_function(&mut self, name: &str, args: &[Operand]) -> Result<()> {
        let function = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UndefinedFunction {
                name: name.to_string(),
            })?;

        if args.len() != function.params.len() {
            return Err(Error::IncorrectParamCount {
                name: name.to_string(),
                expected: function.params.len(),
                given: args.len(),
            });
        }

        let mut bindings = HashMap::new();
        for (param, arg) in function.params.iter().zip(args) {
            bindings.insert(param.clone(), self.resolve(arg)?);
        }

        debug!(function = name, args = args.len(), "call");
        self.execute_scoped(Some(bindings), &function.body)
    }

    fn resolve(&self, operand: &Operand) -> Result<Value> {
        match operand {
            Operand::Variable(name) => self.env.get(name),
            literal => Value::from_literal(literal)
                .ok_or_else(|| Error::runtime(format!("cannot resolve {}", literal))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::Parser;

    fn run(source: &str) -> Result<String> {
        let tokens = Scanner::new(source).scan_tokens()?;
        let program = Parser::new(tokens).parse()?;
        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.execute(&program)?;
        Ok(String::from_utf8_lossy(&interpreter.into_output()).into_owned())
    }

    #[test]
    fn test_print_and_newline() {
        assert_eq!(run("Uint8 A = 7\nPRI A\nBRK\nprint(3)").unwrap(), "7\n3");
    }

    #[test]
    fn test_print_char() {
        assert_eq!(run("Uint8 C = 72\nPRU C\nPRU 105").unwrap(), "Hi");
    }

    #[test]
    fn test_while_not_counts_up() {
        let out = run("Uint8 A = 0\nwhileNot(A, 3):\n PRI A\n INC A\nend\nPRI A").unwrap();
        assert_eq!(out, "0123");
    }

    #[test]
    fn test_lit_increment_rejected() {
        assert!(matches!(run("INC 4"), Err(Error::LitIncrement { .. })));
    }

    #[test]
    fn test_loop_iteration_limit() {
        let tokens = Scanner::new("Uint8 A = 0\nwhileNot(A, 1):\n BRK\nend")
            .scan_tokens()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new()).with_options(
            InterpreterOptions {
                max_loop_iterations: 5,
            },
        );
        assert!(matches!(
            interpreter.execute(&program),
            Err(Error::TooManyIterations { limit: 5 })
        ));
    }

    #[test]
    fn test_plot_toggles_pixel() {
        let tokens = Scanner::new("plot(3, 4)\nplot(67, 4)\nplot(5, 5)")
            .scan_tokens()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.execute(&program).unwrap();
        // x = 67 wraps onto x = 3 and clears it again
        assert!(!interpreter.pixel(3, 4));
        assert!(interpreter.pixel(5, 5));
    }

    #[test]
    fn test_debug_lists_state_without_sink() {
        let tokens = Scanner::new("Uint8 A = 1\ndef g():\nend\ndef f():\nend\nplot(1, 1)")
            .scan_tokens()
            .unwrap();
        let program = Parser::new(tokens).parse().unwrap();
        let mut interpreter = Interpreter::with_output(Vec::new());
        interpreter.execute(&program).unwrap();

        let rendered = format!("{:?}", interpreter);
        assert!(rendered.starts_with("Interpreter {"));
        assert!(rendered.contains(r#"functions: ["f", "g"]"#));
        assert!(rendered.contains("lit_pixels: 1"));
        assert!(rendered.contains("max_loop_iterations: 10000000"));
        assert!(!rendered.contains("output"));
    }
}
