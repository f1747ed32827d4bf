//! IR Generator - lowers the smol AST to CHIP-8 IR
//!
//! One pass over the statements, dispatching on the node kind and recursing
//! into nested bodies. Every lowering routine receives the [`IrProgram`] it
//! mutates explicitly; the generator itself only holds configuration.
//!
//! ## Control flow shapes
//!
//! | Construct | Emitted layout |
//! |-----------|----------------|
//! | `def f(): … end` | `[JP skip][body…][RET]`, entry = address after `JP` |
//! | `whileNot(a, b): … end` | `[body…][LD VC, a][SE VC, b][JP start]` |
//! | `eq(a, b): … end` | `[LD VC, a][SE VC, b][JP end][body…]` |
//! | `switch` case | `[LD VC, v][SE VC, c][JP next][body…][JP end]` |
//!
//! Forward jumps are emitted with a zero target and patched through the
//! [`PatchHandle`] returned by [`IrProgram::emit`] once the target address is
//! known.

use std::mem;

use tracing::debug;

use super::instruction::{Instruction, PatchHandle, SkipCondition, SkipOperand};
use super::memory_table::PIXEL_SPRITE;
use super::program::IrProgram;
use crate::compiler::target::CpuLayout;
use crate::error::{Error, Result};
use crate::parser::{
    BuiltinOp, CompareOp, DirectOp, MathOp, Operand, Statement, SwitchCase,
};

/// Prefix of the memory regions holding saved register frames
pub const FRAME_PREFIX: &str = "__frame_";

/// IR Generator - transforms AST statements into IR
pub struct IrGenerator {
    /// Target constants
    layout: CpuLayout,
    /// Save and restore caller registers around function bodies
    preserve_registers: bool,
    /// Program built so far
    program: IrProgram,
}

impl IrGenerator {
    /// Generator for `layout`
    pub fn new(layout: CpuLayout) -> Self {
        let program = IrProgram::new(&layout);
        IrGenerator {
            layout,
            preserve_registers: false,
            program,
        }
    }

    /// Enables register frames around function bodies
    pub fn with_register_preservation(mut self, enabled: bool) -> Self {
        self.preserve_registers = enabled;
        self
    }

    /// Lowers `statements`, appending to the program built so far
    pub fn generate(&mut self, statements: &[Statement]) -> Result<()> {
        debug!(statements = statements.len(), "generating IR");
        let mut program = mem::take(&mut self.program);
        let result = self.lower_block(&mut program, statements);
        self.program = program;
        result
    }

    /// Program built so far
    pub fn program(&self) -> &IrProgram {
        &self.program
    }

    /// Mutable access for post-lowering passes
    pub(crate) fn program_mut(&mut self) -> &mut IrProgram {
        &mut self.program
    }

    /// Target constants
    pub fn layout(&self) -> &CpuLayout {
        &self.layout
    }

    /// Consumes the generator and returns the program
    pub fn finish(self) -> IrProgram {
        self.program
    }

    fn lower_block(&self, program: &mut IrProgram, statements: &[Statement]) -> Result<()> {
        for statement in statements {
            self.lower_statement(program, statement)?;
        }
        Ok(())
    }

    fn lower_statement(&self, program: &mut IrProgram, statement: &Statement) -> Result<()> {
        debug!(
            kind = statement.kind_name(),
            address = program.next_address(self.layout.code_origin),
            "lowering"
        );
        match statement {
            Statement::VariableDecl { name, value, .. } => {
                self.lower_variable_decl(program, name, value)
            }

            Statement::Function { name, params, body } => {
                self.lower_function(program, name, params, body)
            }

            Statement::FunctionCall { name, args } => {
                let address = program.functions.lookup(name)?;
                if !args.is_empty() {
                    program.warn(format!(
                        "arguments to '{}' are not passed in compiled code",
                        name
                    ));
                }
                program.emit(Instruction::Call { address });
                program.registers.invalidate_index();
                Ok(())
            }

            Statement::DirectOperation { target, op } => match op {
                DirectOp::Increment => self.lower_increment(program, target),
                DirectOp::Decrement => {
                    let register = self.incrementable_register(program, target)?;
                    self.subtract_immediate(program, register, 1)
                }
            },

            Statement::Set { target, value } => {
                let name = target.as_variable().ok_or_else(|| Error::LitAssign {
                    literal: target.to_string(),
                })?;
                let register = Self::variable_register(program, name)?;
                self.load(program, register, value, Some(name))
            }

            Statement::Free { target } => {
                let name = target.as_variable().ok_or_else(|| Error::LitFree {
                    literal: target.to_string(),
                })?;
                let register = Self::variable_register(program, name)?;
                debug!(name, register, "free");
                program.registers.free(register)
            }

            Statement::Plot { x, y } => self.lower_plot(program, x, y),

            Statement::Builtin { op, operand } => match (op, operand) {
                (BuiltinOp::Inc, Some(target)) => self.lower_increment(program, target),
                (BuiltinOp::Inc, None) => Err(Error::compiler("INC without an operand")),
                (op, _) => Err(Error::unsupported(format!("{} builtin", op))),
            },

            Statement::Math {
                op,
                receiver,
                value,
            } => self.lower_math(program, *op, receiver, value),

            Statement::WhileNot { lhs, rhs, body } => self.lower_while_not(program, lhs, rhs, body),

            Statement::Comparison { op, lhs, rhs, body } => {
                self.lower_comparison(program, *op, lhs, rhs, body)
            }

            Statement::Switch {
                value,
                cases,
                default,
            } => self.lower_switch(program, value, cases, default.as_deref()),
        }
    }

    // =========================================================================
    // VARIABLES
    // =========================================================================

    fn lower_variable_decl(&self, program: &mut IrProgram, name: &str, value: &Operand) -> Result<()> {
        // Redeclaration reuses the register the name already owns
        let register = match program.registers.find(name) {
            Some(register) => register,
            None => program.registers.find_empty()?,
        };
        self.load(program, register, value, Some(name))
    }

    /// Loads `value` into `register`, leaving it owned by `owner`
    fn load(
        &self,
        program: &mut IrProgram,
        register: u8,
        value: &Operand,
        owner: Option<&str>,
    ) -> Result<()> {
        let (instruction, known) = match value {
            Operand::Variable(source) => {
                let from = Self::variable_register(program, source)?;
                let known = program.registers.get(from).map_or(0, |r| r.value);
                (Instruction::RegisterCopy { from, to: register }, known)
            }
            literal => {
                let value = Self::immediate(literal)?;
                (Instruction::SetRegister { register, value }, u16::from(value))
            }
        };
        program
            .registers
            .put(register, known, owner.map(str::to_string))?;
        program.emit(instruction);
        Ok(())
    }

    fn lower_increment(&self, program: &mut IrProgram, target: &Operand) -> Result<()> {
        let register = self.incrementable_register(program, target)?;
        program.emit(Instruction::Add {
            register,
            amount: 1,
        });
        Self::track_value(program, register, |v| v.wrapping_add(1) & 0xFF)
    }

    /// Register of an increment or decrement target
    fn incrementable_register(&self, program: &IrProgram, target: &Operand) -> Result<u8> {
        let name = target.as_variable().ok_or_else(|| Error::LitIncrement {
            literal: target.to_string(),
        })?;
        Self::variable_register(program, name)
    }

    /// `VX -= amount` through a scratch register, there is no immediate subtract
    fn subtract_immediate(&self, program: &mut IrProgram, register: u8, amount: u8) -> Result<()> {
        let scratch = program.registers.find_empty()?;
        program.emit(Instruction::SetRegister {
            register: scratch,
            value: amount,
        });
        program.emit(Instruction::Sub {
            target: register,
            amount_register: scratch,
        });
        program.emit(Instruction::SetRegister {
            register: scratch,
            value: 0,
        });
        Self::track_value(program, register, |v| v.wrapping_sub(u16::from(amount)) & 0xFF)
    }

    // =========================================================================
    // MATH
    // =========================================================================

    fn lower_math(
        &self,
        program: &mut IrProgram,
        op: MathOp,
        receiver: &Operand,
        value: &Operand,
    ) -> Result<()> {
        let name = receiver
            .as_variable()
            .ok_or_else(|| Error::MathInvalidReceiver {
                receiver: receiver.to_string(),
            })?;
        let register = Self::variable_register(program, name)?;

        match (op, value) {
            (MathOp::Add, Operand::Variable(source)) => {
                let source = Self::variable_register(program, source)?;
                program.emit(Instruction::AddRegister {
                    target: register,
                    source,
                });
                Ok(())
            }
            (MathOp::Add, literal) => {
                let amount = Self::immediate(literal)?;
                program.emit(Instruction::Add { register, amount });
                Self::track_value(program, register, |v| v.wrapping_add(u16::from(amount)) & 0xFF)
            }
            (MathOp::Sub, Operand::Variable(source)) => {
                let amount_register = Self::variable_register(program, source)?;
                program.emit(Instruction::Sub {
                    target: register,
                    amount_register,
                });
                Ok(())
            }
            (MathOp::Sub, literal) => {
                let amount = Self::immediate(literal)?;
                self.subtract_immediate(program, register, amount)
            }
            (op, _) => Err(Error::unsupported(format!("{} statement", op))),
        }
    }

    // =========================================================================
    // FUNCTIONS
    // =========================================================================

    fn lower_function(
        &self,
        program: &mut IrProgram,
        name: &str,
        params: &[String],
        body: &[Statement],
    ) -> Result<()> {
        let origin = self.layout.code_origin;
        let skip = program.emit(Instruction::Jump { target: 0 });

        // Registered before the body so recursive calls resolve
        let entry = program.next_address(origin);
        program.functions.register(name, entry);
        if !params.is_empty() {
            program.warn(format!(
                "parameters of '{}' are not bound in compiled code",
                name
            ));
        }
        program.registers.invalidate_index();

        let frame = if self.preserve_registers {
            self.save_registers(program, name)?
        } else {
            None
        };

        self.lower_block(program, body)?;

        if let Some((address, count)) = frame {
            program.emit(Instruction::SetIndex { address });
            program.emit(Instruction::RegisterLoad {
                start_address: address,
                count,
            });
            program.registers.load_index(address);
        }
        program.emit(Instruction::Return);

        let after = program.next_address(origin);
        program.patch_jump(skip, after)?;
        program.registers.invalidate_index();
        debug!(name, entry, after, "function lowered");
        Ok(())
    }

    /// Dumps the registers owned at function entry into a frame region
    fn save_registers(&self, program: &mut IrProgram, name: &str) -> Result<Option<(u16, u8)>> {
        let Some(highest) = program.registers.highest_owned() else {
            return Ok(None);
        };
        let count = highest + 1;
        let frame_name = format!("{}{}", FRAME_PREFIX, name);
        let region = match program.memory.lookup(&frame_name, true)? {
            Some(region) if region.size >= count as usize => region,
            Some(_) => {
                return Err(Error::compiler(format!(
                    "register frame of '{}' is too small for redefinition",
                    name
                )))
            }
            None => program.memory.put(&frame_name, 0, count as usize)?,
        };

        program.emit(Instruction::SetIndex {
            address: region.address,
        });
        program.emit(Instruction::RegisterDump {
            start_address: region.address,
            count,
        });
        program.registers.load_index(region.address);
        Ok(Some((region.address, count)))
    }

    // =========================================================================
    // CONTROL FLOW
    // =========================================================================

    fn lower_while_not(
        &self,
        program: &mut IrProgram,
        lhs: &Operand,
        rhs: &Operand,
        body: &[Statement],
    ) -> Result<()> {
        let start = program.next_address(self.layout.code_origin);
        program.registers.invalidate_index();

        self.lower_block(program, body)?;

        let compare = self.layout.compare_register;
        self.load(program, compare, lhs, None)?;
        let rhs = Self::skip_operand(program, rhs)?;
        program.emit(Instruction::ConditionalSkip {
            lhs: compare,
            rhs,
            condition: SkipCondition::Equal,
        });
        program.emit(Instruction::Jump { target: start });
        Ok(())
    }

    fn lower_comparison(
        &self,
        program: &mut IrProgram,
        op: CompareOp,
        lhs: &Operand,
        rhs: &Operand,
        body: &[Statement],
    ) -> Result<()> {
        let condition = match op {
            CompareOp::Equal => SkipCondition::Equal,
            CompareOp::NotEqual => SkipCondition::NotEqual,
            CompareOp::LessThan | CompareOp::GreaterThan => {
                return Err(Error::unsupported(format!("{} comparison", op)))
            }
        };

        let compare = self.layout.compare_register;
        self.load(program, compare, lhs, None)?;
        let rhs = Self::skip_operand(program, rhs)?;
        program.emit(Instruction::ConditionalSkip {
            lhs: compare,
            rhs,
            condition,
        });
        let skip_body = program.emit(Instruction::Jump { target: 0 });

        self.lower_block(program, body)?;

        let end = program.next_address(self.layout.code_origin);
        program.patch_jump(skip_body, end)?;
        program.registers.invalidate_index();
        Ok(())
    }

    fn lower_switch(
        &self,
        program: &mut IrProgram,
        value: &Operand,
        cases: &[SwitchCase],
        default: Option<&[Statement]>,
    ) -> Result<()> {
        let origin = self.layout.code_origin;
        let compare = self.layout.compare_register;
        let mut exits: Vec<PatchHandle> = Vec::with_capacity(cases.len());

        for case in cases {
            program.registers.invalidate_index();
            self.load(program, compare, value, None)?;
            let rhs = Self::skip_operand(program, &case.value)?;
            program.emit(Instruction::ConditionalSkip {
                lhs: compare,
                rhs,
                condition: SkipCondition::Equal,
            });
            let next_case = program.emit(Instruction::Jump { target: 0 });

            self.lower_block(program, &case.body)?;
            exits.push(program.emit(Instruction::Jump { target: 0 }));

            let next = program.next_address(origin);
            program.patch_jump(next_case, next)?;
        }

        program.registers.invalidate_index();
        if let Some(body) = default {
            self.lower_block(program, body)?;
        }

        let end = program.next_address(origin);
        for exit in exits {
            program.patch_jump(exit, end)?;
        }
        program.registers.invalidate_index();
        Ok(())
    }

    // =========================================================================
    // GRAPHICS
    // =========================================================================

    fn lower_plot(&self, program: &mut IrProgram, x: &Operand, y: &Operand) -> Result<()> {
        let sprite = match program.memory.lookup(PIXEL_SPRITE, true)? {
            Some(region) => region,
            None => {
                let region = program
                    .memory
                    .put(PIXEL_SPRITE, self.layout.pixel_sprite, 1)?;
                program.emit(Instruction::RawMemSet {
                    value: region.value,
                    address: region.address,
                });
                region
            }
        };

        if program.registers.index_value() != Some(sprite.address) {
            program.emit(Instruction::SetIndex {
                address: sprite.address,
            });
            program.registers.load_index(sprite.address);
        }

        let (plot_x, plot_y) = (self.layout.plot_x_register, self.layout.plot_y_register);
        self.load(program, plot_x, x, None)?;
        self.load(program, plot_y, y, None)?;
        program.emit(Instruction::Plot {
            x: plot_x,
            y: plot_y,
            height: 1,
        });
        Ok(())
    }

    // =========================================================================
    // OPERANDS
    // =========================================================================

    fn variable_register(program: &IrProgram, name: &str) -> Result<u8> {
        program
            .registers
            .find(name)
            .ok_or_else(|| Error::UndefinedVariable {
                name: name.to_string(),
            })
    }

    fn immediate(literal: &Operand) -> Result<u8> {
        match literal {
            Operand::Number(n) => u8::try_from(*n).map_err(|_| Error::ImmediateOutOfRange { value: *n }),
            Operand::Bool(b) => Ok(u8::from(*b)),
            Operand::Str(_) => Err(Error::unsupported("string literal")),
            Operand::Variable(name) => Err(Error::compiler(format!(
                "variable '{}' used where an immediate was expected",
                name
            ))),
        }
    }

    fn skip_operand(program: &IrProgram, operand: &Operand) -> Result<SkipOperand> {
        match operand {
            Operand::Variable(name) => Ok(SkipOperand::Register(Self::variable_register(
                program, name,
            )?)),
            literal => Ok(SkipOperand::Immediate(Self::immediate(literal)?)),
        }
    }

    /// Updates the value the compiler tracks for an owned register
    fn track_value(program: &mut IrProgram, register: u8, f: impl Fn(u16) -> u16) -> Result<()> {
        let (value, owner) = match program.registers.get(register) {
            Some(slot) => (f(slot.value), slot.owner.clone()),
            None => return Err(Error::IllegalRegisterAccess { index: register }),
        };
        program.registers.put(register, value, owner)
    }
}

impl Default for IrGenerator {
    fn default() -> Self {
        Self::new(CpuLayout::chip8())
    }
}
