//! IR generation tests
//!
//! Lower small programs and check the exact instruction streams and the
//! register/memory/function tables left behind.

use smolc::compiler::ir::{
    Instruction, IrGenerator, IrProgram, SkipCondition, SkipOperand, PIXEL_SPRITE,
};
use smolc::compiler::CpuLayout;
use smolc::{Error, ErrorCategory, Operand, Parser, Scanner, Statement};

fn lower_source(source: &str) -> smolc::Result<IrProgram> {
    let tokens = Scanner::new(source).scan_tokens()?;
    let program = Parser::new(tokens).parse()?;
    let mut generator = IrGenerator::new(CpuLayout::chip8());
    generator.generate(&program.statements)?;
    Ok(generator.finish())
}

// =============================================================================
// VARIABLES
// =============================================================================

#[test]
fn test_literal_declaration_is_discoverable() {
    let program = lower_source("Uint8 A = 42\nUint8 B = 7").unwrap();

    let a = program.registers.find("A").unwrap();
    let b = program.registers.find("B").unwrap();
    assert_eq!(program.registers.get(a).unwrap().value, 42);
    assert_eq!(program.registers.get(b).unwrap().value, 7);
    assert_eq!(
        program.instructions,
        vec![
            Instruction::SetRegister {
                register: a,
                value: 42
            },
            Instruction::SetRegister {
                register: b,
                value: 7
            },
        ]
    );
}

#[test]
fn test_set_statement() {
    let program = lower_source("Uint8 A = 1\nUint8 B = 2\nset A B\nset B 9").unwrap();
    assert_eq!(
        &program.instructions[2..],
        &[
            Instruction::RegisterCopy { from: 1, to: 0 },
            Instruction::SetRegister {
                register: 1,
                value: 9
            },
        ]
    );
}

#[test]
fn test_set_into_literal_fails() {
    assert!(matches!(
        lower_source("Uint8 A = 1\nset 5 A"),
        Err(Error::LitAssign { .. })
    ));
}

#[test]
fn test_free_literal_fails() {
    assert!(matches!(
        lower_source("free 3"),
        Err(Error::LitFree { .. })
    ));
}

#[test]
fn test_out_of_registers() {
    let source: String = (0..13).map(|i| format!("Uint8 V{} = {}\n", i, i)).collect();
    let err = lower_source(&source).unwrap_err();
    assert!(matches!(err, Error::OutOfRegisters { available: 12 }));
    assert_eq!(err.category(), ErrorCategory::ResourceExhaustion);
}

#[test]
fn test_undefined_variable() {
    assert!(matches!(
        lower_source("Uint8 A = B"),
        Err(Error::UndefinedVariable { .. })
    ));
}

// =============================================================================
// INCREMENT
// =============================================================================

#[test]
fn test_increment_forms() {
    let program = lower_source("Uint8 A = 0\nINC A\nA++").unwrap();
    assert_eq!(
        &program.instructions[1..],
        &[
            Instruction::Add {
                register: 0,
                amount: 1
            },
            Instruction::Add {
                register: 0,
                amount: 1
            },
        ]
    );
}

#[test]
fn test_increment_tracks_byte_wraparound() {
    let program = lower_source("Uint8 A = 255\nINC A").unwrap();
    assert_eq!(program.registers.get(0).unwrap().value, 0);

    let program = lower_source("Uint8 B = 254\nB++\nB++\nB++").unwrap();
    assert_eq!(program.registers.get(0).unwrap().value, 1);
}

#[test]
fn test_increment_literal_leaves_program_untouched() {
    let mut generator = IrGenerator::default();
    generator
        .generate(&[Statement::VariableDecl {
            var_type: "Uint8".to_string(),
            name: "A".to_string(),
            value: Operand::Number(1),
        }])
        .unwrap();
    let before = generator.program().instructions.clone();

    let err = generator
        .generate(&[Statement::Builtin {
            op: smolc::parser::BuiltinOp::Inc,
            operand: Some(Operand::Number(4)),
        }])
        .unwrap_err();

    assert!(matches!(err, Error::LitIncrement { .. }));
    assert_eq!(generator.program().instructions, before);
}

// =============================================================================
// LOOPS
// =============================================================================

#[test]
fn test_while_not_concrete_scenario() {
    let program = lower_source("Uint8 A = 0\nwhileNot(A, 3):\n INC A\nend").unwrap();
    assert_eq!(
        program.instructions,
        vec![
            Instruction::SetRegister {
                register: 0,
                value: 0
            },
            Instruction::Add {
                register: 0,
                amount: 1
            },
            Instruction::RegisterCopy { from: 0, to: 0xC },
            Instruction::ConditionalSkip {
                lhs: 0xC,
                rhs: SkipOperand::Immediate(3),
                condition: SkipCondition::Equal,
            },
            Instruction::Jump { target: 0x202 },
        ]
    );
}

#[test]
fn test_while_not_register_compare() {
    let program = lower_source("Uint8 A = 0\nUint8 B = 5\nwhileNot(A, B):\n A++\nend").unwrap();
    assert_eq!(
        program.instructions[4],
        Instruction::ConditionalSkip {
            lhs: 0xC,
            rhs: SkipOperand::Register(1),
            condition: SkipCondition::Equal,
        }
    );
    assert_eq!(program.instructions[5], Instruction::Jump { target: 0x204 });
}

// =============================================================================
// PLOT
// =============================================================================

#[test]
fn test_single_plot() {
    let program = lower_source("plot(3, 4)").unwrap();
    let sprite = program
        .memory
        .lookup(PIXEL_SPRITE, false)
        .unwrap()
        .unwrap();

    assert_eq!(sprite.address, 0xCA0);
    assert_eq!(
        program.instructions,
        vec![
            Instruction::RawMemSet {
                value: 0x80,
                address: 0xCA0
            },
            Instruction::SetIndex { address: 0xCA0 },
            Instruction::SetRegister {
                register: 0xE,
                value: 3
            },
            Instruction::SetRegister {
                register: 0xD,
                value: 4
            },
            Instruction::Plot {
                x: 0xE,
                y: 0xD,
                height: 1
            },
        ]
    );
}

#[test]
fn test_second_plot_reuses_sprite_and_index() {
    let program = lower_source("Uint8 X = 1\nplot(3, 4)\nplot(X, 5)").unwrap();

    let raw_sets = program
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::RawMemSet { .. }))
        .count();
    let index_loads = program
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::SetIndex { .. }))
        .count();
    assert_eq!(raw_sets, 1);
    assert_eq!(index_loads, 1);
    assert_eq!(program.memory.regions().len(), 1);
    assert_eq!(
        &program.instructions[program.instructions.len() - 3..],
        &[
            Instruction::RegisterCopy { from: 0, to: 0xE },
            Instruction::SetRegister {
                register: 0xD,
                value: 5
            },
            Instruction::Plot {
                x: 0xE,
                y: 0xD,
                height: 1
            },
        ]
    );
}

#[test]
fn test_plot_inside_loop_reloads_index() {
    let program = lower_source("plot(1, 1)\nUint8 A = 0\nwhileNot(A, 2):\n plot(A, 1)\n A++\nend")
        .unwrap();
    let index_loads = program
        .instructions
        .iter()
        .filter(|i| matches!(i, Instruction::SetIndex { .. }))
        .count();
    assert_eq!(index_loads, 2);
}

// =============================================================================
// FUNCTIONS
// =============================================================================

#[test]
fn test_function_patch_and_call() {
    let program = lower_source("Uint8 A = 0\ndef bump():\n INC A\n INC A\nend\nbump()").unwrap();

    // 0x200 LD V0 / 0x202 JP / 0x204 ADD / 0x206 ADD / 0x208 RET / 0x20A CALL
    assert_eq!(program.functions.lookup("bump").unwrap(), 0x204);
    assert_eq!(program.instructions[1], Instruction::Jump { target: 0x20A });
    assert_eq!(program.instructions[4], Instruction::Return);
    assert_eq!(program.instructions[5], Instruction::Call { address: 0x204 });
}

#[test]
fn test_recursive_call_resolves() {
    let program = lower_source("def spin():\n spin()\nend").unwrap();
    assert_eq!(
        program.instructions,
        vec![
            Instruction::Jump { target: 0x206 },
            Instruction::Call { address: 0x202 },
            Instruction::Return,
        ]
    );
}

#[test]
fn test_unknown_function() {
    let err = lower_source("later()\ndef later():\nend").unwrap_err();
    assert!(matches!(err, Error::UnknownFunctionName { .. }));
    assert_eq!(err.category(), ErrorCategory::UnresolvedReference);
}

#[test]
fn test_arguments_produce_warning() {
    let program = lower_source("def f(x):\nend\nf(1)").unwrap();
    assert_eq!(program.warnings.len(), 2);
}

#[test]
fn test_register_preservation() {
    let tokens = Scanner::new("Uint8 A = 1\nUint8 B = 2\ndef f():\n A++\nend")
        .scan_tokens()
        .unwrap();
    let ast = Parser::new(tokens).parse().unwrap();
    let mut generator = IrGenerator::default().with_register_preservation(true);
    generator.generate(&ast.statements).unwrap();
    let program = generator.finish();

    let frame = program.memory.lookup("__frame_f", false).unwrap().unwrap();
    assert_eq!(frame.size, 2);
    assert_eq!(
        &program.instructions[3..],
        &[
            Instruction::SetIndex {
                address: frame.address
            },
            Instruction::RegisterDump {
                start_address: frame.address,
                count: 2
            },
            Instruction::Add {
                register: 0,
                amount: 1
            },
            Instruction::SetIndex {
                address: frame.address
            },
            Instruction::RegisterLoad {
                start_address: frame.address,
                count: 2
            },
            Instruction::Return,
        ]
    );
    assert_eq!(program.instructions[2], Instruction::Jump { target: 0x212 });
}

// =============================================================================
// MATH, COMPARISONS, SWITCH
// =============================================================================

#[test]
fn test_math_lowering() {
    let program =
        lower_source("Uint8 A = 10\nUint8 B = 2\nADD A 5\nADD A B\nSUB A B\nSUB A 1").unwrap();
    assert_eq!(
        &program.instructions[2..],
        &[
            Instruction::Add {
                register: 0,
                amount: 5
            },
            Instruction::AddRegister {
                target: 0,
                source: 1
            },
            Instruction::Sub {
                target: 0,
                amount_register: 1
            },
            Instruction::SetRegister {
                register: 2,
                value: 1
            },
            Instruction::Sub {
                target: 0,
                amount_register: 2
            },
            Instruction::SetRegister {
                register: 2,
                value: 0
            },
        ]
    );
}

#[test]
fn test_math_errors() {
    assert!(matches!(
        lower_source("ADD 3 4"),
        Err(Error::MathInvalidReceiver { .. })
    ));
    assert!(matches!(
        lower_source("Uint8 A = 2\nMUL A 2"),
        Err(Error::UnsupportedForCompilation { .. })
    ));
}

#[test]
fn test_equal_comparison() {
    let program = lower_source("Uint8 A = 1\neq(A, 1):\n A++\nend").unwrap();
    assert_eq!(
        &program.instructions[1..],
        &[
            Instruction::RegisterCopy { from: 0, to: 0xC },
            Instruction::ConditionalSkip {
                lhs: 0xC,
                rhs: SkipOperand::Immediate(1),
                condition: SkipCondition::Equal,
            },
            Instruction::Jump { target: 0x20A },
            Instruction::Add {
                register: 0,
                amount: 1
            },
        ]
    );
}

#[test]
fn test_switch_lowering() {
    let source = "Uint8 A = 2\nswitch(A):\n case 1:\n  A++\n end\n case 2:\n  A--\n end\n default:\n  A++\n end\nend";
    let program = lower_source(source).unwrap();

    // 0x200 LD V0, 2
    // case 1: 0x202 LD VC / 0x204 SE / 0x206 JP next / 0x208 ADD / 0x20A JP end
    // case 2: 0x20C LD VC / 0x20E SE / 0x210 JP next / 0x212..0x216 SUB seq / 0x218 JP end
    // default: 0x21A ADD, end = 0x21C
    assert_eq!(program.instructions[3], Instruction::Jump { target: 0x20C });
    assert_eq!(program.instructions[5], Instruction::Jump { target: 0x21C });
    assert_eq!(program.instructions[8], Instruction::Jump { target: 0x21A });
    assert_eq!(program.instructions[12], Instruction::Jump { target: 0x21C });
    assert_eq!(program.code_end(), 0x1C);
}

#[test]
fn test_print_builtins_unsupported() {
    for source in ["PRI 1", "PRU 65", "BRK", "print(1)"] {
        assert!(
            matches!(
                lower_source(source),
                Err(Error::UnsupportedForCompilation { .. })
            ),
            "{} should be rejected",
            source
        );
    }
}
