//! Compiler driver tests: source in, ROM out

use smolc::compiler::ir::Instruction;
use smolc::compiler::{disassemble, dump_ir, CompileOptions, Compiler, TargetCpu};
use smolc::{Error, ErrorSeverity};

fn compile(source: &str) -> smolc::Result<smolc::CompileResult> {
    Compiler::new(CompileOptions::default()).compile(source)
}

fn compile_compact(source: &str) -> smolc::Result<smolc::CompileResult> {
    Compiler::new(CompileOptions {
        compact_memory: true,
        ..CompileOptions::default()
    })
    .compile(source)
}

#[test]
fn test_counter_program() {
    let result = compile("Uint8 A = 0\nwhileNot(A, 3):\n INC A\nend").unwrap();
    assert_eq!(
        result.rom,
        vec![0x60, 0x00, 0x70, 0x01, 0x8C, 0x00, 0x3C, 0x03, 0x12, 0x02]
    );
}

#[test]
fn test_plot_without_compaction_reaches_window() {
    let result = compile("plot(3, 4)").unwrap();
    assert_eq!(result.code_size, 8);
    assert_eq!(result.rom.len(), 0xCA1);
    assert_eq!(result.rom[0xCA0], 0x80);
}

#[test]
fn test_plot_with_compaction() {
    let result = compile_compact("plot(3, 4)").unwrap();

    // LD I / LD VE / LD VD / DRW / JP 0x200, sprite right after
    assert_eq!(
        result.rom,
        vec![0xA2, 0x0A, 0x6E, 0x03, 0x6D, 0x04, 0xDE, 0xD1, 0x12, 0x00, 0x80]
    );
    assert_eq!(result.code_size, 10);
    assert_eq!(result.program.memory.regions()[0].address, 10);
}

#[test]
fn test_compaction_rewrites_register_frames() {
    let result = Compiler::new(CompileOptions {
        compact_memory: true,
        preserve_registers: true,
        ..CompileOptions::default()
    })
    .compile("Uint8 A = 1\ndef f():\n A++\nend\nf()\nplot(A, A)")
    .unwrap();

    let code_end = result.code_size as u16;
    let regions = result.program.memory.regions();
    assert_eq!(regions[0].address, code_end);
    assert_eq!(regions[1].address, code_end + 1);

    let frame_refs = result
        .program
        .instructions
        .iter()
        .filter(|i| i.memory_address() == Some(code_end))
        .count();
    // SetIndex + RegisterDump + SetIndex + RegisterLoad
    assert_eq!(frame_refs, 4);
    assert_eq!(result.rom[code_end as usize + 1], 0x80);
}

#[test]
fn test_warnings_propagate() {
    let result = compile("def f(a):\nend\nf(1)").unwrap();
    assert_eq!(result.warnings.len(), 2);
}

#[test]
fn test_program_too_large() {
    let mut source = String::from("Uint8 A = 0\n");
    for _ in 0..0x700 {
        source.push_str("A++\n");
    }
    source.push_str("plot(A, A)\n");
    assert!(matches!(
        compile(&source),
        Err(Error::ProgramTooLarge { .. })
    ));
}

#[test]
fn test_syntax_error_reported() {
    let err = compile("Uint8 = 5").unwrap_err();
    assert!(matches!(err, Error::SyntaxError { .. }));
    assert_eq!(err.classify(), ErrorSeverity::Fatal);
}

#[test]
fn test_unsupported_target() {
    let err = Compiler::new(CompileOptions {
        target: TargetCpu::GameBoy,
        ..CompileOptions::default()
    })
    .compile("Uint8 A = 1")
    .unwrap_err();
    assert!(matches!(err, Error::UnsupportedTarget { .. }));
}

#[test]
fn test_listing_tools() {
    let result = compile_compact("Uint8 A = 5\nplot(A, 1)").unwrap();

    let dump = dump_ir(&result.program, 0x200);
    assert!(dump.contains("0x200: 6005  LD V0, #0x05"));
    assert!(dump.contains("V0 = A (5)"));

    let lines = disassemble(&result.rom, 0x200);
    assert_eq!(lines[0], "0x200: 6005  LD V0, #0x05");
    assert!(lines.iter().any(|l| l.ends_with("DRW VE, VD, 1")));
}

#[test]
fn test_ir_json_round_trip() {
    let result = compile("Uint8 A = 1\nA++").unwrap();
    let json = serde_json::to_string(&result.program).unwrap();
    let back: smolc::compiler::IrProgram = serde_json::from_str(&json).unwrap();
    assert_eq!(back.instructions, result.program.instructions);
    assert_eq!(
        back.instructions[1],
        Instruction::Add {
            register: 0,
            amount: 1
        }
    );
}

#[test]
fn test_demo_programs_compile() {
    let counter = compile(include_str!("../demos/counter_rom.smol")).unwrap();
    assert_eq!(counter.code_size, 16);

    let plot = compile_compact(include_str!("../demos/plot.smol")).unwrap();
    assert_eq!(plot.program.functions.lookup("dot").unwrap(), 0x206);
    assert_eq!(plot.rom.len(), plot.code_size + 1);
}
