//! `smolc` command line: REPL, interpreter and CHIP-8 compiler

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser as ClapParser;

use smolc::compiler::{bytecode, debug, CompileOptions, Compiler, TargetCpu};
use smolc::{Error, Interpreter, InterpreterOptions, Parser, Scanner};

/// Exit status for a program the toolchain rejected
const EXIT_DATA_ERROR: u8 = 65;

#[derive(ClapParser, Debug)]
#[command(author, version, about = "smol interpreter and CHIP-8 compiler", long_about = None)]
struct Args {
    /// Source file; starts the REPL when omitted
    file: Option<PathBuf>,

    /// Compile to a ROM instead of interpreting
    #[arg(short, long)]
    compile: bool,

    /// ROM output path
    #[arg(short, long, default_value = "ROM")]
    output: PathBuf,

    /// Target CPU (chip8, gameboy)
    #[arg(short, long, default_value = "chip8")]
    target: TargetCpu,

    /// Move variable space directly behind the code
    #[arg(long)]
    compact: bool,

    /// Save and restore registers around function bodies
    #[arg(long)]
    preserve_registers: bool,

    /// Print the IR listing
    #[arg(long)]
    dump_ir: bool,

    /// Print the IR program as JSON
    #[arg(long)]
    emit_ir_json: bool,

    /// Print the encoded ROM decoded back to mnemonics
    #[arg(long)]
    disassemble: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match &args.file {
        None => repl(),
        Some(path) if args.compile => compile_file(path, &args),
        Some(path) => run_file(path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<Error>() {
                Some(smol) => eprintln!("error [{:?}]: {}", smol.category(), smol),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::from(EXIT_DATA_ERROR)
        }
    }
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn run_file(path: &Path) -> anyhow::Result<()> {
    let source = read_source(path)?;
    let tokens = Scanner::new(&source).scan_tokens()?;
    let program = Parser::new(tokens).parse()?;

    let mut interpreter = Interpreter::new().with_options(InterpreterOptions::from_env());
    interpreter.execute(&program)?;
    Ok(())
}

fn compile_file(path: &Path, args: &Args) -> anyhow::Result<()> {
    let source = read_source(path)?;
    let compiler = Compiler::new(CompileOptions {
        target: args.target,
        compact_memory: args.compact,
        preserve_registers: args.preserve_registers,
    });
    let result = compiler.compile(&source)?;
    let origin = bytecode::CODE_ORIGIN;

    for warning in &result.warnings {
        eprintln!("warning: {}", warning);
    }
    if args.dump_ir {
        print!("{}", debug::dump_ir(&result.program, origin));
    }
    if args.emit_ir_json {
        println!("{}", serde_json::to_string_pretty(&result.program)?);
    }
    if args.disassemble {
        for line in debug::disassemble(&result.rom, origin) {
            println!("{}", line);
        }
    }

    bytecode::write_rom(&args.output, &result.rom)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    println!(
        "Wrote {} ({} bytes, {} bytes of code)",
        args.output.display(),
        result.rom.len(),
        result.code_size
    );
    Ok(())
}

fn repl() -> anyhow::Result<()> {
    println!("smol {} interactive REPL", smolc::VERSION);
    println!("Type 'exit' to quit, 'clear' to reset the environment.");

    let mut interpreter = Interpreter::new().with_options(InterpreterOptions::from_env());
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut pending = String::new();

    loop {
        print!("{}", if pending.is_empty() { "smol> " } else { "....> " });
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        if pending.is_empty() {
            match line.trim() {
                "" => continue,
                "exit" | "quit" => break,
                "clear" => {
                    interpreter = Interpreter::new().with_options(InterpreterOptions::from_env());
                    println!("Environment cleared");
                    continue;
                }
                _ => {}
            }
        }

        pending.push_str(&line);
        pending.push('\n');

        match execute_chunk(&mut interpreter, &pending) {
            // Open block, keep reading
            Err(Error::UnexpectedEof { .. }) => continue,
            Err(err) => eprintln!("  ✗ {}", err),
            Ok(()) => println!(),
        }
        pending.clear();
    }
    Ok(())
}

fn execute_chunk(interpreter: &mut Interpreter, code: &str) -> smolc::Result<()> {
    let tokens = Scanner::new(code).scan_tokens()?;
    let program = Parser::new(tokens).parse()?;
    interpreter.execute(&program)
}
