use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use rvtac::{asm, parser, sema, tac, tokenizer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
  Tac,
  Asm,
  All,
}

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Args {
  /// Source file to compile, or `-` for stdin.
  input: PathBuf,
  /// Which listings to print.
  #[arg(long, value_enum, default_value_t = Emit::All)]
  emit: Emit,
  /// Print the symbol table after semantic analysis.
  #[arg(long)]
  symbols: bool,
  /// Refuse to generate code while semantic errors remain.
  #[arg(long)]
  strict: bool,
  /// Dump tokens and the syntax tree to stderr.
  #[arg(short, long)]
  debug: bool,
}

fn read_source(path: &Path) -> io::Result<String> {
  if path.as_os_str() == "-" {
    let mut source = String::new();
    io::stdin().read_to_string(&mut source)?;
    Ok(source)
  } else {
    fs::read_to_string(path)
  }
}

fn fail(message: impl std::fmt::Display) -> ! {
  eprintln!("{message}");
  process::exit(1);
}

fn main() {
  let args = Args::parse();

  let source = read_source(&args.input)
    .unwrap_or_else(|err| fail(format!("cannot read {}: {err}", args.input.display())));

  let tokens = tokenizer::tokenize(&source).unwrap_or_else(|err| fail(err));
  if args.debug {
    eprintln!("tokens: {tokens:?}");
  }

  let program = parser::parse(tokens, &source).unwrap_or_else(|err| fail(err));
  if args.debug {
    eprintln!("ast: {program:#?}");
  }

  let semantics = sema::check(&program);
  if semantics.diagnostics().is_empty() {
    eprintln!("no semantic errors found");
  } else {
    for diagnostic in semantics.diagnostics() {
      eprintln!("error: {diagnostic}");
    }
  }

  if args.symbols {
    println!("# symbol table");
    println!("name\tkind\tscope");
    for row in semantics.symbols() {
      println!("{}\t{}\t{}", row.name, row.kind, row.scope);
    }
  }

  if args.strict && !semantics.diagnostics().is_empty() {
    fail(format!(
      "{} semantic error(s); no code generated",
      semantics.diagnostics().len()
    ));
  }

  if matches!(args.emit, Emit::Tac | Emit::All) {
    println!("# three-address code");
    print!("{}", tac::generate(&program).render());
  }

  if matches!(args.emit, Emit::Asm | Emit::All) {
    let asm = asm::generate(&program).unwrap_or_else(|err| fail(err));
    println!("# RISC-V assembly");
    print!("{}", asm.render());
  }
}
