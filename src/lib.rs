//! Crate root: wires together the compilation pipeline.
//!
//! The stages are small and run in a fixed order:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns a `Program`.
//! - `sema` resolves names against a scope stack and collects diagnostics.
//! - `tac` lowers the program into three-address code.
//! - `asm` lowers the same program into RISC-V style assembly.
//! - `error` holds the fatal error type shared by the other modules.
//!
//! The three walks over the tree are independent: each owns its own
//! context and none of them reads another's output.

pub mod asm;
pub mod ast;
pub mod error;
pub mod parser;
pub mod sema;
pub mod tac;
pub mod tokenizer;

pub use asm::AsmContext;
pub use ast::Program;
pub use error::{CompileError, CompileResult};
pub use sema::{Diagnostic, SemanticContext};
pub use tac::TacContext;

/// Everything a compilation run produces.
#[derive(Debug)]
pub struct Compilation {
  pub program: Program,
  pub semantics: SemanticContext,
  pub tac: TacContext,
  pub asm: AsmContext,
}

impl Compilation {
  pub fn diagnostics(&self) -> &[Diagnostic] {
    self.semantics.diagnostics()
  }
}

/// Tokenize and parse a source string.
pub fn parse_source(source: &str) -> CompileResult<Program> {
  let tokens = tokenizer::tokenize(source)?;
  parser::parse(tokens, source)
}

/// Run every stage. Semantic diagnostics do not stop code generation; the
/// caller decides what to do with them.
pub fn compile(source: &str) -> CompileResult<Compilation> {
  let program = parse_source(source)?;
  let semantics = sema::check(&program);
  let tac = tac::generate(&program);
  let asm = asm::generate(&program)?;
  Ok(Compilation {
    program,
    semantics,
    tac,
    asm,
  })
}

/// Compile a source string straight to an assembly listing.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let program = parse_source(source)?;
  Ok(asm::generate(&program)?.render())
}
