//! Error types shared across the compilation pipeline.
//!
//! Two channels live here. `CompileError` covers everything that aborts a
//! compilation: lexical failures, the first syntax error, and calls the
//! assembly backend cannot express. Semantic problems never abort; they are
//! collected as `Diagnostic`s by the semantic pass (see `sema`).

use snafu::Snafu;

use crate::tokenizer::TokenKind;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
pub enum CompileError {
  #[snafu(display("{expr_line}\n{marker} {message}"))]
  WithLocation {
    expr_line: String,
    marker: String,
    message: String,
  },

  #[snafu(display(
    "syntax error at token {position} (byte {offset}): expected {expected}, found {found_kind} ({found_text})"
  ))]
  Syntax {
    expected: String,
    found_kind: TokenKind,
    found_text: String,
    position: usize,
    offset: usize,
  },

  #[snafu(display(
    "call to '{function}' passes {count} arguments, but only a0..a7 are available"
  ))]
  TooManyArguments { function: String, count: usize },

  #[snafu(display(
    "function '{function}' declares {count} parameters, but only a0..a7 are available"
  ))]
  TooManyParameters { function: String, count: usize },
}

impl CompileError {
  /// Construct an error anchored at a specific byte offset in the source.
  ///
  /// Only the line containing `loc` is echoed back so multi-line programs
  /// stay readable.
  pub fn at(source: &str, loc: usize, message: impl Into<String>) -> Self {
    let safe_loc = loc.min(source.len());
    let line_start = source[..safe_loc].rfind('\n').map_or(0, |i| i + 1);
    let line_end = source[safe_loc..]
      .find('\n')
      .map_or(source.len(), |i| safe_loc + i);
    let expr_line = format!("'{}'", &source[line_start..line_end]);
    let char_offset = source[line_start..safe_loc].chars().count() + 1; // account for opening quote
    let marker = format!("{}^", " ".repeat(char_offset));
    Self::WithLocation {
      expr_line,
      marker,
      message: message.into(),
    }
  }

  pub fn is_syntax(&self) -> bool {
    matches!(self, Self::Syntax { .. })
  }
}
