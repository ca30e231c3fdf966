//! Lexical analysis: turns the raw input string into a vector of tokens.
//!
//! The tokenizer knows nothing about grammar. It classifies lexemes into the
//! six kinds the parser dispatches on and records where each one started.
//! Multi-character operators are matched before single-character ones to
//! avoid ambiguity.

use std::fmt;

use crate::error::{CompileError, CompileResult};

pub const KEYWORDS: [&str; 7] = ["int", "return", "if", "else", "while", "for", "func"];

const LONG_OPS: [&str; 6] = ["==", "!=", "<=", ">=", "&&", "||"];

/// Kinds of tokens recognised by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
  Keyword,
  Ident,
  Number,
  Op,
  Symbol,
  Eof,
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenKind::Keyword => "KEYWORD",
      TokenKind::Ident => "ID",
      TokenKind::Number => "NUMBER",
      TokenKind::Op => "OP",
      TokenKind::Symbol => "SYMBOL",
      TokenKind::Eof => "EOF",
    };
    f.write_str(name)
  }
}

/// A classified lexeme and the byte offset it started at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub loc: usize,
}

impl Token {
  pub fn new(kind: TokenKind, text: impl Into<String>, loc: usize) -> Self {
    Self {
      kind,
      text: text.into(),
      loc,
    }
  }

  pub fn eof(loc: usize) -> Self {
    Self::new(TokenKind::Eof, "", loc)
  }

  pub fn is(&self, kind: TokenKind, text: &str) -> bool {
    self.kind == kind && self.text == text
  }
}

/// Lex the input into a flat vector of tokens terminated by an `Eof` marker.
pub fn tokenize(input: &str) -> CompileResult<Vec<Token>> {
  let mut tokens = Vec::new();
  let bytes = input.as_bytes();
  let mut i = 0;

  while i < bytes.len() {
    let c = bytes[i];
    if c.is_ascii_whitespace() {
      i += 1;
      continue;
    }

    if c.is_ascii_digit() {
      let start = i;
      while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
      }
      tokens.push(Token::new(TokenKind::Number, &input[start..i], start));
      continue;
    }

    if c.is_ascii_alphabetic() || c == b'_' {
      let start = i;
      while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
      }
      let text = &input[start..i];
      let kind = if KEYWORDS.contains(&text) {
        TokenKind::Keyword
      } else {
        TokenKind::Ident
      };
      tokens.push(Token::new(kind, text, start));
      continue;
    }

    if let Some(op) = LONG_OPS.into_iter().find(|op| input[i..].starts_with(op)) {
      tokens.push(Token::new(TokenKind::Op, op, i));
      i += op.len();
      continue;
    }

    if matches!(c, b'+' | b'-' | b'*' | b'/' | b'<' | b'>' | b'=' | b'!') {
      tokens.push(Token::new(TokenKind::Op, &input[i..i + 1], i));
      i += 1;
      continue;
    }

    if matches!(c, b'(' | b')' | b'{' | b'}' | b';' | b',') {
      tokens.push(Token::new(TokenKind::Symbol, &input[i..i + 1], i));
      i += 1;
      continue;
    }

    let invalid_char = input[i..].chars().next().unwrap_or('\0');
    return Err(CompileError::at(
      input,
      i,
      format!("invalid token: '{invalid_char}'"),
    ));
  }

  tokens.push(Token::eof(input.len()));
  Ok(tokens)
}

/// Human-friendly description used in diagnostics.
pub fn describe_token(token: &Token) -> String {
  match token.kind {
    TokenKind::Eof => "EOF".to_string(),
    _ => token.text.clone(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn kinds(src: &str) -> Vec<(TokenKind, String)> {
    tokenize(src)
      .unwrap()
      .into_iter()
      .map(|t| (t.kind, t.text))
      .collect()
  }

  #[test]
  fn classifies_a_declaration() {
    use TokenKind::*;
    assert_eq!(
      kinds("int x = 42;"),
      vec![
        (Keyword, "int".to_string()),
        (Ident, "x".to_string()),
        (Op, "=".to_string()),
        (Number, "42".to_string()),
        (Symbol, ";".to_string()),
        (Eof, String::new()),
      ]
    );
  }

  #[test]
  fn prefers_two_character_operators() {
    let ops: Vec<String> = tokenize("a<=b==c&&!d||e!=f>=g")
      .unwrap()
      .into_iter()
      .filter(|t| t.kind == TokenKind::Op)
      .map(|t| t.text)
      .collect();
    assert_eq!(ops, ["<=", "==", "&&", "!", "||", "!=", ">="]);
  }

  #[test]
  fn keywords_are_whole_words() {
    let toks = tokenize("interval for_each for").unwrap();
    assert_eq!(toks[0].kind, TokenKind::Ident);
    assert_eq!(toks[1].kind, TokenKind::Ident);
    assert_eq!(toks[2].kind, TokenKind::Keyword);
  }

  #[test]
  fn records_byte_offsets() {
    let toks = tokenize("  x\n  = 1;").unwrap();
    assert_eq!(toks[0].loc, 2);
    assert_eq!(toks[1].loc, 6);
    assert_eq!(toks.last().unwrap().loc, 10);
  }

  #[test]
  fn rejects_unknown_characters() {
    let err = tokenize("x = 3 % 2;").unwrap_err();
    assert!(err.to_string().contains("invalid token: '%'"));
  }

  #[test]
  fn empty_input_is_just_eof() {
    assert_eq!(kinds(""), vec![(TokenKind::Eof, String::new())]);
  }
}
