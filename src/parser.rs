//! Recursive-descent parser producing a `Program`.
//!
//! Statements are dispatched on the leading token; expressions use one
//! helper per precedence level, loosest first:
//!
//! ```text
//! expr           := or
//! or             := and ('||' and)*
//! and            := relational ('&&' relational)*
//! relational     := additive (('=='|'!='|'<'|'<='|'>'|'>=') additive)*
//! additive       := multiplicative (('+'|'-') multiplicative)*
//! multiplicative := unary (('*'|'/') unary)*
//! unary          := '!' unary | primary
//! primary        := NUMBER | IDENT ('(' args ')')? | '(' expr ')'
//! ```
//!
//! Every level folds to the left inside a loop, which is what makes the
//! binary operators left-associative. The first malformed construct aborts
//! the parse; there is no recovery.

use crate::ast::{Call, Expr, Operator, Program, Stmt};
use crate::error::{CompileError, CompileResult};
use crate::tokenizer::{Token, TokenKind, describe_token};

const RELATIONAL_OPS: [&str; 6] = ["==", "!=", "<", "<=", ">", ">="];

/// Parse a whole token stream into a program.
pub fn parse(tokens: Vec<Token>, source: &str) -> CompileResult<Program> {
  let mut stream = TokenStream::new(tokens, source);
  let body = parse_stmt_list(&mut stream)?;

  if !stream.is_eof() {
    return Err(stream.error("statement"));
  }

  Ok(Program { body })
}

/// Statements continue for as long as the next token could start one.
fn parse_stmt_list(stream: &mut TokenStream) -> CompileResult<Vec<Stmt>> {
  let mut stmts = Vec::new();
  while matches!(stream.peek().kind, TokenKind::Keyword | TokenKind::Ident) {
    stmts.push(parse_stmt(stream)?);
  }
  Ok(stmts)
}

fn parse_stmt(stream: &mut TokenStream) -> CompileResult<Stmt> {
  let token = stream.peek().clone();

  match (token.kind, token.text.as_str()) {
    (TokenKind::Keyword, "int") => {
      // `int name (` opens a function; anything else declares variables.
      if stream.peek_at(2).is(TokenKind::Symbol, "(") {
        stream.expect_keyword("int")?;
        parse_func_decl(stream)
      } else {
        parse_decl_var(stream)
      }
    }
    (TokenKind::Keyword, "func") => {
      stream.expect_keyword("func")?;
      parse_func_decl(stream)
    }
    (TokenKind::Keyword, "return") => {
      stream.expect_keyword("return")?;
      let value = parse_expr(stream)?;
      stream.skip(";")?;
      Ok(Stmt::Return { value })
    }
    (TokenKind::Keyword, "if") => parse_if(stream),
    (TokenKind::Keyword, "while") => parse_while(stream),
    (TokenKind::Keyword, "for") => parse_for(stream),
    (TokenKind::Ident, _) => {
      let stmt = if stream.peek_at(1).is(TokenKind::Symbol, "(") {
        Stmt::Call(parse_call(stream)?)
      } else {
        parse_assign(stream)?
      };
      stream.skip(";")?;
      Ok(stmt)
    }
    _ => Err(stream.error("statement")),
  }
}

/// `name (params) block`, with the leading `int`/`func` already consumed.
fn parse_func_decl(stream: &mut TokenStream) -> CompileResult<Stmt> {
  let name = stream.get_ident()?;
  stream.skip("(")?;
  let params = parse_params(stream)?;
  stream.skip(")")?;
  let body = parse_block(stream)?;
  Ok(Stmt::FuncDecl { name, params, body })
}

/// Parameter names, each optionally preceded by an ignored `int`.
fn parse_params(stream: &mut TokenStream) -> CompileResult<Vec<String>> {
  let mut params = Vec::new();
  loop {
    stream.equal(TokenKind::Keyword, "int");
    if stream.peek().kind != TokenKind::Ident {
      break;
    }
    params.push(stream.get_ident()?);
    if !stream.equal(TokenKind::Symbol, ",") {
      break;
    }
  }
  Ok(params)
}

fn parse_decl_var(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.expect_keyword("int")?;
  let mut vars = Vec::new();
  loop {
    let name = stream.get_ident()?;
    let init = if stream.equal(TokenKind::Op, "=") {
      Some(parse_expr(stream)?)
    } else {
      None
    };
    vars.push((name, init));
    if !stream.equal(TokenKind::Symbol, ",") {
      break;
    }
  }
  stream.skip(";")?;
  Ok(Stmt::DeclVar { vars })
}

fn parse_if(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.expect_keyword("if")?;
  stream.skip("(")?;
  let cond = parse_expr(stream)?;
  stream.skip(")")?;
  let then_body = parse_block(stream)?;
  let else_body = if stream.equal(TokenKind::Keyword, "else") {
    Some(parse_block(stream)?)
  } else {
    None
  };
  Ok(Stmt::If {
    cond,
    then_body,
    else_body,
  })
}

fn parse_while(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.expect_keyword("while")?;
  stream.skip("(")?;
  let cond = parse_expr(stream)?;
  stream.skip(")")?;
  let body = parse_block(stream)?;
  Ok(Stmt::While { cond, body })
}

/// Each of the three clauses is optional; an absent clause is detected by
/// seeing its closing delimiter straight away.
fn parse_for(stream: &mut TokenStream) -> CompileResult<Stmt> {
  stream.expect_keyword("for")?;
  stream.skip("(")?;

  let init = if stream.peek().is(TokenKind::Symbol, ";") {
    None
  } else {
    Some(Box::new(parse_assign(stream)?))
  };
  stream.skip(";")?;

  let cond = if stream.peek().is(TokenKind::Symbol, ";") {
    None
  } else {
    Some(parse_expr(stream)?)
  };
  stream.skip(";")?;

  let step = if stream.peek().is(TokenKind::Symbol, ")") {
    None
  } else {
    Some(Box::new(parse_assign(stream)?))
  };
  stream.skip(")")?;

  let body = parse_block(stream)?;
  Ok(Stmt::For {
    init,
    cond,
    step,
    body,
  })
}

fn parse_block(stream: &mut TokenStream) -> CompileResult<Vec<Stmt>> {
  stream.skip("{")?;
  let stmts = parse_stmt_list(stream)?;
  stream.skip("}")?;
  Ok(stmts)
}

/// `name = expr`, without the trailing `;` (the `for` header reuses it).
fn parse_assign(stream: &mut TokenStream) -> CompileResult<Stmt> {
  let target = stream.get_ident()?;
  stream.expect(TokenKind::Op, "=")?;
  let value = parse_expr(stream)?;
  Ok(Stmt::Assign { target, value })
}

fn parse_call(stream: &mut TokenStream) -> CompileResult<Call> {
  let name = stream.get_ident()?;
  stream.skip("(")?;
  let args = parse_args(stream)?;
  stream.skip(")")?;
  Ok(Call { name, args })
}

fn parse_args(stream: &mut TokenStream) -> CompileResult<Vec<Expr>> {
  let mut args = Vec::new();
  if stream.peek().is(TokenKind::Symbol, ")") {
    return Ok(args);
  }
  args.push(parse_expr(stream)?);
  while stream.equal(TokenKind::Symbol, ",") {
    args.push(parse_expr(stream)?);
  }
  Ok(args)
}

pub(crate) fn parse_expr(stream: &mut TokenStream) -> CompileResult<Expr> {
  parse_or(stream)
}

fn parse_or(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_and(stream)?;

  while let Some(op) = stream.take_op(&["||"]) {
    let rhs = parse_and(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_and(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_relational(stream)?;

  while let Some(op) = stream.take_op(&["&&"]) {
    let rhs = parse_relational(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_relational(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_add(stream)?;

  while let Some(op) = stream.take_op(&RELATIONAL_OPS) {
    let rhs = parse_add(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_add(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_mul(stream)?;

  while let Some(op) = stream.take_op(&["+", "-"]) {
    let rhs = parse_mul(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_mul(stream: &mut TokenStream) -> CompileResult<Expr> {
  let mut node = parse_unary(stream)?;

  while let Some(op) = stream.take_op(&["*", "/"]) {
    let rhs = parse_unary(stream)?;
    node = Expr::binary(op, node, rhs);
  }

  Ok(node)
}

fn parse_unary(stream: &mut TokenStream) -> CompileResult<Expr> {
  if let Some(op) = stream.take_op(&["!"]) {
    let operand = parse_unary(stream)?;
    return Ok(Expr::unary(op, operand));
  }

  parse_primary(stream)
}

fn parse_primary(stream: &mut TokenStream) -> CompileResult<Expr> {
  if stream.equal(TokenKind::Symbol, "(") {
    let node = parse_expr(stream)?;
    stream.skip(")")?;
    return Ok(node);
  }

  match stream.peek().kind {
    TokenKind::Number => Ok(Expr::Number(stream.get_number()?)),
    TokenKind::Ident => {
      if stream.peek_at(1).is(TokenKind::Symbol, "(") {
        Ok(Expr::Call(parse_call(stream)?))
      } else {
        Ok(Expr::Variable(stream.get_ident()?))
      }
    }
    _ => Err(stream.error("expression")),
  }
}

/// Lightweight cursor over the token vector.
///
/// Reads past the end of the vector see a synthetic `Eof`, so lookahead
/// never indexes out of bounds even if the caller forgot the sentinel.
pub(crate) struct TokenStream<'a> {
  tokens: Vec<Token>,
  source: &'a str,
  pos: usize,
  eof: Token,
}

impl<'a> TokenStream<'a> {
  pub(crate) fn new(tokens: Vec<Token>, source: &'a str) -> Self {
    Self {
      tokens,
      source,
      pos: 0,
      eof: Token::eof(source.len()),
    }
  }

  fn peek(&self) -> &Token {
    self.peek_at(0)
  }

  fn peek_at(&self, offset: usize) -> &Token {
    self.tokens.get(self.pos + offset).unwrap_or(&self.eof)
  }

  fn is_eof(&self) -> bool {
    self.peek().kind == TokenKind::Eof
  }

  /// Consume the current token if it has this kind and text.
  fn equal(&mut self, kind: TokenKind, text: &str) -> bool {
    if self.peek().is(kind, text) {
      self.pos += 1;
      return true;
    }
    false
  }

  /// Consume the current token if it is one of the given operators.
  fn take_op(&mut self, ops: &[&str]) -> Option<Operator> {
    let token = self.peek();
    if token.kind != TokenKind::Op || !ops.contains(&token.text.as_str()) {
      return None;
    }
    let op = Operator::from_symbol(&token.text)?;
    self.pos += 1;
    Some(op)
  }

  fn expect(&mut self, kind: TokenKind, text: &str) -> CompileResult<()> {
    if self.equal(kind, text) {
      Ok(())
    } else {
      Err(self.error(format!("{kind} '{text}'")))
    }
  }

  fn expect_keyword(&mut self, keyword: &str) -> CompileResult<()> {
    self.expect(TokenKind::Keyword, keyword)
  }

  /// Consume a punctuation symbol such as `(` or `;`.
  fn skip(&mut self, symbol: &str) -> CompileResult<()> {
    self.expect(TokenKind::Symbol, symbol)
  }

  fn get_ident(&mut self) -> CompileResult<String> {
    if self.peek().kind != TokenKind::Ident {
      return Err(self.error(TokenKind::Ident.to_string()));
    }
    let name = self.peek().text.clone();
    self.pos += 1;
    Ok(name)
  }

  fn get_number(&mut self) -> CompileResult<i64> {
    let token = self.peek();
    if token.kind != TokenKind::Number {
      return Err(self.error(TokenKind::Number.to_string()));
    }
    let value = token
      .text
      .parse::<i64>()
      .map_err(|err| CompileError::at(self.source, token.loc, format!("invalid number: {err}")))?;
    self.pos += 1;
    Ok(value)
  }

  /// Build a syntax error describing the token under the cursor.
  fn error(&self, expected: impl Into<String>) -> CompileError {
    let token = self.peek();
    CompileError::Syntax {
      expected: expected.into(),
      found_kind: token.kind,
      found_text: describe_token(token),
      position: self.pos,
      offset: token.loc,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::tokenizer::tokenize;

  fn parse_src(src: &str) -> CompileResult<Program> {
    parse(tokenize(src)?, src)
  }

  fn expr(src: &str) -> Expr {
    let mut stream = TokenStream::new(tokenize(src).unwrap(), src);
    parse_expr(&mut stream).unwrap()
  }

  fn num(v: i64) -> Expr {
    Expr::number(v)
  }

  #[test]
  fn multiplication_binds_tighter_than_addition() {
    assert_eq!(
      expr("1 + 2 * 3"),
      Expr::binary(
        Operator::Add,
        num(1),
        Expr::binary(Operator::Mul, num(2), num(3))
      )
    );
  }

  #[test]
  fn parentheses_override_precedence() {
    assert_eq!(
      expr("(1 + 2) * 3"),
      Expr::binary(
        Operator::Mul,
        Expr::binary(Operator::Add, num(1), num(2)),
        num(3)
      )
    );
  }

  #[test]
  fn subtraction_is_left_associative() {
    assert_eq!(
      expr("8 - 4 - 2"),
      Expr::binary(
        Operator::Sub,
        Expr::binary(Operator::Sub, num(8), num(4)),
        num(2)
      )
    );
  }

  #[test]
  fn logical_levels_nest_or_above_and_above_relational() {
    assert_eq!(
      expr("a < b || c && !d"),
      Expr::binary(
        Operator::Or,
        Expr::binary(Operator::Lt, Expr::var("a"), Expr::var("b")),
        Expr::binary(
          Operator::And,
          Expr::var("c"),
          Expr::unary(Operator::Not, Expr::var("d"))
        )
      )
    );
  }

  #[test]
  fn call_inside_expression() {
    assert_eq!(
      expr("f(1, x) + 2"),
      Expr::binary(
        Operator::Add,
        Expr::call("f", vec![num(1), Expr::var("x")]),
        num(2)
      )
    );
  }

  #[test]
  fn int_followed_by_paren_two_ahead_is_a_function() {
    let program = parse_src("int soma(int x, y) { return x + y; }").unwrap();
    assert_eq!(
      program.body,
      vec![Stmt::FuncDecl {
        name: "soma".to_string(),
        params: vec!["x".to_string(), "y".to_string()],
        body: vec![Stmt::Return {
          value: Expr::binary(Operator::Add, Expr::var("x"), Expr::var("y")),
        }],
      }]
    );
  }

  #[test]
  fn func_keyword_declares_a_function_too() {
    let program = parse_src("func f() { }").unwrap();
    assert!(matches!(&program.body[0], Stmt::FuncDecl { name, params, body }
      if name == "f" && params.is_empty() && body.is_empty()));
  }

  #[test]
  fn int_declares_a_variable_list() {
    let program = parse_src("int a, b = 2, c;").unwrap();
    assert_eq!(
      program.body,
      vec![Stmt::DeclVar {
        vars: vec![
          ("a".to_string(), None),
          ("b".to_string(), Some(num(2))),
          ("c".to_string(), None),
        ],
      }]
    );
  }

  #[test]
  fn identifier_then_paren_is_a_call_statement() {
    let program = parse_src("print(x);").unwrap();
    assert_eq!(
      program.body,
      vec![Stmt::Call(Call {
        name: "print".to_string(),
        args: vec![Expr::var("x")],
      })]
    );
  }

  #[test]
  fn bare_expression_statement_is_rejected() {
    let err = parse_src("x + 1;").unwrap_err();
    assert!(matches!(
      err,
      CompileError::Syntax { ref expected, found_kind: TokenKind::Op, ref found_text, position: 1, .. }
        if expected == "OP '='" && found_text == "+"
    ));
  }

  #[test]
  fn if_with_else() {
    let program = parse_src("if (x) { y = 1; } else { y = 2; }").unwrap();
    assert_eq!(
      program.body,
      vec![Stmt::If {
        cond: Expr::var("x"),
        then_body: vec![Stmt::assign("y", num(1))],
        else_body: Some(vec![Stmt::assign("y", num(2))]),
      }]
    );
  }

  #[test]
  fn for_clauses_are_individually_optional() {
    let program = parse_src("for (;;) { } for (i = 0; i < 3;) { } for (; x; i = i + 1) { }").unwrap();
    assert!(matches!(
      &program.body[0],
      Stmt::For { init: None, cond: None, step: None, .. }
    ));
    assert!(matches!(
      &program.body[1],
      Stmt::For { init: Some(_), cond: Some(_), step: None, .. }
    ));
    assert!(matches!(
      &program.body[2],
      Stmt::For { init: None, cond: Some(_), step: Some(_), .. }
    ));
  }

  #[test]
  fn bodies_must_be_braced() {
    let err = parse_src("while (x) x = 1;").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { ref expected, .. } if expected == "SYMBOL '{'"));
  }

  #[test]
  fn missing_semicolon_reports_found_token() {
    let err = parse_src("x = 1 y = 2;").unwrap_err();
    assert_eq!(
      err.to_string(),
      "syntax error at token 3 (byte 6): expected SYMBOL ';', found ID (y)"
    );
  }

  #[test]
  fn truncated_input_reports_eof() {
    let err = parse_src("x = ").unwrap_err();
    assert!(matches!(
      err,
      CompileError::Syntax { found_kind: TokenKind::Eof, ref expected, .. } if expected == "expression"
    ));
  }

  #[test]
  fn stray_tokens_after_program_are_rejected() {
    let err = parse_src("x = 1; }").unwrap_err();
    assert!(matches!(err, CompileError::Syntax { ref expected, .. } if expected == "statement"));
  }

  #[test]
  fn missing_eof_sentinel_is_tolerated() {
    let mut tokens = tokenize("x = 1;").unwrap();
    tokens.pop();
    assert_eq!(parse(tokens, "x = 1;").unwrap().body.len(), 1);
  }

  #[test]
  fn oversized_literal_is_reported_at_its_location() {
    let err = parse_src("x = 99999999999999999999;").unwrap_err();
    assert!(err.to_string().contains("invalid number"));
  }
}
