//! Semantic analysis: name resolution against a stack of scopes.
//!
//! Only function bodies open a scope; `if`/`while`/`for` bodies share the
//! scope they appear in. Problems are accumulated as `Diagnostic`s and the
//! walk always runs to completion.

use std::collections::HashMap;
use std::fmt;

use snafu::Snafu;

use crate::ast::{Call, Expr, Program, Stmt};

pub const GLOBAL_SCOPE: &str = "global";

/// A non-fatal semantic problem.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum Diagnostic {
  #[snafu(display("variable '{name}' used but not declared"))]
  UndeclaredVariable { name: String },

  #[snafu(display("{kind} '{name}' already declared in the current scope"))]
  RedeclaredVariable { name: String, kind: SymbolKind },

  #[snafu(display("function '{name}' already declared"))]
  RedeclaredFunction { name: String },

  #[snafu(display("function '{name}' not declared"))]
  UndeclaredFunction { name: String },

  #[snafu(display("function '{name}' called with {found} argument(s), but expects {expected}"))]
  ArgumentCountMismatch {
    name: String,
    expected: usize,
    found: usize,
  },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
  Variable,
  Parameter,
}

impl fmt::Display for SymbolKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SymbolKind::Variable => f.write_str("variable"),
      SymbolKind::Parameter => f.write_str("parameter"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
  pub kind: SymbolKind,
  pub scope: String,
}

#[derive(Debug, Default)]
struct Scope {
  name: String,
  symbols: HashMap<String, Symbol>,
  /// Declaration order, so listings are stable.
  order: Vec<String>,
}

/// One row of the symbol table listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRow {
  pub name: String,
  pub kind: String,
  pub scope: String,
}

/// Scope stack, function table and the diagnostics gathered so far.
#[derive(Debug)]
pub struct SemanticContext {
  scopes: Vec<Scope>,
  functions: HashMap<String, usize>,
  function_order: Vec<String>,
  diagnostics: Vec<Diagnostic>,
}

impl Default for SemanticContext {
  fn default() -> Self {
    Self::new()
  }
}

impl SemanticContext {
  /// A context holding just the empty global scope.
  pub fn new() -> Self {
    Self {
      scopes: vec![Scope {
        name: GLOBAL_SCOPE.to_string(),
        ..Scope::default()
      }],
      functions: HashMap::new(),
      function_order: Vec::new(),
      diagnostics: Vec::new(),
    }
  }

  pub fn enter_scope(&mut self, name: &str) {
    self.scopes.push(Scope {
      name: name.to_string(),
      ..Scope::default()
    });
  }

  /// Pop the innermost scope. The global scope is never popped.
  pub fn exit_scope(&mut self) {
    if self.scopes.len() > 1 {
      self.scopes.pop();
    }
  }

  pub fn depth(&self) -> usize {
    self.scopes.len()
  }

  /// Whether `name` resolves in any scope, innermost first.
  pub fn is_declared(&self, name: &str) -> bool {
    self
      .scopes
      .iter()
      .rev()
      .any(|scope| scope.symbols.contains_key(name))
  }

  pub fn lookup(&self, name: &str) -> Option<&Symbol> {
    self
      .scopes
      .iter()
      .rev()
      .find_map(|scope| scope.symbols.get(name))
  }

  /// Register `name` in the innermost scope, diagnosing a clash there.
  pub fn declare(&mut self, name: &str, kind: SymbolKind) {
    if self.current_scope_mut().symbols.contains_key(name) {
      self.diagnostics.push(Diagnostic::RedeclaredVariable {
        name: name.to_string(),
        kind,
      });
      return;
    }
    let scope = self.current_scope_mut();
    let symbol = Symbol {
      kind,
      scope: scope.name.clone(),
    };
    scope.symbols.insert(name.to_string(), symbol);
    scope.order.push(name.to_string());
  }

  /// Record a function's arity; the first declaration wins.
  pub fn declare_function(&mut self, name: &str, arity: usize) {
    if self.functions.contains_key(name) {
      self.diagnostics.push(Diagnostic::RedeclaredFunction {
        name: name.to_string(),
      });
      return;
    }
    self.functions.insert(name.to_string(), arity);
    self.function_order.push(name.to_string());
  }

  pub fn check_function(&mut self, name: &str, arg_count: usize) {
    match self.functions.get(name) {
      None => self.diagnostics.push(Diagnostic::UndeclaredFunction {
        name: name.to_string(),
      }),
      Some(&expected) if expected != arg_count => {
        self.diagnostics.push(Diagnostic::ArgumentCountMismatch {
          name: name.to_string(),
          expected,
          found: arg_count,
        })
      }
      Some(_) => {}
    }
  }

  pub fn report(&mut self, diagnostic: Diagnostic) {
    self.diagnostics.push(diagnostic);
  }

  pub fn diagnostics(&self) -> &[Diagnostic] {
    &self.diagnostics
  }

  pub fn into_diagnostics(self) -> Vec<Diagnostic> {
    self.diagnostics
  }

  /// Symbols still reachable (outermost scope first), then the functions.
  pub fn symbols(&self) -> Vec<SymbolRow> {
    let mut rows = Vec::new();
    for scope in &self.scopes {
      for name in &scope.order {
        let symbol = &scope.symbols[name];
        rows.push(SymbolRow {
          name: name.clone(),
          kind: symbol.kind.to_string(),
          scope: symbol.scope.clone(),
        });
      }
    }
    for name in &self.function_order {
      rows.push(SymbolRow {
        name: name.clone(),
        kind: "function".to_string(),
        scope: GLOBAL_SCOPE.to_string(),
      });
    }
    rows
  }

  fn current_scope_mut(&mut self) -> &mut Scope {
    // Never underflows: `new` pushes the global scope and `exit_scope`
    // refuses to pop it.
    let last = self.scopes.len() - 1;
    &mut self.scopes[last]
  }
}

/// Run the semantic pass over a whole program.
pub fn check(program: &Program) -> SemanticContext {
  let mut ctx = SemanticContext::new();
  check_program(program, &mut ctx);
  ctx
}

pub fn check_program(program: &Program, ctx: &mut SemanticContext) {
  check_stmts(&program.body, ctx);
}

fn check_stmts(stmts: &[Stmt], ctx: &mut SemanticContext) {
  for stmt in stmts {
    check_stmt(stmt, ctx);
  }
}

fn check_stmt(stmt: &Stmt, ctx: &mut SemanticContext) {
  match stmt {
    Stmt::Assign { target, value } => {
      // First assignment declares the name silently.
      if !ctx.is_declared(target) {
        ctx.declare(target, SymbolKind::Variable);
      }
      check_expr(value, ctx);
    }
    Stmt::DeclVar { vars } => {
      for (name, init) in vars {
        ctx.declare(name, SymbolKind::Variable);
        if let Some(init) = init {
          check_expr(init, ctx);
        }
      }
    }
    Stmt::Return { value } => check_expr(value, ctx),
    Stmt::FuncDecl { name, params, body } => {
      ctx.declare_function(name, params.len());
      ctx.enter_scope(name);
      for param in params {
        ctx.declare(param, SymbolKind::Parameter);
      }
      check_stmts(body, ctx);
      ctx.exit_scope();
    }
    Stmt::Call(call) => check_call(call, ctx),
    Stmt::If {
      cond,
      then_body,
      else_body,
    } => {
      check_expr(cond, ctx);
      check_stmts(then_body, ctx);
      if let Some(else_body) = else_body {
        check_stmts(else_body, ctx);
      }
    }
    Stmt::While { cond, body } => {
      check_expr(cond, ctx);
      check_stmts(body, ctx);
    }
    Stmt::For {
      init,
      cond,
      step,
      body,
    } => {
      if let Some(init) = init {
        check_stmt(init, ctx);
      }
      if let Some(cond) = cond {
        check_expr(cond, ctx);
      }
      if let Some(step) = step {
        check_stmt(step, ctx);
      }
      check_stmts(body, ctx);
    }
  }
}

fn check_expr(expr: &Expr, ctx: &mut SemanticContext) {
  match expr {
    Expr::BinOp { lhs, rhs, .. } => {
      check_expr(lhs, ctx);
      check_expr(rhs, ctx);
    }
    Expr::UnaryOp { operand, .. } => check_expr(operand, ctx),
    Expr::Number(_) => {}
    Expr::Variable(name) => {
      if !ctx.is_declared(name) {
        ctx.report(Diagnostic::UndeclaredVariable { name: name.clone() });
      }
    }
    Expr::Call(call) => check_call(call, ctx),
  }
}

fn check_call(call: &Call, ctx: &mut SemanticContext) {
  ctx.check_function(&call.name, call.args.len());
  for arg in &call.args {
    check_expr(arg, ctx);
  }
}
