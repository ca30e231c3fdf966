//! Syntax tree produced by the parser.
//!
//! Statements and expressions are separate sum types; each backend walks
//! them with exhaustive `match`es, so adding a variant fails to build until
//! every pass handles it. Nodes are never mutated after parsing.

use std::fmt;

/// Every operator the front-end knows, binary and unary alike.
///
/// Backends decide which operators they can lower in which position; a
/// combination they do not handle (such as `!` as a binary operator) is
/// emitted as a marker comment instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
  Add,
  Sub,
  Mul,
  Div,
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
  And,
  Or,
  Not,
}

impl Operator {
  pub fn symbol(self) -> &'static str {
    match self {
      Operator::Add => "+",
      Operator::Sub => "-",
      Operator::Mul => "*",
      Operator::Div => "/",
      Operator::Eq => "==",
      Operator::Ne => "!=",
      Operator::Lt => "<",
      Operator::Le => "<=",
      Operator::Gt => ">",
      Operator::Ge => ">=",
      Operator::And => "&&",
      Operator::Or => "||",
      Operator::Not => "!",
    }
  }

  pub fn from_symbol(symbol: &str) -> Option<Self> {
    let op = match symbol {
      "+" => Operator::Add,
      "-" => Operator::Sub,
      "*" => Operator::Mul,
      "/" => Operator::Div,
      "==" => Operator::Eq,
      "!=" => Operator::Ne,
      "<" => Operator::Lt,
      "<=" => Operator::Le,
      ">" => Operator::Gt,
      ">=" => Operator::Ge,
      "&&" => Operator::And,
      "||" => Operator::Or,
      "!" => Operator::Not,
      _ => return None,
    };
    Some(op)
  }
}

impl fmt::Display for Operator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.symbol())
  }
}

/// Root of the tree: the top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
  pub body: Vec<Stmt>,
}

/// A call site; appears both as a statement and inside expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
  pub name: String,
  pub args: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
  Assign {
    target: String,
    value: Expr,
  },
  DeclVar {
    vars: Vec<(String, Option<Expr>)>,
  },
  Return {
    value: Expr,
  },
  FuncDecl {
    name: String,
    params: Vec<String>,
    body: Vec<Stmt>,
  },
  Call(Call),
  If {
    cond: Expr,
    then_body: Vec<Stmt>,
    else_body: Option<Vec<Stmt>>,
  },
  While {
    cond: Expr,
    body: Vec<Stmt>,
  },
  /// `init` and `step` are always assignments when present.
  For {
    init: Option<Box<Stmt>>,
    cond: Option<Expr>,
    step: Option<Box<Stmt>>,
    body: Vec<Stmt>,
  },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
  BinOp {
    op: Operator,
    lhs: Box<Expr>,
    rhs: Box<Expr>,
  },
  UnaryOp {
    op: Operator,
    operand: Box<Expr>,
  },
  Number(i64),
  Variable(String),
  Call(Call),
}

impl Stmt {
  pub fn assign(target: impl Into<String>, value: Expr) -> Self {
    Self::Assign {
      target: target.into(),
      value,
    }
  }
}

impl Expr {
  pub fn number(value: i64) -> Self {
    Self::Number(value)
  }

  pub fn var(name: impl Into<String>) -> Self {
    Self::Variable(name.into())
  }

  pub fn binary(op: Operator, lhs: Expr, rhs: Expr) -> Self {
    Self::BinOp {
      op,
      lhs: Box::new(lhs),
      rhs: Box::new(rhs),
    }
  }

  pub fn unary(op: Operator, operand: Expr) -> Self {
    Self::UnaryOp {
      op,
      operand: Box::new(operand),
    }
  }

  pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
    Self::Call(Call {
      name: name.into(),
      args,
    })
  }
}
