//! Three-address code generation.
//!
//! A single forward walk appends one line per primitive operation.
//! Expressions hand back the operand that holds their value: a variable
//! name, a literal, or a fresh temporary `tN`. Control constructs take a
//! numeric id from the context and derive their label pair from it.

use crate::ast::{Call, Expr, Operator, Program, Stmt};

#[derive(Debug, Default)]
pub struct TacContext {
  code: Vec<String>,
  temps: usize,
  labels: usize,
}

impl TacContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn emit(&mut self, line: impl Into<String>) {
    self.code.push(line.into());
  }

  /// Mint a temporary name never handed out before in this compilation.
  pub fn new_temp(&mut self) -> String {
    let temp = format!("t{}", self.temps);
    self.temps += 1;
    temp
  }

  /// Id shared by all labels of one control construct.
  pub fn new_label_id(&mut self) -> usize {
    let id = self.labels;
    self.labels += 1;
    id
  }

  pub fn code(&self) -> &[String] {
    &self.code
  }

  pub fn into_code(self) -> Vec<String> {
    self.code
  }

  pub fn render(&self) -> String {
    let mut out = String::new();
    for line in &self.code {
      out.push_str(line);
      out.push('\n');
    }
    out
  }
}

pub fn generate(program: &Program) -> TacContext {
  let mut ctx = TacContext::new();
  emit_program(program, &mut ctx);
  ctx
}

pub fn emit_program(program: &Program, ctx: &mut TacContext) {
  emit_stmts(&program.body, ctx);
}

fn emit_stmts(stmts: &[Stmt], ctx: &mut TacContext) {
  for stmt in stmts {
    emit_stmt(stmt, ctx);
  }
}

fn emit_stmt(stmt: &Stmt, ctx: &mut TacContext) {
  match stmt {
    Stmt::Assign { target, value } => {
      let value = emit_expr(value, ctx);
      ctx.emit(format!("{target} = {value}"));
    }
    Stmt::DeclVar { vars } => {
      for (name, init) in vars {
        if let Some(init) = init {
          let value = emit_expr(init, ctx);
          ctx.emit(format!("{name} = {value}"));
        }
      }
    }
    Stmt::Return { value } => {
      let value = emit_expr(value, ctx);
      ctx.emit(format!("return {value}"));
    }
    Stmt::FuncDecl { name, params, body } => {
      ctx.emit(format!("func {name}({})", params.join(", ")));
      emit_stmts(body, ctx);
      ctx.emit("endfunc");
    }
    Stmt::Call(call) => {
      emit_call(call, ctx);
    }
    Stmt::If {
      cond,
      then_body,
      else_body,
    } => {
      let id = ctx.new_label_id();
      let cond = emit_expr(cond, ctx);
      ctx.emit(format!("ifnot {cond} goto else_{id}"));
      emit_stmts(then_body, ctx);
      ctx.emit(format!("goto endif_{id}"));
      ctx.emit(format!("else_{id}:"));
      if let Some(else_body) = else_body {
        emit_stmts(else_body, ctx);
      }
      ctx.emit(format!("endif_{id}:"));
    }
    Stmt::While { cond, body } => {
      let id = ctx.new_label_id();
      ctx.emit(format!("while_{id}:"));
      let cond = emit_expr(cond, ctx);
      ctx.emit(format!("ifnot {cond} goto endwhile_{id}"));
      emit_stmts(body, ctx);
      ctx.emit(format!("goto while_{id}"));
      ctx.emit(format!("endwhile_{id}:"));
    }
    Stmt::For {
      init,
      cond,
      step,
      body,
    } => {
      if let Some(init) = init {
        emit_stmt(init, ctx);
      }
      let id = ctx.new_label_id();
      ctx.emit(format!("for_{id}:"));
      // No condition means the loop only ends through code outside the TAC.
      if let Some(cond) = cond {
        let cond = emit_expr(cond, ctx);
        ctx.emit(format!("ifnot {cond} goto endfor_{id}"));
      }
      emit_stmts(body, ctx);
      if let Some(step) = step {
        emit_stmt(step, ctx);
      }
      ctx.emit(format!("goto for_{id}"));
      ctx.emit(format!("endfor_{id}:"));
    }
  }
}

fn emit_expr(expr: &Expr, ctx: &mut TacContext) -> String {
  match expr {
    Expr::BinOp { op, lhs, rhs } => {
      let lhs = emit_expr(lhs, ctx);
      let rhs = emit_expr(rhs, ctx);
      let temp = ctx.new_temp();
      if *op == Operator::Not {
        ctx.emit(format!("# unsupported binary operator: {op}"));
      } else {
        ctx.emit(format!("{temp} = {lhs} {op} {rhs}"));
      }
      temp
    }
    Expr::UnaryOp { op, operand } => {
      let value = emit_expr(operand, ctx);
      let temp = ctx.new_temp();
      match op {
        Operator::Not => ctx.emit(format!("{temp} = !{value}")),
        _ => ctx.emit(format!("# unsupported unary operator: {op}")),
      }
      temp
    }
    Expr::Number(value) => value.to_string(),
    Expr::Variable(name) => name.clone(),
    Expr::Call(call) => emit_call(call, ctx),
  }
}

fn emit_call(call: &Call, ctx: &mut TacContext) -> String {
  let args: Vec<String> = call.args.iter().map(|arg| emit_expr(arg, ctx)).collect();
  let temp = ctx.new_temp();
  ctx.emit(format!("{temp} = call {}({})", call.name, args.join(", ")));
  temp
}
