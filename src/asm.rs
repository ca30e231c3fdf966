//! Code generation: lower the parsed program into RISC-V style assembly.
//!
//! Every variable, parameters included, is a global word in `.data`; each
//! read or write recomputes its address with `la` into a fresh register.
//! Function bodies are emitted inline after `main:` and closed with `ret`.
//!
//! Working registers come from a pool of seven handed out round-robin with
//! no liveness tracking, so a value that stays live across seven further
//! allocations has its register overwritten. Arguments travel in `a0..a7`
//! and results come back in `a0`.
//!
//! Each argument is moved into its `aN` register as soon as it is
//! evaluated, so a later argument that itself makes a call overwrites the
//! argument registers already loaded: `f(1, g(2))` reaches `f` with `g`'s
//! result in `a0`. `ra` is never saved either, so a function that calls
//! another one returns through the callee's return address.

use std::collections::BTreeSet;

use crate::ast::{Call, Expr, Operator, Program, Stmt};
use crate::error::{CompileError, CompileResult};

pub const WORK_REGISTERS: usize = 7;

pub const ARG_REGISTERS: [&str; 8] = ["a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7"];

#[derive(Debug, Default)]
pub struct AsmContext {
  code: Vec<String>,
  labels: usize,
  vars: BTreeSet<String>,
  regs: usize,
}

impl AsmContext {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn emit(&mut self, line: impl Into<String>) {
    self.code.push(line.into());
  }

  /// `<prefix><n>`, with one counter shared by every prefix.
  pub fn new_label(&mut self, prefix: &str) -> String {
    let label = format!("{prefix}{}", self.labels);
    self.labels += 1;
    label
  }

  pub fn declare_var(&mut self, name: &str) {
    self.vars.insert(name.to_string());
  }

  /// Next working register, `t0` through `t6`, wrapping around.
  pub fn new_reg(&mut self) -> String {
    let reg = format!("t{}", self.regs % WORK_REGISTERS);
    self.regs += 1;
    reg
  }

  pub fn code(&self) -> &[String] {
    &self.code
  }

  pub fn vars(&self) -> impl Iterator<Item = &str> {
    self.vars.iter().map(String::as_str)
  }

  /// The complete listing: data section, entry point, code, exit syscall.
  pub fn render(&self) -> String {
    let mut asm = String::new();
    asm.push_str(".data\n");
    for var in &self.vars {
      asm.push_str(&format!("{var}: .word 0\n"));
    }
    asm.push_str(".text\n");
    asm.push_str(".globl main\n");
    asm.push_str("main:\n");
    for line in &self.code {
      asm.push_str(line);
      asm.push('\n');
    }
    asm.push_str("li a7, 93\n");
    asm.push_str("ecall\n");
    asm
  }
}

pub fn generate(program: &Program) -> CompileResult<AsmContext> {
  let mut ctx = AsmContext::new();
  emit_program(program, &mut ctx)?;
  Ok(ctx)
}

pub fn emit_program(program: &Program, ctx: &mut AsmContext) -> CompileResult<()> {
  emit_stmts(&program.body, ctx)
}

fn emit_stmts(stmts: &[Stmt], ctx: &mut AsmContext) -> CompileResult<()> {
  for stmt in stmts {
    emit_stmt(stmt, ctx)?;
  }
  Ok(())
}

fn emit_store(name: &str, value: &str, ctx: &mut AsmContext) {
  let addr = ctx.new_reg();
  ctx.emit(format!("la {addr}, {name}"));
  ctx.emit(format!("sw {value}, 0({addr})"));
}

fn emit_stmt(stmt: &Stmt, ctx: &mut AsmContext) -> CompileResult<()> {
  match stmt {
    Stmt::Assign { target, value } => {
      ctx.declare_var(target);
      let value = emit_expr(value, ctx)?;
      emit_store(target, &value, ctx);
    }
    Stmt::DeclVar { vars } => {
      for (name, init) in vars {
        ctx.declare_var(name);
        if let Some(init) = init {
          let value = emit_expr(init, ctx)?;
          emit_store(name, &value, ctx);
        }
      }
    }
    Stmt::Return { value } => {
      // Only sets the result; the enclosing function emits `ret`.
      let value = emit_expr(value, ctx)?;
      ctx.emit(format!("mv a0, {value}"));
    }
    Stmt::FuncDecl { name, params, body } => {
      if params.len() > ARG_REGISTERS.len() {
        return Err(CompileError::TooManyParameters {
          function: name.clone(),
          count: params.len(),
        });
      }
      ctx.emit(format!("{name}:"));
      for (param, reg) in params.iter().zip(ARG_REGISTERS) {
        ctx.declare_var(param);
        emit_store(param, reg, ctx);
      }
      emit_stmts(body, ctx)?;
      ctx.emit("ret");
    }
    Stmt::Call(call) => {
      emit_call(call, ctx)?;
    }
    Stmt::If {
      cond,
      then_body,
      else_body,
    } => {
      let cond = emit_expr(cond, ctx)?;
      let else_label = ctx.new_label("ELSE");
      let end_label = ctx.new_label("ENDIF");
      ctx.emit(format!("beq {cond}, zero, {else_label}"));
      emit_stmts(then_body, ctx)?;
      ctx.emit(format!("j {end_label}"));
      ctx.emit(format!("{else_label}:"));
      if let Some(else_body) = else_body {
        emit_stmts(else_body, ctx)?;
      }
      ctx.emit(format!("{end_label}:"));
    }
    Stmt::While { cond, body } => {
      let start_label = ctx.new_label("WHILE");
      let end_label = ctx.new_label("ENDWHILE");
      ctx.emit(format!("{start_label}:"));
      let cond = emit_expr(cond, ctx)?;
      ctx.emit(format!("beq {cond}, zero, {end_label}"));
      emit_stmts(body, ctx)?;
      ctx.emit(format!("j {start_label}"));
      ctx.emit(format!("{end_label}:"));
    }
    Stmt::For {
      init,
      cond,
      step,
      body,
    } => {
      if let Some(init) = init {
        emit_stmt(init, ctx)?;
      }
      let start_label = ctx.new_label("FOR");
      let end_label = ctx.new_label("ENDFOR");
      ctx.emit(format!("{start_label}:"));
      if let Some(cond) = cond {
        let cond = emit_expr(cond, ctx)?;
        ctx.emit(format!("beq {cond}, zero, {end_label}"));
      }
      emit_stmts(body, ctx)?;
      if let Some(step) = step {
        emit_stmt(step, ctx)?;
      }
      ctx.emit(format!("j {start_label}"));
      ctx.emit(format!("{end_label}:"));
    }
  }
  Ok(())
}

/// Emit code for an expression and return the register holding its value.
fn emit_expr(expr: &Expr, ctx: &mut AsmContext) -> CompileResult<String> {
  match expr {
    Expr::BinOp { op, lhs, rhs } => {
      let l = emit_expr(lhs, ctx)?;
      let r = emit_expr(rhs, ctx)?;
      let dest = ctx.new_reg();
      emit_binary(*op, &dest, &l, &r, ctx);
      Ok(dest)
    }
    Expr::UnaryOp { op, operand } => {
      let value = emit_expr(operand, ctx)?;
      let dest = ctx.new_reg();
      match op {
        Operator::Not => ctx.emit(format!("seqz {dest}, {value}")),
        _ => ctx.emit(format!("# unsupported unary operator: {op}")),
      }
      Ok(dest)
    }
    Expr::Number(value) => {
      let reg = ctx.new_reg();
      ctx.emit(format!("li {reg}, {value}"));
      Ok(reg)
    }
    Expr::Variable(name) => {
      ctx.declare_var(name);
      let addr = ctx.new_reg();
      let value = ctx.new_reg();
      ctx.emit(format!("la {addr}, {name}"));
      ctx.emit(format!("lw {value}, 0({addr})"));
      Ok(value)
    }
    Expr::Call(call) => emit_call(call, ctx),
  }
}

fn emit_binary(op: Operator, dest: &str, l: &str, r: &str, ctx: &mut AsmContext) {
  match op {
    Operator::Add => ctx.emit(format!("add {dest}, {l}, {r}")),
    Operator::Sub => ctx.emit(format!("sub {dest}, {l}, {r}")),
    Operator::Mul => ctx.emit(format!("mul {dest}, {l}, {r}")),
    Operator::Div => ctx.emit(format!("div {dest}, {l}, {r}")),
    Operator::Eq => {
      ctx.emit(format!("sub {dest}, {l}, {r}"));
      ctx.emit(format!("seqz {dest}, {dest}"));
    }
    Operator::Ne => {
      ctx.emit(format!("sub {dest}, {l}, {r}"));
      ctx.emit(format!("snez {dest}, {dest}"));
    }
    Operator::Lt => ctx.emit(format!("slt {dest}, {l}, {r}")),
    Operator::Le => {
      ctx.emit(format!("slt {dest}, {r}, {l}"));
      ctx.emit(format!("xori {dest}, {dest}, 1"));
    }
    Operator::Gt => ctx.emit(format!("slt {dest}, {r}, {l}")),
    Operator::Ge => {
      ctx.emit(format!("slt {dest}, {l}, {r}"));
      ctx.emit(format!("xori {dest}, {dest}, 1"));
    }
    Operator::And => {
      ctx.emit(format!("snez {l}, {l}"));
      ctx.emit(format!("snez {r}, {r}"));
      ctx.emit(format!("and {dest}, {l}, {r}"));
    }
    Operator::Or => {
      ctx.emit(format!("snez {l}, {l}"));
      ctx.emit(format!("snez {r}, {r}"));
      ctx.emit(format!("or {dest}, {l}, {r}"));
    }
    Operator::Not => ctx.emit(format!("# unsupported binary operator: {op}")),
  }
}

/// Arguments are evaluated and moved into `a0..a7` one at a time.
fn emit_call(call: &Call, ctx: &mut AsmContext) -> CompileResult<String> {
  if call.args.len() > ARG_REGISTERS.len() {
    return Err(CompileError::TooManyArguments {
      function: call.name.clone(),
      count: call.args.len(),
    });
  }
  for (arg, reg) in call.args.iter().zip(ARG_REGISTERS) {
    let value = emit_expr(arg, ctx)?;
    ctx.emit(format!("mv {reg}, {value}"));
  }
  ctx.emit(format!("call {}", call.name));
  let dest = ctx.new_reg();
  ctx.emit(format!("mv {dest}, a0"));
  Ok(dest)
}
