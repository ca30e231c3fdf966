//! End-to-end runs through every stage of the public pipeline.

use rvtac::ast::Stmt;
use rvtac::{CompileError, Diagnostic, compile, generate_assembly, parse_source, sema, tac};

const SOMA: &str = "int soma(int x, int y) {\n    return x + y;\n}\n";

#[test]
fn soma_compiles_cleanly_through_both_backends() {
  let out = compile(SOMA).unwrap();
  assert!(out.diagnostics().is_empty());

  let tac = out.tac.code();
  assert_eq!(tac.first().unwrap(), "func soma(x, y)");
  assert!(tac.iter().any(|l| l == "t0 = x + y"));
  assert!(tac.iter().any(|l| l == "return t0"));
  assert_eq!(tac.last().unwrap(), "endfunc");

  let asm = out.asm.code();
  assert_eq!(asm[0], "soma:");
  let add = asm.iter().find(|l| l.starts_with("add ")).unwrap();
  let dest = add["add ".len()..].split(',').next().unwrap();
  let mv = format!("mv a0, {dest}");
  assert!(asm.iter().any(|l| *l == mv));
  assert_eq!(asm.iter().filter(|l| *l == "ret").count(), 1);
  assert_eq!(asm.last().unwrap(), "ret");
}

#[test]
fn rendered_listing_declares_parameters_as_globals() {
  let listing = generate_assembly(SOMA).unwrap();
  assert!(listing.starts_with(".data\nx: .word 0\ny: .word 0\n.text\n.globl main\nmain:\nsoma:\n"));
  assert!(listing.ends_with("ret\nli a7, 93\necall\n"));
}

#[test]
fn assignment_targets_follow_source_order() {
  let src = "a = 1; b = a * 2 + 3; c = b - a; d = (c + 1) / 2;";
  let program = parse_source(src).unwrap();
  let assigned: Vec<String> = program
    .body
    .iter()
    .map(|stmt| match stmt {
      Stmt::Assign { target, .. } => target.clone(),
      other => panic!("unexpected statement {other:?}"),
    })
    .collect();

  let targets: Vec<String> = tac::generate(&program)
    .code()
    .iter()
    .filter_map(|line| line.split(" = ").next())
    .filter(|dest| !dest.starts_with('t'))
    .map(str::to_string)
    .collect();
  assert_eq!(targets, assigned);
}

#[test]
fn function_scope_is_gone_for_sibling_functions() {
  let src = "int f() { x = 1; return x; }\nint g() { return x; }";
  let program = parse_source(src).unwrap();
  let ctx = sema::check(&program);
  assert_eq!(
    ctx.diagnostics(),
    [Diagnostic::UndeclaredVariable { name: "x".into() }]
  );
  assert_eq!(ctx.depth(), 1);
}

#[test]
fn arity_mismatch_is_reported_exactly_once() {
  let out = compile("int f(a, b) { return a + b; }\nr = f(1);").unwrap();
  let mismatches: Vec<&Diagnostic> = out
    .diagnostics()
    .iter()
    .filter(|d| matches!(d, Diagnostic::ArgumentCountMismatch { .. }))
    .collect();
  assert_eq!(
    mismatches,
    [&Diagnostic::ArgumentCountMismatch {
      name: "f".into(),
      expected: 2,
      found: 1,
    }]
  );
}

#[test]
fn diagnostics_do_not_block_code_generation() {
  let out = compile("x = y;").unwrap();
  assert_eq!(out.diagnostics().len(), 1);
  assert_eq!(out.tac.code(), ["x = y"]);
  assert!(out.asm.vars().any(|v| v == "y"));
}

#[test]
fn syntax_error_aborts_everything() {
  let err = compile("int f( { }").unwrap_err();
  assert!(err.is_syntax());
}

#[test]
fn lexical_error_points_at_the_character() {
  let err = compile("x = 1;\ny = 2 # 3;").unwrap_err();
  assert!(matches!(err, CompileError::WithLocation { .. }));
  assert_eq!(err.to_string(), "'y = 2 # 3;'\n       ^ invalid token: '#'");
}

#[test]
fn factorial_program_uses_every_construct() {
  let src = r#"
    int fat(n) {
      int r = 1;
      while (n > 1) {
        r = r * n;
        n = n - 1;
      }
      return r;
    }
    int total = 0, i;
    for (i = 0; i <= 5; i = i + 1) {
      if (i != 3 && !(i == 4)) {
        total = total + fat(i);
      } else {
        log(i);
      }
    }
  "#;
  let out = compile(src).unwrap();
  assert_eq!(
    out.diagnostics(),
    [Diagnostic::UndeclaredFunction { name: "log".into() }]
  );

  let tac = out.tac.render();
  for label in ["while_0:", "for_1:", "else_2:", "endif_2:", "endfor_1:"] {
    assert!(tac.contains(label), "missing {label} in\n{tac}");
  }
  assert!(tac.contains("call fat(i)"));

  let asm = out.asm.render();
  for needle in ["fat:", "WHILE0:", "FOR2:", "ELSE4:", "ENDIF5:", "call fat", "call log", "seqz", "and "] {
    assert!(asm.contains(needle), "missing {needle} in\n{asm}");
  }
  assert!(asm.contains("i: .word 0\nn: .word 0\nr: .word 0\ntotal: .word 0\n"));
}
