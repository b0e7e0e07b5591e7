//! Integration tests for end-to-end compilation.
//!
//! These tests drive the complete pipeline from source text through
//! tokenization, parsing and SSA lowering, then execute the result on the
//! built-in interpreter.

use std::{cell::RefCell, rc::Rc};

use hls::{
    compiler::compiler::{Compiler, ItemKind},
    errors::errors::ErrorImpl,
    ir::Interpreter,
    parser::parser::parse_source,
    render_error,
    session::compile_source,
};
use pretty_assertions::assert_eq;

#[test]
fn test_compile_and_run_program() {
    let source = "
        # Iterative and recursive versions agree.
        def fib(x)
            if x < 3 then 1 else fib(x - 1) + fib(x - 2)

        extern sin(x)

        fib(15)
    ";

    let mut compiler = Compiler::default();
    let report = compile_source(source, Some("fib.hls".to_string()), &mut compiler);
    assert!(report.is_ok(), "{:?}", report.errors);

    let kinds: Vec<ItemKind> = report.items.iter().map(|item| item.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ItemKind::Definition,
            ItemKind::Declaration,
            ItemKind::AnonymousExpression
        ]
    );

    let module = compiler.backend();
    let mut interpreter = Interpreter::new(module);
    let result = interpreter.run(&report.items[2].name, &[]).unwrap();
    assert_eq!(result, 610.0);
}

#[test]
fn test_program_with_errors_keeps_good_forms() {
    let source = "def double(x) x * 2\ndef broken(x) x +\ndef triple(x) x * 3\ntriple(double(2))";

    let mut compiler = Compiler::default();
    let report = compile_source(source, Some("mixed.hls".to_string()), &mut compiler);

    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].is_parse_error());

    let names: Vec<&str> = report.items.iter().map(|item| item.name.as_str()).collect();
    assert_eq!(names, vec!["double", "triple", "__anon_expr.1"]);

    let mut interpreter = Interpreter::new(compiler.backend());
    assert_eq!(interpreter.run("__anon_expr.1", &[]).unwrap(), 12.0);
}

#[test]
fn test_lowering_error_renders_without_position() {
    let mut compiler = Compiler::default();
    let report = compile_source("def f(a) b", None, &mut compiler);

    assert_eq!(report.errors.len(), 1);
    assert!(matches!(
        report.errors[0].kind(),
        ErrorImpl::VariableNotDeclared { variable } if variable == "b"
    ));

    let rendered = render_error(&report.errors[0], "def f(a) b");
    assert!(rendered.starts_with("Error: VariableNotDeclared"));
}

#[test]
fn test_parse_error_renders_with_position() {
    let source = "def f(a)\n  a + )";
    let (items, errors) = parse_source(source, Some("test.hls".to_string()));

    assert!(items.is_empty());
    assert_eq!(errors.len(), 1);

    let rendered = render_error(&errors[0], source);
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines[1], "-> test.hls");
    assert_eq!(lines[3], "2 | a + )");
    assert!(lines[4].ends_with("----^"));
}

#[test]
fn test_session_state_persists_between_sources() {
    let mut compiler = Compiler::default();

    let first = compile_source("def square(x) x * x", None, &mut compiler);
    assert!(first.is_ok());

    let second = compile_source("square(9) + 1", None, &mut compiler);
    assert!(second.is_ok());

    let mut interpreter = Interpreter::new(compiler.backend());
    assert_eq!(interpreter.run(&second.items[0].name, &[]).unwrap(), 82.0);
}

#[test]
fn test_loop_with_extern_side_effects() {
    let source = "
        extern putchard(c)
        def line(n) for i = 0, i < n, 1 in putchard(42)
        line(3)
    ";

    let mut compiler = Compiler::default();
    let report = compile_source(source, None, &mut compiler);
    assert!(report.is_ok(), "{:?}", report.errors);

    let output = Rc::new(RefCell::new(String::new()));
    let sink = Rc::clone(&output);

    let mut interpreter = Interpreter::new(compiler.backend()).with_extern("putchard", move |args| {
        sink.borrow_mut().push(args[0] as u8 as char);
        0.0
    });

    let result = interpreter.run(&report.items[2].name, &[]).unwrap();
    assert_eq!(result, 0.0);
    assert_eq!(output.borrow().as_str(), "****");
}

#[test]
fn test_printed_module() {
    let mut compiler = Compiler::default();
    let report = compile_source("extern cos(x)\ndef add(a b) a + b", None, &mut compiler);
    assert!(report.is_ok());

    let printed = compiler.backend().to_string();
    assert!(printed.contains("declare double @cos(double %x)"));
    assert!(printed.contains("define double @add(double %a, double %b) {"));
    assert!(printed.contains("fadd double %a, %b"));
}
