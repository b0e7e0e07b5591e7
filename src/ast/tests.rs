//! Unit tests for AST equality, display and visitor dispatch.

use pretty_assertions::{assert_eq, assert_ne};

use super::{
    ast::{Expr, Function, Prototype, TopLevel, ANON_FN_NAME},
    visitor::{ItemVisitor, NodeCounter},
};

fn sum_ab() -> Expr {
    Expr::binary('+', Expr::variable("a"), Expr::variable("b"))
}

#[test]
fn test_number_equality() {
    assert_eq!(Expr::number(1.0), Expr::number(1.0));
    assert_ne!(Expr::number(1.0), Expr::number(2.0));
}

#[test]
fn test_variable_equality() {
    assert_eq!(Expr::variable("a"), Expr::variable("a"));
    assert_ne!(Expr::variable("a"), Expr::variable("b"));
}

#[test]
fn test_binary_equality() {
    let a = Expr::binary('+', Expr::variable("a"), Expr::number(1.0));
    let b = Expr::binary('+', Expr::variable("a"), Expr::number(1.0));

    assert_eq!(a, b);
    assert_ne!(a, Expr::binary('+', Expr::variable("b"), Expr::number(2.0)));
    assert_ne!(a, Expr::binary('-', Expr::variable("a"), Expr::number(1.0)));
}

#[test]
fn test_call_equality() {
    let a = Expr::call("my_func_a", vec![Expr::variable("a"), Expr::number(1.0)]);
    let b = Expr::call("my_func_a", vec![Expr::variable("a"), Expr::number(1.0)]);
    let c = Expr::call(
        "my_func_a",
        vec![Expr::variable("c"), Expr::number(2.0), Expr::variable("e")],
    );

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_control_flow_equality() {
    let cond = || Expr::conditional(Expr::variable("x"), Expr::number(1.0), Expr::number(2.0));
    assert_eq!(cond(), cond());
    assert_ne!(
        cond(),
        Expr::conditional(Expr::variable("x"), Expr::number(2.0), Expr::number(1.0))
    );

    let with_step = Expr::for_loop(
        "i",
        Expr::number(0.0),
        Expr::variable("n"),
        Some(Expr::number(1.0)),
        Expr::variable("i"),
    );
    let without_step = Expr::for_loop(
        "i",
        Expr::number(0.0),
        Expr::variable("n"),
        None,
        Expr::variable("i"),
    );
    assert_eq!(with_step, with_step.clone());
    assert_ne!(with_step, without_step);
}

#[test]
fn test_inequality_across_variants() {
    assert_ne!(Expr::number(1.0), Expr::variable("a"));
    assert_ne!(Expr::variable("f"), Expr::call("f", vec![]));
    assert_ne!(sum_ab(), Expr::call("a", vec![Expr::variable("b")]));
    assert_ne!(
        TopLevel::Extern(Prototype::new("f", &["a"])),
        TopLevel::Definition(Function::new(Prototype::new("f", &["a"]), Expr::variable("a")))
    );
}

#[test]
fn test_prototype_and_function_equality() {
    assert_eq!(Prototype::new("my_func", &["a", "b"]), Prototype::new("my_func", &["a", "b"]));
    assert_ne!(Prototype::new("my_func", &["a", "b"]), Prototype::new("my_func", &["c", "d"]));

    let a = Function::new(Prototype::new("my_func", &["a", "b"]), sum_ab());
    let b = Function::new(Prototype::new("my_func", &["a", "b"]), sum_ab());
    let c = Function::new(
        Prototype::new("my_func", &["c", "d"]),
        Expr::binary('-', Expr::variable("c"), Expr::variable("d")),
    );

    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_anonymous_prototype() {
    let function = Function::anonymous(Expr::number(4.0));

    assert!(function.proto.is_anonymous());
    assert_eq!(function.proto.name, ANON_FN_NAME);
    assert_eq!(function.proto.arity(), 0);
}

#[test]
fn test_display() {
    let expr = Expr::binary(
        '*',
        sum_ab(),
        Expr::call("f", vec![Expr::number(1.5), Expr::variable("c")]),
    );
    assert_eq!(expr.to_string(), "((a + b) * f(1.5, c))");

    let looped = Expr::for_loop(
        "i",
        Expr::number(1.0),
        Expr::binary('<', Expr::variable("i"), Expr::variable("n")),
        None,
        Expr::conditional(Expr::variable("i"), Expr::number(1.0), Expr::number(0.0)),
    );
    assert_eq!(
        looped.to_string(),
        "(for i = 1, (i < n) in (if i then 1 else 0))"
    );

    let function = Function::new(Prototype::new("add", &["a", "b"]), sum_ab());
    assert_eq!(TopLevel::Definition(function).to_string(), "def add(a b) (a + b)");
    assert_eq!(
        TopLevel::Extern(Prototype::new("sin", &["x"])).to_string(),
        "extern sin(x)"
    );
}

#[test]
fn test_node_counter_visits_every_node() {
    let expr = Expr::for_loop(
        "i",
        Expr::number(0.0),
        Expr::binary('<', Expr::variable("i"), Expr::number(3.0)),
        Some(Expr::number(1.0)),
        Expr::call("f", vec![Expr::variable("i")]),
    );

    let counts = NodeCounter::count(&expr);

    assert_eq!(counts.loops, 1);
    assert_eq!(counts.numbers, 3);
    assert_eq!(counts.variables, 2);
    assert_eq!(counts.binaries, 1);
    assert_eq!(counts.calls, 1);
    assert_eq!(counts.total(), 8);
}

struct Names;

impl ItemVisitor for Names {
    type Output = String;

    fn visit_prototype(&mut self, proto: &Prototype) -> String {
        format!("extern:{}", proto.name)
    }

    fn visit_function(&mut self, function: &Function) -> String {
        format!("def:{}", function.proto.name)
    }
}

#[test]
fn test_item_visitor_dispatch() {
    let ext = TopLevel::Extern(Prototype::new("sin", &["x"]));
    let def = TopLevel::Definition(Function::new(Prototype::new("id", &["x"]), Expr::variable("x")));

    assert_eq!(ext.accept(&mut Names), "extern:sin");
    assert_eq!(def.accept(&mut Names), "def:id");
    assert_eq!(def.name(), "id");
}
