//! Unit tests for the built-in IR: construction, verification,
//! optimization and interpretation.

use pretty_assertions::assert_eq;

use super::{ArithOp, Backend, BlockId, FunctionId, Interpreter, Module};
use crate::errors::errors::ErrorImpl;

fn names(params: &[&str]) -> Vec<String> {
    params.iter().map(|param| param.to_string()).collect()
}

/// add(a b) = a + b
fn build_add(module: &mut Module) -> FunctionId {
    let function = module.declare_function("add", &names(&["a", "b"])).unwrap();
    let params = module.param_values(function);
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);

    let sum = module.emit_binary(ArithOp::Add, params[0], params[1]).unwrap();
    module.emit_return(sum).unwrap();
    function
}

/// select(c a b) = if c then a else b
fn build_select(module: &mut Module) -> (FunctionId, [BlockId; 4]) {
    let function = module
        .declare_function("select", &names(&["c", "a", "b"]))
        .unwrap();
    let params = module.param_values(function);

    let entry = module.open_block(function, "entry");
    let then_block = module.open_block(function, "then");
    let else_block = module.open_block(function, "else");
    let merge = module.open_block(function, "ifcont");

    module.set_insertion_point(entry);
    let cond = module.emit_compare_ne_zero(params[0]).unwrap();
    module
        .emit_conditional_branch(cond, then_block, else_block)
        .unwrap();

    module.set_insertion_point(then_block);
    module.emit_jump(merge).unwrap();

    module.set_insertion_point(else_block);
    module.emit_jump(merge).unwrap();

    module.set_insertion_point(merge);
    let phi = module
        .emit_phi(&[(params[1], then_block), (params[2], else_block)])
        .unwrap();
    module.emit_return(module.phi_value(phi)).unwrap();

    (function, [entry, then_block, else_block, merge])
}

fn invalid_reason(module: &Module, function: FunctionId) -> String {
    match module.verify(function).unwrap_err().kind() {
        ErrorImpl::InvalidFunction { reason, .. } => reason.clone(),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn test_constants_are_interned() {
    let mut module = Module::new("test");

    let a = module.emit_constant(1.0);
    let b = module.emit_constant(1.0);
    let c = module.emit_constant(2.0);

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_ne!(module.emit_constant(0.0), module.emit_constant(-0.0));
    assert_eq!(module.constant_value(c), Some(2.0));
}

#[test]
fn test_declare_and_lookup() {
    let mut module = Module::new("test");
    let sin = module.declare_function("sin", &names(&["x"])).unwrap();

    assert_eq!(module.lookup_function("sin"), Some(sin));
    assert_eq!(module.param_count(sin), 1);
    assert!(!module.has_body(sin));
    assert_eq!(module.lookup_function("cos"), None);

    // Same arity returns the existing declaration
    assert_eq!(module.declare_function("sin", &names(&["y"])).unwrap(), sin);
    assert!(module.declare_function("sin", &names(&["x", "y"])).is_err());
}

#[test]
fn test_build_and_run_add() {
    let mut module = Module::new("test");
    let add = build_add(&mut module);

    assert!(module.verify(add).is_ok());
    assert!(module.has_body(add));

    let mut interpreter = Interpreter::new(&module);
    assert_eq!(interpreter.run("add", &[2.0, 3.5]).unwrap(), 5.5);
}

#[test]
fn test_select_merges_by_predecessor() {
    let mut module = Module::new("test");
    let (select, _) = build_select(&mut module);

    assert!(module.verify(select).is_ok());

    let mut interpreter = Interpreter::new(&module);
    assert_eq!(interpreter.run("select", &[1.0, 10.0, 20.0]).unwrap(), 10.0);
    assert_eq!(interpreter.run("select", &[0.0, 10.0, 20.0]).unwrap(), 20.0);
    assert_eq!(interpreter.run("select", &[-3.0, 10.0, 20.0]).unwrap(), 10.0);
}

#[test]
fn test_block_names_are_uniqued() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &[]).unwrap();

    let first = module.open_block(function, "then");
    let second = module.open_block(function, "then");

    assert_eq!(module.block(first).name, "then");
    assert_eq!(module.block(second).name, "then1");
}

#[test]
fn test_emission_rules() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &names(&["x"])).unwrap();
    let x = module.param_values(function)[0];

    // Nowhere to insert yet
    assert!(module.emit_binary(ArithOp::Add, x, x).is_err());

    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);

    // Booleans are not doubles
    let flag = module.emit_compare_lt(x, x).unwrap();
    assert!(module.emit_binary(ArithOp::Mul, flag, x).is_err());
    assert!(module.emit_return(flag).is_err());
    assert!(module.emit_convert_bool_to_scalar(x).is_err());

    // Wrong number of arguments
    assert!(module.emit_call(function, &[]).is_err());

    module.emit_return(x).unwrap();

    // The block is closed now
    assert!(module.emit_binary(ArithOp::Add, x, x).is_err());
    assert!(module.emit_jump(entry).is_err());
}

#[test]
fn test_verify_missing_terminator() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &[]).unwrap();
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);

    assert!(invalid_reason(&module, function).contains("no terminator"));
}

#[test]
fn test_verify_declaration_has_no_body() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &[]).unwrap();

    assert!(invalid_reason(&module, function).contains("no body"));
}

#[test]
fn test_verify_phi_needs_every_predecessor() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &names(&["x"])).unwrap();
    let x = module.param_values(function)[0];

    let entry = module.open_block(function, "entry");
    let then_block = module.open_block(function, "then");
    let merge = module.open_block(function, "merge");

    module.set_insertion_point(entry);
    let cond = module.emit_compare_ne_zero(x).unwrap();
    module.emit_conditional_branch(cond, then_block, merge).unwrap();

    module.set_insertion_point(then_block);
    module.emit_jump(merge).unwrap();

    // Missing the edge from `entry`
    module.set_insertion_point(merge);
    let phi = module.emit_phi(&[(x, then_block)]).unwrap();
    module.emit_return(phi).unwrap();

    let reason = invalid_reason(&module, function);
    assert!(reason.contains("incoming edges"), "{}", reason);

    module.add_incoming(phi, x, entry).unwrap();
    assert!(module.verify(function).is_ok());
}

#[test]
fn test_verify_dominance() {
    let mut module = Module::new("test");
    let function = module.declare_function("f", &names(&["x"])).unwrap();
    let x = module.param_values(function)[0];

    let entry = module.open_block(function, "entry");
    let then_block = module.open_block(function, "then");
    let merge = module.open_block(function, "merge");

    module.set_insertion_point(entry);
    let cond = module.emit_compare_ne_zero(x).unwrap();
    module.emit_conditional_branch(cond, then_block, merge).unwrap();

    module.set_insertion_point(then_block);
    let doubled = module.emit_binary(ArithOp::Add, x, x).unwrap();
    module.emit_jump(merge).unwrap();

    // `doubled` is not available on the edge from `entry`
    module.set_insertion_point(merge);
    module.emit_return(doubled).unwrap();

    let reason = invalid_reason(&module, function);
    assert!(reason.contains("does not dominate"), "{}", reason);
}

#[test]
fn test_verify_rejects_foreign_values() {
    let mut module = Module::new("test");
    build_add(&mut module);
    let add = module.lookup_function("add").unwrap();
    let foreign = module.param_values(add)[0];

    let function = module.declare_function("g", &[]).unwrap();
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);
    module.emit_return(foreign).unwrap();

    assert!(invalid_reason(&module, function).contains("another function"));
}

#[test]
fn test_optimize_folds_constants() {
    let mut module = Module::new("test");
    let function = module.declare_function("seven", &[]).unwrap();
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);

    let one = module.emit_constant(1.0);
    let two = module.emit_constant(2.0);
    let three = module.emit_constant(3.0);
    let product = module.emit_binary(ArithOp::Mul, two, three).unwrap();
    let sum = module.emit_binary(ArithOp::Add, one, product).unwrap();
    let less = module.emit_compare_lt(one, two).unwrap();
    let widened = module.emit_convert_bool_to_scalar(less).unwrap();
    let total = module.emit_binary(ArithOp::Add, sum, widened).unwrap();
    module.emit_return(total).unwrap();

    assert_eq!(module.instruction_count(function), 5);

    module.optimize(function);

    assert_eq!(module.instruction_count(function), 0);
    assert!(module.verify(function).is_ok());
    assert_eq!(Interpreter::new(&module).run("seven", &[]).unwrap(), 8.0);
}

#[test]
fn test_optimize_folds_constant_branch() {
    let mut module = Module::new("test");
    let function = module.declare_function("pick", &[]).unwrap();

    let entry = module.open_block(function, "entry");
    let then_block = module.open_block(function, "then");
    let else_block = module.open_block(function, "else");
    let merge = module.open_block(function, "ifcont");

    module.set_insertion_point(entry);
    let one = module.emit_constant(1.0);
    let cond = module.emit_compare_ne_zero(one).unwrap();
    module
        .emit_conditional_branch(cond, then_block, else_block)
        .unwrap();

    module.set_insertion_point(then_block);
    let ten = module.emit_constant(10.0);
    module.emit_jump(merge).unwrap();

    module.set_insertion_point(else_block);
    let twenty = module.emit_constant(20.0);
    module.emit_jump(merge).unwrap();

    module.set_insertion_point(merge);
    let phi = module
        .emit_phi(&[(ten, then_block), (twenty, else_block)])
        .unwrap();
    module.emit_return(phi).unwrap();

    module.optimize(function);

    assert_eq!(module.function(function).blocks.len(), 1);
    assert_eq!(module.instruction_count(function), 0);
    assert!(module.verify(function).is_ok());
    assert_eq!(Interpreter::new(&module).run("pick", &[]).unwrap(), 10.0);
}

#[test]
fn test_optimize_keeps_calls() {
    let mut module = Module::new("test");
    let effect = module.declare_function("effect", &names(&["x"])).unwrap();
    let function = module.declare_function("f", &[]).unwrap();
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);

    let one = module.emit_constant(1.0);
    module.emit_call(effect, &[one]).unwrap();
    module.emit_binary(ArithOp::Add, one, one).unwrap();
    let zero = module.emit_constant(0.0);
    module.emit_return(zero).unwrap();

    module.optimize(function);

    assert_eq!(module.instruction_count(function), 1);
}

#[test]
fn test_optimize_preserves_behaviour() {
    let mut module = Module::new("test");
    let (select, _) = build_select(&mut module);

    module.optimize(select);

    assert!(module.verify(select).is_ok());
    let mut interpreter = Interpreter::new(&module);
    assert_eq!(interpreter.run("select", &[1.0, 10.0, 20.0]).unwrap(), 10.0);
    assert_eq!(interpreter.run("select", &[0.0, 10.0, 20.0]).unwrap(), 20.0);
}

#[test]
fn test_erase() {
    let mut module = Module::new("test");
    let add = build_add(&mut module);

    module.erase(add);

    assert_eq!(module.lookup_function("add"), None);
    assert_eq!(module.functions().count(), 0);
    assert_eq!(module.current_block(), None);

    // A fresh declaration gets a new handle
    let again = module.declare_function("add", &names(&["a", "b"])).unwrap();
    assert_ne!(again, add);
    assert!(!module.has_body(again));
}

#[test]
fn test_interpreter_externs() {
    let mut module = Module::new("test");
    let sqrt = module.declare_function("sqrt", &names(&["x"])).unwrap();
    let function = module.declare_function("root", &names(&["x"])).unwrap();
    let x = module.param_values(function)[0];
    let entry = module.open_block(function, "entry");
    module.set_insertion_point(entry);
    let result = module.emit_call(sqrt, &[x]).unwrap();
    module.emit_return(result).unwrap();

    let err = Interpreter::new(&module).run("root", &[16.0]).unwrap_err();
    assert!(matches!(err.kind(), ErrorImpl::Execution { .. }));

    let mut interpreter = Interpreter::new(&module).with_math_library();
    assert_eq!(interpreter.run("root", &[16.0]).unwrap(), 4.0);

    let mut custom = Interpreter::new(&module).with_extern("sqrt", |_| 42.0);
    assert_eq!(custom.run("root", &[16.0]).unwrap(), 42.0);

    assert!(custom.run("missing", &[]).is_err());
    assert!(custom.run("root", &[]).is_err());
}

#[test]
fn test_interpreter_step_limit() {
    let mut module = Module::new("test");
    let function = module.declare_function("spin", &[]).unwrap();
    let entry = module.open_block(function, "entry");
    let body = module.open_block(function, "loop");

    module.set_insertion_point(entry);
    module.emit_jump(body).unwrap();
    module.set_insertion_point(body);
    module.emit_jump(body).unwrap();

    let err = Interpreter::new(&module)
        .with_step_limit(100)
        .run("spin", &[])
        .unwrap_err();

    assert!(matches!(
        err.kind(),
        ErrorImpl::Execution { message } if message.contains("step limit")
    ));
}

#[test]
fn test_display() {
    let mut module = Module::new("demo");
    module.declare_function("sin", &names(&["x"])).unwrap();
    build_add(&mut module);
    build_select(&mut module);

    let text = module.to_string();

    assert!(text.starts_with("; ModuleID = 'demo'"));
    assert!(text.contains("declare double @sin(double %x)"));
    assert!(text.contains("define double @add(double %a, double %b) {"));
    assert!(text.contains("fadd double %a, %b"));
    assert!(text.contains("fcmp one double %c, 0.0"));
    assert!(text.contains("br i1"));
    assert!(text.contains("phi double [ %a, %then ], [ %b, %else ]"));
}
