use super::ast::{Expr, Function, Prototype};

/// One method per expression variant, dispatched by [`Expr::accept`].
pub trait ExprVisitor {
    type Output;

    fn visit_number(&mut self, value: f64) -> Self::Output;

    fn visit_variable(&mut self, name: &str) -> Self::Output;

    fn visit_binary(&mut self, op: char, lhs: &Expr, rhs: &Expr) -> Self::Output;

    fn visit_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Self::Output;

    fn visit_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Self::Output;

    fn visit_call(&mut self, callee: &str, args: &[Expr]) -> Self::Output;
}

/// Dispatch over top-level items, used by [`super::ast::TopLevel::accept`].
pub trait ItemVisitor {
    type Output;

    fn visit_prototype(&mut self, proto: &Prototype) -> Self::Output;

    fn visit_function(&mut self, function: &Function) -> Self::Output;
}

/// Counts nodes per variant. Handy for sanity checks on parsed trees.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NodeCounter {
    pub numbers: usize,
    pub variables: usize,
    pub binaries: usize,
    pub conditionals: usize,
    pub loops: usize,
    pub calls: usize,
}

impl NodeCounter {
    pub fn count(expr: &Expr) -> Self {
        let mut counter = NodeCounter::default();
        expr.accept(&mut counter);
        counter
    }

    pub fn total(&self) -> usize {
        self.numbers + self.variables + self.binaries + self.conditionals + self.loops + self.calls
    }
}

impl ExprVisitor for NodeCounter {
    type Output = ();

    fn visit_number(&mut self, _value: f64) {
        self.numbers += 1;
    }

    fn visit_variable(&mut self, _name: &str) {
        self.variables += 1;
    }

    fn visit_binary(&mut self, _op: char, lhs: &Expr, rhs: &Expr) {
        self.binaries += 1;
        lhs.accept(self);
        rhs.accept(self);
    }

    fn visit_conditional(&mut self, condition: &Expr, then_branch: &Expr, else_branch: &Expr) {
        self.conditionals += 1;
        condition.accept(self);
        then_branch.accept(self);
        else_branch.accept(self);
    }

    fn visit_for(&mut self, _var: &str, start: &Expr, end: &Expr, step: Option<&Expr>, body: &Expr) {
        self.loops += 1;
        start.accept(self);
        end.accept(self);
        if let Some(step) = step {
            step.accept(self);
        }
        body.accept(self);
    }

    fn visit_call(&mut self, _callee: &str, args: &[Expr]) {
        self.calls += 1;
        for arg in args {
            arg.accept(self);
        }
    }
}
