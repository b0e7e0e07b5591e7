use crate::{
    ast::{ast::Expr, visitor::ExprVisitor},
    errors::errors::{Error, ErrorImpl},
    ir::{ArithOp, Backend},
};

use super::compiler::Compiler;

/// Lowers expressions to SSA values. Operands are lowered left to right,
/// before the instruction that uses them.
impl<B: Backend> ExprVisitor for Compiler<B> {
    type Output = Result<B::Value, Error>;

    fn visit_number(&mut self, value: f64) -> Self::Output {
        Ok(self.backend.emit_constant(value))
    }

    fn visit_variable(&mut self, name: &str) -> Self::Output {
        self.locals.get(name).copied().ok_or_else(|| {
            Error::unpositioned(ErrorImpl::VariableNotDeclared {
                variable: name.to_string(),
            })
        })
    }

    fn visit_binary(&mut self, op: char, lhs: &Expr, rhs: &Expr) -> Self::Output {
        let lhs = lhs.accept(self)?;
        let rhs = rhs.accept(self)?;

        if op == '<' {
            let less = self.backend.emit_compare_lt(lhs, rhs)?;
            return self.backend.emit_convert_bool_to_scalar(less);
        }

        match ArithOp::from_operator(op) {
            Some(op) => self.backend.emit_binary(op, lhs, rhs),
            None => Err(Error::unpositioned(ErrorImpl::UnknownOperator { operator: op })),
        }
    }

    /// Lowers to a diamond: `then` and `else` both jump to `ifcont`, where a
    /// phi picks the value of whichever branch ran.
    fn visit_conditional(
        &mut self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: &Expr,
    ) -> Self::Output {
        let condition = condition.accept(self)?;
        let test = self.backend.emit_compare_ne_zero(condition)?;

        let function = self.current_function()?;
        let then_block = self.backend.open_block(function, "then");
        let else_block = self.backend.open_block(function, "else");
        let merge_block = self.backend.open_block(function, "ifcont");

        self.backend
            .emit_conditional_branch(test, then_block, else_block)?;

        // Nested control flow moves the insertion point, so the incoming
        // edge comes from wherever each branch ends.
        self.backend.set_insertion_point(then_block);
        let then_value = then_branch.accept(self)?;
        self.backend.emit_jump(merge_block)?;
        let then_end = self.current_block()?;

        self.backend.set_insertion_point(else_block);
        let else_value = else_branch.accept(self)?;
        self.backend.emit_jump(merge_block)?;
        let else_end = self.current_block()?;

        self.backend.set_insertion_point(merge_block);
        let phi = self
            .backend
            .emit_phi(&[(then_value, then_end), (else_value, else_end)])?;

        Ok(self.backend.phi_value(phi))
    }

    /// Lowers to a `loop` block entered from the current block, with the
    /// induction variable as a phi. The body runs before the end condition
    /// is tested, so it runs at least once. Evaluates to `0.0`.
    fn visit_for(
        &mut self,
        var: &str,
        start: &Expr,
        end: &Expr,
        step: Option<&Expr>,
        body: &Expr,
    ) -> Self::Output {
        let start_value = start.accept(self)?;

        let function = self.current_function()?;
        let preheader = self.current_block()?;
        let loop_block = self.backend.open_block(function, "loop");

        self.backend.emit_jump(loop_block)?;
        self.backend.set_insertion_point(loop_block);

        let phi = self.backend.emit_phi(&[(start_value, preheader)])?;
        let induction = self.backend.phi_value(phi);

        let (next_value, end_condition) = self.with_shadowed(var, induction, |compiler| {
            body.accept(compiler)?;

            let step_value = match step {
                Some(step) => step.accept(compiler)?,
                None => compiler.backend.emit_constant(1.0),
            };
            let next_value = compiler
                .backend
                .emit_binary(ArithOp::Add, induction, step_value)?;

            let end_value = end.accept(compiler)?;
            let end_condition = compiler.backend.emit_compare_ne_zero(end_value)?;

            Ok::<_, Error>((next_value, end_condition))
        })?;

        let loop_end = self.current_block()?;
        let after_block = self.backend.open_block(function, "afterloop");

        self.backend
            .emit_conditional_branch(end_condition, loop_block, after_block)?;
        self.backend.add_incoming(phi, next_value, loop_end)?;

        self.backend.set_insertion_point(after_block);

        Ok(self.backend.emit_constant(0.0))
    }

    fn visit_call(&mut self, callee: &str, args: &[Expr]) -> Self::Output {
        let function = self.resolve_function(callee)?.ok_or_else(|| {
            Error::unpositioned(ErrorImpl::UnknownFunction {
                function: callee.to_string(),
            })
        })?;

        let expected = self.backend.param_count(function);
        if args.len() > expected {
            return Err(Error::unpositioned(ErrorImpl::UnexpectedArguments {
                function: callee.to_string(),
                expected,
                received: args.len(),
            }));
        }
        if args.len() < expected {
            return Err(Error::unpositioned(ErrorImpl::MissingArguments {
                function: callee.to_string(),
                expected,
                received: args.len(),
            }));
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(arg.accept(self)?);
        }

        self.backend.emit_call(function, &values)
    }
}
