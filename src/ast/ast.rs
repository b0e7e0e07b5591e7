use std::fmt::{self, Display};

use super::visitor::{ExprVisitor, ItemVisitor};

/// Name given to the prototype wrapping a top-level expression.
pub const ANON_FN_NAME: &str = "__anon_expr";

/// Expression nodes.
///
/// Children are exclusively owned, so every tree is acyclic. Equality is
/// structural: same variant, then recursively equal fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Binary {
        op: char,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Conditional {
        condition: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Box<Expr>,
    },
    /// `for var = start, end[, step] in body`
    ///
    /// `end` is re-evaluated every iteration with `var` bound; the loop keeps
    /// going while it is non-zero.
    For {
        var: String,
        start: Box<Expr>,
        end: Box<Expr>,
        step: Option<Box<Expr>>,
        body: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn number(value: f64) -> Self {
        Expr::Number(value)
    }

    pub fn variable(name: &str) -> Self {
        Expr::Variable(name.to_string())
    }

    pub fn binary(op: char, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Expr) -> Self {
        Expr::Conditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        }
    }

    pub fn for_loop(var: &str, start: Expr, end: Expr, step: Option<Expr>, body: Expr) -> Self {
        Expr::For {
            var: var.to_string(),
            start: Box::new(start),
            end: Box::new(end),
            step: step.map(Box::new),
            body: Box::new(body),
        }
    }

    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: callee.to_string(),
            args,
        }
    }

    /// Double dispatch into `visitor`, one method per variant.
    pub fn accept<V: ExprVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            Expr::Number(value) => visitor.visit_number(*value),
            Expr::Variable(name) => visitor.visit_variable(name),
            Expr::Binary { op, lhs, rhs } => visitor.visit_binary(*op, lhs, rhs),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => visitor.visit_conditional(condition, then_branch, else_branch),
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => visitor.visit_for(var, start, end, step.as_deref(), body),
            Expr::Call { callee, args } => visitor.visit_call(callee, args),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Variable(name) => write!(f, "{}", name),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op, rhs),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => write!(
                f,
                "(if {} then {} else {})",
                condition, then_branch, else_branch
            ),
            Expr::For {
                var,
                start,
                end,
                step,
                body,
            } => {
                write!(f, "(for {} = {}, {}", var, start, end)?;
                if let Some(step) = step {
                    write!(f, ", {}", step)?;
                }
                write!(f, " in {})", body)
            }
            Expr::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A routine signature: its name and parameter names.
///
/// Parameter names are unique; the parser rejects duplicates.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
}

impl Prototype {
    pub fn new(name: &str, params: &[&str]) -> Self {
        Prototype {
            name: name.to_string(),
            params: params.iter().map(|param| param.to_string()).collect(),
        }
    }

    pub fn anonymous() -> Self {
        Prototype {
            name: ANON_FN_NAME.to_string(),
            params: vec![],
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.name == ANON_FN_NAME
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl Display for Prototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Expr,
}

impl Function {
    pub fn new(proto: Prototype, body: Expr) -> Self {
        Function { proto, body }
    }

    /// Wraps a top-level expression in a parameterless anonymous routine.
    pub fn anonymous(body: Expr) -> Self {
        Function {
            proto: Prototype::anonymous(),
            body,
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.proto.is_anonymous() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "def {} {}", self.proto, self.body)
        }
    }
}

/// One top-level form, as handed from the parser to the compiler.
#[derive(Debug, Clone, PartialEq)]
pub enum TopLevel {
    Definition(Function),
    Extern(Prototype),
}

impl TopLevel {
    pub fn name(&self) -> &str {
        match self {
            TopLevel::Definition(function) => &function.proto.name,
            TopLevel::Extern(proto) => &proto.name,
        }
    }

    pub fn accept<V: ItemVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self {
            TopLevel::Definition(function) => visitor.visit_function(function),
            TopLevel::Extern(proto) => visitor.visit_prototype(proto),
        }
    }
}

impl Display for TopLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopLevel::Definition(function) => write!(f, "{}", function),
            TopLevel::Extern(proto) => write!(f, "extern {}", proto),
        }
    }
}
