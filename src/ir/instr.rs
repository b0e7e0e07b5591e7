//! IR Instructions
//!
//! Instruction and terminator definitions.

use std::fmt;

use super::types::{BlockId, FunctionId, ValueId};

/// Arithmetic on doubles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
}

impl ArithOp {
    /// Maps a source operator to its instruction, if it has one.
    pub fn from_operator(op: char) -> Option<Self> {
        match op {
            '+' => Some(ArithOp::Add),
            '-' => Some(ArithOp::Sub),
            '*' => Some(ArithOp::Mul),
            _ => None,
        }
    }

    pub fn apply(self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithOp::Add => lhs + rhs,
            ArithOp::Sub => lhs - rhs,
            ArithOp::Mul => lhs * rhs,
        }
    }
}

impl fmt::Display for ArithOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArithOp::Add => write!(f, "fadd"),
            ArithOp::Sub => write!(f, "fsub"),
            ArithOp::Mul => write!(f, "fmul"),
        }
    }
}

/// Float comparison predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    /// Unordered or less than
    Ult,
    /// Ordered and not equal
    One,
}

impl CmpOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            CmpOp::Ult => lhs.is_nan() || rhs.is_nan() || lhs < rhs,
            CmpOp::One => !lhs.is_nan() && !rhs.is_nan() && lhs != rhs,
        }
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CmpOp::Ult => write!(f, "ult"),
            CmpOp::One => write!(f, "one"),
        }
    }
}

/// Kinds of instructions. Every instruction defines exactly one value.
#[derive(Debug, Clone, PartialEq)]
pub enum InstrKind {
    Arith(ArithOp, ValueId, ValueId),
    FCmp(CmpOp, ValueId, ValueId),
    /// Unsigned int to float, used to widen `i1` to `double`
    UIToFP(ValueId),
    Call {
        callee: FunctionId,
        args: Vec<ValueId>,
    },
    /// Phi node for SSA form
    Phi(Vec<(ValueId, BlockId)>),
}

impl InstrKind {
    pub fn is_phi(&self) -> bool {
        matches!(self, InstrKind::Phi(_))
    }

    /// Whether removing an unused instance could change behaviour.
    pub fn has_side_effects(&self) -> bool {
        matches!(self, InstrKind::Call { .. })
    }

    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            InstrKind::Arith(_, a, b) | InstrKind::FCmp(_, a, b) => vec![*a, *b],
            InstrKind::UIToFP(v) => vec![*v],
            InstrKind::Call { args, .. } => args.clone(),
            InstrKind::Phi(incoming) => incoming.iter().map(|(value, _)| *value).collect(),
        }
    }

    /// Rewrites every use of `from` into `to`.
    pub fn replace_operand(&mut self, from: ValueId, to: ValueId) {
        let swap = |v: &mut ValueId| {
            if *v == from {
                *v = to;
            }
        };
        match self {
            InstrKind::Arith(_, a, b) | InstrKind::FCmp(_, a, b) => {
                swap(a);
                swap(b);
            }
            InstrKind::UIToFP(v) => swap(v),
            InstrKind::Call { args, .. } => args.iter_mut().for_each(swap),
            InstrKind::Phi(incoming) => incoming.iter_mut().for_each(|(v, _)| swap(v)),
        }
    }
}

/// Block terminators
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    /// Return from function
    Ret(ValueId),
    /// Unconditional branch
    Br(BlockId),
    /// Conditional branch
    CondBr {
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    },
}

impl Terminator {
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Terminator::Ret(_) => vec![],
            Terminator::Br(target) => vec![*target],
            Terminator::CondBr {
                then_block,
                else_block,
                ..
            } => {
                if then_block == else_block {
                    vec![*then_block]
                } else {
                    vec![*then_block, *else_block]
                }
            }
        }
    }

    pub fn operands(&self) -> Vec<ValueId> {
        match self {
            Terminator::Ret(value) => vec![*value],
            Terminator::Br(_) => vec![],
            Terminator::CondBr { cond, .. } => vec![*cond],
        }
    }

    pub fn replace_operand(&mut self, from: ValueId, to: ValueId) {
        match self {
            Terminator::Ret(value) | Terminator::CondBr { cond: value, .. } => {
                if *value == from {
                    *value = to;
                }
            }
            Terminator::Br(_) => {}
        }
    }
}
