//! IR Types
//!
//! Handles and per-entity data for the built-in SSA representation.

use std::fmt;

use super::instr::{InstrKind, Terminator};

/// An SSA value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// A basic block label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// A routine in the module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FunctionId(pub u32);

/// IR types. Every user-visible value is a double; comparisons produce `i1`
/// until widened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// 64-bit float
    F64,
    /// Boolean (1 bit)
    Bool,
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::F64 => write!(f, "double"),
            IrType::Bool => write!(f, "i1"),
        }
    }
}

/// Where a value comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueDef {
    /// Interned `double` constant
    Float(f64),
    /// Interned `i1` constant, only produced by folding
    Flag(bool),
    /// The `index`-th formal parameter of `function`
    Param { function: FunctionId, index: usize },
    /// Result of an instruction placed in `block`
    Instr { block: BlockId, kind: InstrKind },
}

#[derive(Debug, Clone)]
pub struct ValueData {
    pub ty: IrType,
    pub def: ValueDef,
}

impl ValueData {
    pub fn is_constant(&self) -> bool {
        matches!(self.def, ValueDef::Float(_) | ValueDef::Flag(_))
    }
}

/// A basic block contains a sequence of instructions
#[derive(Debug, Clone)]
pub struct BlockData {
    pub name: String,
    pub function: FunctionId,
    pub instructions: Vec<ValueId>,
    pub terminator: Option<Terminator>,
}

impl BlockData {
    pub fn new(name: String, function: FunctionId) -> Self {
        Self {
            name,
            function,
            instructions: Vec::new(),
            terminator: None,
        }
    }
}

/// A function in the IR. A function without blocks is a declaration.
#[derive(Debug, Clone)]
pub struct FunctionData {
    pub name: String,
    pub params: Vec<String>,
    pub param_values: Vec<ValueId>,
    pub blocks: Vec<BlockId>,
    /// Set once the function has been removed from the module
    pub erased: bool,
}

impl FunctionData {
    pub fn new(name: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            name: name.into(),
            params,
            param_values: Vec::new(),
            blocks: Vec::new(),
            erased: false,
        }
    }

    pub fn is_declaration(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn entry_block(&self) -> Option<BlockId> {
        self.blocks.first().copied()
    }
}
