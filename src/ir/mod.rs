//! Built-in SSA intermediate representation.
//!
//! A small, self-contained backend for the code generator:
//! - `backend`: the primitive operations the code generator is written against
//! - `module`: arenas for values, blocks and functions, and the builder
//! - `verify` / `passes`: structural checks and clean-up passes
//! - `interp`: a reference interpreter used to observe lowered code
//! - `display`: LLVM-style textual dump

pub mod backend;
pub mod cfg;
mod display;
pub mod instr;
pub mod interp;
pub mod module;
pub mod passes;
pub mod types;
pub mod verify;

pub use backend::Backend;
pub use instr::{ArithOp, CmpOp, InstrKind, Terminator};
pub use interp::Interpreter;
pub use module::Module;
pub use types::{BlockId, FunctionId, IrType, ValueId};

#[cfg(test)]
mod tests;
