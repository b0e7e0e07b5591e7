//! Code generation module for the compiler.
//!
//! This module lowers parsed top-level forms into SSA routines. It handles:
//!
//! - Declarations and definitions, with redefinition and arity checks
//! - Expressions, including conditionals and loops with phi nodes
//! - Scoping of parameters and loop induction variables
//! - Rollback of routines whose body fails to lower

pub mod compiler;
pub mod expr;
