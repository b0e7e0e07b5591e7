//! The primitive operations the code generator needs from a backend.

use std::fmt::Debug;

use crate::errors::errors::Error;

use super::instr::ArithOp;

/// An SSA construction backend.
///
/// Handles are small copyable tokens owned by the backend. All values are
/// doubles except the results of the two comparison primitives, which stay
/// booleans until widened with [`Backend::emit_convert_bool_to_scalar`].
/// Emission goes to the block set with [`Backend::set_insertion_point`].
pub trait Backend {
    type Function: Copy + Debug;
    type Block: Copy + Debug + PartialEq;
    type Value: Copy + Debug;
    type Phi: Copy + Debug;

    /// Declares a routine taking one double per parameter and returning a
    /// double. Parameter names are attached for readability.
    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<Self::Function, Error>;

    fn lookup_function(&self, name: &str) -> Option<Self::Function>;

    fn param_count(&self, function: Self::Function) -> usize;

    /// Whether the routine already has a body.
    fn has_body(&self, function: Self::Function) -> bool;

    /// The SSA values bound to the formal parameters, in order.
    fn param_values(&self, function: Self::Function) -> Vec<Self::Value>;

    /// Appends a new, empty block to `function`.
    fn open_block(&mut self, function: Self::Function, name: &str) -> Self::Block;

    fn set_insertion_point(&mut self, block: Self::Block);

    fn current_block(&self) -> Option<Self::Block>;

    /// Returns the interned constant for `value`. Equal bit patterns give the
    /// same handle.
    fn emit_constant(&mut self, value: f64) -> Self::Value;

    fn emit_binary(
        &mut self,
        op: ArithOp,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, Error>;

    /// Unordered less-than.
    fn emit_compare_lt(&mut self, lhs: Self::Value, rhs: Self::Value)
        -> Result<Self::Value, Error>;

    /// Ordered not-equal against `0.0`.
    fn emit_compare_ne_zero(&mut self, value: Self::Value) -> Result<Self::Value, Error>;

    /// Widens a boolean to `0.0` or `1.0`.
    fn emit_convert_bool_to_scalar(&mut self, value: Self::Value) -> Result<Self::Value, Error>;

    fn emit_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
    ) -> Result<Self::Value, Error>;

    fn emit_conditional_branch(
        &mut self,
        cond: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> Result<(), Error>;

    fn emit_jump(&mut self, block: Self::Block) -> Result<(), Error>;

    /// Emits a double-typed phi at the insertion point. More incoming edges
    /// can be added later with [`Backend::add_incoming`].
    fn emit_phi(&mut self, incoming: &[(Self::Value, Self::Block)]) -> Result<Self::Phi, Error>;

    fn add_incoming(
        &mut self,
        phi: Self::Phi,
        value: Self::Value,
        block: Self::Block,
    ) -> Result<(), Error>;

    fn phi_value(&self, phi: Self::Phi) -> Self::Value;

    fn emit_return(&mut self, value: Self::Value) -> Result<(), Error>;

    /// Checks structural well-formedness of a finished routine.
    fn verify(&self, function: Self::Function) -> Result<(), Error>;

    fn optimize(&mut self, function: Self::Function);

    /// Removes the routine's body. The routine is dropped from the module,
    /// or left as a bodiless declaration when call sites still refer to it.
    fn erase(&mut self, function: Self::Function);
}
