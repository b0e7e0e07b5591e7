/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: Expression, prototype, function and top-level node types
/// - visitor: Double-dispatch traits over the node variants
pub mod ast;
pub mod visitor;

#[cfg(test)]
mod tests;
