//! Error types and error handling for the front end.
//!
//! Every phase reports failures through the same [`errors::Error`] type:
//!
//! - Parse errors carry the source position of the offending token
//! - Lowering, backend and execution errors are unpositioned
//! - Each variant has a stable name and a human-readable tip

pub mod errors;

#[cfg(test)]
mod tests;
