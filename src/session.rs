//! Source-to-module driver loop.
//!
//! Pulls one top-level form at a time from the parser and hands it straight
//! to the compiler, so a bad form only costs itself.

use tracing::{debug, info_span};

use crate::{
    compiler::compiler::{CompiledItem, Compiler},
    errors::errors::Error,
    ir::Backend,
    lexer::lexer::Lexer,
    parser::parser::Parser,
};

/// Outcome of compiling one source text.
#[derive(Debug, Default)]
pub struct CompileReport {
    /// Successfully lowered forms, in source order
    pub items: Vec<CompiledItem>,
    /// Parse and lowering errors, in source order
    pub errors: Vec<Error>,
}

impl CompileReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parses and lowers every form in `source` into `compiler`.
///
/// # Arguments
///
/// * `source` - Program text
/// * `file` - Name used in error positions (defaults to "shell")
/// * `compiler` - Receives the forms; keeps its state between calls
pub fn compile_source<B: Backend>(
    source: &str,
    file: Option<String>,
    compiler: &mut Compiler<B>,
) -> CompileReport {
    let lexer = Lexer::new(source, file);
    let span = info_span!("compile", file = %lexer.file());
    let _guard = span.enter();

    let mut parser = Parser::new(lexer);
    let mut report = CompileReport::default();

    loop {
        match parser.next_top_level_form() {
            Ok(Some(item)) => match compiler.compile_top_level(&item) {
                Ok(compiled) => report.items.push(compiled),
                Err(error) => report.errors.push(error),
            },
            Ok(None) => break,
            Err(error) => report.errors.push(error),
        }
    }

    debug!(
        items = report.items.len(),
        errors = report.errors.len(),
        "finished compiling source"
    );

    report
}
