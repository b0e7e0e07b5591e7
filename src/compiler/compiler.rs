//! Main compiler module.
//!
//! This module contains the core Compiler structure and drives the lowering
//! of top-level forms into SSA routines on a [`Backend`]. It owns the symbol
//! tables and guarantees that a failure while lowering one form leaves the
//! module usable for the next.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    ast::{
        ast::{Function, Prototype, TopLevel, ANON_FN_NAME},
        visitor::ItemVisitor,
    },
    errors::errors::{Error, ErrorImpl},
    ir::{Backend, Module},
};

/// Settings for a compilation unit.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    /// Name given to the backend module
    pub module_name: String,
    /// Run the backend's optimizer on every finished routine
    pub optimize: bool,
    /// Run the backend's verifier on every finished routine
    pub verify: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        CompilerOptions {
            module_name: "hls".to_string(),
            optimize: true,
            verify: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    /// An `extern` prototype
    Declaration,
    /// A named `def`
    Definition,
    /// A bare top-level expression
    AnonymousExpression,
}

/// What a successfully lowered top-level form produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledItem {
    /// Name of the routine in the backend module
    pub name: String,
    pub kind: ItemKind,
}

/// The main compiler structure that holds the state of the compilation process.
///
/// This structure manages:
/// - The backend receiving the SSA routines
/// - `globals`, every signature declared so far; entries are never removed
/// - `locals`, the variables visible in the routine being lowered
/// - The diagnostics reported for this compilation unit
///
/// # Type Parameters
///
/// * `B` - The backend that builds and owns the routines
pub struct Compiler<B: Backend> {
    pub options: CompilerOptions,
    pub(super) backend: B,

    /// Declared signatures by routine name
    pub(super) globals: HashMap<String, Prototype>,
    /// Variable name to current SSA value, for the routine being lowered
    pub(super) locals: HashMap<String, B::Value>,
    /// The routine being lowered, if any
    pub(super) current_function: Option<B::Function>,

    diagnostics: Vec<Error>,
    anonymous_count: usize,
}

impl Compiler<Module> {
    /// Creates a compiler over the built-in IR backend.
    pub fn new(options: CompilerOptions) -> Self {
        let module = Module::new(options.module_name.clone());
        Compiler::with_backend(module, options)
    }
}

impl Default for Compiler<Module> {
    fn default() -> Self {
        Compiler::new(CompilerOptions::default())
    }
}

impl<B: Backend> Compiler<B> {
    /// Creates a compiler emitting into `backend`.
    ///
    /// # Arguments
    ///
    /// * `backend` - An empty backend module
    /// * `options` - Verification and optimization settings
    pub fn with_backend(backend: B, options: CompilerOptions) -> Self {
        Compiler {
            options,
            backend,
            globals: HashMap::new(),
            locals: HashMap::new(),
            current_function: None,
            diagnostics: vec![],
            anonymous_count: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    /// Every lowering error reported so far, oldest first.
    pub fn diagnostics(&self) -> &[Error] {
        &self.diagnostics
    }

    /// The signature recorded for `name`, if any.
    pub fn signature(&self, name: &str) -> Option<&Prototype> {
        self.globals.get(name)
    }

    /// Lowers one top-level form.
    ///
    /// Failures are recorded in [`Compiler::diagnostics`] as well as
    /// returned; either way the compiler is ready for the next form.
    ///
    /// # Arguments
    ///
    /// * `item` - A form produced by the parser
    ///
    /// # Returns
    ///
    /// The name and kind of the routine that was declared or defined.
    pub fn compile_top_level(&mut self, item: &TopLevel) -> Result<CompiledItem, Error> {
        match item.accept(self) {
            Ok(compiled) => {
                debug!(name = %compiled.name, kind = ?compiled.kind, "lowered top-level form");
                Ok(compiled)
            }
            Err(error) => {
                warn!(%error, form = item.name(), "lowering failed");
                self.diagnostics.push(error.clone());
                Err(error)
            }
        }
    }

    /// Declares the routine described by `proto`, or returns the existing
    /// declaration if it has the same number of parameters.
    pub fn compile_prototype(&mut self, proto: &Prototype) -> Result<B::Function, Error> {
        if let Some(existing) = self.globals.get(&proto.name) {
            if existing.arity() != proto.arity() {
                return Err(Error::unpositioned(ErrorImpl::IncompatibleRedeclaration {
                    function: proto.name.clone(),
                    expected: existing.arity(),
                    received: proto.arity(),
                }));
            }
        }

        let function = match self.backend.lookup_function(&proto.name) {
            Some(function) if self.backend.param_count(function) == proto.arity() => function,
            Some(function) => {
                return Err(Error::unpositioned(ErrorImpl::IncompatibleRedeclaration {
                    function: proto.name.clone(),
                    expected: self.backend.param_count(function),
                    received: proto.arity(),
                }))
            }
            None => self.backend.declare_function(&proto.name, &proto.params)?,
        };

        self.globals.insert(proto.name.clone(), proto.clone());
        Ok(function)
    }

    /// Lowers a routine definition.
    ///
    /// A routine that already has a body is left untouched and the attempt
    /// fails. If the body fails to lower or to verify, the routine is erased
    /// so a later definition of the same name can succeed.
    pub fn compile_function(&mut self, function: &Function) -> Result<B::Function, Error> {
        let proto = if function.proto.is_anonymous() {
            self.anonymous_count += 1;
            Prototype {
                name: format!("{}.{}", ANON_FN_NAME, self.anonymous_count),
                params: vec![],
            }
        } else {
            function.proto.clone()
        };

        if let Some(existing) = self.backend.lookup_function(&proto.name) {
            if self.backend.has_body(existing) {
                return Err(Error::unpositioned(ErrorImpl::FunctionAlreadyDefined {
                    function: proto.name.clone(),
                }));
            }
        }

        let handle = self.compile_prototype(&proto)?;

        let entry = self.backend.open_block(handle, "entry");
        self.backend.set_insertion_point(entry);

        self.locals.clear();
        for (param, value) in proto.params.iter().zip(self.backend.param_values(handle)) {
            self.locals.insert(param.clone(), value);
        }
        self.current_function = Some(handle);

        let result = self.lower_body(handle, function);

        self.current_function = None;
        self.locals.clear();

        match result {
            Ok(()) => {
                if self.options.optimize {
                    self.backend.optimize(handle);
                }
                debug!(function = %proto.name, "defined function");
                Ok(handle)
            }
            Err(error) => {
                self.backend.erase(handle);
                Err(error)
            }
        }
    }

    fn lower_body(&mut self, handle: B::Function, function: &Function) -> Result<(), Error> {
        let value = function.body.accept(self)?;
        self.backend.emit_return(value)?;

        if self.options.verify {
            self.backend.verify(handle)?;
        }

        Ok(())
    }

    /// The routine being lowered.
    pub(super) fn current_function(&self) -> Result<B::Function, Error> {
        self.current_function.ok_or_else(|| {
            Error::unpositioned(ErrorImpl::Backend {
                message: "no function is being lowered".to_string(),
            })
        })
    }

    pub(super) fn current_block(&self) -> Result<B::Block, Error> {
        self.backend.current_block().ok_or_else(|| {
            Error::unpositioned(ErrorImpl::Backend {
                message: "no insertion point".to_string(),
            })
        })
    }

    /// Finds a callable routine. A name known to `globals` whose routine was
    /// erased after a failed definition is declared again.
    pub(super) fn resolve_function(&mut self, name: &str) -> Result<Option<B::Function>, Error> {
        if let Some(function) = self.backend.lookup_function(name) {
            return Ok(Some(function));
        }

        match self.globals.get(name) {
            Some(proto) => {
                let proto = proto.clone();
                Ok(Some(self.backend.declare_function(&proto.name, &proto.params)?))
            }
            None => Ok(None),
        }
    }

    /// Runs `scope` with `name` bound to `value`, then restores the previous
    /// binding, or removes the name if it had none. The restore happens on
    /// the error path too.
    pub(super) fn with_shadowed<T>(
        &mut self,
        name: &str,
        value: B::Value,
        scope: impl FnOnce(&mut Self) -> T,
    ) -> T {
        let previous = self.locals.insert(name.to_string(), value);

        let result = scope(self);

        match previous {
            Some(previous) => {
                self.locals.insert(name.to_string(), previous);
            }
            None => {
                self.locals.remove(name);
            }
        }

        result
    }
}

impl<B: Backend> ItemVisitor for Compiler<B> {
    type Output = Result<CompiledItem, Error>;

    fn visit_prototype(&mut self, proto: &Prototype) -> Self::Output {
        self.compile_prototype(proto)?;

        Ok(CompiledItem {
            name: proto.name.clone(),
            kind: ItemKind::Declaration,
        })
    }

    fn visit_function(&mut self, function: &Function) -> Self::Output {
        self.compile_function(function)?;

        if function.proto.is_anonymous() {
            Ok(CompiledItem {
                name: format!("{}.{}", ANON_FN_NAME, self.anonymous_count),
                kind: ItemKind::AnonymousExpression,
            })
        } else {
            Ok(CompiledItem {
                name: function.proto.name.clone(),
                kind: ItemKind::Definition,
            })
        }
    }
}
