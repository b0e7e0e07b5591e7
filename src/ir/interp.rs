//! A reference interpreter for the built-in IR.
//!
//! Runs a routine on `f64` arguments. Declarations without a body resolve to
//! host functions registered with [`Interpreter::register_extern`]. Calls
//! are resolved by name at call time, so a routine redefined after an
//! earlier failed attempt is the one that runs.

use std::collections::HashMap;

use crate::errors::errors::{Error, ErrorImpl};

use super::{
    backend::Backend,
    instr::{InstrKind, Terminator},
    module::Module,
    types::{BlockId, FunctionId, ValueDef, ValueId},
};

pub type ExternFn = Box<dyn Fn(&[f64]) -> f64>;

/// Instructions executed before a run is abandoned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;
pub const MAX_CALL_DEPTH: usize = 256;

fn execution_error(message: impl Into<String>) -> Error {
    Error::unpositioned(ErrorImpl::Execution {
        message: message.into(),
    })
}

#[derive(Debug, Clone, Copy)]
enum Slot {
    Scalar(f64),
    Flag(bool),
}

pub struct Interpreter<'m> {
    module: &'m Module,
    externs: HashMap<String, ExternFn>,
    step_limit: usize,
    steps: usize,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m Module) -> Self {
        Interpreter {
            module,
            externs: HashMap::new(),
            step_limit: DEFAULT_STEP_LIMIT,
            steps: 0,
        }
    }

    pub fn register_extern(&mut self, name: &str, function: impl Fn(&[f64]) -> f64 + 'static) {
        self.externs.insert(name.to_string(), Box::new(function));
    }

    pub fn with_extern(mut self, name: &str, function: impl Fn(&[f64]) -> f64 + 'static) -> Self {
        self.register_extern(name, function);
        self
    }

    /// Registers the usual one-argument math functions.
    pub fn with_math_library(self) -> Self {
        self.with_extern("sin", unary(f64::sin))
            .with_extern("cos", unary(f64::cos))
            .with_extern("sqrt", unary(f64::sqrt))
            .with_extern("exp", unary(f64::exp))
            .with_extern("log", unary(f64::ln))
            .with_extern("fabs", unary(f64::abs))
    }

    pub fn with_step_limit(mut self, limit: usize) -> Self {
        self.step_limit = limit;
        self
    }

    /// Runs the routine currently bound to `name`.
    pub fn run(&mut self, name: &str, args: &[f64]) -> Result<f64, Error> {
        let function = self
            .module
            .lookup_function(name)
            .ok_or_else(|| execution_error(format!("no function named `{}`", name)))?;

        self.steps = 0;
        self.call(function, args, 0)
    }

    fn tick(&mut self) -> Result<(), Error> {
        self.steps += 1;
        if self.steps > self.step_limit {
            return Err(execution_error(format!(
                "step limit of {} exceeded",
                self.step_limit
            )));
        }
        Ok(())
    }

    fn call(&mut self, function: FunctionId, args: &[f64], depth: usize) -> Result<f64, Error> {
        let module = self.module;

        if depth > MAX_CALL_DEPTH {
            return Err(execution_error("call depth limit exceeded"));
        }

        let name = &module.function(function).name;
        let function = module.lookup_function(name).unwrap_or(function);
        let data = module.function(function);

        if data.params.len() != args.len() {
            return Err(execution_error(format!(
                "`{}` takes {} arguments, {} given",
                name,
                data.params.len(),
                args.len()
            )));
        }

        let Some(entry) = data.entry_block() else {
            return match self.externs.get(name) {
                Some(host) => Ok(host(args)),
                None => Err(execution_error(format!("unresolved external `{}`", name))),
            };
        };

        let mut env: HashMap<ValueId, Slot> = data
            .param_values
            .iter()
            .zip(args)
            .map(|(value, arg)| (*value, Slot::Scalar(*arg)))
            .collect();

        let mut previous: Option<BlockId> = None;
        let mut block = entry;

        loop {
            let block_data = module.block(block);
            let phi_count = module.leading_phis(block);

            // Phis read their inputs before any of them is written.
            let mut incoming_values = vec![];
            for id in &block_data.instructions[..phi_count] {
                if let Some(InstrKind::Phi(incoming)) = module.instruction(*id) {
                    let source = previous
                        .ok_or_else(|| execution_error("phi reached without a predecessor"))?;
                    let (value, _) = incoming
                        .iter()
                        .find(|(_, from)| *from == source)
                        .ok_or_else(|| execution_error(format!("{} has no edge from {}", id, source)))?;
                    incoming_values.push((*id, read(module, &env, *value)?));
                }
            }
            env.extend(incoming_values);

            for id in &block_data.instructions[phi_count..] {
                self.tick()?;

                let slot = match module.instruction(*id) {
                    Some(InstrKind::Arith(op, a, b)) => {
                        Slot::Scalar(op.apply(scalar(module, &env, *a)?, scalar(module, &env, *b)?))
                    }
                    Some(InstrKind::FCmp(op, a, b)) => {
                        Slot::Flag(op.apply(scalar(module, &env, *a)?, scalar(module, &env, *b)?))
                    }
                    Some(InstrKind::UIToFP(v)) => {
                        Slot::Scalar(if flag(module, &env, *v)? { 1.0 } else { 0.0 })
                    }
                    Some(InstrKind::Call { callee, args }) => {
                        let values = args
                            .iter()
                            .map(|arg| scalar(module, &env, *arg))
                            .collect::<Result<Vec<f64>, Error>>()?;
                        Slot::Scalar(self.call(*callee, &values, depth + 1)?)
                    }
                    Some(InstrKind::Phi(_)) | None => {
                        return Err(execution_error(format!("{} is not executable here", id)))
                    }
                };

                env.insert(*id, slot);
            }

            self.tick()?;

            match &block_data.terminator {
                Some(Terminator::Ret(value)) => return scalar(module, &env, *value),
                Some(Terminator::Br(target)) => {
                    previous = Some(block);
                    block = *target;
                }
                Some(Terminator::CondBr {
                    cond,
                    then_block,
                    else_block,
                }) => {
                    previous = Some(block);
                    block = if flag(module, &env, *cond)? {
                        *then_block
                    } else {
                        *else_block
                    };
                }
                None => {
                    return Err(execution_error(format!(
                        "block `{}` has no terminator",
                        block_data.name
                    )))
                }
            }
        }
    }
}

fn unary(function: fn(f64) -> f64) -> impl Fn(&[f64]) -> f64 {
    move |args| args.first().map_or(f64::NAN, |arg| function(*arg))
}

fn read(module: &Module, env: &HashMap<ValueId, Slot>, id: ValueId) -> Result<Slot, Error> {
    match module.value(id).def {
        ValueDef::Float(value) => Ok(Slot::Scalar(value)),
        ValueDef::Flag(value) => Ok(Slot::Flag(value)),
        _ => env
            .get(&id)
            .copied()
            .ok_or_else(|| execution_error(format!("{} used before definition", id))),
    }
}

fn scalar(module: &Module, env: &HashMap<ValueId, Slot>, id: ValueId) -> Result<f64, Error> {
    match read(module, env, id)? {
        Slot::Scalar(value) => Ok(value),
        Slot::Flag(_) => Err(execution_error(format!("{} is not a double", id))),
    }
}

fn flag(module: &Module, env: &HashMap<ValueId, Slot>, id: ValueId) -> Result<bool, Error> {
    match read(module, env, id)? {
        Slot::Flag(value) => Ok(value),
        Slot::Scalar(_) => Err(execution_error(format!("{} is not a boolean", id))),
    }
}
