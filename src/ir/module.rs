//! IR Module
//!
//! Module-wide arenas for values, blocks and functions, plus the builder
//! state used while a function body is being emitted.

use std::collections::HashMap;

use tracing::trace;

use crate::errors::errors::{Error, ErrorImpl};

use super::{
    backend::Backend,
    instr::{ArithOp, CmpOp, InstrKind, Terminator},
    passes, verify,
    types::{BlockData, BlockId, FunctionData, FunctionId, IrType, ValueData, ValueDef, ValueId},
};

pub(super) fn backend_error(message: impl Into<String>) -> Error {
    Error::unpositioned(ErrorImpl::Backend {
        message: message.into(),
    })
}

/// A module contains functions and the values they are built from
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    pub(super) values: Vec<ValueData>,
    pub(super) blocks: Vec<BlockData>,
    pub(super) functions: Vec<FunctionData>,
    /// Live functions by name; erased functions are dropped from here
    function_names: HashMap<String, FunctionId>,
    /// Interned constants keyed by type and bit pattern
    constants: HashMap<(IrType, u64), ValueId>,
    insertion_point: Option<BlockId>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
            blocks: Vec::new(),
            functions: Vec::new(),
            function_names: HashMap::new(),
            constants: HashMap::new(),
            insertion_point: None,
        }
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.0 as usize]
    }

    pub(super) fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.0 as usize]
    }

    pub fn block(&self, id: BlockId) -> &BlockData {
        &self.blocks[id.0 as usize]
    }

    pub(super) fn block_mut(&mut self, id: BlockId) -> &mut BlockData {
        &mut self.blocks[id.0 as usize]
    }

    pub fn value(&self, id: ValueId) -> &ValueData {
        &self.values[id.0 as usize]
    }

    pub(super) fn value_mut(&mut self, id: ValueId) -> &mut ValueData {
        &mut self.values[id.0 as usize]
    }

    /// Live functions in declaration order.
    pub fn functions(&self) -> impl Iterator<Item = (FunctionId, &FunctionData)> {
        self.functions
            .iter()
            .enumerate()
            .filter(|(_, function)| !function.erased)
            .map(|(index, function)| (FunctionId(index as u32), function))
    }

    /// The value of a `double` constant, if `id` is one.
    pub fn constant_value(&self, id: ValueId) -> Option<f64> {
        match self.value(id).def {
            ValueDef::Float(value) => Some(value),
            _ => None,
        }
    }

    pub(super) fn flag_value(&self, id: ValueId) -> Option<bool> {
        match self.value(id).def {
            ValueDef::Flag(flag) => Some(flag),
            _ => None,
        }
    }

    /// Number of instructions in the body of `function`.
    pub fn instruction_count(&self, function: FunctionId) -> usize {
        self.function(function)
            .blocks
            .iter()
            .map(|block| self.block(*block).instructions.len())
            .sum()
    }

    /// The instruction defining `id`, if it is one.
    pub fn instruction(&self, id: ValueId) -> Option<&InstrKind> {
        match &self.value(id).def {
            ValueDef::Instr { kind, .. } => Some(kind),
            _ => None,
        }
    }

    /// The function a value belongs to. Constants belong to none.
    pub(super) fn owner(&self, id: ValueId) -> Option<FunctionId> {
        match &self.value(id).def {
            ValueDef::Float(_) | ValueDef::Flag(_) => None,
            ValueDef::Param { function, .. } => Some(*function),
            ValueDef::Instr { block, .. } => Some(self.block(*block).function),
        }
    }

    fn push_value(&mut self, data: ValueData) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        self.values.push(data);
        id
    }

    fn intern(&mut self, ty: IrType, bits: u64, def: ValueDef) -> ValueId {
        if let Some(id) = self.constants.get(&(ty, bits)) {
            return *id;
        }
        let id = self.push_value(ValueData { ty, def });
        self.constants.insert((ty, bits), id);
        id
    }

    pub(super) fn float_constant(&mut self, value: f64) -> ValueId {
        self.intern(IrType::F64, value.to_bits(), ValueDef::Float(value))
    }

    pub(super) fn flag_constant(&mut self, flag: bool) -> ValueId {
        self.intern(IrType::Bool, flag as u64, ValueDef::Flag(flag))
    }

    fn check_value(&self, id: ValueId, ty: IrType) -> Result<(), Error> {
        let data = self
            .values
            .get(id.0 as usize)
            .ok_or_else(|| backend_error(format!("unknown value {}", id)))?;

        if data.ty != ty {
            return Err(backend_error(format!(
                "expected {} operand, {} is {}",
                ty, id, data.ty
            )));
        }

        Ok(())
    }

    /// The open block at the insertion point.
    fn open_insertion_block(&self) -> Result<BlockId, Error> {
        let block = self
            .insertion_point
            .ok_or_else(|| backend_error("no insertion point"))?;

        if self.block(block).terminator.is_some() {
            return Err(backend_error(format!(
                "block `{}` is already terminated",
                self.block(block).name
            )));
        }

        Ok(block)
    }

    fn insert(&mut self, ty: IrType, kind: InstrKind) -> Result<ValueId, Error> {
        let block = self.open_insertion_block()?;
        let is_phi = kind.is_phi();
        let id = self.push_value(ValueData {
            ty,
            def: ValueDef::Instr { block, kind },
        });

        let position = if is_phi {
            self.leading_phis(block)
        } else {
            self.block(block).instructions.len()
        };
        self.block_mut(block).instructions.insert(position, id);

        Ok(id)
    }

    /// Number of phi nodes at the start of `block`.
    pub(super) fn leading_phis(&self, block: BlockId) -> usize {
        self.block(block)
            .instructions
            .iter()
            .take_while(|id| self.instruction(**id).is_some_and(InstrKind::is_phi))
            .count()
    }

    fn terminate(&mut self, terminator: Terminator) -> Result<(), Error> {
        let block = self.open_insertion_block()?;
        self.block_mut(block).terminator = Some(terminator);
        Ok(())
    }

    fn check_block(&self, block: BlockId) -> Result<(), Error> {
        match self.blocks.get(block.0 as usize) {
            Some(_) => Ok(()),
            None => Err(backend_error(format!("unknown block {}", block))),
        }
    }
}

impl Backend for Module {
    type Function = FunctionId;
    type Block = BlockId;
    type Value = ValueId;
    type Phi = ValueId;

    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<FunctionId, Error> {
        if let Some(existing) = self.lookup_function(name) {
            if self.param_count(existing) != params.len() {
                return Err(backend_error(format!(
                    "`{}` is already declared with {} parameters",
                    name,
                    self.param_count(existing)
                )));
            }
            return Ok(existing);
        }

        let id = FunctionId(self.functions.len() as u32);
        let mut function = FunctionData::new(name, params.to_vec());
        for index in 0..params.len() {
            function.param_values.push(self.push_value(ValueData {
                ty: IrType::F64,
                def: ValueDef::Param {
                    function: id,
                    index,
                },
            }));
        }

        self.functions.push(function);
        self.function_names.insert(name.to_string(), id);

        Ok(id)
    }

    fn lookup_function(&self, name: &str) -> Option<FunctionId> {
        self.function_names.get(name).copied()
    }

    fn param_count(&self, function: FunctionId) -> usize {
        self.function(function).params.len()
    }

    fn has_body(&self, function: FunctionId) -> bool {
        !self.function(function).is_declaration()
    }

    fn param_values(&self, function: FunctionId) -> Vec<ValueId> {
        self.function(function).param_values.clone()
    }

    fn open_block(&mut self, function: FunctionId, name: &str) -> BlockId {
        let taken = |module: &Module, candidate: &str| {
            module
                .function(function)
                .blocks
                .iter()
                .any(|block| module.block(*block).name == candidate)
        };

        let mut unique = name.to_string();
        let mut suffix = 1;
        while taken(self, &unique) {
            unique = format!("{}{}", name, suffix);
            suffix += 1;
        }

        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BlockData::new(unique, function));
        self.function_mut(function).blocks.push(id);
        id
    }

    fn set_insertion_point(&mut self, block: BlockId) {
        self.insertion_point = Some(block);
    }

    fn current_block(&self) -> Option<BlockId> {
        self.insertion_point
    }

    fn emit_constant(&mut self, value: f64) -> ValueId {
        self.float_constant(value)
    }

    fn emit_binary(&mut self, op: ArithOp, lhs: ValueId, rhs: ValueId) -> Result<ValueId, Error> {
        self.check_value(lhs, IrType::F64)?;
        self.check_value(rhs, IrType::F64)?;
        self.insert(IrType::F64, InstrKind::Arith(op, lhs, rhs))
    }

    fn emit_compare_lt(&mut self, lhs: ValueId, rhs: ValueId) -> Result<ValueId, Error> {
        self.check_value(lhs, IrType::F64)?;
        self.check_value(rhs, IrType::F64)?;
        self.insert(IrType::Bool, InstrKind::FCmp(CmpOp::Ult, lhs, rhs))
    }

    fn emit_compare_ne_zero(&mut self, value: ValueId) -> Result<ValueId, Error> {
        self.check_value(value, IrType::F64)?;
        let zero = self.float_constant(0.0);
        self.insert(IrType::Bool, InstrKind::FCmp(CmpOp::One, value, zero))
    }

    fn emit_convert_bool_to_scalar(&mut self, value: ValueId) -> Result<ValueId, Error> {
        self.check_value(value, IrType::Bool)?;
        self.insert(IrType::F64, InstrKind::UIToFP(value))
    }

    fn emit_call(&mut self, function: FunctionId, args: &[ValueId]) -> Result<ValueId, Error> {
        let callee = self.function(function);
        if callee.erased {
            return Err(backend_error(format!("call to erased function `{}`", callee.name)));
        }
        if callee.params.len() != args.len() {
            return Err(backend_error(format!(
                "`{}` takes {} arguments, {} given",
                callee.name,
                callee.params.len(),
                args.len()
            )));
        }
        for arg in args {
            self.check_value(*arg, IrType::F64)?;
        }

        self.insert(
            IrType::F64,
            InstrKind::Call {
                callee: function,
                args: args.to_vec(),
            },
        )
    }

    fn emit_conditional_branch(
        &mut self,
        cond: ValueId,
        then_block: BlockId,
        else_block: BlockId,
    ) -> Result<(), Error> {
        self.check_value(cond, IrType::Bool)?;
        self.check_block(then_block)?;
        self.check_block(else_block)?;
        self.terminate(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        })
    }

    fn emit_jump(&mut self, block: BlockId) -> Result<(), Error> {
        self.check_block(block)?;
        self.terminate(Terminator::Br(block))
    }

    fn emit_phi(&mut self, incoming: &[(ValueId, BlockId)]) -> Result<ValueId, Error> {
        for (value, block) in incoming {
            self.check_value(*value, IrType::F64)?;
            self.check_block(*block)?;
        }
        self.insert(IrType::F64, InstrKind::Phi(incoming.to_vec()))
    }

    fn add_incoming(&mut self, phi: ValueId, value: ValueId, block: BlockId) -> Result<(), Error> {
        self.check_value(value, IrType::F64)?;
        self.check_block(block)?;

        match &mut self.value_mut(phi).def {
            ValueDef::Instr {
                kind: InstrKind::Phi(incoming),
                ..
            } => {
                incoming.push((value, block));
                Ok(())
            }
            _ => Err(backend_error(format!("{} is not a phi node", phi))),
        }
    }

    fn phi_value(&self, phi: ValueId) -> ValueId {
        phi
    }

    fn emit_return(&mut self, value: ValueId) -> Result<(), Error> {
        self.check_value(value, IrType::F64)?;
        self.terminate(Terminator::Ret(value))
    }

    fn verify(&self, function: FunctionId) -> Result<(), Error> {
        verify::verify_function(self, function).map_err(|reason| {
            Error::unpositioned(ErrorImpl::InvalidFunction {
                function: self.function(function).name.clone(),
                reason,
            })
        })
    }

    fn optimize(&mut self, function: FunctionId) {
        let before = self.instruction_count(function);
        passes::optimize_function(self, function);
        trace!(
            function = %self.function(function).name,
            before,
            after = self.instruction_count(function),
            "optimized"
        );
    }

    fn erase(&mut self, function: FunctionId) {
        let name = self.function(function).name.clone();
        if self.function_names.get(&name) == Some(&function) {
            self.function_names.remove(&name);
        }

        if self
            .insertion_point
            .is_some_and(|block| self.block(block).function == function)
        {
            self.insertion_point = None;
        }

        let data = self.function_mut(function);
        data.erased = true;
        data.blocks.clear();
    }
}
