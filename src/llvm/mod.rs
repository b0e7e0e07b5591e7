//! LLVM backend.
//!
//! Builds the same SSA routines as [`crate::ir::Module`] directly into an
//! LLVM module through inkwell. Values are `double`, comparison results are
//! `i1` until widened with `uitofp`.

use inkwell::{
    basic_block::BasicBlock,
    builder::{Builder, BuilderError},
    context::Context,
    module::Module,
    passes::PassManager,
    values::{
        BasicMetadataValueEnum, BasicValue, BasicValueEnum, FloatValue, FunctionValue,
        InstructionOpcode, IntValue, PhiValue,
    },
    FloatPredicate,
};
use tracing::{trace, warn};

use crate::{
    errors::errors::{Error, ErrorImpl},
    ir::{ArithOp, Backend},
};

/// An LLVM module under construction, plus the per-function optimization
/// pipeline run by [`Backend::optimize`].
pub struct LlvmBackend<'ctx> {
    /// Reference to the LLVM context
    pub context: &'ctx Context,
    /// The LLVM module being built
    pub module: Module<'ctx>,
    /// The LLVM IR builder
    pub builder: Builder<'ctx>,
    fpm: PassManager<FunctionValue<'ctx>>,
}

impl<'ctx> LlvmBackend<'ctx> {
    /// Creates an empty module named `name` in `context`.
    ///
    /// The function pass manager runs instruction combining, reassociation,
    /// global value numbering and CFG simplification.
    pub fn new(context: &'ctx Context, name: &str) -> Self {
        let module = context.create_module(name);

        let fpm = PassManager::create(&module);
        fpm.add_instruction_combining_pass();
        fpm.add_reassociate_pass();
        fpm.add_gvn_pass();
        fpm.add_cfg_simplification_pass();
        fpm.initialize();

        LlvmBackend {
            context,
            module,
            builder: context.create_builder(),
            fpm,
        }
    }

    /// Textual LLVM IR of the whole module.
    pub fn print_to_string(&self) -> String {
        self.module.print_to_string().to_string()
    }
}

fn builder_error(error: BuilderError) -> Error {
    Error::unpositioned(ErrorImpl::Backend {
        message: format!("{:?}", error),
    })
}

fn type_error(expected: &str, value: BasicValueEnum) -> Error {
    Error::unpositioned(ErrorImpl::Backend {
        message: format!("expected {} value, got {}", expected, value.get_type()),
    })
}

fn float(value: BasicValueEnum) -> Result<FloatValue, Error> {
    match value {
        BasicValueEnum::FloatValue(value) => Ok(value),
        other => Err(type_error("double", other)),
    }
}

fn flag(value: BasicValueEnum) -> Result<IntValue, Error> {
    match value {
        BasicValueEnum::IntValue(value) if value.get_type().get_bit_width() == 1 => Ok(value),
        other => Err(type_error("i1", other)),
    }
}

impl<'ctx> Backend for LlvmBackend<'ctx> {
    type Function = FunctionValue<'ctx>;
    type Block = BasicBlock<'ctx>;
    type Value = BasicValueEnum<'ctx>;
    type Phi = PhiValue<'ctx>;

    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<Self::Function, Error> {
        if let Some(existing) = self.module.get_function(name) {
            if existing.count_params() as usize == params.len() {
                return Ok(existing);
            }
            return Err(Error::unpositioned(ErrorImpl::IncompatibleRedeclaration {
                function: name.to_string(),
                expected: existing.count_params() as usize,
                received: params.len(),
            }));
        }

        let f64_type = self.context.f64_type();
        let param_types = vec![f64_type.into(); params.len()];
        let function = self
            .module
            .add_function(name, f64_type.fn_type(&param_types, false), None);

        for (param, name) in function.get_param_iter().zip(params) {
            param.into_float_value().set_name(name);
        }

        Ok(function)
    }

    fn lookup_function(&self, name: &str) -> Option<Self::Function> {
        self.module.get_function(name)
    }

    fn param_count(&self, function: Self::Function) -> usize {
        function.count_params() as usize
    }

    fn has_body(&self, function: Self::Function) -> bool {
        function.count_basic_blocks() > 0
    }

    fn param_values(&self, function: Self::Function) -> Vec<Self::Value> {
        function.get_param_iter().collect()
    }

    fn open_block(&mut self, function: Self::Function, name: &str) -> Self::Block {
        self.context.append_basic_block(function, name)
    }

    fn set_insertion_point(&mut self, block: Self::Block) {
        self.builder.position_at_end(block);
    }

    fn current_block(&self) -> Option<Self::Block> {
        self.builder.get_insert_block()
    }

    fn emit_constant(&mut self, value: f64) -> Self::Value {
        self.context.f64_type().const_float(value).into()
    }

    fn emit_binary(
        &mut self,
        op: ArithOp,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, Error> {
        let (lhs, rhs) = (float(lhs)?, float(rhs)?);

        let result = match op {
            ArithOp::Add => self.builder.build_float_add(lhs, rhs, "addtmp"),
            ArithOp::Sub => self.builder.build_float_sub(lhs, rhs, "subtmp"),
            ArithOp::Mul => self.builder.build_float_mul(lhs, rhs, "multmp"),
        };

        Ok(result.map_err(builder_error)?.into())
    }

    fn emit_compare_lt(
        &mut self,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, Error> {
        let compare = self
            .builder
            .build_float_compare(FloatPredicate::ULT, float(lhs)?, float(rhs)?, "cmptmp")
            .map_err(builder_error)?;

        Ok(compare.into())
    }

    fn emit_compare_ne_zero(&mut self, value: Self::Value) -> Result<Self::Value, Error> {
        let zero = self.context.f64_type().const_float(0.0);
        let compare = self
            .builder
            .build_float_compare(FloatPredicate::ONE, float(value)?, zero, "cond")
            .map_err(builder_error)?;

        Ok(compare.into())
    }

    fn emit_convert_bool_to_scalar(&mut self, value: Self::Value) -> Result<Self::Value, Error> {
        let converted = self
            .builder
            .build_unsigned_int_to_float(flag(value)?, self.context.f64_type(), "booltmp")
            .map_err(builder_error)?;

        Ok(converted.into())
    }

    fn emit_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
    ) -> Result<Self::Value, Error> {
        let mut call_args: Vec<BasicMetadataValueEnum> = Vec::with_capacity(args.len());
        for arg in args {
            call_args.push(float(*arg)?.into());
        }

        self.builder
            .build_call(function, &call_args, "calltmp")
            .map_err(builder_error)?
            .try_as_basic_value()
            .left()
            .ok_or_else(|| {
                Error::unpositioned(ErrorImpl::Backend {
                    message: "call produced no value".to_string(),
                })
            })
    }

    fn emit_conditional_branch(
        &mut self,
        cond: Self::Value,
        then_block: Self::Block,
        else_block: Self::Block,
    ) -> Result<(), Error> {
        self.builder
            .build_conditional_branch(flag(cond)?, then_block, else_block)
            .map_err(builder_error)?;
        Ok(())
    }

    fn emit_jump(&mut self, block: Self::Block) -> Result<(), Error> {
        self.builder
            .build_unconditional_branch(block)
            .map_err(builder_error)?;
        Ok(())
    }

    fn emit_phi(&mut self, incoming: &[(Self::Value, Self::Block)]) -> Result<Self::Phi, Error> {
        let phi = self
            .builder
            .build_phi(self.context.f64_type(), "phi")
            .map_err(builder_error)?;

        for (value, block) in incoming {
            phi.add_incoming(&[(&float(*value)?, *block)]);
        }

        Ok(phi)
    }

    fn add_incoming(
        &mut self,
        phi: Self::Phi,
        value: Self::Value,
        block: Self::Block,
    ) -> Result<(), Error> {
        phi.add_incoming(&[(&float(value)?, block)]);
        Ok(())
    }

    fn phi_value(&self, phi: Self::Phi) -> Self::Value {
        phi.as_basic_value()
    }

    fn emit_return(&mut self, value: Self::Value) -> Result<(), Error> {
        self.builder
            .build_return(Some(&float(value)?))
            .map_err(builder_error)?;
        Ok(())
    }

    fn verify(&self, function: Self::Function) -> Result<(), Error> {
        if function.verify(false) {
            return Ok(());
        }

        let name = function.get_name().to_string_lossy().into_owned();
        Err(Error::unpositioned(ErrorImpl::InvalidFunction {
            function: name,
            reason: "rejected by the LLVM verifier".to_string(),
        }))
    }

    fn optimize(&mut self, function: Self::Function) {
        let changed = self.fpm.run_on(&function);
        trace!(function = ?function.get_name(), changed, "ran function passes");
    }

    /// Drops the body. The function itself is deleted only when nothing
    /// refers to it; otherwise it stays behind as a declaration so existing
    /// call sites remain valid.
    fn erase(&mut self, function: Self::Function) {
        self.builder.clear_insertion_position();

        if !self.clear_body(function) {
            warn!(function = ?function.get_name(), "could not drop function body");
            return;
        }

        let pointer = function.as_global_value().as_pointer_value();
        if pointer.get_first_use().is_none() {
            // SAFETY: no instruction refers to the function and the compiler
            // does not hold the handle past this call.
            unsafe { function.delete() };
        }
    }
}

impl<'ctx> LlvmBackend<'ctx> {
    /// Erases every instruction and block of `function`, leaving a
    /// declaration. Returns `false` if some instruction could not be freed.
    fn clear_body(&self, function: FunctionValue<'ctx>) -> bool {
        let undef = self.context.f64_type().get_undef();
        let mut instructions = vec![];

        for block in function.get_basic_blocks() {
            let mut next = block.get_first_instruction();
            while let Some(instruction) = next {
                next = instruction.get_next_instruction();

                // Phis are the only way a use can precede its definition.
                if instruction.get_opcode() == InstructionOpcode::Phi {
                    for index in 0..instruction.get_num_operands() {
                        instruction.set_operand(index, undef);
                    }
                }
                instructions.push(instruction);
            }
        }

        // With phis detached the remaining uses are acyclic, so each round
        // frees at least one instruction.
        while !instructions.is_empty() {
            let before = instructions.len();
            instructions.retain(|instruction| {
                if instruction.get_first_use().is_some() {
                    return true;
                }
                instruction.erase_from_basic_block();
                false
            });

            if instructions.len() == before {
                return false;
            }
        }

        for block in function.get_basic_blocks() {
            // SAFETY: the block is empty and no branch targets it any more.
            if unsafe { block.delete() }.is_err() {
                return false;
            }
        }

        true
    }
}
