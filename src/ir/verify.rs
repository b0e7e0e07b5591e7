//! Structural verifier for finished functions.

use std::collections::HashSet;

use super::{
    cfg::{predecessors, Dominators},
    instr::{InstrKind, Terminator},
    module::Module,
    types::{BlockId, FunctionId, IrType, ValueDef, ValueId},
};

/// Checks `function` and returns the first problem found.
pub fn verify_function(module: &Module, function: FunctionId) -> Result<(), String> {
    let data = module.function(function);
    if data.erased {
        return Err("function has been erased".to_string());
    }
    let entry = data
        .entry_block()
        .ok_or_else(|| "function has no body".to_string())?;
    let own_blocks: HashSet<BlockId> = data.blocks.iter().copied().collect();

    for block in &data.blocks {
        let block_data = module.block(*block);
        if block_data.function != function {
            return Err(format!("block `{}` belongs to another function", block_data.name));
        }

        let terminator = block_data
            .terminator
            .as_ref()
            .ok_or_else(|| format!("block `{}` has no terminator", block_data.name))?;

        for succ in terminator.successors() {
            if !own_blocks.contains(&succ) {
                return Err(format!("branch from `{}` leaves the function", block_data.name));
            }
            if succ == entry {
                return Err(format!("entry block is a branch target of `{}`", block_data.name));
            }
        }
    }

    let preds = predecessors(module, function);

    for block in &data.blocks {
        let block_data = module.block(*block);
        let mut past_phis = false;

        for id in &block_data.instructions {
            let kind = match &module.value(*id).def {
                ValueDef::Instr { block: home, kind } if home == block => kind,
                _ => return Err(format!("{} is misplaced in `{}`", id, block_data.name)),
            };

            if kind.is_phi() {
                if past_phis {
                    return Err(format!("phi {} is not at the start of `{}`", id, block_data.name));
                }
            } else {
                past_phis = true;
            }

            for operand in kind.operands() {
                check_ownership(module, function, operand)?;
            }
            check_instruction(module, *id, kind, &preds[block])?;
        }

        if let Some(terminator) = &block_data.terminator {
            for operand in terminator.operands() {
                check_ownership(module, function, operand)?;
            }
            match terminator {
                Terminator::Ret(value) => expect_type(module, *value, IrType::F64)?,
                Terminator::CondBr { cond, .. } => expect_type(module, *cond, IrType::Bool)?,
                Terminator::Br(_) => {}
            }
        }
    }

    check_dominance(module, function, &Dominators::compute(module, function, &preds))
}

fn check_ownership(module: &Module, function: FunctionId, operand: ValueId) -> Result<(), String> {
    match module.owner(operand) {
        None => Ok(()),
        Some(owner) if owner == function => Ok(()),
        Some(_) => Err(format!("{} is defined in another function", operand)),
    }
}

fn expect_type(module: &Module, value: ValueId, ty: IrType) -> Result<(), String> {
    let actual = module.value(value).ty;
    if actual != ty {
        return Err(format!("{} has type {}, expected {}", value, actual, ty));
    }
    Ok(())
}

fn check_instruction(
    module: &Module,
    id: ValueId,
    kind: &InstrKind,
    preds: &[BlockId],
) -> Result<(), String> {
    let result = module.value(id).ty;

    let (operand_type, result_type) = match kind {
        InstrKind::Arith(..) => (IrType::F64, IrType::F64),
        InstrKind::FCmp(..) => (IrType::F64, IrType::Bool),
        InstrKind::UIToFP(_) => (IrType::Bool, IrType::F64),
        InstrKind::Call { .. } | InstrKind::Phi(_) => (IrType::F64, IrType::F64),
    };

    if result != result_type {
        return Err(format!("{} has type {}, expected {}", id, result, result_type));
    }
    for operand in kind.operands() {
        expect_type(module, operand, operand_type)?;
    }

    match kind {
        InstrKind::Call { callee, args } => {
            let callee = module.function(*callee);
            if callee.erased {
                return Err(format!("{} calls erased function `{}`", id, callee.name));
            }
            if callee.params.len() != args.len() {
                return Err(format!(
                    "{} passes {} arguments to `{}`, which takes {}",
                    id,
                    args.len(),
                    callee.name,
                    callee.params.len()
                ));
            }
        }
        InstrKind::Phi(incoming) => {
            let mut sources: Vec<BlockId> = incoming.iter().map(|(_, block)| *block).collect();
            sources.sort();

            let mut expected = preds.to_vec();
            expected.sort();

            if sources != expected {
                return Err(format!(
                    "phi {} has {} incoming edges for {} predecessors",
                    id,
                    sources.len(),
                    expected.len()
                ));
            }
        }
        _ => {}
    }

    Ok(())
}

/// Position of an instruction value inside its block.
fn definition_site(module: &Module, value: ValueId) -> Option<(BlockId, usize)> {
    match &module.value(value).def {
        ValueDef::Instr { block, .. } => {
            let index = module
                .block(*block)
                .instructions
                .iter()
                .position(|id| *id == value)?;
            Some((*block, index))
        }
        _ => None,
    }
}

fn check_dominance(module: &Module, function: FunctionId, doms: &Dominators) -> Result<(), String> {
    for block in &module.function(function).blocks {
        if !doms.is_reachable(*block) {
            continue;
        }
        let block_data = module.block(*block);

        for (index, id) in block_data.instructions.iter().enumerate() {
            match module.instruction(*id) {
                Some(InstrKind::Phi(incoming)) => {
                    for (value, pred) in incoming {
                        if let Some((def_block, _)) = definition_site(module, *value) {
                            if doms.is_reachable(*pred) && !doms.dominates(def_block, *pred) {
                                return Err(format!(
                                    "{} does not dominate the edge from `{}` into {}",
                                    value,
                                    module.block(*pred).name,
                                    id
                                ));
                            }
                        }
                    }
                }
                Some(kind) => {
                    for operand in kind.operands() {
                        if let Some((def_block, def_index)) = definition_site(module, operand) {
                            let ok = if def_block == *block {
                                def_index < index
                            } else {
                                doms.dominates(def_block, *block)
                            };
                            if !ok {
                                return Err(format!("{} does not dominate its use in {}", operand, id));
                            }
                        }
                    }
                }
                None => {}
            }
        }

        if let Some(terminator) = &block_data.terminator {
            for operand in terminator.operands() {
                if let Some((def_block, _)) = definition_site(module, operand) {
                    if !doms.dominates(def_block, *block) {
                        return Err(format!(
                            "{} does not dominate the terminator of `{}`",
                            operand, block_data.name
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}
