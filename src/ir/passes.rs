//! Function-level optimization passes.
//!
//! Each pass reports whether it changed anything; [`optimize_function`]
//! runs them all until none does.

use std::collections::HashSet;

use super::{
    cfg::{predecessors, reachable},
    instr::{InstrKind, Terminator},
    module::Module,
    types::{BlockId, FunctionId, ValueDef, ValueId},
};

pub fn optimize_function(module: &mut Module, function: FunctionId) {
    if module.function(function).is_declaration() {
        return;
    }

    loop {
        let mut changed = false;
        changed |= fold_constants(module, function);
        changed |= remove_trivial_phis(module, function);
        changed |= fold_constant_branches(module, function);
        changed |= remove_unreachable_blocks(module, function);
        changed |= merge_straight_line_blocks(module, function);
        changed |= remove_dead_instructions(module, function);

        if !changed {
            break;
        }
    }
}

fn replace_all_uses(module: &mut Module, function: FunctionId, from: ValueId, to: ValueId) {
    for block in module.function(function).blocks.clone() {
        for id in module.block(block).instructions.clone() {
            if let ValueDef::Instr { kind, .. } = &mut module.value_mut(id).def {
                kind.replace_operand(from, to);
            }
        }
        if let Some(terminator) = &mut module.block_mut(block).terminator {
            terminator.replace_operand(from, to);
        }
    }
}

fn remove_instruction(module: &mut Module, block: BlockId, id: ValueId) {
    module.block_mut(block).instructions.retain(|other| *other != id);
}

/// Updates the phis of `block` with `update`, applied to each incoming list.
fn rewrite_phis(module: &mut Module, block: BlockId, update: impl Fn(&mut Vec<(ValueId, BlockId)>)) {
    for id in module.block(block).instructions.clone() {
        if let ValueDef::Instr {
            kind: InstrKind::Phi(incoming),
            ..
        } = &mut module.value_mut(id).def
        {
            update(incoming);
        }
    }
}

fn fold_constants(module: &mut Module, function: FunctionId) -> bool {
    let mut changed = false;

    for block in module.function(function).blocks.clone() {
        for id in module.block(block).instructions.clone() {
            let replacement = match module.instruction(id).cloned() {
                Some(InstrKind::Arith(op, a, b)) => {
                    match (module.constant_value(a), module.constant_value(b)) {
                        (Some(a), Some(b)) => Some(module.float_constant(op.apply(a, b))),
                        _ => None,
                    }
                }
                Some(InstrKind::FCmp(op, a, b)) => {
                    match (module.constant_value(a), module.constant_value(b)) {
                        (Some(a), Some(b)) => Some(module.flag_constant(op.apply(a, b))),
                        _ => None,
                    }
                }
                Some(InstrKind::UIToFP(v)) => module
                    .flag_value(v)
                    .map(|flag| module.float_constant(if flag { 1.0 } else { 0.0 })),
                _ => None,
            };

            if let Some(constant) = replacement {
                replace_all_uses(module, function, id, constant);
                remove_instruction(module, block, id);
                changed = true;
            }
        }
    }

    changed
}

fn remove_trivial_phis(module: &mut Module, function: FunctionId) -> bool {
    let mut changed = false;

    for block in module.function(function).blocks.clone() {
        for id in module.block(block).instructions.clone() {
            let Some(InstrKind::Phi(incoming)) = module.instruction(id) else {
                continue;
            };

            let distinct: HashSet<ValueId> = incoming
                .iter()
                .map(|(value, _)| *value)
                .filter(|value| *value != id)
                .collect();

            if distinct.len() == 1 {
                if let Some(value) = distinct.into_iter().next() {
                    replace_all_uses(module, function, id, value);
                    remove_instruction(module, block, id);
                    changed = true;
                }
            }
        }
    }

    changed
}

fn fold_constant_branches(module: &mut Module, function: FunctionId) -> bool {
    let mut changed = false;

    for block in module.function(function).blocks.clone() {
        let Some(Terminator::CondBr {
            cond,
            then_block,
            else_block,
        }) = module.block(block).terminator.clone()
        else {
            continue;
        };
        let Some(flag) = module.flag_value(cond) else {
            continue;
        };

        let (taken, dropped) = if flag {
            (then_block, else_block)
        } else {
            (else_block, then_block)
        };

        module.block_mut(block).terminator = Some(Terminator::Br(taken));
        if dropped != taken {
            rewrite_phis(module, dropped, |incoming| {
                incoming.retain(|(_, source)| *source != block)
            });
        }
        changed = true;
    }

    changed
}

fn remove_unreachable_blocks(module: &mut Module, function: FunctionId) -> bool {
    let live = reachable(module, function);
    let blocks = module.function(function).blocks.clone();

    if blocks.iter().all(|block| live.contains(block)) {
        return false;
    }

    for block in blocks.iter().filter(|block| live.contains(block)) {
        rewrite_phis(module, *block, |incoming| {
            incoming.retain(|(_, source)| live.contains(source))
        });
    }

    module
        .function_mut(function)
        .blocks
        .retain(|block| live.contains(block));

    true
}

/// Folds a block into its only predecessor when that predecessor jumps
/// straight to it.
fn merge_straight_line_blocks(module: &mut Module, function: FunctionId) -> bool {
    let preds = predecessors(module, function);
    let entry = module.function(function).entry_block();

    for block in module.function(function).blocks.clone() {
        if Some(block) == entry {
            continue;
        }
        let pred = match preds.get(&block).map(Vec::as_slice) {
            Some([pred]) if *pred != block => *pred,
            _ => continue,
        };
        if module.block(pred).terminator != Some(Terminator::Br(block)) {
            continue;
        }

        // With a single predecessor every phi has a single incoming value.
        for id in module.block(block).instructions.clone() {
            if let Some(InstrKind::Phi(incoming)) = module.instruction(id).cloned() {
                if let Some((value, _)) = incoming.first() {
                    replace_all_uses(module, function, id, *value);
                }
                remove_instruction(module, block, id);
            }
        }

        let moved = std::mem::take(&mut module.block_mut(block).instructions);
        for id in &moved {
            if let ValueDef::Instr { block: home, .. } = &mut module.value_mut(*id).def {
                *home = pred;
            }
        }
        module.block_mut(pred).instructions.extend(moved);

        let terminator = module.block_mut(block).terminator.take();
        for succ in terminator.iter().flat_map(Terminator::successors) {
            rewrite_phis(module, succ, |incoming| {
                for (_, source) in incoming.iter_mut() {
                    if *source == block {
                        *source = pred;
                    }
                }
            });
        }
        module.block_mut(pred).terminator = terminator;
        module
            .function_mut(function)
            .blocks
            .retain(|other| *other != block);

        return true;
    }

    false
}

fn remove_dead_instructions(module: &mut Module, function: FunctionId) -> bool {
    let blocks = module.function(function).blocks.clone();
    let mut used = HashSet::new();

    for block in &blocks {
        for id in &module.block(*block).instructions {
            if let Some(kind) = module.instruction(*id) {
                used.extend(kind.operands());
            }
        }
        if let Some(terminator) = &module.block(*block).terminator {
            used.extend(terminator.operands());
        }
    }

    let mut changed = false;
    for block in &blocks {
        for id in module.block(*block).instructions.clone() {
            let removable = module
                .instruction(id)
                .is_some_and(|kind| !kind.has_side_effects());

            if removable && !used.contains(&id) {
                remove_instruction(module, *block, id);
                changed = true;
            }
        }
    }

    changed
}
