//! Control-flow graph queries shared by the verifier and the optimizer.

use std::collections::{BTreeSet, HashMap, HashSet};

use super::{
    module::Module,
    types::{BlockId, FunctionId},
};

/// Successor blocks of `block`; empty while the block is unterminated.
pub fn successors(module: &Module, block: BlockId) -> Vec<BlockId> {
    module
        .block(block)
        .terminator
        .as_ref()
        .map(|terminator| terminator.successors())
        .unwrap_or_default()
}

/// Predecessors of every block of `function`, each listed once.
pub fn predecessors(module: &Module, function: FunctionId) -> HashMap<BlockId, Vec<BlockId>> {
    let blocks = &module.function(function).blocks;
    let mut preds: HashMap<BlockId, Vec<BlockId>> =
        blocks.iter().map(|block| (*block, vec![])).collect();

    for block in blocks {
        for succ in successors(module, *block) {
            let entry = preds.entry(succ).or_default();
            if !entry.contains(block) {
                entry.push(*block);
            }
        }
    }

    preds
}

/// Blocks reachable from the entry block.
pub fn reachable(module: &Module, function: FunctionId) -> HashSet<BlockId> {
    let mut seen = HashSet::new();
    let mut stack: Vec<BlockId> = module.function(function).entry_block().into_iter().collect();

    while let Some(block) = stack.pop() {
        if seen.insert(block) {
            stack.extend(successors(module, block));
        }
    }

    seen
}

/// Dominator sets of the reachable blocks.
pub struct Dominators {
    sets: HashMap<BlockId, BTreeSet<BlockId>>,
}

impl Dominators {
    pub fn compute(
        module: &Module,
        function: FunctionId,
        preds: &HashMap<BlockId, Vec<BlockId>>,
    ) -> Self {
        let live = reachable(module, function);
        let blocks: Vec<BlockId> = module
            .function(function)
            .blocks
            .iter()
            .copied()
            .filter(|block| live.contains(block))
            .collect();

        let everything: BTreeSet<BlockId> = blocks.iter().copied().collect();
        let entry = module.function(function).entry_block();

        let mut sets: HashMap<BlockId, BTreeSet<BlockId>> = blocks
            .iter()
            .map(|block| {
                if Some(*block) == entry {
                    (*block, BTreeSet::from([*block]))
                } else {
                    (*block, everything.clone())
                }
            })
            .collect();

        let mut changed = true;
        while changed {
            changed = false;

            for block in &blocks {
                if Some(*block) == entry {
                    continue;
                }

                let mut next: Option<BTreeSet<BlockId>> = None;
                for pred in preds.get(block).into_iter().flatten() {
                    if let Some(pred_set) = sets.get(pred) {
                        next = Some(match next {
                            Some(acc) => acc.intersection(pred_set).copied().collect(),
                            None => pred_set.clone(),
                        });
                    }
                }

                let mut next = next.unwrap_or_default();
                next.insert(*block);

                if sets.get(block) != Some(&next) {
                    sets.insert(*block, next);
                    changed = true;
                }
            }
        }

        Dominators { sets }
    }

    /// Whether `a` dominates `b`. Unreachable blocks dominate nothing and
    /// are dominated by nothing.
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.sets.get(&b).is_some_and(|set| set.contains(&a))
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.sets.contains_key(&block)
    }
}
