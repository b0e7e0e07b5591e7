//! Textual form of a module, modelled on LLVM assembly.

use std::fmt;

use super::{
    instr::{InstrKind, Terminator},
    module::Module,
    types::{BlockId, FunctionId, ValueDef, ValueId},
};

impl Module {
    /// Operand spelling: constants inline, parameters by name, the rest numbered.
    fn operand(&self, id: ValueId) -> String {
        match &self.value(id).def {
            ValueDef::Float(value) => format!("{:?}", value),
            ValueDef::Flag(value) => value.to_string(),
            ValueDef::Param { function, index } => format!("%{}", self.function(*function).params[*index]),
            ValueDef::Instr { .. } => id.to_string(),
        }
    }

    fn label(&self, block: BlockId) -> String {
        format!("%{}", self.block(block).name)
    }

    fn write_signature(&self, f: &mut fmt::Formatter<'_>, function: FunctionId) -> fmt::Result {
        let data = self.function(function);
        let params: Vec<String> = data
            .params
            .iter()
            .map(|param| format!("double %{}", param))
            .collect();
        write!(f, "double @{}({})", data.name, params.join(", "))
    }

    fn write_instruction(&self, f: &mut fmt::Formatter<'_>, id: ValueId, kind: &InstrKind) -> fmt::Result {
        write!(f, "  {} = ", id)?;
        match kind {
            InstrKind::Arith(op, a, b) => {
                writeln!(f, "{} double {}, {}", op, self.operand(*a), self.operand(*b))
            }
            InstrKind::FCmp(op, a, b) => {
                writeln!(f, "fcmp {} double {}, {}", op, self.operand(*a), self.operand(*b))
            }
            InstrKind::UIToFP(v) => writeln!(f, "uitofp i1 {} to double", self.operand(*v)),
            InstrKind::Call { callee, args } => {
                let args: Vec<String> = args
                    .iter()
                    .map(|arg| format!("double {}", self.operand(*arg)))
                    .collect();
                writeln!(
                    f,
                    "call double @{}({})",
                    self.function(*callee).name,
                    args.join(", ")
                )
            }
            InstrKind::Phi(incoming) => {
                let edges: Vec<String> = incoming
                    .iter()
                    .map(|(value, block)| format!("[ {}, {} ]", self.operand(*value), self.label(*block)))
                    .collect();
                writeln!(f, "phi double {}", edges.join(", "))
            }
        }
    }

    fn write_terminator(&self, f: &mut fmt::Formatter<'_>, terminator: &Terminator) -> fmt::Result {
        match terminator {
            Terminator::Ret(value) => writeln!(f, "  ret double {}", self.operand(*value)),
            Terminator::Br(target) => writeln!(f, "  br label {}", self.label(*target)),
            Terminator::CondBr {
                cond,
                then_block,
                else_block,
            } => writeln!(
                f,
                "  br i1 {}, label {}, label {}",
                self.operand(*cond),
                self.label(*then_block),
                self.label(*else_block)
            ),
        }
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "; ModuleID = '{}'", self.name)?;

        for (id, function) in self.functions() {
            writeln!(f)?;

            if function.is_declaration() {
                write!(f, "declare ")?;
                self.write_signature(f, id)?;
                writeln!(f)?;
                continue;
            }

            write!(f, "define ")?;
            self.write_signature(f, id)?;
            writeln!(f, " {{")?;

            for (index, block) in function.blocks.iter().enumerate() {
                if index > 0 {
                    writeln!(f)?;
                }
                let data = self.block(*block);
                writeln!(f, "{}:", data.name)?;

                for value in &data.instructions {
                    if let Some(kind) = self.instruction(*value) {
                        self.write_instruction(f, *value, kind)?;
                    }
                }
                if let Some(terminator) = &data.terminator {
                    self.write_terminator(f, terminator)?;
                }
            }

            writeln!(f, "}}")?;
        }

        Ok(())
    }
}
