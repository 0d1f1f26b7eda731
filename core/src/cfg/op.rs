use serde::Serialize;

use super::block::BlockName;
use super::value::Constant;
use crate::ast::{Binding, Parameter};

/// Source of an `Assign`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Binding(Binding),
    Constant(Constant),
}

/// Block argument attached to a call or super.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BlockOperand {
    None,
    /// `&blk`: a value converted to a block by the callee.
    Value(Binding),
    /// Body label of a block literal built by a preceding `Closure`.
    Body(BlockName),
}

/// The lowered instruction set. Only `Branch` and `Jump` end a block; every
/// other instruction is straight-line.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Instruction {
    Assign { dest: Binding, src: Operand },
    /// `dest` is `None` when the result is discarded.
    Call {
        dest: Option<Binding>,
        receiver: Binding,
        method: String,
        args: Vec<Binding>,
        block: BlockOperand,
    },
    /// Call whose arguments were aggregated into one array.
    CallVararg {
        dest: Option<Binding>,
        receiver: Binding,
        method: String,
        args: Binding,
        block: BlockOperand,
    },
    Super { dest: Option<Binding>, args: Vec<Binding>, block: BlockOperand },
    SuperVararg { dest: Option<Binding>, args: Binding, block: BlockOperand },
    /// Two-way transfer. A missing condition means either successor may run.
    Branch { condition: Option<Binding>, if_true: BlockName, if_false: BlockName },
    Jump { target: BlockName },
    /// Records the returned value; always followed by a `Jump` to the return target.
    Return { value: Binding },
    Closure { dest: Binding, params: Vec<Parameter>, body: BlockName },
    /// End of one invocation of a block body, yielding `value` to the caller.
    Resume { value: Binding },
}

impl Instruction {
    pub fn is_terminator(&self) -> bool {
        matches!(self, Instruction::Branch { .. } | Instruction::Jump { .. })
    }

    /// Blocks control may transfer to, in edge order.
    pub fn targets(&self) -> Vec<BlockName> {
        match self {
            Instruction::Branch { if_true, if_false, .. } => vec![*if_true, *if_false],
            Instruction::Jump { target } => vec![*target],
            _ => Vec::new(),
        }
    }

    /// Binding written by this instruction, if any.
    pub fn dest(&self) -> Option<&Binding> {
        match self {
            Instruction::Assign { dest, .. } | Instruction::Closure { dest, .. } => Some(dest),
            Instruction::Call { dest, .. }
            | Instruction::CallVararg { dest, .. }
            | Instruction::Super { dest, .. }
            | Instruction::SuperVararg { dest, .. } => dest.as_ref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operand::Binding(b) => write!(f, "{}", b),
            Operand::Constant(c) => write!(f, "{}", c),
        }
    }
}

fn write_dest(f: &mut std::fmt::Formatter<'_>, dest: &Option<Binding>) -> std::fmt::Result {
    match dest {
        Some(d) => write!(f, "{} <- ", d),
        None => Ok(()),
    }
}

fn write_block(f: &mut std::fmt::Formatter<'_>, block: &BlockOperand) -> std::fmt::Result {
    match block {
        BlockOperand::None => Ok(()),
        BlockOperand::Value(b) => write!(f, " &{}", b),
        BlockOperand::Body(name) => write!(f, " do {}", name),
    }
}

fn join(args: &[Binding]) -> String {
    args.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Instruction::Assign { dest, src } => write!(f, "{} <- {}", dest, src),
            Instruction::Call { dest, receiver, method, args, block } => {
                write_dest(f, dest)?;
                write!(f, "call {}.{}({})", receiver, method, join(args))?;
                write_block(f, block)
            }
            Instruction::CallVararg { dest, receiver, method, args, block } => {
                write_dest(f, dest)?;
                write!(f, "call_vararg {}.{}(*{})", receiver, method, args)?;
                write_block(f, block)
            }
            Instruction::Super { dest, args, block } => {
                write_dest(f, dest)?;
                write!(f, "super({})", join(args))?;
                write_block(f, block)
            }
            Instruction::SuperVararg { dest, args, block } => {
                write_dest(f, dest)?;
                write!(f, "super_vararg(*{})", args)?;
                write_block(f, block)
            }
            Instruction::Branch { condition, if_true, if_false } => match condition {
                Some(c) => write!(f, "branch {} ? {} : {}", c, if_true, if_false),
                None => write!(f, "branch * {} : {}", if_true, if_false),
            },
            Instruction::Jump { target } => write!(f, "jump {}", target),
            Instruction::Return { value } => write!(f, "return {}", value),
            Instruction::Closure { dest, params, body } => {
                let params = params.iter().map(|p| p.binding.to_string()).collect::<Vec<_>>().join(", ");
                write!(f, "{} <- closure |{}| {}", dest, params, body)
            }
            Instruction::Resume { value } => write!(f, "resume {}", value),
        }
    }
}
