//! file: core/src/cfg/verify.rs
//! description: structural checks over a finished graph.
//!
//! `verify` reports every place where a graph breaks the block/edge
//! contract: terminators, edge bookkeeping and the sentinel blocks.
//! Reachability is computed once per call.
//!
use std::collections::HashMap;

use super::block::BlockName;
use super::graph::ControlFlowGraph;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A non-Exit block whose last instruction is not a branch or jump.
    MissingTerminator { block: BlockName },
    /// A branch or jump somewhere other than the end of its block.
    MisplacedTerminator { block: BlockName, index: usize },
    /// Outgoing edges differ from the targets named by the terminator.
    EdgeMismatch { block: BlockName, expected: Vec<BlockName>, actual: Vec<BlockName> },
    UnknownTarget { block: BlockName, target: BlockName },
    EnterHasPredecessors,
    ExitHasSuccessors,
    /// No path leads from `Enter` to `Exit`.
    ExitUnreachable,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Violation::MissingTerminator { block } => write!(f, "{} does not end in a terminator", block),
            Violation::MisplacedTerminator { block, index } => {
                write!(f, "{} has a terminator at position {} that is not last", block, index)
            }
            Violation::EdgeMismatch { block, expected, actual } => {
                write!(f, "{} edges {:?} do not match terminator targets {:?}", block, actual, expected)
            }
            Violation::UnknownTarget { block, target } => write!(f, "{} targets missing block {}", block, target),
            Violation::EnterHasPredecessors => write!(f, "Enter has incoming edges"),
            Violation::ExitHasSuccessors => write!(f, "Exit has outgoing edges"),
            Violation::ExitUnreachable => write!(f, "Exit is not reachable from Enter"),
        }
    }
}

fn counts(names: &[BlockName]) -> HashMap<BlockName, usize> {
    let mut map = HashMap::new();
    for name in names {
        *map.entry(*name).or_insert(0) += 1;
    }
    map
}

pub fn verify(graph: &ControlFlowGraph) -> Vec<Violation> {
    let mut violations = Vec::new();

    for block in graph.blocks() {
        let actual = graph.successors(block.name);
        if block.name == BlockName::Exit {
            if !actual.is_empty() {
                violations.push(Violation::ExitHasSuccessors);
            }
            continue;
        }

        let last = block.len().saturating_sub(1);
        for (i, inst) in block.iter().enumerate() {
            if inst.is_terminator() && i != last {
                violations.push(Violation::MisplacedTerminator { block: block.name, index: i });
            }
        }

        let expected = match block.terminator() {
            Some(term) => term.targets(),
            None => {
                violations.push(Violation::MissingTerminator { block: block.name });
                Vec::new()
            }
        };
        for target in &expected {
            if !graph.contains(*target) {
                violations.push(Violation::UnknownTarget { block: block.name, target: *target });
            }
        }
        if counts(&expected) != counts(&actual) {
            violations.push(Violation::EdgeMismatch { block: block.name, expected, actual });
        }
    }

    if !graph.predecessors(BlockName::Enter).is_empty() {
        violations.push(Violation::EnterHasPredecessors);
    }
    if !graph.reachable_set().contains(&BlockName::Exit) {
        violations.push(Violation::ExitUnreachable);
    }
    violations
}
