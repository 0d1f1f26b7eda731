//! file: core/src/cfg/lower/lowering_context.rs
//! description: active destinations of non-local jumps.
//!
//! `JumpTargets` holds where `break`, `next`, `redo` and `return` go at the
//! current point of the walk. Loops, block bodies and ensure regions
//! override some of them for the duration of their body; see
//! `GraphBuilder::with_jump_targets` for the scoped save and restore.

use crate::cfg::block::BlockName;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpKind {
    Break,
    Next,
    Redo,
    Return,
}

impl JumpKind {
    pub const ALL: [JumpKind; 4] = [JumpKind::Break, JumpKind::Next, JumpKind::Redo, JumpKind::Return];

    pub fn keyword(&self) -> &'static str {
        match self {
            JumpKind::Break => "break",
            JumpKind::Next => "next",
            JumpKind::Redo => "redo",
            JumpKind::Return => "return",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpTargets {
    pub break_to: Option<BlockName>,
    pub next_to: Option<BlockName>,
    pub redo_to: Option<BlockName>,
    pub return_to: Option<BlockName>,
}

impl JumpTargets {
    pub fn get(&self, kind: JumpKind) -> Option<BlockName> {
        match kind {
            JumpKind::Break => self.break_to,
            JumpKind::Next => self.next_to,
            JumpKind::Redo => self.redo_to,
            JumpKind::Return => self.return_to,
        }
    }

    pub fn set(&mut self, kind: JumpKind, target: BlockName) {
        let slot = match kind {
            JumpKind::Break => &mut self.break_to,
            JumpKind::Next => &mut self.next_to,
            JumpKind::Redo => &mut self.redo_to,
            JumpKind::Return => &mut self.return_to,
        };
        *slot = Some(target);
    }

    /// Kinds that currently have a destination.
    pub fn active(&self) -> Vec<JumpKind> {
        JumpKind::ALL.iter().copied().filter(|k| self.get(*k).is_some()).collect()
    }

    /// These targets with every `Some` in `overrides` applied on top.
    pub fn overlay(&self, overrides: &JumpTargets) -> JumpTargets {
        JumpTargets {
            break_to: overrides.break_to.or(self.break_to),
            next_to: overrides.next_to.or(self.next_to),
            redo_to: overrides.redo_to.or(self.redo_to),
            return_to: overrides.return_to.or(self.return_to),
        }
    }
}

impl std::fmt::Display for JumpTargets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let show = |t: Option<BlockName>| t.map_or("-".to_string(), |b| b.to_string());
        write!(
            f,
            "break={} next={} redo={} return={}",
            show(self.break_to),
            show(self.next_to),
            show(self.redo_to),
            show(self.return_to)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_keeps_unset_kinds() {
        let outer = JumpTargets { return_to: Some(BlockName::Exit), ..Default::default() };
        let mut loop_targets = JumpTargets::default();
        loop_targets.set(JumpKind::Break, BlockName::Numbered(3));
        let inner = outer.overlay(&loop_targets);
        assert_eq!(inner.get(JumpKind::Break), Some(BlockName::Numbered(3)));
        assert_eq!(inner.get(JumpKind::Return), Some(BlockName::Exit));
        assert_eq!(inner.active(), vec![JumpKind::Break, JumpKind::Return]);
    }
}
