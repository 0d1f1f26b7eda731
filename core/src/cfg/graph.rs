//! file: core/src/cfg/graph.rs
//! description: additive control-flow multigraph over basic blocks.
//!
//! Vertices keep their creation order; edges are an ordered list of
//! `(from, to)` pairs so that a branch whose two targets coincide still
//! contributes two edges. Nothing is ever removed. Adjacency lists are
//! kept alongside the edge list so neighbour queries and reachability do
//! not rescan every edge.
//!
use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;

use super::block::{BasicBlock, BlockName};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Edge {
    pub from: BlockName,
    pub to: BlockName,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlFlowGraph {
    blocks: Vec<BasicBlock>,
    #[serde(skip)]
    index: HashMap<BlockName, usize>,
    edges: Vec<Edge>,
    #[serde(skip)]
    succ: HashMap<BlockName, Vec<BlockName>>,
    #[serde(skip)]
    pred: HashMap<BlockName, Vec<BlockName>>,
}

impl ControlFlowGraph {
    /// A graph holding only the `Enter` and `Exit` sentinels.
    pub fn new() -> Self {
        let mut graph = ControlFlowGraph {
            blocks: Vec::new(),
            index: HashMap::new(),
            edges: Vec::new(),
            succ: HashMap::new(),
            pred: HashMap::new(),
        };
        graph.add_vertex(BlockName::Enter);
        graph.add_vertex(BlockName::Exit);
        graph
    }

    /// Add an empty block. Returns false if the name is already taken.
    pub fn add_vertex(&mut self, name: BlockName) -> bool {
        if self.index.contains_key(&name) {
            return false;
        }
        self.index.insert(name, self.blocks.len());
        self.blocks.push(BasicBlock::new(name));
        true
    }

    pub fn add_edge(&mut self, from: BlockName, to: BlockName) {
        self.edges.push(Edge { from, to });
        self.succ.entry(from).or_default().push(to);
        self.pred.entry(to).or_default().push(from);
    }

    pub fn contains(&self, name: BlockName) -> bool {
        self.index.contains_key(&name)
    }

    pub fn enter(&self) -> &BasicBlock {
        &self.blocks[0]
    }

    pub fn exit(&self) -> &BasicBlock {
        &self.blocks[1]
    }

    pub fn block(&self, name: BlockName) -> Option<&BasicBlock> {
        self.index.get(&name).map(|&i| &self.blocks[i])
    }

    pub(crate) fn block_mut(&mut self, name: BlockName) -> Option<&mut BasicBlock> {
        match self.index.get(&name) {
            Some(&i) => self.blocks.get_mut(i),
            None => None,
        }
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> &[BasicBlock] {
        &self.blocks
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Outgoing edge targets of `name`, duplicates included.
    pub fn successors(&self, name: BlockName) -> Vec<BlockName> {
        self.succ.get(&name).cloned().unwrap_or_default()
    }

    /// Incoming edge sources of `name`, duplicates included.
    pub fn predecessors(&self, name: BlockName) -> Vec<BlockName> {
        self.pred.get(&name).cloned().unwrap_or_default()
    }

    /// Blocks reachable from `Enter`, in breadth-first order. Linear in
    /// blocks plus edges.
    pub fn reachable(&self) -> Vec<BlockName> {
        let mut seen = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::new();
        queue.push_back(BlockName::Enter);
        seen.insert(BlockName::Enter);
        while let Some(name) = queue.pop_front() {
            order.push(name);
            for &next in self.succ.get(&name).map(Vec::as_slice).unwrap_or(&[]) {
                if seen.insert(next) {
                    queue.push_back(next);
                }
            }
        }
        order
    }

    /// `reachable` as a set, for membership tests over many blocks.
    pub fn reachable_set(&self) -> HashSet<BlockName> {
        self.reachable().into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for ControlFlowGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ControlFlowGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for block in &self.blocks {
            writeln!(f, "{}:", block.name)?;
            for inst in block.iter() {
                writeln!(f, "    {}", inst)?;
            }
            let succ = self.successors(block.name);
            if !succ.is_empty() {
                let names = succ.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ");
                writeln!(f, "    -> {}", names)?;
            }
        }
        Ok(())
    }
}
