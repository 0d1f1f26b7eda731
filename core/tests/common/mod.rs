#![allow(dead_code)]

use flowgraph_core::cfg::{BlockName, BuildError, BuiltinTypes, ControlFlowGraph, GraphBuilder, verify};
use flowgraph_core::{AstNode, Source, read_source};

pub fn read(text: &str) -> AstNode {
    read_source(&Source::new("fixture.sx", text)).expect("fixture should read")
}

/// Build `text` and check the graph invariants on the way out.
pub fn build(text: &str) -> ControlFlowGraph {
    let ast = read(text);
    let graph = GraphBuilder::new(&ast, &BuiltinTypes).build().expect("fixture should build");
    let violations = verify(&graph);
    assert!(violations.is_empty(), "violations {:?} in\n{}", violations, graph);
    graph
}

pub fn build_err(text: &str) -> BuildError {
    let ast = read(text);
    match GraphBuilder::new(&ast, &BuiltinTypes).build() {
        Ok(graph) => panic!("expected a build error, got\n{}", graph),
        Err(e) => e,
    }
}

pub fn b(n: usize) -> BlockName {
    BlockName::Numbered(n)
}

/// Instructions of `name` as printed by `Display`.
pub fn lines(graph: &ControlFlowGraph, name: BlockName) -> Vec<String> {
    match graph.block(name) {
        Some(block) => block.iter().map(|i| i.to_string()).collect(),
        None => panic!("no block {} in\n{}", name, graph),
    }
}

/// Every instruction of the graph, in block order.
pub fn all_lines(graph: &ControlFlowGraph) -> Vec<String> {
    graph.blocks().iter().flat_map(|block| block.iter().map(|i| i.to_string())).collect()
}
