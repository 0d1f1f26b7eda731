mod common;

use std::collections::HashMap;
use std::sync::Arc;

use common::{build_err, read};
use flowgraph_core::ast::{AstNode, AstNodeKind, Binding, Scope};
use flowgraph_core::cfg::{BuildErrorKind, BuiltinTypes, Constant, GraphBuilder};
use flowgraph_core::config::DEFAULT_MAX_DEPTH;
use flowgraph_core::{
    BuildOptions, FlowgraphErrorExt, Source, Stage, build_graph_from_source, build_graph_with_options,
    generate_error_report, read_source, read_source_with_options,
};

#[test]
fn jumps_outside_their_construct_are_rejected() {
    for text in ["(break)", "(next 1)", "(redo)", "(if (lvar c) (seq (next)))"] {
        let err = build_err(text);
        assert_eq!(err.kind(), BuildErrorKind::InvalidJumpContext, "{}", text);
    }
}

#[test]
fn jump_error_points_at_the_jump() {
    let err = build_err("(program\n  (redo))");
    let location = err.location().expect("location");
    assert_eq!((location.line, location.column), (2, 3));
    assert_eq!(err.issuer(), "flowgraph.lower.jump_target");
    assert!(err.message().contains("redo"));
}

#[test]
fn multiple_assignment_is_not_yet_implemented() {
    let err = build_err("(assign (mlhs (lvar a) (lvar b)) (lvar c))");
    assert_eq!(err.kind(), BuildErrorKind::NotYetImplemented);
}

#[test]
fn for_loops_over_fields_or_multiple_targets_are_not_yet_implemented() {
    let err = build_err("(for (mlhs (lvar a) (lvar b)) (lvar pairs) (lvar a))");
    assert_eq!(err.kind(), BuildErrorKind::NotYetImplemented);
    let err = build_err("(for (field self cur) (lvar items) nil)");
    assert_eq!(err.kind(), BuildErrorKind::NotYetImplemented);
}

#[test]
fn misplaced_nodes_are_unsupported() {
    assert_eq!(build_err("(field (lvar o) name)").kind(), BuildErrorKind::UnsupportedConstruct);
    assert_eq!(build_err("(splat (lvar a))").kind(), BuildErrorKind::UnsupportedConstruct);
    assert_eq!(
        build_err("(program (when (seq 1) 2) nil)").kind(),
        BuildErrorKind::UnsupportedConstruct
    );
}

#[test]
fn block_argument_and_literal_together_are_unsupported() {
    let err = build_err("(call (lvar r) each (block-pass (lvar f)) (do-block (params) nil))");
    assert_eq!(err.kind(), BuildErrorKind::UnsupportedConstruct);
}

#[test]
fn zsuper_outside_method_is_missing_annotation() {
    assert_eq!(build_err("(zsuper)").kind(), BuildErrorKind::MissingAnnotation);
}

#[test]
fn unregistered_well_known_type_is_missing_annotation() {
    let ast = read("(array 1 2)");
    let empty: HashMap<String, Binding> = HashMap::new();
    let err = GraphBuilder::new(&ast, &empty).build().expect_err("Array is not registered");
    assert_eq!(err.kind(), BuildErrorKind::MissingAnnotation);
    assert!(err.message().contains("Array"));
}

#[test]
fn custom_type_registry_is_consulted() {
    let ast = read("(array 1)");
    let mut types: HashMap<String, Binding> = HashMap::new();
    types.insert("Array".into(), Binding::constant("::Core::Array"));
    let graph = GraphBuilder::new(&ast, &types).build().expect("build");
    assert_eq!(graph.enter().instructions[0].to_string(), "%t1 <- call ::Core::Array.new()");
}

#[test]
fn self_without_scope_is_missing_annotation() {
    let node = AstNode::new(AstNodeKind::SelfRef, None, None);
    let root = AstNode::new(AstNodeKind::Program { body: vec![node] }, None, None);
    let err = GraphBuilder::new(&root, &flowgraph_core::BuiltinTypes).build().expect_err("no scope");
    assert_eq!(err.kind(), BuildErrorKind::MissingAnnotation);

    let scoped = AstNode::new(AstNodeKind::SelfRef, None, None).with_scope(Arc::new(Scope::new(Binding::self_ref("Foo"))));
    let root = AstNode::new(AstNodeKind::Program { body: vec![scoped] }, None, None);
    assert!(GraphBuilder::new(&root, &flowgraph_core::BuiltinTypes).build().is_ok());
}

fn nested_parens(levels: usize) -> String {
    let mut text = String::from("1");
    for _ in 0..levels {
        text = format!("(paren {})", text);
    }
    text
}

#[test]
fn deep_nesting_hits_the_depth_limit() {
    let ast = read(&nested_parens(20));
    let options = BuildOptions { max_depth: 8 };
    let err = GraphBuilder::new(&ast, &flowgraph_core::BuiltinTypes)
        .with_options(options)
        .build()
        .expect_err("too deep");
    assert_eq!(err.kind(), BuildErrorKind::DepthLimitExceeded);

    // The default limit is far above this.
    assert!(GraphBuilder::new(&ast, &flowgraph_core::BuiltinTypes).build().is_ok());
}

#[test]
fn errors_surface_through_the_source_entry_point() {
    let err = build_graph_from_source(&Source::new("bad.sx", "(break)")).expect_err("invalid jump");
    let report = generate_error_report(err.as_ref());
    assert!(report.starts_with("FLOWGRAPH | lower | invalid jump context | bad.sx:1:1"), "{}", report);
}

#[test]
fn reader_errors_surface_through_the_source_entry_point() {
    let err = build_graph_from_source(&Source::new("bad.sx", "(assign (lvar x)")).expect_err("unbalanced");
    assert!(err.message().contains("Malformed"));
    let err = build_graph_from_source(&Source::new("empty.sx", "  ")).expect_err("empty");
    assert_eq!(err.issuer(), "flowgraph.ast.sexp.read_source");
}

#[test]
fn reader_rejects_nesting_past_the_default_limit() {
    let text = nested_parens(DEFAULT_MAX_DEPTH + 1);
    let err = read_source(&Source::new("deep.sx", text)).expect_err("too deep");
    assert_eq!(err.stage(), Stage::Read);
    assert_eq!(err.build_kind(), Some(BuildErrorKind::DepthLimitExceeded));
    // Each level opens with "(paren ", so the first list past the limit
    // starts right after the last accepted prefix.
    let location = err.location().expect("location");
    assert_eq!((location.line, location.column), (1, 7 * DEFAULT_MAX_DEPTH + 1));
}

#[test]
fn reader_limit_follows_the_options() {
    let options = BuildOptions { max_depth: 4 };
    let err = build_graph_with_options(&Source::new("deep.sx", nested_parens(5)), options).expect_err("too deep");
    assert_eq!(err.stage(), Stage::Read);
    assert_eq!(err.build_kind(), Some(BuildErrorKind::DepthLimitExceeded));

    // Parentheses in strings and comments are not nesting.
    let text = format!("; ((((((\n(paren \"((((((\" {})", nested_parens(2));
    assert!(read_source_with_options(&Source::new("flat.sx", text), &BuildOptions { max_depth: 4 }).is_ok());
}

#[test]
fn builder_rejects_nesting_past_the_default_limit() {
    let mut node = AstNode::new(AstNodeKind::Literal { value: Constant::Integer(1) }, None, None);
    for _ in 0..DEFAULT_MAX_DEPTH + 1 {
        node = AstNode::new(AstNodeKind::Begin { body: Box::new(node) }, None, None);
    }
    let err = GraphBuilder::new(&node, &BuiltinTypes).build().expect_err("too deep");
    assert_eq!(err.kind(), BuildErrorKind::DepthLimitExceeded);
    assert_eq!(err.issuer(), "flowgraph.lower.descend");
}

#[test]
fn nesting_at_the_limit_reads_but_does_not_lower() {
    let text = nested_parens(DEFAULT_MAX_DEPTH);
    let err = build_graph_from_source(&Source::new("deep.sx", text)).expect_err("too deep to lower");
    assert_eq!(err.stage(), Stage::Lower);
    assert_eq!(err.build_kind(), Some(BuildErrorKind::DepthLimitExceeded));
}
