mod common;

use common::{all_lines, b, build, lines};
use flowgraph_core::cfg::{BlockName, Instruction};

#[test]
fn block_literal_over_approximates_invocations() {
    let g = build("(call (lvar recv) each (do-block (params (req x)) (call (lvar x) puts)))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t2 <- recv",
            "%t3 <- closure |x| B2",
            "%t1 <- call %t2.each() do B2",
            "branch * B2 : B1",
        ]
    );
    assert_eq!(
        lines(&g, b(2)),
        vec!["%t5 <- x", "%t4 <- call %t5.puts()", "resume %t4", "branch * B2 : B1"]
    );
    assert_eq!(lines(&g, b(1)), vec!["return %t1", "jump Exit"]);
    assert_eq!(g.successors(BlockName::Enter), vec![b(2), b(1)]);
    assert_eq!(g.successors(b(2)), vec![b(2), b(1)]);
    assert_eq!(g.len(), 4);
}

#[test]
fn closure_names_its_parameters_and_body() {
    let g = build("(call (lvar r) map (do-block (params (req a) (opt b)) (lvar a)))");
    let closure = g
        .enter()
        .iter()
        .find_map(|inst| match inst {
            Instruction::Closure { params, body, .. } => Some((params.clone(), *body)),
            _ => None,
        })
        .expect("closure instruction");
    assert_eq!(closure.0.len(), 2);
    assert_eq!(closure.1, b(2));
}

#[test]
fn next_in_block_resumes_with_nil() {
    let g = build("(call (lvar r) each (do-block (params) (next) 1))");
    // after B1, body B2, next landing B3
    assert_eq!(lines(&g, b(2)), vec!["jump B3"]);
    assert_eq!(lines(&g, b(3)), vec!["%t5 <- nil", "resume %t5", "branch * B2 : B1"]);
}

#[test]
fn break_in_block_leaves_the_call() {
    let g = build("(program (call (lvar r) each (do-block (params) (break))) nil)");
    assert_eq!(lines(&g, b(2)), vec!["jump B1"]);
}

#[test]
fn block_pass_is_evaluated_after_arguments() {
    let g = build("(call (lvar r) map (lvar a) (block-pass (lvar f)))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- r", "%t3 <- a", "%t4 <- f", "%t1 <- call %t2.map(%t3) &%t4", "return %t1", "jump Exit"]
    );
}

#[test]
fn implicit_receiver_is_self() {
    let g = build("(program (scope obj) (call _ puts 1))");
    assert_eq!(lines(&g, BlockName::Enter)[0], "%t2 <- self<obj>");
}

#[test]
fn splat_arguments_are_aggregated() {
    let g = build("(call (lvar r) m (lvar a) (splat (lvar b)) (lvar c))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t2 <- r",
            "%t3 <- call Array.new()",
            "%t4 <- a",
            "call %t3.<<(%t4)",
            "%t5 <- b",
            "%t7 <- call Array.===(%t5)",
            "branch %t7 ? B1 : B2",
        ]
    );
    // B1: already an array; B2: converted with to_a; B3 joins.
    assert_eq!(lines(&g, b(1)), vec!["%t6 <- %t5", "jump B3"]);
    assert_eq!(lines(&g, b(2)), vec!["%t8 <- call %t5.to_a()", "%t6 <- %t8", "jump B3"]);
    assert_eq!(
        lines(&g, b(3))[..4].to_vec(),
        vec![
            "call %t3.concat(%t6)",
            "%t9 <- c",
            "call %t3.<<(%t9)",
            "%t1 <- call_vararg %t2.m(*%t3)",
        ]
    );
}

#[test]
fn splat_array_literal_uses_the_same_aggregate() {
    let g = build("(array 1 (splat (lvar xs)))");
    let all = all_lines(&g);
    assert!(all.contains(&"call %t1.concat(%t4)".to_string()), "{:?}", all);
    assert!(all.contains(&"return %t1".to_string()));
}

#[test]
fn multiple_return_values_become_an_array() {
    let g = build("(return 1 2)");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t1 <- call Array.new()",
            "%t2 <- 1",
            "call %t1.<<(%t2)",
            "%t3 <- 2",
            "call %t1.<<(%t3)",
            "return %t1",
            "jump Exit",
        ]
    );
    assert!(!g.reachable_set().contains(&b(1)));
}

#[test]
fn explicit_super_passes_arguments() {
    let g = build("(program (scope self (def m (req a))) (super (lvar a) (block-pass (lvar blk))))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- a", "%t3 <- blk", "%t1 <- super(%t2) &%t3", "return %t1", "jump Exit"]
    );
}

#[test]
fn zsuper_forwards_positional_parameters() {
    let g = build("(program (scope self (def m (req a) (opt b) (block blk))) (zsuper))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- a", "%t3 <- b", "%t1 <- super(%t2, %t3)", "return %t1", "jump Exit"]
    );
}

#[test]
fn zsuper_rebuilds_rest_parameter() {
    let g = build("(program (scope self (def m (req a) (rest r) (post z))) (zsuper))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t2 <- call Array.new()",
            "%t3 <- a",
            "call %t2.<<(%t3)",
            "%t4 <- r",
            "%t6 <- call Array.===(%t4)",
            "branch %t6 ? B1 : B2",
        ]
    );
    assert_eq!(
        lines(&g, b(3))[..4].to_vec(),
        vec!["call %t2.concat(%t5)", "%t8 <- z", "call %t2.<<(%t8)", "%t1 <- super_vararg(*%t2)"]
    );
}

#[test]
fn zsuper_with_block_uses_block_protocol() {
    let g = build("(program (scope self (def m (req a))) (zsuper (do-block (params) 1)))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- closure || B2", "%t3 <- a", "%t1 <- super(%t3) do B2", "branch * B2 : B1"]
    );
}

#[test]
fn for_loop_iterates_with_each() {
    let g = build("(for (lvar x) (lvar items) (call (lvar x) puts))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t2 <- items",
            "%t3 <- closure |x| B2",
            "%t1 <- call %t2.each() do B2",
            "branch * B2 : B1",
        ]
    );
    assert_eq!(lines(&g, b(2)).last().map(String::as_str), Some("branch * B2 : B1"));
}

#[test]
fn return_inside_block_targets_exit() {
    let g = build("(program (call (lvar r) each (do-block (params) (return 1))) nil)");
    assert_eq!(lines(&g, b(2)), vec!["%t3 <- 1", "return %t3", "jump Exit"]);
}
