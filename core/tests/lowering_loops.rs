mod common;

use common::{b, build, lines};
use flowgraph_core::cfg::BlockName;

// Loops allocate body, after, pretest in that order: B1, B2, B3 for the
// first loop in a fixture.

#[test]
fn while_tests_before_and_after_the_body() {
    let g = build("(while (lvar c) (call (lvar x) foo))");
    assert_eq!(lines(&g, BlockName::Enter), vec!["jump B3"]);
    assert_eq!(lines(&g, b(3)), vec!["%t1 <- c", "branch %t1 ? B1 : B2"]);
    assert_eq!(
        lines(&g, b(1)),
        vec!["%t2 <- x", "call %t2.foo()", "%t3 <- c", "branch %t3 ? B1 : B2"]
    );
    assert_eq!(lines(&g, b(2)), vec!["%t4 <- nil", "return %t4", "jump Exit"]);
    assert_eq!(g.predecessors(b(2)), vec![b(3), b(1)]);
}

#[test]
fn until_swaps_the_loop_exits() {
    let g = build("(until (lvar c) (call _ f))");
    assert_eq!(lines(&g, b(3)), vec!["%t1 <- c", "branch %t1 ? B2 : B1"]);
}

#[test]
fn modifier_loops_use_the_same_shape() {
    let g = build("(while-mod (lvar c) (call _ f))");
    assert_eq!(lines(&g, b(3)), vec!["%t1 <- c", "branch %t1 ? B1 : B2"]);
    let g = build("(until-mod (lvar c) (call _ f))");
    assert_eq!(lines(&g, b(3)), vec!["%t1 <- c", "branch %t1 ? B2 : B1"]);
}

#[test]
fn next_retests_and_break_leaves_innermost_loop() {
    let g = build("(while (lvar a) (while (lvar b) (break)) (next))");
    // outer: body B1, after B2, pretest B3; inner: body B4, after B5, pretest B6
    assert_eq!(lines(&g, b(1)), vec!["jump B6"]);
    assert_eq!(lines(&g, b(4)), vec!["jump B5"]);
    assert_eq!(lines(&g, b(5)), vec!["jump B3"]);
    assert_eq!(g.successors(b(4)), vec![b(5)]);
    assert!(!g.predecessors(b(2)).contains(&b(4)));
}

#[test]
fn redo_restarts_the_body_without_testing() {
    let g = build("(while (lvar c) (redo))");
    assert_eq!(lines(&g, b(1)), vec!["jump B1"]);
    // The condition after `redo` is unreachable.
    assert!(!g.reachable_set().contains(&b(4)));
}

#[test]
fn code_after_break_lands_in_unreachable_block() {
    let g = build("(while (lvar c) (break) (call _ f))");
    assert_eq!(lines(&g, b(1)), vec!["jump B2"]);
    let dead = lines(&g, b(4));
    assert_eq!(dead[1], "call %t2.f()");
    assert!(!g.reachable_set().contains(&b(4)));
}

#[test]
fn break_arguments_are_evaluated_before_the_jump() {
    let g = build("(while (lvar c) (break (call _ compute)))");
    assert_eq!(lines(&g, b(1)), vec!["%t2 <- self<main>", "call %t2.compute()", "jump B2"]);
}

#[test]
fn loop_value_is_nil() {
    let g = build("(assign (lvar r) (while (lvar c) (call _ f)))");
    assert_eq!(lines(&g, b(2)), vec!["%t4 <- nil", "r <- %t4", "return %t4", "jump Exit"]);
}

#[test]
fn return_inside_ensure_runs_cleanup_first() {
    let g = build("(bodystmt (seq (return 1)) (ensure (call _ cleanup)))");
    assert_eq!(lines(&g, BlockName::Enter), vec!["jump B1"]);
    // B2 is the return landing.
    assert_eq!(lines(&g, b(1)), vec!["%t3 <- 1", "return %t3", "jump B2"]);
    assert_eq!(lines(&g, b(2)), vec!["%t2 <- self<main>", "call %t2.cleanup()", "jump Exit"]);
    assert!(!g.predecessors(BlockName::Exit).contains(&b(1)));
    assert!(g.predecessors(BlockName::Exit).contains(&b(2)));
}

#[test]
fn ensure_runs_on_fallthrough() {
    let g = build("(bodystmt (seq (call _ work)) (ensure (call _ cleanup)))");
    // body B1, return landing B2, ensure B3, after B4
    assert_eq!(g.successors(b(1)), vec![b(3)]);
    assert_eq!(
        lines(&g, b(3)),
        vec!["%t5 <- self<main>", "call %t5.cleanup()", "jump B4"]
    );
    assert_eq!(lines(&g, b(4)), vec!["return %t1", "jump Exit"]);
    assert!(!g.reachable_set().contains(&b(2)));
}

#[test]
fn every_loop_exit_inside_ensure_goes_through_a_landing() {
    let g = build("(while true (bodystmt (seq (break)) (ensure (call _ log))))");
    // loop: body B1, after B2, pretest B3; bodystmt body B4;
    // landings for break B5, next B6, redo B7, return B8.
    assert_eq!(lines(&g, b(4)), vec!["jump B5"]);
    assert_eq!(g.successors(b(5)), vec![b(2)]);
    assert_eq!(g.successors(b(6)), vec![b(3)]);
    assert_eq!(g.successors(b(7)), vec![b(1)]);
    assert_eq!(g.successors(b(8)), vec![BlockName::Exit]);
    for landing in [b(5), b(6), b(7), b(8)] {
        let landing_lines = lines(&g, landing);
        assert!(landing_lines[1].ends_with(".log()"), "{:?}", landing_lines);
    }
}

#[test]
fn nested_ensure_forwards_to_outer_landing() {
    let g = build(
        "(bodystmt
           (seq (bodystmt (seq (return0)) (ensure (call _ inner))))
           (ensure (call _ outer)))",
    );
    // outer: body B1, return landing B2; inner: body B3, return landing B4.
    assert_eq!(g.successors(b(2)), vec![BlockName::Exit]);
    assert_eq!(g.successors(b(4)), vec![b(2)]);
    assert_eq!(g.successors(b(3)), vec![b(4)]);
}
