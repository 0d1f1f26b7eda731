mod common;

use common::{all_lines, b, build, lines, read};
use flowgraph_core::cfg::{BlockName, BuiltinTypes, GraphBuilder};

#[test]
fn assignment_is_a_single_block() {
    let g = build("(assign (lvar x) 1)");
    assert_eq!(g.len(), 2);
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t1 <- 1", "x <- %t1", "return %t1", "jump Exit"]
    );
    assert_eq!(g.successors(BlockName::Enter), vec![BlockName::Exit]);
    assert!(g.exit().is_empty());
}

#[test]
fn unused_literals_emit_nothing() {
    let g = build("(program 1 (str \"a\") (lvar y) nil)");
    assert_eq!(lines(&g, BlockName::Enter), vec!["%t1 <- nil", "return %t1", "jump Exit"]);
}

#[test]
fn or_keeps_truthy_left_operand() {
    let g = build("(assign (lvar x) (binary (lvar c1) || (lvar c2)))");
    assert_eq!(lines(&g, BlockName::Enter), vec!["%t2 <- c1", "branch %t2 ? B1 : B2"]);
    assert_eq!(lines(&g, b(1)), vec!["%t1 <- %t2", "jump B3"]);
    assert_eq!(lines(&g, b(2)), vec!["%t3 <- c2", "%t1 <- %t3", "jump B3"]);
    assert_eq!(lines(&g, b(3)), vec!["x <- %t1", "return %t1", "jump Exit"]);
    assert_eq!(g.predecessors(b(3)), vec![b(1), b(2)]);
}

#[test]
fn and_without_value_skips_right_side_on_falsy() {
    let g = build("(program (binary (lvar a) && (call _ f)) nil)");
    assert_eq!(lines(&g, BlockName::Enter), vec!["%t1 <- a", "branch %t1 ? B1 : B2"]);
    assert_eq!(lines(&g, b(1)), vec!["%t2 <- self<main>", "call %t2.f()", "jump B2"]);
    assert_eq!(lines(&g, b(2)), vec!["%t3 <- nil", "return %t3", "jump Exit"]);
    assert_eq!(g.successors(BlockName::Enter), vec![b(1), b(2)]);
}

#[test]
fn compound_assignment_to_local() {
    let g = build("(opassign (lvar x) + 1)");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t2 <- x",
            "%t3 <- 1",
            "%t4 <- call %t2.+(%t3)",
            "%t1 <- %t4",
            "x <- %t4",
            "return %t1",
            "jump Exit",
        ]
    );
}

#[test]
fn or_assign_on_field_skips_setter_when_set() {
    let g = build("(opassign (field (lvar o) name) || 5)");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- o", "%t3 <- call %t2.name()", "branch %t3 ? B1 : B2"]
    );
    assert_eq!(lines(&g, b(1)), vec!["%t1 <- %t3", "jump B3"]);
    assert_eq!(
        lines(&g, b(2)),
        vec!["%t4 <- 5", "call %t2.name=(%t4)", "%t1 <- %t4", "jump B3"]
    );
    // The receiver is read exactly once.
    assert_eq!(all_lines(&g).iter().filter(|l| l.ends_with("<- o")).count(), 1);
}

#[test]
fn and_assign_on_field_mirrors_or_assign() {
    let g = build("(program (opassign (field (lvar o) name) && 5) nil)");
    assert_eq!(g.successors(BlockName::Enter), vec![b(1), b(2)]);
    assert_eq!(lines(&g, b(1)), vec!["%t3 <- 5", "call %t1.name=(%t3)", "jump B2"]);
}

#[test]
fn compound_assignment_to_field_calls_setter_with_combined_value() {
    let g = build("(program (opassign (field (lvar o) count) + 1) nil)");
    assert_eq!(
        lines(&g, BlockName::Enter)[..5].to_vec(),
        vec![
            "%t1 <- o",
            "%t2 <- call %t1.count()",
            "%t3 <- 1",
            "%t4 <- call %t2.+(%t3)",
            "call %t1.count=(%t4)",
        ]
    );
}

#[test]
fn field_assignment_yields_right_hand_side() {
    let g = build("(assign (field self name) (str \"n\"))");
    let enter = lines(&g, BlockName::Enter);
    assert_eq!(enter[0], "%t1 <- self<main>");
    assert!(enter.contains(&"call %t1.name=(%t4)".to_string()), "{:?}", enter);
    assert!(enter.contains(&"return %t4".to_string()));
}

#[test]
fn interpolated_string_folds_from_empty() {
    let g = build("(str \"a\" (embed (lvar x)))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t1 <- \"\"",
            "%t2 <- \"a\"",
            "%t3 <- call %t1.concat(%t2)",
            "%t4 <- x",
            "%t5 <- call %t4.to_s()",
            "%t6 <- call %t3.concat(%t5)",
            "return %t6",
            "jump Exit",
        ]
    );
}

#[test]
fn backtick_string_calls_self() {
    let g = build("(xstr \"ls\")");
    let enter = lines(&g, BlockName::Enter);
    assert!(enter.contains(&"%t1 <- call self<main>.`(%t4)".to_string()), "{:?}", enter);
}

#[test]
fn regexp_literal_builds_through_regexp_new() {
    let g = build("(regexp \"i\" \"ab\")");
    let enter = lines(&g, BlockName::Enter);
    assert!(enter.contains(&"%t5 <- call Regexp.new(%t3, %t4)".to_string()), "{:?}", enter);
}

#[test]
fn array_literal_appends_in_order() {
    let g = build("(array 1 (lvar y))");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec![
            "%t1 <- call Array.new()",
            "%t2 <- 1",
            "call %t1.<<(%t2)",
            "%t3 <- y",
            "call %t1.<<(%t3)",
            "return %t1",
            "jump Exit",
        ]
    );
}

#[test]
fn unbound_identifier_is_a_self_call() {
    let g = build("(vcall helper)");
    assert_eq!(
        lines(&g, BlockName::Enter),
        vec!["%t2 <- self<main>", "%t1 <- call %t2.helper()", "return %t1", "jump Exit"]
    );
}

#[test]
fn unary_and_binary_operators_are_calls() {
    let g = build("(unary ! (binary (lvar a) + 2))");
    assert_eq!(
        lines(&g, BlockName::Enter)[..4].to_vec(),
        vec!["%t1 <- a", "%t2 <- 2", "%t3 <- call %t1.+(%t2)", "%t4 <- call %t3.!()"]
    );
}

#[test]
fn building_twice_is_deterministic() {
    let text = "(program
        (assign (lvar x) 0)
        (while (binary (lvar x) < 10)
          (if (binary (lvar x) == 5) (seq (break)))
          (opassign (lvar x) + 1))
        (call (lvar x) times (do-block (params (req i)) (call _ puts (lvar i)))))";
    let ast = read(text);
    let first = GraphBuilder::new(&ast, &BuiltinTypes).build().expect("build");
    let second = GraphBuilder::new(&ast, &BuiltinTypes).build().expect("build");
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}
