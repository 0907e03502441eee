//! Switch lowering tests: integral dispatch, fallthrough, string
//! switches, goto case, duplicate rejection.

use super::harness::*;
use sable_ast::{BinOp, Expr, Span, StmtKind};
use sable_compiler::ir::{BlockId, IrFunction, IrInstr, RuntimeFn, Terminator};
use sable_compiler::CompileError;

fn dispatch_cases(f: &IrFunction) -> (Vec<(i64, BlockId)>, BlockId) {
    let entry = block_labeled(f, "entry");
    match &entry.terminator {
        Some(Terminator::Switch { cases, default, .. }) => (cases.clone(), *default),
        other => panic!("expected switch dispatch, got {:?}", other),
    }
}

#[test]
fn test_integral_switch_dispatch() {
    let (f, _) = lower(block(vec![switch(
        int(2),
        vec![
            case(vec![int(1)], vec![call("one"), stmt(StmtKind::Break { label: None })]),
            case(vec![int(2)], vec![call("two"), stmt(StmtKind::Break { label: None })]),
        ],
        Some(default_case(vec![call("other")])),
    )]));
    assert_all_terminated(&f);

    let (cases, default) = dispatch_cases(&f);
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0], (1, block_calling(&f, "one").id));
    assert_eq!(cases[1], (2, block_calling(&f, "two").id));
    assert_eq!(default, block_calling(&f, "other").id);

    // break from each case lands on the common end block.
    let end_bb = block_labeled(&f, "switchend");
    assert_eq!(jump_target(block_calling(&f, "one")), end_bb.id);
    assert_eq!(jump_target(block_calling(&f, "two")), end_bb.id);
}

#[test]
fn test_chained_labels_share_a_body() {
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![case(
            vec![int(1), int(2), int(3)],
            vec![stmt(StmtKind::Break { label: None })],
        )],
        None,
    )]));
    let (cases, _) = dispatch_cases(&f);
    assert_eq!(cases.len(), 3);
    assert!(cases.iter().all(|(_, b)| *b == cases[0].1));
}

#[test]
fn test_case_without_break_falls_through() {
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![
            case(vec![int(1)], vec![call("one")]),
            case(vec![int(2)], vec![call("two")]),
        ],
        Some(default_case(vec![call("other")])),
    )]));

    // one falls into two, two falls into default, default into the end.
    assert_eq!(
        jump_target(block_calling(&f, "one")),
        block_calling(&f, "two").id
    );
    assert_eq!(
        jump_target(block_calling(&f, "two")),
        block_calling(&f, "other").id
    );
    assert_eq!(
        jump_target(block_calling(&f, "other")),
        block_labeled(&f, "switchend").id
    );
}

#[test]
fn test_last_case_without_default_falls_to_end() {
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![case(vec![int(1)], vec![call("one")])],
        None,
    )]));
    let (_, default) = dispatch_cases(&f);
    let end_bb = block_labeled(&f, "switchend");
    assert_eq!(default, end_bb.id);
    assert_eq!(jump_target(block_calling(&f, "one")), end_bb.id);
}

#[test]
fn test_string_switch_builds_sorted_table() {
    let (f, _) = lower(block(vec![switch(
        string("b"),
        vec![
            case(vec![string("b")], vec![call("on_b"), stmt(StmtKind::Break { label: None })]),
            case(vec![string("a")], vec![call("on_a"), stmt(StmtKind::Break { label: None })]),
            case(vec![string("c")], vec![call("on_c"), stmt(StmtKind::Break { label: None })]),
        ],
        Some(default_case(vec![call("on_default")])),
    )]));
    assert_all_terminated(&f);

    // The table is sorted regardless of source order.
    assert_eq!(f.string_tables.len(), 1);
    assert_eq!(f.string_tables[0].literals, vec!["a", "b", "c"]);

    // Dispatch runs on the ordinal returned by the runtime search.
    let entry = block_labeled(&f, "entry");
    assert!(entry.instructions.iter().any(|i| matches!(
        i,
        IrInstr::RuntimeCall {
            func: RuntimeFn::SwitchString,
            table: Some(_),
            ..
        }
    )));

    // Ordinal 0 is "a", 1 is "b", 2 is "c"; out-of-range sentinels fall
    // to the default.
    let (cases, default) = dispatch_cases(&f);
    assert_eq!(cases[0], (0, block_calling(&f, "on_a").id));
    assert_eq!(cases[1], (1, block_calling(&f, "on_b").id));
    assert_eq!(cases[2], (2, block_calling(&f, "on_c").id));
    assert_eq!(default, block_calling(&f, "on_default").id);
}

#[test]
fn test_wide_string_switch_picks_wide_runtime() {
    use sable_ast::CharWidth;

    let wide = |s: &str| Expr::Str {
        value: s.into(),
        width: CharWidth::Wide,
        span: sp(),
    };
    let (f, _) = lower(block(vec![switch(
        wide("x"),
        vec![case(vec![wide("x")], vec![stmt(StmtKind::Break { label: None })])],
        None,
    )]));
    let entry = block_labeled(&f, "entry");
    assert!(entry.instructions.iter().any(|i| matches!(
        i,
        IrInstr::RuntimeCall {
            func: RuntimeFn::SwitchWstring,
            ..
        }
    )));
}

#[test]
fn test_duplicate_integral_case_rejected() {
    let err = lower_err(block(vec![switch(
        int(0),
        vec![
            case(vec![int(1)], vec![]),
            case(vec![int(2), int(2)], vec![]),
        ],
        None,
    )]));
    assert!(matches!(err, CompileError::DuplicateCase { value, .. } if value == "2"));
}

#[test]
fn test_duplicate_string_case_rejected() {
    let err = lower_err(block(vec![switch(
        string("k"),
        vec![
            case(vec![string("k")], vec![]),
            case(vec![string("k")], vec![]),
        ],
        None,
    )]));
    assert!(matches!(err, CompileError::DuplicateCase { .. }));
}

#[test]
fn test_duplicate_string_case_names_offending_case() {
    let mut second = case(vec![string("k")], vec![]);
    second.span = Span::new(4, 7);
    let err = lower_err(block(vec![switch(
        string("k"),
        vec![case(vec![string("k")], vec![]), second],
        None,
    )]));
    match err {
        CompileError::DuplicateCase { span, .. } => assert_eq!(span, Span::new(4, 7)),
        other => panic!("expected duplicate case error, got {:?}", other),
    }
}

#[test]
fn test_non_constant_case_rejected() {
    let err = lower_err(block(vec![
        stmt(StmtKind::Expression(assign("x", int(1)))),
        switch(int(0), vec![case(vec![ident("x")], vec![])], None),
    ]));
    assert!(matches!(err, CompileError::NonConstantCase { .. }));
}

#[test]
fn test_constant_folded_case_label() {
    let label = Expr::Binary {
        op: BinOp::Add,
        left: Box::new(int(2)),
        right: Box::new(int(3)),
        span: sp(),
    };
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![case(vec![label], vec![stmt(StmtKind::Break { label: None })])],
        None,
    )]));
    let (cases, _) = dispatch_cases(&f);
    assert_eq!(cases[0].0, 5);
}

#[test]
fn test_goto_case_jumps_to_case_body() {
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![
            case(vec![int(0)], vec![stmt(StmtKind::GotoCase { case_index: 1 })]),
            case(vec![int(1)], vec![call("target"), stmt(StmtKind::Break { label: None })]),
        ],
        None,
    )]));
    assert_all_terminated(&f);

    let source_bb = blocks_labeled(&f, "case")[0];
    assert_eq!(jump_target(source_bb), block_calling(&f, "target").id);
    assert_eq!(blocks_labeled(&f, "aftergotocase").len(), 1);
}

#[test]
fn test_goto_default_jumps_to_default_body() {
    let (f, _) = lower(block(vec![switch(
        int(0),
        vec![case(vec![int(0)], vec![stmt(StmtKind::GotoDefault)])],
        Some(default_case(vec![call("target"), stmt(StmtKind::Break { label: None })])),
    )]));
    let source_bb = blocks_labeled(&f, "case")[0];
    assert_eq!(jump_target(source_bb), block_calling(&f, "target").id);
}

#[test]
fn test_break_inside_switch_exits_switch_not_loop() {
    // while (true) { switch (0) { case 0: break; } call after_switch; }
    let body = block(vec![
        switch(
            int(0),
            vec![case(vec![int(0)], vec![stmt(StmtKind::Break { label: None })])],
            None,
        ),
        call("after_switch"),
    ]);
    let (f, _) = lower(block(vec![stmt(StmtKind::While {
        cond: boolean(true),
        body: Box::new(body),
    })]));

    let end_bb = block_labeled(&f, "switchend");
    let case_bb = blocks_labeled(&f, "case")[0];
    assert_eq!(jump_target(case_bb), end_bb.id);
    // The code after the switch is still inside the loop.
    assert_eq!(call_names(end_bb), vec!["after_switch"]);
    assert_eq!(jump_target(end_bb), block_labeled(&f, "whilecond").id);
}
