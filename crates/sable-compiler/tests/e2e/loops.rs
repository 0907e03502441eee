//! While / do-while / for / unrolled loop lowering tests

use super::harness::*;
use sable_ast::{Expr, Stmt, StmtKind};
use sable_compiler::ir::Terminator;

fn while_loop(cond: Expr, body: Stmt) -> Stmt {
    stmt(StmtKind::While {
        cond,
        body: Box::new(body),
    })
}

#[test]
fn test_while_topology() {
    let (f, _) = lower(block(vec![while_loop(boolean(true), call("body_marker"))]));
    assert_all_terminated(&f);

    let cond_bb = block_labeled(&f, "whilecond");
    let body_bb = block_labeled(&f, "whilebody");
    let end_bb = block_labeled(&f, "endwhile");

    assert_eq!(jump_target(block_labeled(&f, "entry")), cond_bb.id);
    match &cond_bb.terminator {
        Some(Terminator::Branch {
            then_block,
            else_block,
            ..
        }) => {
            assert_eq!(*then_block, body_bb.id);
            assert_eq!(*else_block, end_bb.id);
        }
        other => panic!("expected branch, got {:?}", other),
    }
    // The body loops back through the condition.
    assert_eq!(jump_target(body_bb), cond_bb.id);
}

#[test]
fn test_while_break_and_continue_edges() {
    let body = block(vec![
        stmt(StmtKind::If {
            cond: boolean(true),
            then_body: Box::new(stmt(StmtKind::Break { label: None })),
            else_body: None,
        }),
        stmt(StmtKind::Continue { label: None }),
    ]);
    let (f, _) = lower(block(vec![while_loop(boolean(true), body)]));
    assert_all_terminated(&f);

    let cond_bb = block_labeled(&f, "whilecond");
    let end_bb = block_labeled(&f, "endwhile");

    // break jumps to the loop end, continue back to the condition.
    let break_bb = block_labeled(&f, "if");
    assert_eq!(jump_target(break_bb), end_bb.id);
    let continue_bb = block_labeled(&f, "endif");
    assert_eq!(jump_target(continue_bb), cond_bb.id);
}

#[test]
fn test_do_while_body_runs_before_condition() {
    let (f, _) = lower(block(vec![stmt(StmtKind::Do {
        body: Box::new(call("body_marker")),
        cond: boolean(true),
    })]));
    assert_all_terminated(&f);

    let body_bb = block_labeled(&f, "dowhile");
    let cond_bb = block_labeled(&f, "dowhilecond");
    let end_bb = block_labeled(&f, "enddowhile");

    // Entry goes straight into the body; the condition branches back up.
    assert_eq!(jump_target(block_labeled(&f, "entry")), body_bb.id);
    assert_eq!(jump_target(body_bb), cond_bb.id);
    match &cond_bb.terminator {
        Some(Terminator::Branch {
            then_block,
            else_block,
            ..
        }) => {
            assert_eq!(*then_block, body_bb.id);
            assert_eq!(*else_block, end_bb.id);
        }
        other => panic!("expected branch, got {:?}", other),
    }
}

#[test]
fn test_do_while_continue_reruns_condition() {
    let (f, _) = lower(block(vec![stmt(StmtKind::Do {
        body: Box::new(block(vec![
            call("body_marker"),
            stmt(StmtKind::Continue { label: None }),
        ])),
        cond: boolean(true),
    })]));

    let body_bb = block_calling(&f, "body_marker");
    let cond_bb = block_labeled(&f, "dowhilecond");
    assert_eq!(jump_target(body_bb), cond_bb.id);
}

#[test]
fn test_for_topology_and_continue_through_increment() {
    let body = block(vec![
        call("body_marker"),
        stmt(StmtKind::Continue { label: None }),
    ]);
    let (f, _) = lower(block(vec![stmt(StmtKind::For {
        init: Some(Box::new(stmt(StmtKind::Expression(assign("i", int(0)))))),
        cond: Some(ident("i")),
        inc: Some(assign("i", int(1))),
        body: Box::new(body),
    })]));
    assert_all_terminated(&f);

    let cond_bb = block_labeled(&f, "forcond");
    let inc_bb = block_labeled(&f, "forinc");
    let body_bb = block_calling(&f, "body_marker");

    // init runs once, in the entry block.
    let entry = block_labeled(&f, "entry");
    assert!(!entry.instructions.is_empty());
    assert_eq!(jump_target(entry), cond_bb.id);

    // continue routes through the increment, which loops to the condition.
    assert_eq!(jump_target(body_bb), inc_bb.id);
    assert_eq!(jump_target(inc_bb), cond_bb.id);
}

#[test]
fn test_for_without_condition_loops_unconditionally() {
    let (f, _) = lower(block(vec![stmt(StmtKind::For {
        init: None,
        cond: None,
        inc: None,
        body: Box::new(stmt(StmtKind::Break { label: None })),
    })]));
    assert_all_terminated(&f);

    let cond_bb = block_labeled(&f, "forcond");
    let body_bb = block_labeled(&f, "forbody");
    assert_eq!(jump_target(cond_bb), body_bb.id);
}

#[test]
fn test_unrolled_loop_continue_skips_remaining_children() {
    let (f, _) = lower(block(vec![stmt(StmtKind::UnrolledLoop(vec![
        call("first"),
        stmt(StmtKind::Continue { label: None }),
        call("second"),
    ]))]));
    assert_all_terminated(&f);

    let end_bb = block_labeled(&f, "unrolledend");
    // continue transfers to the end, past the remaining children.
    let first_bb = block_calling(&f, "first");
    assert_eq!(jump_target(first_bb), end_bb.id);
    // The skipped child still lowers, into an unreachable block.
    let second_bb = block_calling(&f, "second");
    assert_eq!(second_bb.label.as_deref(), Some("unreachable"));
}

#[test]
fn test_unrolled_loop_break_exits() {
    let (f, _) = lower(block(vec![
        stmt(StmtKind::UnrolledLoop(vec![
            call("first"),
            stmt(StmtKind::Break { label: None }),
        ])),
        call("after"),
    ]));
    let end_bb = block_labeled(&f, "unrolledend");
    assert_eq!(jump_target(block_calling(&f, "first")), end_bb.id);
    assert_eq!(call_names(end_bb), vec!["after"]);
}
