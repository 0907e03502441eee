//! Test harness for statement lowering
//!
//! Builders for statement trees and inspection helpers for the lowered
//! control-flow graph, shared by the topic test modules.

#![allow(dead_code)]

use sable_ast::{
    assign_node_ids, bind, CaseStmt, CatchClause, CharWidth, DefaultStmt, Expr, NodeId, Span,
    Stmt, StmtKind, SwitchStmt, Ty, VarBinding,
};
use sable_compiler::ir::{BasicBlock, BlockId, IrFunction, IrInstr, Terminator};
use sable_compiler::{lower_function, CompileError, Diagnostics, Param};

pub fn sp() -> Span {
    Span::default()
}

// ---- tree builders -----------------------------------------------------

pub fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(kind, sp())
}

pub fn block(children: Vec<Stmt>) -> Stmt {
    stmt(StmtKind::Compound(children))
}

pub fn int(value: i64) -> Expr {
    Expr::Int {
        value,
        ty: Ty::int(32, true),
        span: sp(),
    }
}

pub fn boolean(value: bool) -> Expr {
    Expr::Bool { value, span: sp() }
}

pub fn string(value: &str) -> Expr {
    Expr::Str {
        value: value.into(),
        width: CharWidth::Narrow,
        span: sp(),
    }
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident {
        name: name.into(),
        span: sp(),
    }
}

pub fn assign(target: &str, value: Expr) -> Expr {
    Expr::Assign {
        target: target.into(),
        value: Box::new(value),
        span: sp(),
    }
}

/// A void call used as a marker so tests can locate where a statement
/// body landed in the graph.
pub fn call(callee: &str) -> Stmt {
    stmt(StmtKind::Expression(Expr::Call {
        callee: callee.into(),
        args: vec![],
        ty: Ty::Void,
        span: sp(),
    }))
}

pub fn ret(value: Option<Expr>) -> Stmt {
    stmt(StmtKind::Return(value))
}

pub fn case(labels: Vec<Expr>, body: Vec<Stmt>) -> CaseStmt {
    CaseStmt {
        id: NodeId::UNSET,
        span: sp(),
        labels,
        body: Box::new(block(body)),
    }
}

pub fn default_case(body: Vec<Stmt>) -> DefaultStmt {
    DefaultStmt {
        id: NodeId::UNSET,
        span: sp(),
        body: Box::new(block(body)),
    }
}

pub fn switch(scrutinee: Expr, cases: Vec<CaseStmt>, default: Option<DefaultStmt>) -> Stmt {
    stmt(StmtKind::Switch(SwitchStmt {
        scrutinee,
        cases,
        default,
    }))
}

pub fn labeled(name: &str, body: Stmt) -> Stmt {
    stmt(StmtKind::Label {
        name: name.into(),
        body: Box::new(body),
    })
}

pub fn try_finally(body: Stmt, cleanup_marker: &str) -> Stmt {
    stmt(StmtKind::TryFinally {
        body: Box::new(body),
        cleanup: Box::new(call(cleanup_marker)),
    })
}

pub fn try_catch(body: Stmt) -> Stmt {
    stmt(StmtKind::TryCatch {
        body: Box::new(body),
        catches: vec![CatchClause {
            name: None,
            body: block(vec![]),
        }],
    })
}

pub fn binding(name: &str, ty: Ty, by_ref: bool) -> VarBinding {
    VarBinding {
        name: name.into(),
        ty,
        by_ref,
    }
}

// ---- lowering entry points ----------------------------------------------

pub fn lower(body: Stmt) -> (IrFunction, Diagnostics) {
    lower_with_params(body, &[])
}

pub fn lower_with_params(mut body: Stmt, params: &[Param]) -> (IrFunction, Diagnostics) {
    assign_node_ids(&mut body);
    let bindings = bind(&body);
    lower_function(&bindings, "test_fn", params, Ty::Void, &body).expect("lowering failed")
}

pub fn lower_err(mut body: Stmt) -> CompileError {
    assign_node_ids(&mut body);
    let bindings = bind(&body);
    match lower_function(&bindings, "test_fn", &[], Ty::Void, &body) {
        Ok(_) => panic!("expected lowering to fail"),
        Err(e) => e,
    }
}

// ---- graph inspection -----------------------------------------------------

pub fn assert_all_terminated(func: &IrFunction) {
    for b in &func.blocks {
        assert!(
            b.is_terminated(),
            "block {} ({:?}) has no terminator",
            b.id,
            b.label
        );
    }
}

pub fn blocks_labeled<'f>(func: &'f IrFunction, label: &str) -> Vec<&'f BasicBlock> {
    func.blocks
        .iter()
        .filter(|b| b.label.as_deref() == Some(label))
        .collect()
}

pub fn block_labeled<'f>(func: &'f IrFunction, label: &str) -> &'f BasicBlock {
    let found = blocks_labeled(func, label);
    assert_eq!(
        found.len(),
        1,
        "expected exactly one block labeled '{}', found {}",
        label,
        found.len()
    );
    found[0]
}

/// Callee names of plain calls in one block, in emission order.
pub fn call_names(block: &BasicBlock) -> Vec<&str> {
    block
        .instructions
        .iter()
        .filter_map(|i| match i {
            IrInstr::Call { callee, .. } => Some(callee.as_str()),
            _ => None,
        })
        .collect()
}

/// Total number of calls to `callee` across the whole function.
pub fn count_calls(func: &IrFunction, callee: &str) -> usize {
    func.blocks
        .iter()
        .flat_map(|b| b.instructions.iter())
        .filter(|i| matches!(i, IrInstr::Call { callee: c, .. } if c == callee))
        .count()
}

/// The block containing a call to `callee`; panics unless exactly one
/// block does.
pub fn block_calling<'f>(func: &'f IrFunction, callee: &str) -> &'f BasicBlock {
    let found: Vec<_> = func
        .blocks
        .iter()
        .filter(|b| call_names(b).contains(&callee))
        .collect();
    assert_eq!(
        found.len(),
        1,
        "expected exactly one block calling '{}', found {}",
        callee,
        found.len()
    );
    found[0]
}

pub fn jump_target(block: &BasicBlock) -> BlockId {
    match &block.terminator {
        Some(Terminator::Jump(b)) => *b,
        other => panic!("block {} does not end in a jump: {:?}", block.id, other),
    }
}
