//! Sable AST
//!
//! The structured-statement tree consumed by the lowering stage, plus the
//! binding pass that resolves protected-region chains, labels, and
//! `goto case` targets ahead of lowering.

pub mod ast;
pub mod bind;
pub mod span;
pub mod types;

pub use ast::{
    assign_node_ids, BinOp, CaseStmt, CatchClause, DefaultStmt, Expr, ForeachAggregate,
    ForeachStmt, NodeId, Stmt, StmtKind, SwitchStmt, UnOp, VarBinding,
};
pub use bind::{bind, Bindings, LabelInfo, RegionId, RegionRecord};
pub use span::Span;
pub use types::{CharWidth, Ty};
