//! Statement and expression tree
//!
//! Statements are a closed tagged variant; the lowering dispatcher
//! matches on it exhaustively. Nodes are identified by a `NodeId`
//! assigned in a pre-order numbering pass, so side tables (region
//! back-references, label blocks) can refer to them without aliasing
//! into the tree.

use crate::span::Span;
use crate::types::{CharWidth, Ty};

/// Identity of a statement node within one function body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Placeholder used while a tree is being built, before numbering.
    pub const UNSET: NodeId = NodeId(u32::MAX);
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
    BitNot,
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinOp::And | BinOp::Or)
    }
}

/// Expressions
///
/// Deliberately small: expression-to-value lowering is a collaborator of
/// the statement core, and this is the slice of it the statement forms
/// and their tests need.
#[derive(Debug, Clone)]
pub enum Expr {
    Int {
        value: i64,
        ty: Ty,
        span: Span,
    },
    Bool {
        value: bool,
        span: Span,
    },
    Str {
        value: String,
        width: CharWidth,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    /// Assignment to a named local. Assigning to a name with no binding
    /// yet declares it.
    Assign {
        target: String,
        value: Box<Expr>,
        span: Span,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
        ty: Ty,
        span: Span,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::Int { span, .. }
            | Expr::Bool { span, .. }
            | Expr::Str { span, .. }
            | Expr::Ident { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Assign { span, .. }
            | Expr::Call { span, .. }
            | Expr::Index { span, .. } => *span,
        }
    }
}

/// A foreach key or value binding.
#[derive(Debug, Clone)]
pub struct VarBinding {
    pub name: String,
    pub ty: Ty,
    /// Reference bindings alias the element in place; value bindings copy
    /// it into a fresh slot each iteration.
    pub by_ref: bool,
}

/// What a foreach iterates over.
#[derive(Debug, Clone)]
pub enum ForeachAggregate {
    /// An array-typed value; dynamic arrays are unpacked into
    /// length + pointer at runtime.
    Value(Expr),
    /// An already-unpacked pointer + length pair.
    Slice { ptr: Expr, len: Expr, elem: Ty },
}

#[derive(Debug, Clone)]
pub struct ForeachStmt {
    pub key: Option<VarBinding>,
    pub value: VarBinding,
    pub aggregate: ForeachAggregate,
    pub reverse: bool,
    pub body: Box<Stmt>,
}

/// One case group; chained labels share the body.
#[derive(Debug, Clone)]
pub struct CaseStmt {
    pub id: NodeId,
    pub span: Span,
    pub labels: Vec<Expr>,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct DefaultStmt {
    pub id: NodeId,
    pub span: Span,
    pub body: Box<Stmt>,
}

#[derive(Debug, Clone)]
pub struct SwitchStmt {
    pub scrutinee: Expr,
    pub cases: Vec<CaseStmt>,
    pub default: Option<DefaultStmt>,
}

/// A catch clause. Handlers are currently ignored by lowering; the
/// clause is kept so the tree round-trips.
#[derive(Debug, Clone)]
pub struct CatchClause {
    pub name: Option<String>,
    pub body: Stmt,
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub id: NodeId,
    pub span: Span,
    pub kind: StmtKind,
}

#[derive(Debug, Clone)]
pub enum StmtKind {
    Compound(Vec<Stmt>),
    Expression(Expr),
    Return(Option<Expr>),
    If {
        cond: Expr,
        then_body: Box<Stmt>,
        else_body: Option<Box<Stmt>>,
    },
    /// Transparent wrapper; label resolution unwraps it.
    Scope(Box<Stmt>),
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Do {
        body: Box<Stmt>,
        cond: Expr,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        inc: Option<Expr>,
        body: Box<Stmt>,
    },
    Foreach(ForeachStmt),
    UnrolledLoop(Vec<Stmt>),
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Switch(SwitchStmt),
    /// Only valid inside a `Switch`; reached directly it is an internal
    /// error.
    Case(CaseStmt),
    /// Only valid inside a `Switch`; reached directly it is an internal
    /// error.
    Default(DefaultStmt),
    Label {
        name: String,
        body: Box<Stmt>,
    },
    Goto {
        label: String,
    },
    /// Target case resolved to an index into the enclosing switch's case
    /// list by an earlier semantic pass.
    GotoCase {
        case_index: usize,
    },
    GotoDefault,
    TryFinally {
        body: Box<Stmt>,
        cleanup: Box<Stmt>,
    },
    TryCatch {
        body: Box<Stmt>,
        catches: Vec<CatchClause>,
    },
    Throw(Expr),
    With {
        name: String,
        object: Expr,
        body: Box<Stmt>,
    },
    Synchronized {
        body: Box<Stmt>,
    },
    Volatile {
        body: Box<Stmt>,
    },
    Asm {
        tokens: Vec<String>,
    },
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self {
            id: NodeId::UNSET,
            span,
            kind,
        }
    }

    /// Unwrap transparent scope wrappers, yielding the statement a label
    /// effectively names.
    pub fn strip_scopes(&self) -> &Stmt {
        let mut s = self;
        while let StmtKind::Scope(inner) = &s.kind {
            s = inner;
        }
        s
    }
}

impl StmtKind {
    /// Variant name, for trace output.
    pub fn name(&self) -> &'static str {
        match self {
            StmtKind::Compound(_) => "compound",
            StmtKind::Expression(_) => "expression",
            StmtKind::Return(_) => "return",
            StmtKind::If { .. } => "if",
            StmtKind::Scope(_) => "scope",
            StmtKind::While { .. } => "while",
            StmtKind::Do { .. } => "do",
            StmtKind::For { .. } => "for",
            StmtKind::Foreach(_) => "foreach",
            StmtKind::UnrolledLoop(_) => "unrolled-loop",
            StmtKind::Break { .. } => "break",
            StmtKind::Continue { .. } => "continue",
            StmtKind::Switch(_) => "switch",
            StmtKind::Case(_) => "case",
            StmtKind::Default(_) => "default",
            StmtKind::Label { .. } => "label",
            StmtKind::Goto { .. } => "goto",
            StmtKind::GotoCase { .. } => "goto-case",
            StmtKind::GotoDefault => "goto-default",
            StmtKind::TryFinally { .. } => "try-finally",
            StmtKind::TryCatch { .. } => "try-catch",
            StmtKind::Throw(_) => "throw",
            StmtKind::With { .. } => "with",
            StmtKind::Synchronized { .. } => "synchronized",
            StmtKind::Volatile { .. } => "volatile",
            StmtKind::Asm { .. } => "asm",
        }
    }
}

/// Number a statement tree pre-order. Returns the number of nodes
/// visited, so callers numbering several trees can keep ids distinct.
pub fn assign_node_ids(root: &mut Stmt) -> u32 {
    let mut next = 0;
    number(root, &mut next);
    next
}

fn number(stmt: &mut Stmt, next: &mut u32) {
    stmt.id = NodeId(*next);
    *next += 1;

    match &mut stmt.kind {
        StmtKind::Compound(children) | StmtKind::UnrolledLoop(children) => {
            for c in children {
                number(c, next);
            }
        }
        StmtKind::If {
            then_body,
            else_body,
            ..
        } => {
            number(then_body, next);
            if let Some(e) = else_body {
                number(e, next);
            }
        }
        StmtKind::Scope(inner)
        | StmtKind::While { body: inner, .. }
        | StmtKind::Do { body: inner, .. }
        | StmtKind::Label { body: inner, .. }
        | StmtKind::With { body: inner, .. }
        | StmtKind::Synchronized { body: inner }
        | StmtKind::Volatile { body: inner } => number(inner, next),
        StmtKind::For { init, body, .. } => {
            if let Some(i) = init {
                number(i, next);
            }
            number(body, next);
        }
        StmtKind::Foreach(fe) => number(&mut fe.body, next),
        StmtKind::Switch(sw) => {
            for case in &mut sw.cases {
                case.id = NodeId(*next);
                *next += 1;
                number(&mut case.body, next);
            }
            if let Some(def) = &mut sw.default {
                def.id = NodeId(*next);
                *next += 1;
                number(&mut def.body, next);
            }
        }
        StmtKind::Case(case) => {
            case.id = NodeId(*next);
            *next += 1;
            number(&mut case.body, next);
        }
        StmtKind::Default(def) => {
            def.id = NodeId(*next);
            *next += 1;
            number(&mut def.body, next);
        }
        StmtKind::TryFinally { body, cleanup } => {
            number(body, next);
            number(cleanup, next);
        }
        StmtKind::TryCatch { body, catches } => {
            number(body, next);
            for c in catches {
                number(&mut c.body, next);
            }
        }
        StmtKind::Expression(_)
        | StmtKind::Return(_)
        | StmtKind::Break { .. }
        | StmtKind::Continue { .. }
        | StmtKind::Goto { .. }
        | StmtKind::GotoCase { .. }
        | StmtKind::GotoDefault
        | StmtKind::Throw(_)
        | StmtKind::Asm { .. } => {}
    }
}
