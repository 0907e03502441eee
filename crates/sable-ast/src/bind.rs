//! Binding pass
//!
//! Walks a function body once, before lowering, and resolves everything
//! lowering reads but never writes: the chain of enclosing protected
//! regions, the label table, and which switch a `goto case` /
//! `goto default` targets.
//!
//! Region back-references are indices into an arena of region records
//! rather than aliasing handles into the tree; the chain is acyclic by
//! construction and terminates at `None` (the function root).

use crate::ast::{NodeId, Stmt, StmtKind};
use rustc_hash::FxHashMap;

/// Index into the region arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionId(pub u32);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "region{}", self.0)
    }
}

/// One protected region: a try-finally's cleanup body and its parent in
/// the static nesting chain.
#[derive(Debug)]
pub struct RegionRecord<'a> {
    pub node: NodeId,
    pub parent: Option<RegionId>,
    pub cleanup: &'a Stmt,
}

/// A labeled statement and the region active where the label appears.
#[derive(Debug)]
pub struct LabelInfo<'a> {
    pub node: NodeId,
    pub target: &'a Stmt,
    pub region: Option<RegionId>,
}

/// Read-only lowering inputs computed by [`bind`].
#[derive(Debug, Default)]
pub struct Bindings<'a> {
    regions: Vec<RegionRecord<'a>>,
    region_of: FxHashMap<NodeId, RegionId>,
    labels: FxHashMap<String, LabelInfo<'a>>,
    switch_of: FxHashMap<NodeId, NodeId>,
}

impl<'a> Bindings<'a> {
    /// The innermost protected region enclosing a statement, if any.
    pub fn region_of(&self, node: NodeId) -> Option<RegionId> {
        self.region_of.get(&node).copied()
    }

    pub fn record(&self, region: RegionId) -> &RegionRecord<'a> {
        &self.regions[region.0 as usize]
    }

    pub fn parent(&self, region: RegionId) -> Option<RegionId> {
        self.record(region).parent
    }

    pub fn label(&self, name: &str) -> Option<&LabelInfo<'a>> {
        self.labels.get(name)
    }

    /// The switch enclosing a `goto case` / `goto default` statement.
    pub fn switch_target(&self, node: NodeId) -> Option<NodeId> {
        self.switch_of.get(&node).copied()
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }
}

/// Compute the bindings for one function body.
///
/// Node ids must already be assigned (see
/// [`assign_node_ids`](crate::ast::assign_node_ids)).
pub fn bind(root: &Stmt) -> Bindings<'_> {
    let mut out = Bindings::default();
    let mut switches = Vec::new();
    walk(root, None, &mut switches, &mut out);
    out
}

fn walk<'a>(
    stmt: &'a Stmt,
    region: Option<RegionId>,
    switches: &mut Vec<NodeId>,
    out: &mut Bindings<'a>,
) {
    if let Some(r) = region {
        out.region_of.insert(stmt.id, r);
    }

    match &stmt.kind {
        StmtKind::Compound(children) | StmtKind::UnrolledLoop(children) => {
            for c in children {
                walk(c, region, switches, out);
            }
        }
        StmtKind::If {
            then_body,
            else_body,
            ..
        } => {
            walk(then_body, region, switches, out);
            if let Some(e) = else_body {
                walk(e, region, switches, out);
            }
        }
        StmtKind::Scope(inner)
        | StmtKind::While { body: inner, .. }
        | StmtKind::Do { body: inner, .. }
        | StmtKind::With { body: inner, .. }
        | StmtKind::Synchronized { body: inner }
        | StmtKind::Volatile { body: inner } => walk(inner, region, switches, out),
        StmtKind::For { init, body, .. } => {
            if let Some(i) = init {
                walk(i, region, switches, out);
            }
            walk(body, region, switches, out);
        }
        StmtKind::Foreach(fe) => walk(&fe.body, region, switches, out),
        StmtKind::Label { name, body } => {
            out.labels.insert(
                name.clone(),
                LabelInfo {
                    node: stmt.id,
                    target: body,
                    region,
                },
            );
            walk(body, region, switches, out);
        }
        StmtKind::Switch(sw) => {
            switches.push(stmt.id);
            for case in &sw.cases {
                if let Some(r) = region {
                    out.region_of.insert(case.id, r);
                }
                walk(&case.body, region, switches, out);
            }
            if let Some(def) = &sw.default {
                if let Some(r) = region {
                    out.region_of.insert(def.id, r);
                }
                walk(&def.body, region, switches, out);
            }
            switches.pop();
        }
        StmtKind::Case(case) => walk(&case.body, region, switches, out),
        StmtKind::Default(def) => walk(&def.body, region, switches, out),
        StmtKind::GotoCase { .. } | StmtKind::GotoDefault => {
            if let Some(sw) = switches.last() {
                out.switch_of.insert(stmt.id, *sw);
            }
        }
        StmtKind::TryFinally { body, cleanup } => {
            let id = RegionId(out.regions.len() as u32);
            out.regions.push(RegionRecord {
                node: stmt.id,
                parent: region,
                cleanup,
            });
            walk(body, Some(id), switches, out);
            // The cleanup body runs outside its own region.
            walk(cleanup, region, switches, out);
        }
        StmtKind::TryCatch { body, catches } => {
            walk(body, region, switches, out);
            for c in catches {
                walk(&c.body, region, switches, out);
            }
        }
        StmtKind::Expression(_)
        | StmtKind::Return(_)
        | StmtKind::Break { .. }
        | StmtKind::Continue { .. }
        | StmtKind::Goto { .. }
        | StmtKind::Throw(_)
        | StmtKind::Asm { .. } => {}
    }
}
