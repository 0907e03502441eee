//! AST to CFG Lowering
//!
//! Recursive-descent construction of a basic-block graph from the
//! statement tree. All lowering state lives in one [`Lowerer`] value
//! threaded through the recursion: the cursor (current block plus the
//! horizon new blocks are ordered before), the loop/switch target stack,
//! local bindings, and the per-statement generation state that allows
//! forward references (goto before its label).

mod expr;
mod foreach;
mod stmt;
mod switch;

use crate::diagnostics::Diagnostics;
use crate::error::{CompileError, CompileResult};
use crate::ir::{
    BasicBlock, BlockId, IrFunction, IrInstr, Register, RegisterId, SlotId, Terminator,
};
use rustc_hash::FxHashMap;
use sable_ast::{Bindings, NodeId, RegionId, Span, Stmt, Ty};

/// A function parameter.
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub ty: Ty,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// The cursor: the open block instructions append to, and the horizon
/// new blocks are positioned before. The horizon is a presentation
/// ordering aid only and carries no semantic weight.
#[derive(Debug, Clone, Copy)]
struct Scope {
    block: BlockId,
    horizon: Option<BlockId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TargetKind {
    Loop,
    Switch,
    Unrolled,
}

impl TargetKind {
    /// Whether `continue` may target this construct.
    fn supports_continue(&self) -> bool {
        !matches!(self, TargetKind::Switch)
    }
}

/// One active break/continue target: the construct's identity, the
/// protected region active when it was entered, and where continue and
/// break transfer to.
#[derive(Debug, Clone, Copy)]
struct LoopTarget {
    owner: NodeId,
    region: Option<RegionId>,
    kind: TargetKind,
    reentry: BlockId,
    exit: BlockId,
}

/// How a name resolves inside the current lowering.
#[derive(Debug, Clone)]
enum LocalBinding {
    /// A storage slot.
    Slot(SlotId),
    /// An element address; reference foreach bindings alias the
    /// aggregate in place.
    Addr(Register),
}

/// Case/default blocks of a switch, recorded before its bodies are
/// lowered so `goto case` inside them can resolve.
#[derive(Debug, Clone)]
struct SwitchBlocks {
    cases: Vec<BlockId>,
    default: Option<BlockId>,
}

/// Lowers one function body.
pub struct Lowerer<'a> {
    bindings: &'a Bindings<'a>,
    func: IrFunction,
    scope: Scope,
    next_register: u32,
    next_block: u32,
    loop_targets: Vec<LoopTarget>,
    locals: FxHashMap<String, LocalBinding>,
    /// Label blocks, allocated idempotently by whichever of goto/label
    /// is reached first.
    label_blocks: FxHashMap<NodeId, BlockId>,
    switch_blocks: FxHashMap<NodeId, SwitchBlocks>,
    diagnostics: Diagnostics,
}

impl<'a> Lowerer<'a> {
    /// Create a lowerer with the function skeleton already built: an
    /// entry block and one slot per parameter.
    pub fn new(bindings: &'a Bindings<'a>, name: &str, params: &[Param], return_ty: Ty) -> Self {
        let mut lowerer = Self {
            bindings,
            func: IrFunction::new(name, return_ty),
            scope: Scope {
                block: BlockId(0),
                horizon: None,
            },
            next_register: 0,
            next_block: 0,
            loop_targets: Vec::new(),
            locals: FxHashMap::default(),
            label_blocks: FxHashMap::default(),
            switch_blocks: FxHashMap::default(),
            diagnostics: Diagnostics::new(),
        };

        let entry = lowerer.new_block("entry", None);
        lowerer.scope = Scope {
            block: entry,
            horizon: None,
        };

        for param in params {
            let reg = lowerer.alloc_register(param.ty.clone());
            let slot = lowerer.func.add_slot(Some(param.name.as_str()), param.ty.clone());
            lowerer.func.params.push(reg.clone());
            lowerer.emit(IrInstr::StoreSlot { slot, value: reg });
            lowerer
                .locals
                .insert(param.name.clone(), LocalBinding::Slot(slot));
        }

        lowerer
    }

    /// Lower the function body at the current cursor.
    pub fn lower_body(&mut self, body: &Stmt) -> CompileResult<()> {
        self.lower_stmt(body)
    }

    /// Seal the function (a missing terminator becomes `return`) and
    /// yield it with the notices collected along the way.
    pub fn finish(mut self) -> (IrFunction, Diagnostics) {
        if !self.scope_terminated() {
            self.set_terminator(Terminator::Return(None));
        }
        (self.func, self.diagnostics)
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    // ---- cursor ----------------------------------------------------

    fn set_scope(&mut self, block: BlockId, horizon: Option<BlockId>) {
        self.scope = Scope { block, horizon };
    }

    fn scope_block(&self) -> BlockId {
        self.scope.block
    }

    fn scope_horizon(&self) -> Option<BlockId> {
        self.scope.horizon
    }

    fn scope_terminated(&self) -> bool {
        self.func
            .get_block(self.scope.block)
            .map(|b| b.is_terminated())
            .unwrap_or(false)
    }

    /// Allocate a block positioned before `anchor` (or at the end of the
    /// function when there is no anchor yet).
    fn new_block(&mut self, label: &str, anchor: Option<BlockId>) -> BlockId {
        let id = BlockId(self.next_block);
        self.next_block += 1;
        let block = BasicBlock::with_label(id, label);
        match anchor {
            Some(a) => self.func.insert_block_before(a, block),
            None => self.func.add_block(block),
        }
        id
    }

    fn emit(&mut self, instr: IrInstr) {
        let block = self.scope.block;
        self.func
            .get_block_mut(block)
            .expect("current block not found")
            .add_instr(instr);
    }

    fn set_terminator(&mut self, term: Terminator) {
        let block = self.scope.block;
        self.func
            .get_block_mut(block)
            .expect("current block not found")
            .set_terminator(term);
    }

    /// Branch to `target` unless the current block already ended.
    fn jump_if_open(&mut self, target: BlockId) {
        if !self.scope_terminated() {
            self.set_terminator(Terminator::Jump(target));
        }
    }

    fn alloc_register(&mut self, ty: Ty) -> Register {
        let id = RegisterId(self.next_register);
        self.next_register += 1;
        Register::new(id, ty)
    }

    // ---- loop/switch target stack ------------------------------------

    /// Push a target around `f`; the pop runs on every exit path,
    /// including `?` early returns from nested lowering.
    fn with_target<R>(
        &mut self,
        target: LoopTarget,
        f: impl FnOnce(&mut Self) -> CompileResult<R>,
    ) -> CompileResult<R> {
        self.loop_targets.push(target);
        let result = f(self);
        self.loop_targets
            .pop()
            .expect("loop target stack underflow");
        result
    }

    /// Nearest target for an unlabeled break.
    fn innermost_target(&self, span: Span) -> CompileResult<LoopTarget> {
        self.loop_targets
            .last()
            .copied()
            .ok_or(CompileError::BreakOutsideLoop { span })
    }

    /// Nearest target for an unlabeled continue; switch entries are
    /// skipped, so continue inside a switch reaches the enclosing loop
    /// or fails.
    fn innermost_continue_target(&self, span: Span) -> CompileResult<LoopTarget> {
        self.loop_targets
            .iter()
            .rev()
            .copied()
            .find(|t| t.kind.supports_continue())
            .ok_or(CompileError::ContinueOutsideLoop { span })
    }

    /// Target of a labeled break/continue: resolve the label, strip
    /// transparent scope wrappers, then scan the stack top-down for the
    /// owning construct. A label that resolves but matches no active
    /// target is a bug in an earlier phase.
    fn labeled_target(&self, name: &str, span: Span) -> CompileResult<(LoopTarget, Option<RegionId>)> {
        let info = self
            .bindings
            .label(name)
            .ok_or_else(|| CompileError::UndefinedLabel {
                name: name.to_owned(),
                span,
            })?;
        let owner = info.target.strip_scopes().id;
        let target = self
            .loop_targets
            .iter()
            .rev()
            .copied()
            .find(|t| t.owner == owner)
            .ok_or_else(|| {
                CompileError::internal(format!(
                    "label '{}' does not name an active loop or switch",
                    name
                ))
            })?;
        Ok((target, info.region))
    }

    // ---- finally chains ----------------------------------------------

    /// Re-emit the cleanup bodies of every protected region between
    /// `from` (inclusive) and `to` (exclusive), innermost to outermost.
    /// `to` must be an ancestor of `from`; a transfer whose destination
    /// region is not an ancestor would enter a protected region, which
    /// is a static error.
    fn emit_finally_chain(
        &mut self,
        from: Option<RegionId>,
        to: Option<RegionId>,
        span: Span,
    ) -> CompileResult<()> {
        // Verify `to` encloses `from` before emitting anything.
        let mut cursor = from;
        while cursor != to {
            match cursor {
                Some(r) => cursor = self.bindings.parent(r),
                None => return Err(CompileError::GotoIntoProtectedRegion { span }),
            }
        }

        let mut cursor = from;
        while cursor != to {
            let region = cursor.expect("region chain verified above");
            let cleanup = self.bindings.record(region).cleanup;
            self.lower_stmt(cleanup)?;
            cursor = self.bindings.parent(region);
        }
        Ok(())
    }

    // ---- local bindings ------------------------------------------------

    fn lookup_local(&self, name: &str) -> Option<LocalBinding> {
        self.locals.get(name).cloned()
    }

    /// Bind `name` for the duration of a construct, returning whatever
    /// it shadowed so the caller can restore it.
    fn bind_local(&mut self, name: &str, binding: LocalBinding) -> Option<LocalBinding> {
        self.locals.insert(name.to_owned(), binding)
    }

    fn restore_local(&mut self, name: &str, previous: Option<LocalBinding>) {
        match previous {
            Some(b) => {
                self.locals.insert(name.to_owned(), b);
            }
            None => {
                self.locals.remove(name);
            }
        }
    }
}

/// Lower one function: build the skeleton, lower the body, seal the
/// result. Static errors abort this function only.
pub fn lower_function(
    bindings: &Bindings<'_>,
    name: &str,
    params: &[Param],
    return_ty: Ty,
    body: &Stmt,
) -> CompileResult<(IrFunction, Diagnostics)> {
    let mut lowerer = Lowerer::new(bindings, name, params, return_ty);
    lowerer.lower_body(body)?;
    Ok(lowerer.finish())
}
