//! Statement Lowering
//!
//! One lowering rule per statement variant. Constructs that introduce
//! blocks allocate them before the old horizon, narrow the cursor to
//! their own sub-range, and restore it to (exit block, old horizon) on
//! the way out, so blocks come out in source-structure order.

use super::{LocalBinding, LoopTarget, Lowerer, TargetKind};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IrInstr, RuntimeFn, Terminator};
use sable_ast::{Expr, Stmt, StmtKind};
use tracing::trace;

impl<'a> Lowerer<'a> {
    /// Lower a statement, leaving the cursor positioned after it.
    pub(crate) fn lower_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        trace!(kind = stmt.kind.name(), span = %stmt.span, "lowering statement");

        match &stmt.kind {
            StmtKind::Compound(children) => self.lower_compound(children),
            StmtKind::Expression(expr) => {
                // Side effects only; the value is discarded.
                self.lower_expr(expr)?;
                Ok(())
            }
            StmtKind::Return(value) => self.lower_return(stmt, value.as_ref()),
            StmtKind::If {
                cond,
                then_body,
                else_body,
            } => self.lower_if(cond, then_body, else_body.as_deref()),
            StmtKind::Scope(inner) => self.lower_stmt(inner),
            StmtKind::While { cond, body } => self.lower_while(stmt, cond, body),
            StmtKind::Do { body, cond } => self.lower_do(stmt, body, cond),
            StmtKind::For {
                init,
                cond,
                inc,
                body,
            } => self.lower_for(stmt, init.as_deref(), cond.as_ref(), inc.as_ref(), body),
            StmtKind::Foreach(fe) => self.lower_foreach(stmt, fe),
            StmtKind::UnrolledLoop(children) => self.lower_unrolled(stmt, children),
            StmtKind::Break { label } => self.lower_break(stmt, label.as_deref()),
            StmtKind::Continue { label } => self.lower_continue(stmt, label.as_deref()),
            StmtKind::Switch(sw) => self.lower_switch(stmt, sw),
            StmtKind::Case(_) => Err(CompileError::internal(
                "case statement reached outside of switch lowering",
            )),
            StmtKind::Default(_) => Err(CompileError::internal(
                "default statement reached outside of switch lowering",
            )),
            StmtKind::Label { name, body } => self.lower_label(stmt, name, body),
            StmtKind::Goto { label } => self.lower_goto(stmt, label),
            StmtKind::GotoCase { case_index } => self.lower_goto_case(stmt, Some(*case_index)),
            StmtKind::GotoDefault => self.lower_goto_case(stmt, None),
            StmtKind::TryFinally { body, cleanup } => self.lower_try_finally(body, cleanup),
            StmtKind::TryCatch { body, .. } => self.lower_try_catch(stmt, body),
            StmtKind::Throw(value) => self.lower_throw(stmt, value),
            StmtKind::With { name, object, body } => self.lower_with(name, object, body),
            StmtKind::Synchronized { body } => {
                self.diagnostics
                    .notice(stmt.span, "synchronized is ignored; only the body is lowered");
                self.lower_stmt(body)
            }
            StmtKind::Volatile { body } => {
                self.diagnostics
                    .notice(stmt.span, "volatile is ignored; only the body is lowered");
                self.lower_stmt(body)
            }
            StmtKind::Asm { .. } => Err(CompileError::UnsupportedFeature {
                feature: "inline assembly".into(),
                span: stmt.span,
            }),
        }
    }

    fn lower_compound(&mut self, children: &[Stmt]) -> CompileResult<()> {
        for child in children {
            // Children after a terminating statement are still lowered,
            // but into a fresh block: nothing may append to a
            // terminated block.
            if self.scope_terminated() {
                let horizon = self.scope_horizon();
                let bb = self.new_block("unreachable", horizon);
                self.set_scope(bb, horizon);
            }
            self.lower_stmt(child)?;
        }
        Ok(())
    }

    fn lower_return(&mut self, stmt: &Stmt, value: Option<&Expr>) -> CompileResult<()> {
        let value = value.map(|e| self.lower_expr(e)).transpose()?;
        let region = self.bindings.region_of(stmt.id);
        self.emit_finally_chain(region, None, stmt.span)?;
        // A re-emitted cleanup body may itself end control flow.
        if !self.scope_terminated() {
            self.set_terminator(Terminator::Return(value));
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then_body: &Stmt,
        else_body: Option<&Stmt>,
    ) -> CompileResult<()> {
        let cond_reg = self.lower_expr_bool(cond)?;

        let old = self.scope;
        let then_bb = self.new_block("if", old.horizon);
        let end_bb = self.new_block("endif", old.horizon);
        let else_bb = if else_body.is_some() {
            self.new_block("else", Some(end_bb))
        } else {
            end_bb
        };

        self.set_terminator(Terminator::Branch {
            cond: cond_reg,
            then_block: then_bb,
            else_block: else_bb,
        });

        self.set_scope(then_bb, Some(else_bb));
        self.lower_stmt(then_body)?;
        self.jump_if_open(end_bb);

        if let Some(eb) = else_body {
            self.set_scope(else_bb, Some(end_bb));
            self.lower_stmt(eb)?;
            self.jump_if_open(end_bb);
        }

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_while(&mut self, stmt: &Stmt, cond: &Expr, body: &Stmt) -> CompileResult<()> {
        let old = self.scope;
        let cond_bb = self.new_block("whilecond", old.horizon);
        let body_bb = self.new_block("whilebody", old.horizon);
        let end_bb = self.new_block("endwhile", old.horizon);

        self.set_terminator(Terminator::Jump(cond_bb));

        self.set_scope(cond_bb, Some(end_bb));
        let cond_reg = self.lower_expr_bool(cond)?;
        self.set_terminator(Terminator::Branch {
            cond: cond_reg,
            then_block: body_bb,
            else_block: end_bb,
        });

        self.set_scope(body_bb, Some(end_bb));
        let target = LoopTarget {
            owner: stmt.id,
            region: self.bindings.region_of(stmt.id),
            kind: TargetKind::Loop,
            reentry: cond_bb,
            exit: end_bb,
        };
        self.with_target(target, |l| l.lower_stmt(body))?;
        self.jump_if_open(cond_bb);

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_do(&mut self, stmt: &Stmt, body: &Stmt, cond: &Expr) -> CompileResult<()> {
        let old = self.scope;
        let body_bb = self.new_block("dowhile", old.horizon);
        let cond_bb = self.new_block("dowhilecond", old.horizon);
        let end_bb = self.new_block("enddowhile", old.horizon);

        self.set_terminator(Terminator::Jump(body_bb));

        // Continue re-runs the condition, so the re-entry point is the
        // condition block placed after the body.
        self.set_scope(body_bb, Some(cond_bb));
        let target = LoopTarget {
            owner: stmt.id,
            region: self.bindings.region_of(stmt.id),
            kind: TargetKind::Loop,
            reentry: cond_bb,
            exit: end_bb,
        };
        self.with_target(target, |l| l.lower_stmt(body))?;
        self.jump_if_open(cond_bb);

        self.set_scope(cond_bb, Some(end_bb));
        let cond_reg = self.lower_expr_bool(cond)?;
        self.set_terminator(Terminator::Branch {
            cond: cond_reg,
            then_block: body_bb,
            else_block: end_bb,
        });

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_for(
        &mut self,
        stmt: &Stmt,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        inc: Option<&Expr>,
        body: &Stmt,
    ) -> CompileResult<()> {
        // The init clause runs once, outside the loop.
        if let Some(init) = init {
            self.lower_stmt(init)?;
        }

        let old = self.scope;
        let cond_bb = self.new_block("forcond", old.horizon);
        let body_bb = self.new_block("forbody", old.horizon);
        let inc_bb = self.new_block("forinc", old.horizon);
        let end_bb = self.new_block("endfor", old.horizon);

        self.set_terminator(Terminator::Jump(cond_bb));

        self.set_scope(cond_bb, Some(body_bb));
        match cond {
            Some(cond) => {
                let cond_reg = self.lower_expr_bool(cond)?;
                self.set_terminator(Terminator::Branch {
                    cond: cond_reg,
                    then_block: body_bb,
                    else_block: end_bb,
                });
            }
            // No condition: loop until something breaks out.
            None => self.set_terminator(Terminator::Jump(body_bb)),
        }

        self.set_scope(body_bb, Some(inc_bb));
        let target = LoopTarget {
            owner: stmt.id,
            region: self.bindings.region_of(stmt.id),
            kind: TargetKind::Loop,
            reentry: inc_bb,
            exit: end_bb,
        };
        self.with_target(target, |l| l.lower_stmt(body))?;
        self.jump_if_open(inc_bb);

        self.set_scope(inc_bb, Some(end_bb));
        if let Some(inc) = inc {
            self.lower_expr(inc)?;
        }
        self.jump_if_open(cond_bb);

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    /// Each child is lowered in sequence inside one target scope whose
    /// exit is the trailing block. Continue re-enters at the construct's
    /// end, i.e. it skips the remaining unrolled children.
    fn lower_unrolled(&mut self, stmt: &Stmt, children: &[Stmt]) -> CompileResult<()> {
        let old = self.scope;
        let end_bb = self.new_block("unrolledend", old.horizon);

        self.set_scope(old.block, Some(end_bb));
        let target = LoopTarget {
            owner: stmt.id,
            region: self.bindings.region_of(stmt.id),
            kind: TargetKind::Unrolled,
            reentry: end_bb,
            exit: end_bb,
        };
        self.with_target(target, |l| l.lower_compound(children))?;
        self.jump_if_open(end_bb);

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_break(&mut self, stmt: &Stmt, label: Option<&str>) -> CompileResult<()> {
        let region = self.bindings.region_of(stmt.id);
        let (target, to_region) = match label {
            Some(name) => {
                let (target, label_region) = self.labeled_target(name, stmt.span)?;
                (target, label_region)
            }
            None => {
                let target = self.innermost_target(stmt.span)?;
                (target, target.region)
            }
        };
        self.emit_finally_chain(region, to_region, stmt.span)?;
        self.jump_if_open(target.exit);
        Ok(())
    }

    fn lower_continue(&mut self, stmt: &Stmt, label: Option<&str>) -> CompileResult<()> {
        let region = self.bindings.region_of(stmt.id);
        let (target, to_region) = match label {
            Some(name) => {
                let (target, label_region) = self.labeled_target(name, stmt.span)?;
                if !target.kind.supports_continue() {
                    return Err(CompileError::internal(format!(
                        "continue label '{}' names a switch",
                        name
                    )));
                }
                (target, label_region)
            }
            None => {
                let target = self.innermost_continue_target(stmt.span)?;
                (target, target.region)
            }
        };
        self.emit_finally_chain(region, to_region, stmt.span)?;
        self.jump_if_open(target.reentry);
        Ok(())
    }

    fn lower_label(&mut self, stmt: &Stmt, name: &str, body: &Stmt) -> CompileResult<()> {
        let horizon = self.scope_horizon();
        // A forward goto may have allocated the block already; reuse it
        // and move it into position.
        let bb = match self.label_blocks.get(&stmt.id).copied() {
            Some(bb) => {
                if let Some(anchor) = horizon {
                    self.func.move_block_before(bb, anchor);
                }
                bb
            }
            None => {
                let bb = self.new_block(&format!("label_{}", name), horizon);
                self.label_blocks.insert(stmt.id, bb);
                bb
            }
        };
        self.jump_if_open(bb);
        self.set_scope(bb, horizon);
        self.lower_stmt(body)
    }

    fn lower_goto(&mut self, stmt: &Stmt, label: &str) -> CompileResult<()> {
        let bindings = self.bindings;
        let info = bindings
            .label(label)
            .ok_or_else(|| CompileError::UndefinedLabel {
                name: label.to_owned(),
                span: stmt.span,
            })?;
        let (label_node, label_region) = (info.node, info.region);

        let target_bb = match self.label_blocks.get(&label_node).copied() {
            Some(bb) => bb,
            None => {
                let bb = self.new_block(&format!("label_{}", label), None);
                self.label_blocks.insert(label_node, bb);
                bb
            }
        };

        // The destination must not sit deeper in the protected-region
        // chain than the goto itself.
        let region = self.bindings.region_of(stmt.id);
        self.emit_finally_chain(region, label_region, stmt.span)?;
        self.jump_if_open(target_bb);

        let horizon = self.scope_horizon();
        let after = self.new_block("aftergoto", horizon);
        self.set_scope(after, horizon);
        Ok(())
    }

    /// `goto case` / `goto default`: a transfer to a specific case body
    /// of the enclosing switch, emitting the finally chain up to the
    /// switch's own region.
    fn lower_goto_case(&mut self, stmt: &Stmt, case_index: Option<usize>) -> CompileResult<()> {
        let switch_node = self
            .bindings
            .switch_target(stmt.id)
            .ok_or_else(|| CompileError::internal("goto case outside of a switch"))?;
        let blocks = self
            .switch_blocks
            .get(&switch_node)
            .ok_or_else(|| CompileError::internal("goto case before switch lowering"))?;

        let target_bb = match case_index {
            Some(i) => *blocks.cases.get(i).ok_or_else(|| {
                CompileError::internal(format!("goto case index {} out of range", i))
            })?,
            None => blocks
                .default
                .ok_or_else(|| CompileError::internal("goto default in a switch with no default"))?,
        };

        let region = self.bindings.region_of(stmt.id);
        let switch_region = self.bindings.region_of(switch_node);
        self.emit_finally_chain(region, switch_region, stmt.span)?;
        self.jump_if_open(target_bb);

        let horizon = self.scope_horizon();
        let after = self.new_block("aftergotocase", horizon);
        self.set_scope(after, horizon);
        Ok(())
    }

    fn lower_try_finally(&mut self, body: &Stmt, cleanup: &Stmt) -> CompileResult<()> {
        let old = self.scope;
        let try_bb = self.new_block("try", old.horizon);
        let finally_bb = self.new_block("finally", old.horizon);
        let end_bb = self.new_block("endtryfinally", old.horizon);

        self.set_terminator(Terminator::Jump(try_bb));

        self.set_scope(try_bb, Some(finally_bb));
        self.lower_stmt(body)?;
        self.jump_if_open(finally_bb);

        // The normal-path copy of the cleanup body; early exits re-emit
        // it at their own transfer site.
        self.set_scope(finally_bb, Some(end_bb));
        self.lower_stmt(cleanup)?;
        self.jump_if_open(end_bb);

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_try_catch(&mut self, stmt: &Stmt, body: &Stmt) -> CompileResult<()> {
        self.diagnostics.notice(
            stmt.span,
            "exception catching is not implemented; handlers are ignored",
        );

        let old = self.scope;
        let try_bb = self.new_block("try", old.horizon);
        let catch_bb = self.new_block("catch", old.horizon);
        let end_bb = self.new_block("endtrycatch", old.horizon);

        self.set_terminator(Terminator::Jump(try_bb));

        self.set_scope(try_bb, Some(catch_bb));
        self.lower_stmt(body)?;
        self.jump_if_open(end_bb);

        self.set_scope(catch_bb, Some(end_bb));
        self.set_terminator(Terminator::Jump(end_bb));

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn lower_throw(&mut self, stmt: &Stmt, value: &Expr) -> CompileResult<()> {
        self.diagnostics
            .notice(stmt.span, "exception unwinding is not fully implemented");
        let value = self.lower_expr(value)?;
        self.emit(IrInstr::RuntimeCall {
            dest: None,
            func: RuntimeFn::Throw,
            table: None,
            args: vec![value],
        });
        self.set_terminator(Terminator::Unreachable);
        Ok(())
    }

    fn lower_with(&mut self, name: &str, object: &Expr, body: &Stmt) -> CompileResult<()> {
        let obj = self.lower_expr(object)?;
        let slot = self.func.add_slot(Some(name), obj.ty.clone());
        self.emit(IrInstr::StoreSlot { slot, value: obj });
        let previous = self.bind_local(name, LocalBinding::Slot(slot));
        let result = self.lower_stmt(body);
        self.restore_local(name, previous);
        result
    }
}
