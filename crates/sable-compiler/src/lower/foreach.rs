//! Foreach Lowering
//!
//! Aggregate iteration drives a hidden counter through a standard
//! cond/body/next/end loop shape. Forward iteration counts 0..len with
//! the increment in the `next` block; reverse iteration counts len..0
//! and decrements inside the condition block, after the zero test, so
//! the body always sees the index of the element it is visiting.
//! Reference bindings alias the element address; value bindings copy
//! the element into a fresh slot each iteration.

use super::{LocalBinding, LoopTarget, Lowerer, TargetKind};
use crate::error::{CompileError, CompileResult};
use crate::ir::{CastKind, IrConstant, IrInstr, Register, Terminator};
use sable_ast::{BinOp, ForeachAggregate, ForeachStmt, Stmt, Ty};

impl<'a> Lowerer<'a> {
    pub(crate) fn lower_foreach(&mut self, stmt: &Stmt, fe: &ForeachStmt) -> CompileResult<()> {
        let old = self.scope;

        // Unpack the aggregate into a base the element addressing can
        // index, its element type, and an iteration count.
        let (base, elem_ty, count) = match &fe.aggregate {
            ForeachAggregate::Value(expr) => {
                let agg = self.lower_expr(expr)?;
                match agg.ty.clone() {
                    Ty::StaticArray { elem, len } => {
                        let count = self.emit_const_int(Ty::index(), len as i64);
                        (agg, *elem, count)
                    }
                    Ty::DynArray { elem } => {
                        let len = self.alloc_register(Ty::index());
                        self.emit(IrInstr::ArrayLen {
                            dest: len.clone(),
                            array: agg.clone(),
                        });
                        let ptr = self.alloc_register(Ty::Ptr(elem.clone()));
                        self.emit(IrInstr::ArrayPtr {
                            dest: ptr.clone(),
                            array: agg,
                        });
                        (ptr, *elem, len)
                    }
                    other => {
                        return Err(CompileError::internal(format!(
                            "foreach over non-array type {}",
                            other
                        )))
                    }
                }
            }
            ForeachAggregate::Slice { ptr, len, elem } => {
                let ptr = self.lower_expr(ptr)?;
                let len = self.lower_expr(len)?;
                (ptr, elem.clone(), len)
            }
        };

        // The counter lives in a slot of the declared key type (or the
        // platform index type when no key is named), so the count must
        // be adapted to that width first.
        let key_ty = fe
            .key
            .as_ref()
            .map(|k| k.ty.clone())
            .unwrap_or_else(Ty::index);
        let count = self.adapt_int_width(count, &key_ty)?;
        let key_slot = self
            .func
            .add_slot(fe.key.as_ref().map(|k| k.name.as_str()), key_ty.clone());

        let init = if fe.reverse {
            count.clone()
        } else {
            self.emit_const_int(key_ty.clone(), 0)
        };
        self.emit(IrInstr::StoreSlot {
            slot: key_slot,
            value: init,
        });

        let cond_bb = self.new_block("foreachcond", old.horizon);
        let body_bb = self.new_block("foreachbody", old.horizon);
        let next_bb = self.new_block("foreachnext", old.horizon);
        let end_bb = self.new_block("foreachend", old.horizon);

        self.jump_if_open(cond_bb);

        // Condition: forward tests idx < count; reverse tests idx != 0
        // and then stores idx - 1 so the body sees the visited index.
        self.set_scope(cond_bb, Some(body_bb));
        let idx = self.alloc_register(key_ty.clone());
        self.emit(IrInstr::LoadSlot {
            dest: idx.clone(),
            slot: key_slot,
        });
        let cond = if fe.reverse {
            let zero = self.emit_const_int(key_ty.clone(), 0);
            let cond = self.alloc_register(Ty::Bool);
            self.emit(IrInstr::BinaryOp {
                dest: cond.clone(),
                op: BinOp::Ne,
                left: idx.clone(),
                right: zero,
            });
            let one = self.emit_const_int(key_ty.clone(), 1);
            let decremented = self.alloc_register(key_ty.clone());
            self.emit(IrInstr::BinaryOp {
                dest: decremented.clone(),
                op: BinOp::Sub,
                left: idx,
                right: one,
            });
            self.emit(IrInstr::StoreSlot {
                slot: key_slot,
                value: decremented,
            });
            cond
        } else {
            let cond = self.alloc_register(Ty::Bool);
            self.emit(IrInstr::BinaryOp {
                dest: cond.clone(),
                op: BinOp::Lt,
                left: idx,
                right: count,
            });
            cond
        };
        self.set_terminator(Terminator::Branch {
            cond,
            then_block: body_bb,
            else_block: end_bb,
        });

        // Body: address the current element, establish the key/value
        // bindings, and lower the body under a loop target whose
        // continue edge runs through the `next` block.
        self.set_scope(body_bb, Some(next_bb));
        let idx = self.alloc_register(key_ty.clone());
        self.emit(IrInstr::LoadSlot {
            dest: idx.clone(),
            slot: key_slot,
        });
        let addr = self.alloc_register(Ty::Ptr(Box::new(elem_ty.clone())));
        self.emit(IrInstr::ElemAddr {
            dest: addr.clone(),
            base,
            index: idx,
        });

        let value_binding = if fe.value.by_ref {
            LocalBinding::Addr(addr)
        } else {
            let slot = self.func.add_slot(Some(fe.value.name.as_str()), elem_ty.clone());
            let elem = self.alloc_register(elem_ty);
            self.emit(IrInstr::LoadPtr {
                dest: elem.clone(),
                addr,
            });
            self.emit(IrInstr::StoreSlot { slot, value: elem });
            LocalBinding::Slot(slot)
        };

        let shadowed_key = fe
            .key
            .as_ref()
            .map(|k| self.bind_local(&k.name, LocalBinding::Slot(key_slot)));
        let shadowed_value = self.bind_local(&fe.value.name, value_binding);

        let target = LoopTarget {
            owner: stmt.id,
            region: self.bindings.region_of(stmt.id),
            kind: TargetKind::Loop,
            reentry: next_bb,
            exit: end_bb,
        };
        self.with_target(target, |l| l.lower_stmt(&fe.body))?;
        self.jump_if_open(next_bb);

        self.restore_local(&fe.value.name, shadowed_value);
        if let Some(key) = &fe.key {
            self.restore_local(&key.name, shadowed_key.flatten());
        }

        // Next: forward advances the counter; reverse already moved it
        // in the condition block.
        self.set_scope(next_bb, Some(end_bb));
        if !fe.reverse {
            let idx = self.alloc_register(key_ty.clone());
            self.emit(IrInstr::LoadSlot {
                dest: idx.clone(),
                slot: key_slot,
            });
            let one = self.emit_const_int(key_ty.clone(), 1);
            let incremented = self.alloc_register(key_ty);
            self.emit(IrInstr::BinaryOp {
                dest: incremented.clone(),
                op: BinOp::Add,
                left: idx,
                right: one,
            });
            self.emit(IrInstr::StoreSlot {
                slot: key_slot,
                value: incremented,
            });
        }
        self.set_terminator(Terminator::Jump(cond_bb));

        self.set_scope(end_bb, old.horizon);
        Ok(())
    }

    fn emit_const_int(&mut self, ty: Ty, value: i64) -> Register {
        let dest = self.alloc_register(ty);
        self.emit(IrInstr::Const {
            dest: dest.clone(),
            value: IrConstant::Int(value),
        });
        dest
    }

    /// Adapt an integer value to the width of `target`: widen with a
    /// zero extension, narrow with a truncation, reinterpret at equal
    /// width.
    fn adapt_int_width(&mut self, value: Register, target: &Ty) -> CompileResult<Register> {
        if &value.ty == target {
            return Ok(value);
        }
        let from = value
            .ty
            .bit_width()
            .ok_or_else(|| CompileError::internal("width adaptation of a non-integral value"))?;
        let to = target
            .bit_width()
            .ok_or_else(|| CompileError::internal("width adaptation to a non-integral type"))?;
        let kind = match to.cmp(&from) {
            std::cmp::Ordering::Greater => CastKind::Zext,
            std::cmp::Ordering::Less => CastKind::Trunc,
            std::cmp::Ordering::Equal => CastKind::Bitcast,
        };
        let dest = self.alloc_register(target.clone());
        self.emit(IrInstr::IntCast {
            dest: dest.clone(),
            kind,
            operand: value,
        });
        Ok(dest)
    }
}
