//! Expression Lowering
//!
//! The slice of expression-to-value lowering the statement core needs:
//! lower an expression at the current cursor yielding a typed register,
//! and reduce a case-label expression to a compile-time constant.

use super::{LocalBinding, Lowerer};
use crate::error::{CompileError, CompileResult};
use crate::ir::{IrConstant, IrInstr, Register};
use sable_ast::{BinOp, Expr, Ty, UnOp};

impl<'a> Lowerer<'a> {
    /// Lower an expression, yielding the register holding its value.
    pub(crate) fn lower_expr(&mut self, expr: &Expr) -> CompileResult<Register> {
        match expr {
            Expr::Int { value, ty, .. } => {
                let dest = self.alloc_register(ty.clone());
                self.emit(IrInstr::Const {
                    dest: dest.clone(),
                    value: IrConstant::Int(*value),
                });
                Ok(dest)
            }
            Expr::Bool { value, .. } => {
                let dest = self.alloc_register(Ty::Bool);
                self.emit(IrInstr::Const {
                    dest: dest.clone(),
                    value: IrConstant::Bool(*value),
                });
                Ok(dest)
            }
            Expr::Str { value, width, .. } => {
                let dest = self.alloc_register(Ty::Str(*width));
                self.emit(IrInstr::Const {
                    dest: dest.clone(),
                    value: IrConstant::Str {
                        value: value.clone(),
                        width: *width,
                    },
                });
                Ok(dest)
            }
            Expr::Ident { name, span } => match self.lookup_local(name) {
                Some(LocalBinding::Slot(slot)) => {
                    let ty = self.func.slots[slot.0 as usize].ty.clone();
                    let dest = self.alloc_register(ty);
                    self.emit(IrInstr::LoadSlot {
                        dest: dest.clone(),
                        slot,
                    });
                    Ok(dest)
                }
                Some(LocalBinding::Addr(addr)) => {
                    let elem = addr
                        .ty
                        .elem()
                        .cloned()
                        .ok_or_else(|| CompileError::internal("address binding is not a pointer"))?;
                    let dest = self.alloc_register(elem);
                    self.emit(IrInstr::LoadPtr {
                        dest: dest.clone(),
                        addr,
                    });
                    Ok(dest)
                }
                None => Err(CompileError::UndefinedVariable {
                    name: name.clone(),
                    span: *span,
                }),
            },
            Expr::Unary { op, operand, .. } => {
                let operand = self.lower_expr(operand)?;
                let ty = match op {
                    UnOp::Not => Ty::Bool,
                    UnOp::Neg | UnOp::BitNot => operand.ty.clone(),
                };
                let dest = self.alloc_register(ty);
                self.emit(IrInstr::UnaryOp {
                    dest: dest.clone(),
                    op: *op,
                    operand,
                });
                Ok(dest)
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.lower_expr(left)?;
                let right = self.lower_expr(right)?;
                let ty = if op.is_comparison() || op.is_logical() {
                    Ty::Bool
                } else {
                    left.ty.clone()
                };
                let dest = self.alloc_register(ty);
                self.emit(IrInstr::BinaryOp {
                    dest: dest.clone(),
                    op: *op,
                    left,
                    right,
                });
                Ok(dest)
            }
            Expr::Assign { target, value, .. } => {
                let value = self.lower_expr(value)?;
                match self.lookup_local(target) {
                    Some(LocalBinding::Slot(slot)) => {
                        self.emit(IrInstr::StoreSlot {
                            slot,
                            value: value.clone(),
                        });
                    }
                    Some(LocalBinding::Addr(addr)) => {
                        self.emit(IrInstr::StorePtr {
                            addr,
                            value: value.clone(),
                        });
                    }
                    // First assignment declares the local.
                    None => {
                        let slot = self.func.add_slot(Some(target.as_str()), value.ty.clone());
                        self.bind_local(target, LocalBinding::Slot(slot));
                        self.emit(IrInstr::StoreSlot {
                            slot,
                            value: value.clone(),
                        });
                    }
                }
                Ok(value)
            }
            Expr::Call {
                callee, args, ty, ..
            } => {
                let args = args
                    .iter()
                    .map(|a| self.lower_expr(a))
                    .collect::<CompileResult<Vec<_>>>()?;
                let dest = self.alloc_register(ty.clone());
                self.emit(IrInstr::Call {
                    dest: Some(dest.clone()),
                    callee: callee.clone(),
                    args,
                });
                Ok(dest)
            }
            Expr::Index { base, index, .. } => {
                let base = self.lower_expr(base)?;
                let index = self.lower_expr(index)?;
                let elem = base
                    .ty
                    .elem()
                    .cloned()
                    .ok_or_else(|| CompileError::internal("indexing a non-array value"))?;
                let addr = self.alloc_register(Ty::Ptr(Box::new(elem.clone())));
                self.emit(IrInstr::ElemAddr {
                    dest: addr.clone(),
                    base,
                    index,
                });
                let dest = self.alloc_register(elem);
                self.emit(IrInstr::LoadPtr {
                    dest: dest.clone(),
                    addr,
                });
                Ok(dest)
            }
        }
    }

    /// Lower a condition: non-boolean values pass through an explicit
    /// truthiness conversion.
    pub(crate) fn lower_expr_bool(&mut self, expr: &Expr) -> CompileResult<Register> {
        let value = self.lower_expr(expr)?;
        if value.ty == Ty::Bool {
            return Ok(value);
        }
        let dest = self.alloc_register(Ty::Bool);
        self.emit(IrInstr::Truthy {
            dest: dest.clone(),
            operand: value,
        });
        Ok(dest)
    }

    /// Reduce a case-label expression to a compile-time constant.
    pub(crate) fn lower_const_expr(&self, expr: &Expr) -> CompileResult<IrConstant> {
        match expr {
            Expr::Int { value, .. } => Ok(IrConstant::Int(*value)),
            Expr::Bool { value, .. } => Ok(IrConstant::Bool(*value)),
            Expr::Str { value, width, .. } => Ok(IrConstant::Str {
                value: value.clone(),
                width: *width,
            }),
            Expr::Unary {
                op: UnOp::Neg,
                operand,
                span,
            } => match self.lower_const_expr(operand)? {
                IrConstant::Int(v) => Ok(IrConstant::Int(-v)),
                _ => Err(CompileError::NonConstantCase { span: *span }),
            },
            Expr::Binary {
                op,
                left,
                right,
                span,
            } => {
                let l = self.lower_const_expr(left)?;
                let r = self.lower_const_expr(right)?;
                match (l.as_int(), r.as_int(), op) {
                    (Some(l), Some(r), BinOp::Add) => Ok(IrConstant::Int(l.wrapping_add(r))),
                    (Some(l), Some(r), BinOp::Sub) => Ok(IrConstant::Int(l.wrapping_sub(r))),
                    (Some(l), Some(r), BinOp::Mul) => Ok(IrConstant::Int(l.wrapping_mul(r))),
                    _ => Err(CompileError::NonConstantCase { span: *span }),
                }
            }
            other => Err(CompileError::NonConstantCase { span: other.span() }),
        }
    }
}
