//! IR Instructions

use super::function::{SlotId, StringTableId};
use super::value::{IrConstant, Register};
use sable_ast::{BinOp, UnOp};

/// Fixed runtime library entry points the lowering core calls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFn {
    /// Sorted-table search over 8-bit-element strings, returns the
    /// matched ordinal or an out-of-range sentinel.
    SwitchString,
    /// 16-bit-element variant.
    SwitchWstring,
    /// 32-bit-element variant.
    SwitchDstring,
    /// Raises an exception value; never returns.
    Throw,
}

impl RuntimeFn {
    pub fn symbol(&self) -> &'static str {
        match self {
            RuntimeFn::SwitchString => "_sbl_switch_string",
            RuntimeFn::SwitchWstring => "_sbl_switch_wstring",
            RuntimeFn::SwitchDstring => "_sbl_switch_dstring",
            RuntimeFn::Throw => "_sbl_throw",
        }
    }
}

impl std::fmt::Display for RuntimeFn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Integer width adaptation, chosen by comparing bit widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastKind {
    Zext,
    Trunc,
    Bitcast,
}

/// Binary operators
pub type BinaryOp = BinOp;

/// Unary operators
pub type UnaryOp = UnOp;

/// IR instruction
#[derive(Debug, Clone)]
pub enum IrInstr {
    /// dest = constant
    Const { dest: Register, value: IrConstant },

    /// dest = left op right
    BinaryOp {
        dest: Register,
        op: BinaryOp,
        left: Register,
        right: Register,
    },

    /// dest = op operand
    UnaryOp {
        dest: Register,
        op: UnaryOp,
        operand: Register,
    },

    /// dest = operand != zero; explicit truthiness conversion for
    /// non-boolean condition values.
    Truthy { dest: Register, operand: Register },

    /// dest = cast(operand) at dest's width
    IntCast {
        dest: Register,
        kind: CastKind,
        operand: Register,
    },

    /// dest = slots[slot]
    LoadSlot { dest: Register, slot: SlotId },

    /// slots[slot] = value
    StoreSlot { slot: SlotId, value: Register },

    /// dest = &base[index]
    ElemAddr {
        dest: Register,
        base: Register,
        index: Register,
    },

    /// dest = *addr
    LoadPtr { dest: Register, addr: Register },

    /// *addr = value
    StorePtr { addr: Register, value: Register },

    /// dest = runtime length of a dynamic array value
    ArrayLen { dest: Register, array: Register },

    /// dest = data pointer of a dynamic array value
    ArrayPtr { dest: Register, array: Register },

    /// dest = callee(args)
    Call {
        dest: Option<Register>,
        callee: String,
        args: Vec<Register>,
    },

    /// dest = runtime_fn(table?, args)
    RuntimeCall {
        dest: Option<Register>,
        func: RuntimeFn,
        table: Option<StringTableId>,
        args: Vec<Register>,
    },
}

impl IrInstr {
    /// The destination register if this instruction produces a value.
    pub fn dest(&self) -> Option<&Register> {
        match self {
            IrInstr::Const { dest, .. }
            | IrInstr::BinaryOp { dest, .. }
            | IrInstr::UnaryOp { dest, .. }
            | IrInstr::Truthy { dest, .. }
            | IrInstr::IntCast { dest, .. }
            | IrInstr::LoadSlot { dest, .. }
            | IrInstr::ElemAddr { dest, .. }
            | IrInstr::LoadPtr { dest, .. }
            | IrInstr::ArrayLen { dest, .. }
            | IrInstr::ArrayPtr { dest, .. } => Some(dest),
            IrInstr::Call { dest, .. } | IrInstr::RuntimeCall { dest, .. } => dest.as_ref(),
            IrInstr::StoreSlot { .. } | IrInstr::StorePtr { .. } => None,
        }
    }
}
