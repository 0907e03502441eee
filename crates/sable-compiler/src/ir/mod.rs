//! Block IR
//!
//! The control-flow-graph representation statement lowering produces:
//! basic blocks holding straight-line instructions and ending in exactly
//! one terminator.

mod block;
mod function;
mod instr;
mod module;
mod pretty;
mod value;

pub use block::{BasicBlock, BlockId, Terminator};
pub use function::{IrFunction, SlotId, SlotInfo, StringTable, StringTableId};
pub use instr::{BinaryOp, CastKind, IrInstr, RuntimeFn, UnaryOp};
pub use module::IrModule;
pub use pretty::PrettyPrint;
pub use value::{IrConstant, Register, RegisterId};
