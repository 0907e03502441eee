//! Sable Compiler - Statement Lowering
//!
//! This crate lowers the structured-statement AST into a basic-block
//! control-flow graph: block topology and terminator placement, loop and
//! switch exit tracking for break/continue, finally-chain emission on
//! every early exit from a protected region, and multi-way dispatch
//! including string-keyed switches through a sorted lookup table and a
//! runtime search call.

pub mod diagnostics;
pub mod error;
pub mod ir;
pub mod lower;

pub use diagnostics::{Diagnostic, Diagnostics};
pub use error::{CompileError, CompileResult};
pub use lower::{lower_function, Lowerer, Param};
