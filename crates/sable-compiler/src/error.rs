//! Compilation errors
//!
//! Static errors abort lowering of the current function and carry the
//! source span they were raised at; whether sibling functions are still
//! lowered is the host's call. `Internal` means a bug in an earlier
//! phase or in the lowering core itself and must halt the whole
//! compilation.

use sable_ast::Span;
use thiserror::Error;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{span}: cannot goto into a protected region")]
    GotoIntoProtectedRegion { span: Span },

    #[error("{span}: undefined label '{name}'")]
    UndefinedLabel { name: String, span: Span },

    #[error("{span}: undefined variable '{name}'")]
    UndefinedVariable { name: String, span: Span },

    #[error("{span}: break outside of a loop or switch")]
    BreakOutsideLoop { span: Span },

    #[error("{span}: continue outside of a loop")]
    ContinueOutsideLoop { span: Span },

    #[error("{span}: case label is not a compile-time constant")]
    NonConstantCase { span: Span },

    #[error("{span}: duplicate case value {value}")]
    DuplicateCase { value: String, span: Span },

    #[error("{span}: unsupported feature: {feature}")]
    UnsupportedFeature { feature: String, span: Span },

    #[error("internal compiler error: {message}")]
    Internal { message: String },
}

impl CompileError {
    pub fn internal(message: impl Into<String>) -> Self {
        CompileError::Internal {
            message: message.into(),
        }
    }

    /// True for errors that indicate a compiler bug rather than bad
    /// input; the host must stop the whole compilation on these.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CompileError::Internal { .. })
    }
}
