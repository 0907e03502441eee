//! Diagnostic notices
//!
//! Constructs whose special semantics are deliberately not implemented
//! (exception handlers, synchronized locking, volatile ordering) still
//! lower their bodies, but the simplification is surfaced to the host as
//! a notice rather than swallowed.

use sable_ast::Span;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.span, self.message)
    }
}

/// Notices collected while lowering one function.
#[derive(Debug, Default)]
pub struct Diagnostics {
    notices: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notice(&mut self, span: Span, message: impl Into<String>) {
        self.notices.push(Diagnostic {
            span,
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.notices.iter()
    }
}
