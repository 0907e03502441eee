//! IR Values and Registers

use sable_ast::{CharWidth, Ty};

/// Virtual register identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegisterId(pub u32);

impl RegisterId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for RegisterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Register with type information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Register {
    pub id: RegisterId,
    pub ty: Ty,
}

impl Register {
    pub fn new(id: RegisterId, ty: Ty) -> Self {
        Self { id, ty }
    }
}

impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Constant values in IR
#[derive(Debug, Clone, PartialEq)]
pub enum IrConstant {
    Int(i64),
    Bool(bool),
    Str { value: String, width: CharWidth },
}

impl IrConstant {
    pub fn as_int(&self) -> Option<i64> {
        match self {
            IrConstant::Int(v) => Some(*v),
            IrConstant::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            IrConstant::Str { value, .. } => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for IrConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IrConstant::Int(v) => write!(f, "{}", v),
            IrConstant::Bool(b) => write!(f, "{}", b),
            IrConstant::Str { value, .. } => write!(f, "\"{}\"", value.escape_default()),
        }
    }
}
