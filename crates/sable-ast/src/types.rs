//! Source types
//!
//! A compact type model, just rich enough for the lowering stage: it
//! needs to know whether a value is integral (switch strategy), the bit
//! width of integers (index conversions), the element width of strings
//! (string-switch runtime selection), and array element types/lengths
//! (foreach).

/// Character element width of a string type.
///
/// Selects which runtime entry point a string switch dispatches through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharWidth {
    /// 8-bit elements
    Narrow,
    /// 16-bit elements
    Wide,
    /// 32-bit elements
    Quad,
}

impl CharWidth {
    pub fn bits(&self) -> u32 {
        match self {
            CharWidth::Narrow => 8,
            CharWidth::Wide => 16,
            CharWidth::Quad => 32,
        }
    }
}

/// A source-level type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Void,
    Bool,
    Int { bits: u32, signed: bool },
    Char(CharWidth),
    Str(CharWidth),
    /// Fixed-length array, length known at compile time.
    StaticArray { elem: Box<Ty>, len: u64 },
    /// Length carried alongside a data pointer at runtime.
    DynArray { elem: Box<Ty> },
    /// Raw element pointer, produced by element addressing.
    Ptr(Box<Ty>),
}

impl Ty {
    /// Bit width of the platform index type.
    pub const INDEX_BITS: u32 = 64;

    /// The platform index type (hidden foreach counters and array lengths).
    pub fn index() -> Ty {
        Ty::Int {
            bits: Self::INDEX_BITS,
            signed: false,
        }
    }

    pub fn int(bits: u32, signed: bool) -> Ty {
        Ty::Int { bits, signed }
    }

    /// Integral kinds can drive an integer switch directly.
    pub fn is_integral(&self) -> bool {
        matches!(self, Ty::Bool | Ty::Int { .. } | Ty::Char(_))
    }

    /// Bit width for integral kinds.
    pub fn bit_width(&self) -> Option<u32> {
        match self {
            Ty::Bool => Some(1),
            Ty::Int { bits, .. } => Some(*bits),
            Ty::Char(w) => Some(w.bits()),
            _ => None,
        }
    }

    /// Element type for arrays and pointers.
    pub fn elem(&self) -> Option<&Ty> {
        match self {
            Ty::StaticArray { elem, .. } | Ty::DynArray { elem } | Ty::Ptr(elem) => Some(elem),
            _ => None,
        }
    }

    /// Element width for string types.
    pub fn char_width(&self) -> Option<CharWidth> {
        match self {
            Ty::Str(w) => Some(*w),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ty::Void => write!(f, "void"),
            Ty::Bool => write!(f, "bool"),
            Ty::Int { bits, signed: true } => write!(f, "i{}", bits),
            Ty::Int {
                bits,
                signed: false,
            } => write!(f, "u{}", bits),
            Ty::Char(w) => write!(f, "char{}", w.bits()),
            Ty::Str(w) => write!(f, "str{}", w.bits()),
            Ty::StaticArray { elem, len } => write!(f, "[{}; {}]", elem, len),
            Ty::DynArray { elem } => write!(f, "[{}]", elem),
            Ty::Ptr(elem) => write!(f, "*{}", elem),
        }
    }
}
