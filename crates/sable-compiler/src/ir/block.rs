//! Basic blocks and terminators

use super::instr::IrInstr;
use super::value::Register;

/// Basic block identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

impl BlockId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// The control transfer ending a basic block.
#[derive(Debug, Clone, PartialEq)]
pub enum Terminator {
    Jump(BlockId),
    Branch {
        cond: Register,
        then_block: BlockId,
        else_block: BlockId,
    },
    /// Multi-way dispatch on an integer value.
    Switch {
        value: Register,
        cases: Vec<(i64, BlockId)>,
        default: BlockId,
    },
    Return(Option<Register>),
    Unreachable,
}

impl std::fmt::Display for Terminator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Terminator::Jump(b) => write!(f, "jump {}", b),
            Terminator::Branch {
                cond,
                then_block,
                else_block,
            } => write!(f, "branch {} ? {} : {}", cond, then_block, else_block),
            Terminator::Switch {
                value,
                cases,
                default,
            } => {
                write!(f, "switch {} [", value)?;
                for (i, (v, b)) in cases.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{} -> {}", v, b)?;
                }
                write!(f, "] default {}", default)
            }
            Terminator::Return(Some(r)) => write!(f, "return {}", r),
            Terminator::Return(None) => write!(f, "return"),
            Terminator::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// A straight-line instruction sequence ending in one terminator.
///
/// Appending to a terminated block is a bug in the lowering core, not a
/// recoverable condition, and panics.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    pub id: BlockId,
    pub label: Option<String>,
    pub instructions: Vec<IrInstr>,
    pub terminator: Option<Terminator>,
}

impl BasicBlock {
    pub fn new(id: BlockId) -> Self {
        Self {
            id,
            label: None,
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn with_label(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: Some(label.into()),
            instructions: Vec::new(),
            terminator: None,
        }
    }

    pub fn add_instr(&mut self, instr: IrInstr) {
        assert!(
            self.terminator.is_none(),
            "instruction appended to terminated block {}",
            self.id
        );
        self.instructions.push(instr);
    }

    pub fn set_terminator(&mut self, term: Terminator) {
        assert!(
            self.terminator.is_none(),
            "terminator set twice on block {}",
            self.id
        );
        self.terminator = Some(term);
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator.is_some()
    }

    /// Block ids this block can transfer to.
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.terminator {
            Some(Terminator::Jump(b)) => vec![*b],
            Some(Terminator::Branch {
                then_block,
                else_block,
                ..
            }) => vec![*then_block, *else_block],
            Some(Terminator::Switch { cases, default, .. }) => {
                let mut out: Vec<BlockId> = cases.iter().map(|(_, b)| *b).collect();
                out.push(*default);
                out
            }
            Some(Terminator::Return(_)) | Some(Terminator::Unreachable) | None => vec![],
        }
    }
}
