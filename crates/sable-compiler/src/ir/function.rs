//! IR Functions
//!
//! The block vector is kept in source-structure order: lowering inserts
//! new blocks immediately before the horizon of the construct that
//! created them, and label blocks allocated by forward gotos are moved
//! into position when the label is reached.

use super::block::{BasicBlock, BlockId};
use super::value::Register;
use sable_ast::{CharWidth, Ty};

/// Local variable slot identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotId(pub u32);

impl std::fmt::Display for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{}", self.0)
    }
}

#[derive(Debug, Clone)]
pub struct SlotInfo {
    pub name: Option<String>,
    pub ty: Ty,
}

/// Identifier of a string-switch dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StringTableId(pub u32);

impl std::fmt::Display for StringTableId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "table{}", self.0)
    }
}

/// A sorted string-switch lookup table: the literals in lexicographic
/// order plus their count, handed to the runtime search entry point.
#[derive(Debug, Clone)]
pub struct StringTable {
    pub width: CharWidth,
    pub literals: Vec<String>,
}

impl StringTable {
    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }
}

/// A lowered function body.
#[derive(Debug, Clone)]
pub struct IrFunction {
    pub name: String,
    pub params: Vec<Register>,
    pub return_ty: Ty,
    pub slots: Vec<SlotInfo>,
    pub blocks: Vec<BasicBlock>,
    pub string_tables: Vec<StringTable>,
}

impl IrFunction {
    pub fn new(name: impl Into<String>, return_ty: Ty) -> Self {
        Self {
            name: name.into(),
            params: Vec::new(),
            return_ty,
            slots: Vec::new(),
            blocks: Vec::new(),
            string_tables: Vec::new(),
        }
    }

    pub fn add_slot(&mut self, name: Option<&str>, ty: Ty) -> SlotId {
        let id = SlotId(self.slots.len() as u32);
        self.slots.push(SlotInfo {
            name: name.map(str::to_owned),
            ty,
        });
        id
    }

    pub fn add_string_table(&mut self, table: StringTable) -> StringTableId {
        let id = StringTableId(self.string_tables.len() as u32);
        self.string_tables.push(table);
        id
    }

    pub fn add_block(&mut self, block: BasicBlock) {
        self.blocks.push(block);
    }

    /// Insert a block immediately before `anchor` in presentation order.
    pub fn insert_block_before(&mut self, anchor: BlockId, block: BasicBlock) {
        let pos = self.position(anchor).expect("anchor block not found");
        self.blocks.insert(pos, block);
    }

    /// Move an existing block so it sits immediately before `anchor`.
    pub fn move_block_before(&mut self, id: BlockId, anchor: BlockId) {
        let from = self.position(id).expect("moved block not found");
        let block = self.blocks.remove(from);
        let to = self.position(anchor).expect("anchor block not found");
        self.blocks.insert(to, block);
    }

    pub fn get_block(&self, id: BlockId) -> Option<&BasicBlock> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn get_block_mut(&mut self, id: BlockId) -> Option<&mut BasicBlock> {
        self.blocks.iter_mut().find(|b| b.id == id)
    }

    /// Block ids in presentation order.
    pub fn block_order(&self) -> Vec<BlockId> {
        self.blocks.iter().map(|b| b.id).collect()
    }

    fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }
}
