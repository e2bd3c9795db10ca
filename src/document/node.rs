//! Page nodes, fragments and node references

use super::block::{Block, BlockId};
use crate::pagination::PageAttrs;
use serde::Serialize;

/// Stable identifier for pages; doubles as the rendered-element handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct PageId(pub u64);

/// A page container holding one or more blocks
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageNode {
    pub id: PageId,
    pub attrs: PageAttrs,
    pub blocks: Vec<Block>,
}

impl PageNode {
    pub fn new(id: PageId, attrs: PageAttrs, blocks: Vec<Block>) -> Self {
        Self { id, attrs, blocks }
    }

    /// Size of the page's content in positions
    pub fn content_size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    /// Size of the page in positions, including its boundaries
    pub fn node_size(&self) -> usize {
        self.content_size() + 2
    }

    /// Number of blocks
    pub fn child_count(&self) -> usize {
        self.blocks.len()
    }

    /// Index of a block within the page
    pub fn index_of(&self, block: BlockId) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == block)
    }
}

/// Portable copy of a run of blocks
///
/// A fragment owns its blocks; it never refers back into the document it
/// was sliced from.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Fragment {
    pub blocks: Vec<Block>,
}

impl Fragment {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Build a fragment of paragraphs; ids are placeholders that the
    /// document replaces on insert
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            blocks: texts
                .into_iter()
                .map(|text| Block::paragraph(BlockId::default(), text))
                .collect(),
        }
    }

    /// Size of the fragment in positions
    pub fn size(&self) -> usize {
        self.blocks.iter().map(Block::node_size).sum()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Ids of the blocks in order
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.blocks.iter().map(|b| b.id)
    }
}

/// Borrowed view of the node found at a position
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Page(&'a PageNode),
    Block(&'a Block),
}

impl<'a> NodeRef<'a> {
    /// The page, if this is a page node
    pub fn as_page(self) -> Option<&'a PageNode> {
        match self {
            NodeRef::Page(page) => Some(page),
            NodeRef::Block(_) => None,
        }
    }

    /// The block, if this is a block node
    pub fn as_block(self) -> Option<&'a Block> {
        match self {
            NodeRef::Block(block) => Some(block),
            NodeRef::Page(_) => None,
        }
    }

    /// Size of the node in positions
    pub fn node_size(self) -> usize {
        match self {
            NodeRef::Page(page) => page.node_size(),
            NodeRef::Block(block) => block.node_size(),
        }
    }
}

/// Handle to a rendered element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementRef {
    Page(PageId),
    Block(BlockId),
}
