//! Document model: an ordered sequence of pages holding blocks

mod block;
mod markup;
mod node;
mod tree;

pub use block::{Block, BlockId, BlockKind, ListMarker};
pub use node::{ElementRef, Fragment, NodeRef, PageId, PageNode};
pub use tree::DocumentTree;

use crate::editing::{Content, DocPosition, Mutation, MutationResult, Position};
use crate::error::{PaginationError, Result};
use crate::pagination::PageAttrs;
use rustc_hash::FxHashSet;

/// Where a position lands in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolved {
    /// Between pages, before the page at `index` (or at the end)
    Document { index: usize },
    /// Between the blocks of a page, before the block at `index`
    Page { page: usize, index: usize },
    /// Inside the text of a block
    Text { page: usize, block: usize, offset: usize },
}

/// The main document structure
#[derive(Debug, Clone)]
pub struct Document {
    /// Pages in document order; never empty
    pages: Vec<PageNode>,
    /// Monotonic version counter
    version: u64,
    /// Next page ID to assign
    next_page_id: u64,
    /// Next block ID to assign
    next_block_id: u64,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document with one page holding one empty paragraph
    pub fn new() -> Self {
        let mut doc = Self::empty();
        doc.push_page(PageAttrs::default(), vec![(BlockKind::Paragraph, String::new())]);
        doc
    }

    /// Create a document from the block texts of each page.
    ///
    /// Pages are numbered in order. A page with no texts gets one empty
    /// paragraph; an empty iterator yields the default document.
    pub fn from_page_texts<I, P, S>(pages: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut doc = Self::empty();
        for texts in pages {
            let ordinal = doc.pages.len() as u32 + 1;
            let blocks = texts
                .into_iter()
                .map(|t| (BlockKind::Paragraph, t.into()))
                .collect();
            doc.push_page(PageAttrs::numbered(ordinal), blocks);
        }
        if doc.pages.is_empty() {
            return Self::new();
        }
        doc
    }

    pub(crate) fn empty() -> Self {
        Self {
            pages: Vec::new(),
            version: 0,
            next_page_id: 0,
            next_block_id: 0,
        }
    }

    /// Append a page with fresh ids; an empty block list gets one empty
    /// paragraph
    pub(crate) fn push_page(
        &mut self,
        attrs: PageAttrs,
        blocks: Vec<(BlockKind, String)>,
    ) -> PageId {
        let mut nodes: Vec<Block> = blocks
            .into_iter()
            .map(|(kind, text)| {
                let id = self.fresh_block_id();
                Block::new(id, kind, text)
            })
            .collect();
        if nodes.is_empty() {
            nodes.push(Block::paragraph(self.fresh_block_id(), ""));
        }
        let id = self.fresh_page_id();
        self.pages.push(PageNode::new(id, attrs, nodes));
        id
    }

    fn fresh_block_id(&mut self) -> BlockId {
        let id = BlockId(self.next_block_id);
        self.next_block_id += 1;
        id
    }

    fn fresh_page_id(&mut self) -> PageId {
        let id = PageId(self.next_page_id);
        self.next_page_id += 1;
        id
    }

    /// Get the document version
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Pages in order
    pub fn pages(&self) -> &[PageNode] {
        &self.pages
    }

    /// Page count
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Get a page by id
    pub fn page(&self, id: PageId) -> Option<&PageNode> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Index of a page in document order
    pub fn page_index(&self, id: PageId) -> Option<usize> {
        self.pages.iter().position(|p| p.id == id)
    }

    /// Locate a block as (page index, block index)
    pub fn locate_block(&self, id: BlockId) -> Option<(usize, usize)> {
        self.pages.iter().enumerate().find_map(|(pi, page)| {
            page.index_of(id).map(|bi| (pi, bi))
        })
    }

    /// Get a block by id
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        let (pi, bi) = self.locate_block(id)?;
        self.pages[pi].blocks.get(bi)
    }

    /// Page containing a block
    pub fn page_of_block(&self, id: BlockId) -> Option<PageId> {
        self.locate_block(id).map(|(pi, _)| self.pages[pi].id)
    }

    /// Block ids of every page, in document order
    pub fn block_order(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.pages.iter().flat_map(|p| p.blocks.iter().map(|b| b.id))
    }

    /// First block of the document
    pub fn first_block(&self) -> BlockId {
        self.block_order().next().unwrap_or_default()
    }

    /// Block texts of a page, in order
    pub fn page_texts(&self, id: PageId) -> Vec<&str> {
        self.page(id)
            .map(|p| p.blocks.iter().map(|b| b.text.as_str()).collect())
            .unwrap_or_default()
    }

    /// Full document text, one line per block
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .flat_map(|p| p.blocks.iter().map(|b| b.text.as_str()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Total size of the document content in positions
    pub fn content_size(&self) -> usize {
        self.pages.iter().map(PageNode::node_size).sum()
    }

    fn page_start_at(&self, index: usize) -> usize {
        self.pages[..index].iter().map(PageNode::node_size).sum()
    }

    fn block_start_at(&self, page: usize, index: usize) -> usize {
        self.page_start_at(page)
            + 1
            + self.pages[page].blocks[..index]
                .iter()
                .map(Block::node_size)
                .sum::<usize>()
    }

    /// Position of the opening boundary of a page
    pub fn page_start(&self, id: PageId) -> Option<Position> {
        self.page_index(id).map(|i| Position(self.page_start_at(i)))
    }

    /// Position of the opening boundary of a block
    pub fn block_start(&self, id: BlockId) -> Option<Position> {
        let (pi, bi) = self.locate_block(id)?;
        Some(Position(self.block_start_at(pi, bi)))
    }

    /// Convert a cursor address to an absolute position
    pub fn doc_position_to_position(&self, pos: &DocPosition) -> Option<Position> {
        let start = self.block_start(pos.block)?;
        let len = self.block(pos.block)?.char_len();
        Some(start.offset(1 + pos.offset.min(len)))
    }

    /// Convert an absolute position to a cursor address
    pub fn position_to_doc_position(&self, pos: Position) -> Option<DocPosition> {
        match self.resolve(pos)? {
            Resolved::Text { page, block, offset } => Some(DocPosition::new(
                self.pages[page].blocks[block].id,
                offset,
            )),
            _ => None,
        }
    }

    fn resolve(&self, pos: Position) -> Option<Resolved> {
        let mut start = 0;
        for (pi, page) in self.pages.iter().enumerate() {
            if pos.0 == start {
                return Some(Resolved::Document { index: pi });
            }
            let end = start + page.node_size();
            if pos.0 < end {
                let mut block_start = start + 1;
                for (bi, block) in page.blocks.iter().enumerate() {
                    if pos.0 == block_start {
                        return Some(Resolved::Page { page: pi, index: bi });
                    }
                    let block_end = block_start + block.node_size();
                    if pos.0 < block_end {
                        return Some(Resolved::Text {
                            page: pi,
                            block: bi,
                            offset: pos.0 - block_start - 1,
                        });
                    }
                    block_start = block_end;
                }
                return Some(Resolved::Page {
                    page: pi,
                    index: page.blocks.len(),
                });
            }
            start = end;
        }
        (pos.0 == start).then_some(Resolved::Document {
            index: self.pages.len(),
        })
    }

    fn resolve_or_err(&self, pos: Position) -> Result<Resolved> {
        self.resolve(pos).ok_or(PaginationError::OutOfBounds(pos))
    }

    fn block_indices_at(&self, at: Position) -> Result<(usize, usize)> {
        match self.resolve_or_err(at)? {
            Resolved::Page { page, index } if index < self.pages[page].blocks.len() => {
                Ok((page, index))
            }
            _ => Err(PaginationError::StaleReference { pos: at }),
        }
    }

    fn page_index_at(&self, at: Position) -> Result<usize> {
        match self.resolve_or_err(at)? {
            Resolved::Document { index } if index < self.pages.len() => Ok(index),
            _ => Err(PaginationError::StaleReference { pos: at }),
        }
    }

    /// Block with `candidate` id if free, otherwise a fresh id
    fn claim_block_id(&mut self, candidate: BlockId, taken: &mut FxHashSet<BlockId>) -> BlockId {
        let id = if taken.contains(&candidate) {
            self.fresh_block_id()
        } else {
            candidate
        };
        taken.insert(id);
        self.next_block_id = self.next_block_id.max(id.0 + 1);
        id
    }

    fn live_block_ids(&self) -> FxHashSet<BlockId> {
        self.block_order().collect()
    }

    /// Apply a mutation
    pub fn apply_mutation(&mut self, mutation: Mutation) -> Result<MutationResult> {
        let mut result = match mutation {
            Mutation::DeleteRange { from, to } => self.apply_delete(from, to)?,
            Mutation::Insert { at, content } => self.apply_insert(at, content)?,
            Mutation::SetPageAttrs { at, attrs } => {
                let index = self.page_index_at(at)?;
                let page = &mut self.pages[index];
                page.attrs = attrs;
                MutationResult {
                    changed_pages: smallvec::smallvec![page.id],
                    ..Default::default()
                }
            }
            Mutation::ReplaceText { at, text } => {
                let (pi, bi) = self.block_indices_at(at)?;
                self.pages[pi].blocks[bi].text = text;
                MutationResult {
                    changed_pages: smallvec::smallvec![self.pages[pi].id],
                    ..Default::default()
                }
            }
            Mutation::SetBlockKind { at, kind } => {
                let (pi, bi) = self.block_indices_at(at)?;
                self.pages[pi].blocks[bi].kind = kind;
                MutationResult {
                    changed_pages: smallvec::smallvec![self.pages[pi].id],
                    ..Default::default()
                }
            }
        };

        self.version += 1;
        result.version = self.version;
        Ok(result)
    }

    /// Apply a delete operation
    fn apply_delete(&mut self, from: Position, to: Position) -> Result<MutationResult> {
        let mut result = MutationResult::default();
        if from.0 > to.0 {
            return Err(PaginationError::UnalignedRange { from, to });
        }
        if from == to {
            return Ok(result);
        }

        match (self.resolve_or_err(from)?, self.resolve_or_err(to)?) {
            (Resolved::Page { page, index: start }, Resolved::Page { page: end_page, index: end })
                if page == end_page =>
            {
                let target = &mut self.pages[page];
                if end - start == target.blocks.len() {
                    return Err(PaginationError::StructuralViolation(
                        "delete would leave the page without blocks",
                    ));
                }
                result
                    .removed_blocks
                    .extend(target.blocks.drain(start..end).map(|b| b.id));
                result.changed_pages.push(target.id);
            }
            (Resolved::Document { index: start }, Resolved::Document { index: end }) => {
                if end - start == self.pages.len() {
                    return Err(PaginationError::StructuralViolation(
                        "delete would leave the document without pages",
                    ));
                }
                for page in self.pages.drain(start..end) {
                    result.removed_blocks.extend(page.blocks.iter().map(|b| b.id));
                    result.changed_pages.push(page.id);
                }
            }
            _ => return Err(PaginationError::UnalignedRange { from, to }),
        }

        Ok(result)
    }

    /// Apply an insert operation
    fn apply_insert(&mut self, at: Position, content: Content) -> Result<MutationResult> {
        let mut result = MutationResult::default();
        let mut taken = self.live_block_ids();

        match content {
            Content::Blocks(fragment) => {
                let (page, index) = match self.resolve_or_err(at)? {
                    Resolved::Page { page, index } => (page, index),
                    _ => return Err(PaginationError::UnalignedRange { from: at, to: at }),
                };
                if fragment.is_empty() {
                    return Ok(result);
                }
                let blocks: Vec<Block> = fragment
                    .blocks
                    .into_iter()
                    .map(|mut block| {
                        block.id = self.claim_block_id(block.id, &mut taken);
                        block
                    })
                    .collect();
                result.inserted_blocks.extend(blocks.iter().map(|b| b.id));
                let target = &mut self.pages[page];
                target.blocks.splice(index..index, blocks);
                result.changed_pages.push(target.id);
            }
            Content::Page(mut node) => {
                let index = match self.resolve_or_err(at)? {
                    Resolved::Document { index } => index,
                    _ => return Err(PaginationError::UnalignedRange { from: at, to: at }),
                };
                if node.blocks.is_empty() {
                    return Err(PaginationError::StructuralViolation(
                        "a page must hold at least one block",
                    ));
                }
                if self.pages.iter().any(|p| p.id == node.id) {
                    node.id = self.fresh_page_id();
                }
                self.next_page_id = self.next_page_id.max(node.id.0 + 1);
                for block in &mut node.blocks {
                    block.id = self.claim_block_id(block.id, &mut taken);
                }
                result.inserted_blocks.extend(node.blocks.iter().map(|b| b.id));
                result.created_pages.push(node.id);
                result.changed_pages.push(node.id);
                self.pages.insert(index, node);
            }
        }

        Ok(result)
    }

    /// Compute the mutations that undo `mutation`, to be applied in order
    /// before `mutation` is applied
    pub fn compute_reverse(&self, mutation: &Mutation) -> Result<Vec<Mutation>> {
        let reverse = match mutation {
            Mutation::DeleteRange { from, to } => match self.resolve_or_err(*from)? {
                Resolved::Document { index: start } => {
                    let end = match self.resolve_or_err(*to)? {
                        Resolved::Document { index } => index,
                        _ => {
                            return Err(PaginationError::UnalignedRange {
                                from: *from,
                                to: *to,
                            })
                        }
                    };
                    let mut at = *from;
                    self.pages[start..end]
                        .iter()
                        .map(|page| {
                            let op = Mutation::Insert {
                                at,
                                content: Content::Page(page.clone()),
                            };
                            at = at.offset(page.node_size());
                            op
                        })
                        .collect()
                }
                _ => vec![Mutation::Insert {
                    at: *from,
                    content: Content::Blocks(self.slice(*from, *to)?),
                }],
            },
            Mutation::Insert { at, content } => vec![Mutation::DeleteRange {
                from: *at,
                to: at.offset(content.size()),
            }],
            Mutation::SetPageAttrs { at, .. } => {
                let index = self.page_index_at(*at)?;
                vec![Mutation::SetPageAttrs {
                    at: *at,
                    attrs: self.pages[index].attrs.clone(),
                }]
            }
            Mutation::ReplaceText { at, .. } => {
                let (pi, bi) = self.block_indices_at(*at)?;
                vec![Mutation::ReplaceText {
                    at: *at,
                    text: self.pages[pi].blocks[bi].text.clone(),
                }]
            }
            Mutation::SetBlockKind { at, .. } => {
                let (pi, bi) = self.block_indices_at(*at)?;
                vec![Mutation::SetBlockKind {
                    at: *at,
                    kind: self.pages[pi].blocks[bi].kind.clone(),
                }]
            }
        };
        Ok(reverse)
    }
}

impl DocumentTree for Document {
    fn page_elements(&self) -> Vec<PageId> {
        self.pages.iter().map(|p| p.id).collect()
    }

    fn resolve_rendered(&self, element: ElementRef, child_offset: usize) -> Option<Position> {
        match element {
            ElementRef::Page(id) => {
                let index = self.page_index(id)?;
                if child_offset > self.pages[index].blocks.len() {
                    return None;
                }
                if child_offset == self.pages[index].blocks.len() {
                    let end = self.page_start_at(index) + 1 + self.pages[index].content_size();
                    return Some(Position(end));
                }
                Some(Position(self.block_start_at(index, child_offset)))
            }
            ElementRef::Block(id) => {
                let (pi, bi) = self.locate_block(id)?;
                if child_offset > self.pages[pi].blocks[bi].char_len() {
                    return None;
                }
                Some(Position(self.block_start_at(pi, bi) + 1 + child_offset))
            }
        }
    }

    fn node_at(&self, pos: Position) -> Option<NodeRef<'_>> {
        match self.resolve(pos)? {
            Resolved::Document { index } => self.pages.get(index).map(NodeRef::Page),
            Resolved::Page { page, index } => {
                self.pages[page].blocks.get(index).map(NodeRef::Block)
            }
            Resolved::Text { .. } => None,
        }
    }

    fn slice(&self, from: Position, to: Position) -> Result<Fragment> {
        if from.0 > to.0 {
            return Err(PaginationError::UnalignedRange { from, to });
        }
        match (self.resolve_or_err(from)?, self.resolve_or_err(to)?) {
            (Resolved::Page { page, index: start }, Resolved::Page { page: end_page, index: end })
                if page == end_page =>
            {
                Ok(Fragment::new(self.pages[page].blocks[start..end].to_vec()))
            }
            _ => Err(PaginationError::UnalignedRange { from, to }),
        }
    }

    fn apply(&mut self, mutation: Mutation) -> Result<MutationResult> {
        self.apply_mutation(mutation)
    }

    fn end_position(&self) -> Position {
        Position(self.content_size())
    }

    fn page_node(&self, page: PageId) -> Option<&PageNode> {
        self.page(page)
    }
}
