//! Moving overflowing content to the following page

use crate::document::{BlockId, DocumentTree, ElementRef, NodeRef, PageId, PageNode};
use crate::editing::{Content, Mutation, Position};
use crate::error::{PaginationError, Result};
use crate::pagination::detector::resolve_page;
use crate::pagination::PageAttrs;
use log::{debug, warn};
use smallvec::SmallVec;

/// Outcome of redistributing one page
#[derive(Debug, Clone, PartialEq)]
pub struct Redistribution {
    /// Page the blocks were taken from
    pub source: PageId,
    /// Page the blocks now start
    pub destination: PageId,
    /// Moved blocks, in order
    pub moved: SmallVec<[BlockId; 4]>,
    /// Whether `destination` was created for the move
    pub created_page: bool,
}

/// Geometry of the source page, read before any mutation
struct SourcePage {
    pos: Position,
    content_end: Position,
    first_block_end: Position,
    child_count: usize,
    ordinal: u32,
}

fn read_source<D: DocumentTree + ?Sized>(tree: &D, page: PageId) -> Result<SourcePage> {
    let pos = resolve_page(tree, page)?;
    let node = tree
        .node_at(pos)
        .and_then(NodeRef::as_page)
        .ok_or(PaginationError::StaleReference { pos })?;
    let first = node
        .blocks
        .first()
        .ok_or(PaginationError::InvalidPageState(page))?;
    Ok(SourcePage {
        pos,
        content_end: pos.offset(1 + node.content_size()),
        first_block_end: pos.offset(1 + first.node_size()),
        child_count: node.child_count(),
        ordinal: node.attrs.ordinal,
    })
}

/// Start of the split: the anchor's opening boundary, moved past the first
/// block when the anchor is the first block so the page keeps one child
fn split_start<D: DocumentTree + ?Sized>(
    tree: &D,
    source: &SourcePage,
    anchor: BlockId,
) -> Result<Position> {
    let anchor_pos = tree
        .resolve_rendered(ElementRef::Block(anchor), 0)
        .and_then(Position::before)
        .ok_or(PaginationError::StaleReference { pos: source.pos })?;

    let content_start = source.pos.offset(1);
    let is_anchor = tree
        .node_at(anchor_pos)
        .and_then(NodeRef::as_block)
        .is_some_and(|block| block.id == anchor);
    if !is_anchor || anchor_pos < content_start || anchor_pos >= source.content_end {
        return Err(PaginationError::StaleReference { pos: anchor_pos });
    }

    if anchor_pos == content_start {
        if source.child_count < 2 {
            return Err(PaginationError::StructuralViolation(
                "the only block of a page cannot move",
            ));
        }
        return Ok(source.first_block_end);
    }
    Ok(anchor_pos)
}

/// Move everything from `anchor` to the end of `page` onto the next page,
/// creating one at the end of the document when `page` is the last.
///
/// Runs as two transactions: delete from the source, then insert at the
/// destination. If the insert fails the deleted blocks are put back.
pub fn redistribute<D: DocumentTree + ?Sized>(
    tree: &mut D,
    page: PageId,
    anchor: BlockId,
) -> Result<Redistribution> {
    let source = read_source(&*tree, page)?;
    let from = split_start(&*tree, &source, anchor)?;
    let to = source.content_end;

    let fragment = tree.slice(from, to)?;
    tree.apply(Mutation::DeleteRange { from, to })?;

    let after = tree
        .position_after_node(source.pos)
        .ok_or(PaginationError::StaleReference { pos: source.pos })?;
    let next_page = tree
        .node_at(after)
        .and_then(NodeRef::as_page)
        .map(|node| node.id);

    let (at, content) = match next_page {
        Some(_) => (after.offset(1), Content::Blocks(fragment.clone())),
        None => {
            let node = PageNode::new(
                PageId::default(),
                PageAttrs::numbered(source.ordinal + 1),
                fragment.blocks.clone(),
            );
            (tree.end_position(), Content::Page(node))
        }
    };

    let inserted = match tree.apply(Mutation::Insert { at, content }) {
        Ok(result) => result,
        Err(err) => {
            warn!("restoring page {:?} after failed insert: {}", page, err);
            tree.apply(Mutation::Insert {
                at: from,
                content: Content::Blocks(fragment),
            })?;
            return Err(err);
        }
    };

    let (destination, created_page) = match next_page {
        Some(id) => (id, false),
        None => {
            let id = inserted
                .created_pages
                .first()
                .copied()
                .ok_or(PaginationError::StaleReference { pos: at })?;
            (id, true)
        }
    };

    debug!(
        "moved {} block(s) from page {:?} to {}page {:?}",
        inserted.inserted_blocks.len(),
        page,
        if created_page { "new " } else { "" },
        destination
    );

    Ok(Redistribution {
        source: page,
        destination,
        moved: inserted.inserted_blocks,
        created_page,
    })
}
