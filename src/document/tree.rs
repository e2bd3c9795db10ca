//! The document-tree interface consumed by the pagination engine

use super::node::{ElementRef, Fragment, NodeRef, PageId, PageNode};
use crate::editing::{Mutation, MutationResult, Position};
use crate::error::Result;

/// Minimal structural interface the pagination engine needs from a
/// document.
///
/// Implementations must treat every `apply` call as one atomic
/// transaction. Positions returned by this trait are only valid until the
/// next `apply`.
pub trait DocumentTree {
    /// Rendered page elements in document order
    fn page_elements(&self) -> Vec<PageId>;

    /// Position inside `element` at `child_offset`.
    ///
    /// For a page, `child_offset` counts blocks; for a block it counts
    /// chars. `None` when the element no longer exists or the offset is past
    /// its end.
    fn resolve_rendered(&self, element: ElementRef, child_offset: usize) -> Option<Position>;

    /// Node that starts exactly at `pos`
    fn node_at(&self, pos: Position) -> Option<NodeRef<'_>>;

    /// Owned copy of the blocks between two block boundaries of one page
    fn slice(&self, from: Position, to: Position) -> Result<Fragment>;

    /// Apply one mutation as an indivisible transaction
    fn apply(&mut self, mutation: Mutation) -> Result<MutationResult>;

    /// Position at the very end of the document
    fn end_position(&self) -> Position;

    /// Position right after the node starting at `pos`
    fn position_after_node(&self, pos: Position) -> Option<Position> {
        self.node_at(pos).map(|node| pos.offset(node.node_size()))
    }

    /// The page node rendered as `page`
    fn page_node(&self, page: PageId) -> Option<&PageNode> {
        let pos = self
            .resolve_rendered(ElementRef::Page(page), 0)
            .and_then(Position::before)?;
        self.node_at(pos)
            .and_then(NodeRef::as_page)
            .filter(|node| node.id == page)
    }
}
