//! Overflow detection
//!
//! Two checks share the same geometry: a cheap last-child check that only
//! maintains each page's overflow flag, and a full scan that finds where a
//! page must be split.

use crate::document::{BlockId, DocumentTree, ElementRef, NodeRef, PageId};
use crate::editing::{Mutation, Position};
use crate::error::{PaginationError, Result};
use crate::layout::{LayoutMeasurer, RenderedBlock};
use log::trace;

/// First child, in document order, whose bottom edge exceeds `threshold`
pub fn find_overflow_anchor(children: &[RenderedBlock], threshold: f32) -> Option<&RenderedBlock> {
    children.iter().find(|child| child.bottom() > threshold)
}

/// Whether the last child's bottom edge exceeds `threshold`; `None` for a
/// page without children
pub fn last_child_overflows(children: &[RenderedBlock], threshold: f32) -> Option<bool> {
    children.last().map(|child| child.bottom() > threshold)
}

/// Position of a page's opening boundary, checked against the page itself
pub(crate) fn resolve_page<D: DocumentTree + ?Sized>(tree: &D, page: PageId) -> Result<Position> {
    let pos = tree
        .resolve_rendered(ElementRef::Page(page), 0)
        .and_then(Position::before)
        .ok_or(PaginationError::InvalidPageState(page))?;
    match tree.node_at(pos).and_then(NodeRef::as_page) {
        Some(node) if node.id == page => Ok(pos),
        _ => Err(PaginationError::StaleReference { pos }),
    }
}

/// Continuous detection for one page.
///
/// Applies a flag mutation only when the computed value differs from the
/// stored one, and returns whether it did.
pub fn update_overflow_flag<D, M>(
    tree: &mut D,
    measurer: &mut M,
    page: PageId,
    threshold: f32,
) -> Result<bool>
where
    D: DocumentTree + ?Sized,
    M: LayoutMeasurer<D> + ?Sized,
{
    let children = measurer.rendered_children_of(&*tree, page);
    let overflowing = last_child_overflows(&children, threshold)
        .ok_or(PaginationError::InvalidPageState(page))?;

    let pos = resolve_page(&*tree, page)?;
    let attrs = match tree.node_at(pos).and_then(NodeRef::as_page) {
        Some(node) if node.attrs.is_overflowing == overflowing => return Ok(false),
        Some(node) => node.attrs.with_overflowing(overflowing),
        None => return Err(PaginationError::InvalidPageState(page)),
    };

    trace!("page {:?} overflowing: {}", page, overflowing);
    tree.apply(Mutation::SetPageAttrs { at: pos, attrs })?;
    Ok(true)
}

/// Split-point detection for one page: the block every later block must
/// follow onto the next page
pub fn detect_split_point<D, M>(
    tree: &D,
    measurer: &mut M,
    page: PageId,
    threshold: f32,
) -> Result<Option<BlockId>>
where
    D: DocumentTree + ?Sized,
    M: LayoutMeasurer<D> + ?Sized,
{
    let children = measurer.rendered_children_of(tree, page);
    if children.is_empty() {
        return Err(PaginationError::InvalidPageState(page));
    }
    let anchor = find_overflow_anchor(&children, threshold).map(|child| child.element);
    trace!("page {:?} split anchor: {:?}", page, anchor);
    Ok(anchor)
}
