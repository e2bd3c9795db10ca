//! Document mutations and their results

use crate::document::{BlockId, BlockKind, Fragment, PageId, PageNode};
use crate::pagination::PageAttrs;
use smallvec::SmallVec;
use std::fmt;

/// Integer offset into the flattened document.
///
/// Pages and blocks each occupy one position for their opening and one for
/// their closing boundary; block text occupies one position per char.
/// Positions are not identities: they shift with every structural mutation
/// and must be re-resolved afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Position(pub usize);

impl Position {
    /// Create a new position
    pub fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Position one step before this one (the opening boundary of the node
    /// whose content starts here)
    pub fn before(self) -> Option<Position> {
        self.0.checked_sub(1).map(Position)
    }

    /// Position shifted forward by `delta`
    pub fn offset(self, delta: usize) -> Position {
        Position(self.0 + delta)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content carried by an insert
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Blocks inserted inside a page's content
    Blocks(Fragment),
    /// A whole page inserted at the document level
    Page(PageNode),
}

impl Content {
    /// Size of the content in positions
    pub fn size(&self) -> usize {
        match self {
            Content::Blocks(fragment) => fragment.size(),
            Content::Page(page) => page.node_size(),
        }
    }
}

/// An atomic document mutation
///
/// Each variant is applied as one indivisible transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    /// Delete whole blocks inside one page, or whole pages
    DeleteRange { from: Position, to: Position },
    /// Insert blocks at a block boundary, or a page at a page boundary
    Insert { at: Position, content: Content },
    /// Replace the attributes of the page starting at `at`
    SetPageAttrs { at: Position, attrs: PageAttrs },
    /// Replace the text of the block starting at `at`
    ReplaceText { at: Position, text: String },
    /// Change the kind of the block starting at `at`
    SetBlockKind { at: Position, kind: BlockKind },
}

impl Mutation {
    /// Create a delete mutation
    pub fn delete(from: usize, to: usize) -> Self {
        Self::DeleteRange {
            from: Position(from),
            to: Position(to),
        }
    }

    /// Create a block insert mutation
    pub fn insert_blocks(at: usize, fragment: Fragment) -> Self {
        Self::Insert {
            at: Position(at),
            content: Content::Blocks(fragment),
        }
    }
}

/// Result of applying a mutation
#[derive(Debug, Clone, Default)]
pub struct MutationResult {
    /// New document version after this mutation
    pub version: u64,
    /// Pages whose content or attributes changed
    pub changed_pages: SmallVec<[PageId; 2]>,
    /// Pages that were created
    pub created_pages: SmallVec<[PageId; 1]>,
    /// Blocks that were inserted (with their final ids)
    pub inserted_blocks: SmallVec<[BlockId; 4]>,
    /// Blocks that were removed
    pub removed_blocks: SmallVec<[BlockId; 4]>,
}

impl MutationResult {
    /// Check if anything changed
    pub fn has_changes(&self) -> bool {
        !self.changed_pages.is_empty() || !self.created_pages.is_empty()
    }

    /// Fold the result of a later mutation into this one
    pub fn merge(&mut self, other: MutationResult) {
        self.version = self.version.max(other.version);
        for page in other.changed_pages {
            if !self.changed_pages.contains(&page) {
                self.changed_pages.push(page);
            }
        }
        self.created_pages.extend(other.created_pages);
        self.inserted_blocks.extend(other.inserted_blocks);
        self.removed_blocks.extend(other.removed_blocks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_before() {
        assert_eq!(Position(0).before(), None);
        assert_eq!(Position(7).before(), Some(Position(6)));
    }

    #[test]
    fn test_content_size() {
        let fragment = Fragment::from_texts(["abc", ""]);
        assert_eq!(Content::Blocks(fragment.clone()).size(), 7);
        let page = PageNode::new(PageId(0), PageAttrs::default(), fragment.blocks);
        assert_eq!(Content::Page(page).size(), 9);
    }

    #[test]
    fn test_merge_results() {
        let mut first = MutationResult {
            version: 1,
            changed_pages: smallvec::smallvec![PageId(0)],
            ..Default::default()
        };
        first.merge(MutationResult {
            version: 2,
            changed_pages: smallvec::smallvec![PageId(0), PageId(1)],
            inserted_blocks: smallvec::smallvec![BlockId(3)],
            ..Default::default()
        });
        assert_eq!(first.version, 2);
        assert_eq!(first.changed_pages.as_slice(), &[PageId(0), PageId(1)]);
        assert_eq!(first.inserted_blocks.as_slice(), &[BlockId(3)]);
        assert!(first.has_changes());
    }
}
