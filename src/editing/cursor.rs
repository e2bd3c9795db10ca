//! Cursor management

use crate::document::BlockId;

/// Position in document as (block_id, char offset within the block)
///
/// Addressing by block id keeps the cursor attached to its content when
/// pagination moves the block to another page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DocPosition {
    /// The block containing this position
    pub block: BlockId,
    /// Char offset within the block's text
    pub offset: usize,
}

impl DocPosition {
    /// Create a new document position
    pub fn new(block: BlockId, offset: usize) -> Self {
        Self { block, offset }
    }
}

/// The text cursor (caret)
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// Current position in the document
    pub position: DocPosition,
}

impl Cursor {
    /// Create a new cursor at the given position
    pub fn new(position: DocPosition) -> Self {
        Self { position }
    }

    /// Move cursor to a new position
    pub fn move_to(&mut self, position: DocPosition) {
        self.position = position;
    }

    /// Block the cursor is in
    pub fn block(&self) -> BlockId {
        self.position.block
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_to() {
        let mut cursor = Cursor::default();
        cursor.move_to(DocPosition::new(BlockId(3), 2));
        assert_eq!(cursor.block(), BlockId(3));
        assert_eq!(cursor.position.offset, 2);
    }
}
