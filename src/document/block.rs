//! Block-level content nodes

use serde::Serialize;
use unicode_segmentation::UnicodeSegmentation;

/// Stable identifier for blocks; doubles as the rendered-element handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
pub struct BlockId(pub u64);

/// Type of list marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ListMarker {
    Bullet,
    Numbered { ordinal: u32 },
}

impl ListMarker {
    /// Get the display string for this marker
    pub fn display(&self) -> String {
        match self {
            ListMarker::Bullet => "•".to_string(),
            ListMarker::Numbered { ordinal } => format!("{}.", ordinal),
        }
    }
}

/// The kind of block element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub enum BlockKind {
    /// Regular paragraph
    #[default]
    Paragraph,
    /// Heading with level (1-6)
    Heading { level: u8 },
    /// List item
    ListItem { indent_level: u8, marker: ListMarker },
}

impl BlockKind {
    /// Heading of the given level, clamped to 1..=6
    pub fn heading(level: u8) -> Self {
        BlockKind::Heading {
            level: level.clamp(1, 6),
        }
    }

    /// Get the line height multiplier for this block kind
    pub fn line_height_multiplier(&self) -> f32 {
        match self {
            BlockKind::Paragraph => 1.0,
            BlockKind::Heading { level } => match level {
                1 => 1.5,
                2 => 1.4,
                3 => 1.3,
                _ => 1.2,
            },
            BlockKind::ListItem { .. } => 1.0,
        }
    }

    /// Get the spacing after this block (in line heights)
    pub fn spacing_after(&self) -> f32 {
        match self {
            BlockKind::Paragraph => 1.0,
            BlockKind::Heading { .. } => 0.5,
            BlockKind::ListItem { .. } => 0.25,
        }
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    /// Check if this is a list item
    pub fn is_list_item(&self) -> bool {
        matches!(self, BlockKind::ListItem { .. })
    }
}

/// A block of text content (paragraph, heading, list item)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: BlockId,
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(id: BlockId, kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
        }
    }

    /// Paragraph with the given text
    pub fn paragraph(id: BlockId, text: impl Into<String>) -> Self {
        Self::new(id, BlockKind::Paragraph, text)
    }

    /// Number of chars in the block's text
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Size of the block in document positions
    pub fn node_size(&self) -> usize {
        self.char_len() + 2
    }

    /// Byte index of char offset `offset`, clamped to the text length
    pub fn byte_offset(&self, offset: usize) -> usize {
        self.text
            .char_indices()
            .nth(offset)
            .map_or(self.text.len(), |(i, _)| i)
    }

    /// Char offset of the grapheme boundary before `offset`
    pub fn prev_grapheme_offset(&self, offset: usize) -> usize {
        let byte = self.byte_offset(offset);
        let prev = self.text[..byte]
            .grapheme_indices(true)
            .next_back()
            .map_or(0, |(i, _)| i);
        self.text[..prev].chars().count()
    }

    /// Char offset of the grapheme boundary after `offset`
    pub fn next_grapheme_offset(&self, offset: usize) -> usize {
        let byte = self.byte_offset(offset);
        let next = self.text[byte..]
            .graphemes(true)
            .next()
            .map_or(byte, |g| byte + g.len());
        self.text[..next].chars().count()
    }
}
