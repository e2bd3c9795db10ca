//! Line breaking for block text

use crate::document::BlockKind;
use crate::layout::engine::INDENT_WIDTH;
use crate::layout::font::FontMetrics;
use std::hash::{Hash, Hasher};
use std::ops::Range;
use unicode_segmentation::UnicodeSegmentation;

/// Layout result for a single line
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    /// Byte range within the block text this line covers
    pub byte_range: Range<usize>,
    /// Line height
    pub height: f32,
    /// Actual width of content
    pub width: f32,
}

/// Layout result for a block
#[derive(Debug, Clone)]
pub struct BlockLayout {
    /// Lines produced by line breaking
    pub lines: Vec<LineLayout>,
    /// Total height including spacing after the block
    pub total_height: f32,
    /// Hash of kind and text for change detection
    pub content_hash: u64,
}

/// Line breaker
#[derive(Default)]
pub struct LineBreaker;

impl LineBreaker {
    pub fn new() -> Self {
        Self
    }

    /// Layout a block into lines
    pub fn layout_block(
        &self,
        text: &str,
        kind: &BlockKind,
        max_width: f32,
        metrics: &FontMetrics,
    ) -> BlockLayout {
        // Adjust width for list indentation
        let effective_width = match kind {
            BlockKind::ListItem { indent_level, .. } => {
                max_width - (*indent_level as f32 * INDENT_WIDTH)
            }
            _ => max_width,
        };
        let line_height = metrics.line_height * kind.line_height_multiplier();

        let mut lines = Vec::new();
        let mut line_start: usize = 0;
        let mut x: f32 = 0.0;
        let mut has_content = false;
        let mut last_break: Option<(usize, f32)> = None;

        for (byte_idx, grapheme) in text.grapheme_indices(true) {
            // Explicit line break
            if grapheme == "\n" {
                lines.push(LineLayout {
                    byte_range: line_start..byte_idx,
                    height: line_height,
                    width: x,
                });
                line_start = byte_idx + grapheme.len();
                x = 0.0;
                has_content = false;
                last_break = None;
                continue;
            }

            let cluster_width = metrics.grapheme_width(grapheme);

            // Soft wrap
            if x + cluster_width > effective_width && has_content {
                let (break_offset, break_x) = last_break.unwrap_or((byte_idx, x));
                lines.push(LineLayout {
                    byte_range: line_start..break_offset,
                    height: line_height,
                    width: break_x,
                });
                line_start = break_offset;
                x -= break_x;
                last_break = None;
            }

            x += cluster_width;
            has_content = true;

            // Break opportunity after whitespace
            if grapheme.chars().all(char::is_whitespace) {
                last_break = Some((byte_idx + grapheme.len(), x));
            }
        }

        // Final line; an empty block still has one
        lines.push(LineLayout {
            byte_range: line_start..text.len(),
            height: line_height,
            width: x,
        });

        let total_height = lines.iter().map(|l| l.height).sum::<f32>()
            + kind.spacing_after() * metrics.line_height;

        BlockLayout {
            lines,
            total_height,
            content_hash: hash_block(text, kind),
        }
    }
}

/// Hash block content for change detection
pub(crate) fn hash_block(text: &str, kind: &BlockKind) -> u64 {
    use std::collections::hash_map::DefaultHasher;
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    kind.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> FontMetrics {
        FontMetrics::monospace(10.0, 8.0)
    }

    #[test]
    fn test_empty_block() {
        let layout = LineBreaker::new().layout_block("", &BlockKind::Paragraph, 100.0, &metrics());
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.lines[0].byte_range, 0..0);
        // one line plus one line of spacing
        assert_eq!(layout.total_height, 20.0);
    }

    #[test]
    fn test_single_line() {
        let layout = LineBreaker::new().layout_block("Hello", &BlockKind::Paragraph, 100.0, &metrics());
        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.lines[0].byte_range, 0..5);
        assert_eq!(layout.lines[0].width, 40.0);
    }

    #[test]
    fn test_line_wrap() {
        // With 8px per char, 48px width = 6 chars per line
        let layout =
            LineBreaker::new().layout_block("Hello World", &BlockKind::Paragraph, 48.0, &metrics());
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].byte_range, 0..6);
        assert_eq!(layout.lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_emergency_break() {
        let layout =
            LineBreaker::new().layout_block("abcdefgh", &BlockKind::Paragraph, 32.0, &metrics());
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].byte_range, 0..4);
    }

    #[test]
    fn test_explicit_newline() {
        let layout =
            LineBreaker::new().layout_block("Hello\nWorld", &BlockKind::Paragraph, 1000.0, &metrics());
        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.lines[0].byte_range, 0..5);
        assert_eq!(layout.lines[1].byte_range, 6..11);
    }

    #[test]
    fn test_heading_is_taller() {
        let breaker = LineBreaker::new();
        let para = breaker.layout_block("Title", &BlockKind::Paragraph, 100.0, &metrics());
        let heading = breaker.layout_block("Title", &BlockKind::heading(1), 100.0, &metrics());
        assert!(heading.lines[0].height > para.lines[0].height);
        assert_ne!(para.content_hash, heading.content_hash);
    }
}
