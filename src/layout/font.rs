//! Font metrics for layout

use serde::{Deserialize, Serialize};

/// Metrics needed for text layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontMetrics {
    /// Line height in logical pixels
    pub line_height: f32,
    /// Width of ASCII characters (0-127)
    pub char_widths: Vec<f32>,
    /// Default width for non-ASCII characters
    pub default_width: f32,
}

impl Default for FontMetrics {
    fn default() -> Self {
        // 14px * 1.2 line height, 8.41px monospace advance
        Self::monospace(16.8, 8.41)
    }
}

impl FontMetrics {
    pub fn new(line_height: f32, char_widths: Vec<f32>, default_width: f32) -> Self {
        Self {
            line_height,
            char_widths,
            default_width,
        }
    }

    /// Every char has the same advance
    pub fn monospace(line_height: f32, width: f32) -> Self {
        Self::new(line_height, vec![width; 128], width)
    }

    /// Get width of a character
    pub fn width(&self, c: char) -> f32 {
        if c.is_ascii() {
            if let Some(w) = self.char_widths.get(c as usize) {
                return *w;
            }
        }
        self.default_width
    }

    /// Width of a grapheme cluster
    pub fn grapheme_width(&self, grapheme: &str) -> f32 {
        if grapheme == "\t" {
            self.default_width * 4.0
        } else if grapheme.chars().all(char::is_control) {
            0.0
        } else {
            grapheme.chars().map(|c| self.width(c)).sum()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widths() {
        let metrics = FontMetrics::monospace(10.0, 8.0);
        assert_eq!(metrics.width('a'), 8.0);
        assert_eq!(metrics.width('é'), 8.0);
        assert_eq!(metrics.grapheme_width("\t"), 32.0);
        assert_eq!(metrics.grapheme_width("\u{7}"), 0.0);
    }
}
