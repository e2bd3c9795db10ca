//! Layout measurement: the measurer interface and its implementations

use crate::document::{BlockId, BlockKind, Document, DocumentTree, PageId};
use crate::layout::font::FontMetrics;
use crate::layout::line_break::{hash_block, LineBreaker};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

/// Indentation width per list level
pub const INDENT_WIDTH: f32 = 24.0;

/// Page geometry
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConstraints {
    pub page_width: f32,
    pub page_height: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub margin_left: f32,
    pub margin_right: f32,
}

impl Default for LayoutConstraints {
    fn default() -> Self {
        Self {
            page_width: 816.0,   // 8.5" at 96 DPI
            page_height: 1056.0, // 11" at 96 DPI
            margin_top: 96.0,    // 1" margins
            margin_bottom: 96.0,
            margin_left: 96.0,
            margin_right: 96.0,
        }
    }
}

impl LayoutConstraints {
    /// Get usable content width
    pub fn content_width(&self) -> f32 {
        self.page_width - self.margin_left - self.margin_right
    }

    /// Get usable content height per page
    pub fn content_height(&self) -> f32 {
        self.page_height - self.margin_top - self.margin_bottom
    }
}

/// Measured box of a rendered block, in its page's content coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderedBlock {
    pub element: BlockId,
    pub top: f32,
    pub height: f32,
}

impl RenderedBlock {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Reports the rendered geometry of a page's blocks.
///
/// Results must reflect the document as last committed; callers never
/// reuse them across mutations.
pub trait LayoutMeasurer<D: ?Sized = Document> {
    /// Rendered children of `page` in document order; empty when the page
    /// is not rendered
    fn rendered_children_of(&mut self, tree: &D, page: PageId) -> Vec<RenderedBlock>;

    /// Drop whatever is kept for blocks no longer in `tree`
    fn retain_live(&mut self, _tree: &D) {}
}

/// Ids of every block currently in `tree`
fn live_blocks<D: DocumentTree + ?Sized>(tree: &D) -> FxHashSet<BlockId> {
    tree.page_elements()
        .into_iter()
        .filter_map(|page| tree.page_node(page))
        .flat_map(|node| node.blocks.iter().map(|b| b.id))
        .collect()
}

/// Stack block heights top to bottom starting at 0
pub fn stack_blocks<I>(heights: I) -> Vec<RenderedBlock>
where
    I: IntoIterator<Item = (BlockId, f32)>,
{
    let mut top = 0.0;
    heights
        .into_iter()
        .map(|(element, height)| {
            let rendered = RenderedBlock {
                element,
                top,
                height,
            };
            top += height;
            rendered
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct CachedHeight {
    content_hash: u64,
    height: f32,
}

/// Measures blocks by flowing their text into lines
///
/// Block heights are cached per block and recomputed only when the block's
/// text or kind changes.
pub struct FlowMeasurer {
    constraints: LayoutConstraints,
    metrics: FontMetrics,
    line_breaker: LineBreaker,
    cache: FxHashMap<BlockId, CachedHeight>,
}

impl FlowMeasurer {
    pub fn new(constraints: LayoutConstraints, metrics: FontMetrics) -> Self {
        Self {
            constraints,
            metrics,
            line_breaker: LineBreaker::new(),
            cache: FxHashMap::default(),
        }
    }

    /// Get constraints
    pub fn constraints(&self) -> &LayoutConstraints {
        &self.constraints
    }

    /// Replace the font metrics; every cached height is dropped
    pub fn set_metrics(&mut self, metrics: FontMetrics) {
        self.metrics = metrics;
        self.cache.clear();
    }

    /// Number of cached block heights
    pub fn cached_blocks(&self) -> usize {
        self.cache.len()
    }

    fn block_height(&mut self, id: BlockId, text: &str, kind: &BlockKind) -> f32 {
        let content_hash = hash_block(text, kind);
        if let Some(cached) = self.cache.get(&id) {
            if cached.content_hash == content_hash {
                return cached.height;
            }
        }

        let layout = self.line_breaker.layout_block(
            text,
            kind,
            self.constraints.content_width(),
            &self.metrics,
        );
        self.cache.insert(
            id,
            CachedHeight {
                content_hash,
                height: layout.total_height,
            },
        );
        layout.total_height
    }
}

impl Default for FlowMeasurer {
    fn default() -> Self {
        Self::new(LayoutConstraints::default(), FontMetrics::default())
    }
}

impl<D: DocumentTree + ?Sized> LayoutMeasurer<D> for FlowMeasurer {
    fn rendered_children_of(&mut self, tree: &D, page: PageId) -> Vec<RenderedBlock> {
        let Some(node) = tree.page_node(page) else {
            return Vec::new();
        };
        let heights: Vec<(BlockId, f32)> = node
            .blocks
            .iter()
            .map(|b| (b.id, self.block_height(b.id, &b.text, &b.kind)))
            .collect();
        stack_blocks(heights)
    }

    fn retain_live(&mut self, tree: &D) {
        let live = live_blocks(tree);
        self.cache.retain(|id, _| live.contains(id));
    }
}

/// Block heights reported by a host that renders the document itself
/// (e.g. a browser measuring its DOM).
///
/// Blocks the host has not reported yet count as `default_height` tall.
#[derive(Debug, Clone, Default)]
pub struct ReportedHeights {
    heights: FxHashMap<BlockId, f32>,
    default_height: f32,
}

impl ReportedHeights {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height used for blocks with no report
    pub fn with_default_height(default_height: f32) -> Self {
        Self {
            heights: FxHashMap::default(),
            default_height,
        }
    }

    /// Record the measured height of a block; returns whether it changed
    pub fn report(&mut self, block: BlockId, height: f32) -> bool {
        let height = height.max(0.0);
        self.heights.insert(block, height) != Some(height)
    }

    /// Number of blocks with a reported height
    pub fn reported_blocks(&self) -> usize {
        self.heights.len()
    }

    /// Drop the report for a block
    pub fn forget(&mut self, block: BlockId) {
        self.heights.remove(&block);
    }

    /// Drop every report
    pub fn clear(&mut self) {
        self.heights.clear();
    }

    /// Reported height of a block
    pub fn height(&self, block: BlockId) -> Option<f32> {
        self.heights.get(&block).copied()
    }
}

impl<D: DocumentTree + ?Sized> LayoutMeasurer<D> for ReportedHeights {
    fn rendered_children_of(&mut self, tree: &D, page: PageId) -> Vec<RenderedBlock> {
        let Some(node) = tree.page_node(page) else {
            return Vec::new();
        };
        stack_blocks(node.blocks.iter().map(|b| {
            (
                b.id,
                self.heights.get(&b.id).copied().unwrap_or(self.default_height),
            )
        }))
    }

    fn retain_live(&mut self, tree: &D) {
        let live = live_blocks(tree);
        self.heights.retain(|id, _| live.contains(id));
    }
}
