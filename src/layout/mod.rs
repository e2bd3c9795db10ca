//! Layout measurement for pages

mod engine;
pub mod font;
mod line_break;

pub use engine::{
    stack_blocks, FlowMeasurer, LayoutConstraints, LayoutMeasurer, RenderedBlock,
    ReportedHeights, INDENT_WIDTH,
};
pub use font::FontMetrics;
pub use line_break::{BlockLayout, LineBreaker, LineLayout};
