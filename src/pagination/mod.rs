//! Pseudo-pagination: overflow detection and redistribution across pages
//!
//! The [`Paginator`] runs two independent passes:
//!
//! - [`Paginator::check_overflow`] runs after every content edit and only
//!   keeps each page's `is_overflowing` flag in sync with its last block.
//! - [`Paginator::sweep`] runs on explicit request. It finds the first block
//!   of each page crossing the split threshold and moves it, with
//!   everything after it, to the start of the next page.
//!
//! Neither pass repeats itself. Overflow left behind by a sweep (a freshly
//! created page that is itself too full) waits for the next request.

mod config;
pub mod detector;
pub mod page;
pub mod redistributor;

pub use config::{PaginationConfig, CONTINUOUS_THRESHOLD, SPLIT_THRESHOLD};
pub use page::{PageAttrs, PageState, ATTR_OVERFLOW, ATTR_PAGE_NUMBER, PAGE_CLASS};
pub use redistributor::Redistribution;

use crate::document::{Block, BlockId, DocumentTree, Fragment, NodeRef, PageId, PageNode};
use crate::editing::{Content, Mutation};
use crate::error::{PaginationError, Result};
use crate::layout::LayoutMeasurer;
use log::debug;
use smallvec::SmallVec;

/// What the paginator is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Checking,
    Sweeping,
}

/// Result of a continuous check
#[derive(Debug, Clone, Default)]
pub struct ContinuousReport {
    /// Pages whose flag was evaluated
    pub checked: usize,
    /// Pages whose flag changed
    pub changed: SmallVec<[PageId; 4]>,
    /// Pages that could not be evaluated
    pub skipped: SmallVec<[PageId; 2]>,
    /// The check was refused because another pass was running
    pub deferred: bool,
}

/// Result of a redistribution sweep
#[derive(Debug, Clone, Default)]
pub struct SweepReport {
    /// Pages examined (the pages that existed when the sweep started)
    pub examined: usize,
    /// One entry per page whose overflow was moved
    pub redistributions: Vec<Redistribution>,
    /// Pages left as-is because of an error
    pub skipped: SmallVec<[PageId; 2]>,
    /// Pages whose ordinal was rewritten
    pub renumbered: usize,
    /// The sweep was refused because another pass was running
    pub deferred: bool,
}

impl SweepReport {
    /// Whether the sweep changed any content
    pub fn moved_anything(&self) -> bool {
        !self.redistributions.is_empty()
    }

    /// Pages created by the sweep
    pub fn created_pages(&self) -> impl Iterator<Item = PageId> + '_ {
        self.redistributions
            .iter()
            .filter(|r| r.created_page)
            .map(|r| r.destination)
    }
}

/// Pagination controller
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    config: PaginationConfig,
    phase: Phase,
}

impl Paginator {
    pub fn new(config: PaginationConfig) -> Self {
        Self {
            config,
            phase: Phase::Idle,
        }
    }

    pub fn config(&self) -> &PaginationConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Continuous detection over every page.
    ///
    /// Only flag mutations are issued, and only for pages whose flag is out
    /// of date, so running it twice in a row changes nothing the second time.
    pub fn check_overflow<D, M>(&mut self, tree: &mut D, measurer: &mut M) -> ContinuousReport
    where
        D: DocumentTree + ?Sized,
        M: LayoutMeasurer<D> + ?Sized,
    {
        let mut report = ContinuousReport::default();
        if self.phase != Phase::Idle {
            debug!("overflow check deferred while {:?}", self.phase);
            report.deferred = true;
            return report;
        }

        self.phase = Phase::Checking;
        let threshold = self.config.continuous_threshold;
        for page in tree.page_elements() {
            report.checked += 1;
            match detector::update_overflow_flag(tree, measurer, page, threshold) {
                Ok(true) => report.changed.push(page),
                Ok(false) => {}
                Err(err) => {
                    debug!("skipping overflow check for page {:?}: {}", page, err);
                    report.skipped.push(page);
                }
            }
        }
        self.phase = Phase::Idle;

        report
    }

    /// One redistribution pass over the pages that exist right now.
    ///
    /// Each overflowing page is handled independently in document order;
    /// a page that fails is left as-is and the sweep moves on.
    pub fn sweep<D, M>(&mut self, tree: &mut D, measurer: &mut M) -> SweepReport
    where
        D: DocumentTree + ?Sized,
        M: LayoutMeasurer<D> + ?Sized,
    {
        let mut report = SweepReport::default();
        if self.phase != Phase::Idle {
            debug!("sweep deferred while {:?}", self.phase);
            report.deferred = true;
            return report;
        }

        self.phase = Phase::Sweeping;
        let threshold = self.config.split_threshold;
        for page in tree.page_elements() {
            report.examined += 1;
            let anchor = match detector::detect_split_point(&*tree, measurer, page, threshold) {
                Ok(Some(anchor)) => anchor,
                Ok(None) => continue,
                Err(err) => {
                    debug!("skipping page {:?}: {}", page, err);
                    report.skipped.push(page);
                    continue;
                }
            };

            match redistributor::redistribute(tree, page, anchor) {
                Ok(moved) => report.redistributions.push(moved),
                Err(err) => {
                    debug!("leaving page {:?} as-is: {}", page, err);
                    report.skipped.push(page);
                }
            }
        }

        if self.config.maintain_ordinals {
            report.renumbered = renumber(tree);
        }
        self.phase = Phase::Idle;

        debug!(
            "sweep examined {} page(s), moved {}, skipped {}",
            report.examined,
            report.redistributions.len(),
            report.skipped.len()
        );
        report
    }

    /// Append a page holding `content` at the end of the document.
    ///
    /// Empty content becomes one empty paragraph.
    pub fn append_page<D>(&mut self, tree: &mut D, content: Fragment) -> Result<PageId>
    where
        D: DocumentTree + ?Sized,
    {
        let mut blocks = content.blocks;
        if blocks.is_empty() {
            blocks.push(Block::paragraph(BlockId::default(), ""));
        }
        let ordinal = if self.config.maintain_ordinals {
            tree.page_elements().len() as u32 + 1
        } else {
            1
        };
        let node = PageNode::new(PageId::default(), PageAttrs::numbered(ordinal), blocks);
        let at = tree.end_position();
        let result = tree.apply(Mutation::Insert {
            at,
            content: Content::Page(node),
        })?;
        let id = result
            .created_pages
            .first()
            .copied()
            .ok_or(PaginationError::StaleReference { pos: at })?;

        if self.config.maintain_ordinals {
            renumber(tree);
        }
        Ok(id)
    }
}

/// Rewrite page ordinals to 1..=n, touching only pages that are off.
/// Returns the number of pages rewritten.
pub fn renumber<D: DocumentTree + ?Sized>(tree: &mut D) -> usize {
    let mut rewritten = 0;
    for (index, page) in tree.page_elements().into_iter().enumerate() {
        let ordinal = index as u32 + 1;
        let Ok(pos) = detector::resolve_page(&*tree, page) else {
            continue;
        };
        let attrs = match tree.node_at(pos).and_then(NodeRef::as_page) {
            Some(node) if node.attrs.ordinal != ordinal => node.attrs.with_ordinal(ordinal),
            _ => continue,
        };
        if tree.apply(Mutation::SetPageAttrs { at: pos, attrs }).is_ok() {
            rewritten += 1;
        }
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::layout::ReportedHeights;

    fn scenario() -> (Document, ReportedHeights) {
        let doc = Document::from_page_texts([vec!["A", "B", "C"]]);
        let mut measurer = ReportedHeights::new();
        measurer.report(BlockId(0), 100.0);
        measurer.report(BlockId(1), 100.0);
        measurer.report(BlockId(2), 700.0);
        (doc, measurer)
    }

    fn snapshot(doc: &Document) -> Vec<(PageId, PageAttrs, Vec<BlockId>)> {
        doc.pages()
            .iter()
            .map(|p| (p.id, p.attrs.clone(), p.blocks.iter().map(|b| b.id).collect()))
            .collect()
    }

    #[test]
    fn test_sweep_creates_page_for_overflow() {
        let (mut doc, mut measurer) = scenario();
        let mut paginator = Paginator::default();

        let report = paginator.sweep(&mut doc, &mut measurer);

        assert_eq!(report.examined, 1);
        assert_eq!(report.created_pages().count(), 1);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_texts(PageId(0)), vec!["A", "B"]);
        assert_eq!(doc.page_texts(doc.pages()[1].id), vec!["C"]);
        assert_eq!(doc.pages()[1].attrs.ordinal, 2);
    }

    #[test]
    fn test_sweep_prepends_to_existing_page() {
        let mut doc = Document::from_page_texts([vec!["A", "B", "C"], vec!["D"]]);
        let mut measurer = ReportedHeights::new();
        for (id, h) in [(0, 100.0), (1, 100.0), (2, 700.0), (3, 50.0)] {
            measurer.report(BlockId(id), h);
        }

        let report = Paginator::default().sweep(&mut doc, &mut measurer);

        assert_eq!(report.redistributions.len(), 1);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page_texts(PageId(1)), vec!["C", "D"]);
    }

    #[test]
    fn test_content_is_conserved() {
        let mut doc = Document::from_page_texts([vec!["1", "2", "3", "4", "5"], vec!["6"]]);
        let before: Vec<BlockId> = doc.block_order().collect();
        let mut measurer = ReportedHeights::with_default_height(300.0);

        Paginator::default().sweep(&mut doc, &mut measurer);

        let after: Vec<BlockId> = doc.block_order().collect();
        assert_eq!(before, after);
        assert_eq!(doc.page_texts(PageId(0)), vec!["1", "2"]);
    }

    #[test]
    fn test_sweep_without_overflow_is_noop() {
        let mut doc = Document::from_page_texts([vec!["a", "b"], vec!["c"]]);
        let mut measurer = ReportedHeights::with_default_height(100.0);
        let before = snapshot(&doc);
        let version = doc.version();

        let report = Paginator::default().sweep(&mut doc, &mut measurer);

        assert!(!report.moved_anything());
        assert_eq!(report.renumbered, 0);
        assert_eq!(snapshot(&doc), before);
        assert_eq!(doc.version(), version);
    }

    #[test]
    fn test_created_page_is_not_reexamined() {
        // Every block is 500 tall: page 0 keeps one block, the new page
        // receives three and still overflows after the pass
        let mut doc = Document::from_page_texts([vec!["a", "b", "c", "d"]]);
        let mut measurer = ReportedHeights::with_default_height(500.0);

        let report = Paginator::default().sweep(&mut doc, &mut measurer);
        assert_eq!(report.examined, 1);
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[1].child_count(), 3);

        let report = Paginator::default().sweep(&mut doc, &mut measurer);
        assert_eq!(report.examined, 2);
        assert_eq!(doc.page_count(), 3);
    }

    #[test]
    fn test_oversized_single_block_is_skipped() {
        let mut doc = Document::from_page_texts([vec!["huge"], vec!["x", "y"]]);
        let mut measurer = ReportedHeights::with_default_height(1000.0);

        let report = Paginator::default().sweep(&mut doc, &mut measurer);

        assert_eq!(report.skipped.as_slice(), &[PageId(0)]);
        // page 1: first block overflows, so the split moves to the second
        assert_eq!(doc.page_texts(PageId(0)), vec!["huge"]);
        assert_eq!(doc.page_texts(PageId(1)), vec!["x"]);
        assert_eq!(doc.page_texts(doc.pages()[2].id), vec!["y"]);
    }

    #[test]
    fn test_continuous_check_is_idempotent() {
        let mut doc = Document::from_page_texts([vec!["a"]]);
        let mut measurer = ReportedHeights::new();
        measurer.report(BlockId(0), 895.0);
        let mut paginator = Paginator::default();

        let first = paginator.check_overflow(&mut doc, &mut measurer);
        assert_eq!(first.changed.as_slice(), &[PageId(0)]);
        assert!(doc.pages()[0].attrs.is_overflowing);

        let version = doc.version();
        let second = paginator.check_overflow(&mut doc, &mut measurer);
        assert!(second.changed.is_empty());
        assert_eq!(doc.version(), version);

        measurer.report(BlockId(0), 800.0);
        paginator.check_overflow(&mut doc, &mut measurer);
        assert!(!doc.pages()[0].attrs.is_overflowing);
    }

    #[test]
    fn test_continuous_check_does_not_move_content() {
        let (mut doc, mut measurer) = scenario();
        let report = Paginator::default().check_overflow(&mut doc, &mut measurer);
        assert_eq!(report.checked, 1);
        assert_eq!(doc.page_count(), 1);
        assert!(doc.pages()[0].attrs.is_overflowing);
    }

    #[test]
    fn test_busy_paginator_defers() {
        let (mut doc, mut measurer) = scenario();
        let mut paginator = Paginator::default();
        paginator.phase = Phase::Sweeping;

        assert!(paginator.check_overflow(&mut doc, &mut measurer).deferred);
        assert!(paginator.sweep(&mut doc, &mut measurer).deferred);
        assert_eq!(doc.version(), 0);
    }

    #[test]
    fn test_append_page() {
        let mut doc = Document::new();
        let mut paginator = Paginator::default();

        let id = paginator.append_page(&mut doc, Fragment::default()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.page(id).map(|p| p.attrs.ordinal), Some(2));
        assert_eq!(doc.page_texts(id), vec![""]);

        let id = paginator
            .append_page(&mut doc, Fragment::from_texts(["x", "y"]))
            .unwrap();
        assert_eq!(doc.page_texts(id), vec!["x", "y"]);
    }

    #[test]
    fn test_append_without_ordinals_uses_default() {
        let mut doc = Document::new();
        let mut paginator = Paginator::new(PaginationConfig {
            maintain_ordinals: false,
            ..PaginationConfig::default()
        });
        let id = paginator.append_page(&mut doc, Fragment::default()).unwrap();
        assert_eq!(doc.page(id).map(|p| p.attrs.ordinal), Some(1));
    }

    #[test]
    fn test_renumber() {
        let mut doc = Document::from_page_texts([vec!["a"], vec!["b"], vec!["c"]]);
        let pos = doc.page_start(PageId(1)).unwrap();
        doc.apply(Mutation::SetPageAttrs {
            at: pos,
            attrs: PageAttrs::numbered(9),
        })
        .unwrap();

        assert_eq!(renumber(&mut doc), 1);
        assert_eq!(doc.pages()[1].attrs.ordinal, 2);
        assert_eq!(renumber(&mut doc), 0);
    }
}
