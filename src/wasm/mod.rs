//! WASM bindings for the editor
//!
//! The browser renders the document itself and reports each block's
//! measured height back through [`WasmEditor::report_block_height`]; the
//! editor paginates with those heights.

use crate::document::{Document, ListMarker};
use crate::{BlockId, BlockKind, DocPosition, Editor, EditorConfig, Fragment, ReportedHeights};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize panic hook for better error messages
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// WASM-exposed editor wrapper
#[wasm_bindgen]
pub struct WasmEditor {
    editor: Editor<ReportedHeights>,
}

#[wasm_bindgen]
impl WasmEditor {
    /// Create a new editor with the default configuration
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self::with_config(EditorConfig::default())
    }

    /// Create an editor from a JSON configuration
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config_json(json: &str) -> Result<WasmEditor, JsError> {
        let config = EditorConfig::from_json(json)?;
        Ok(Self::with_config(config))
    }

    /// Replace the document with parsed page markup
    #[wasm_bindgen(js_name = loadMarkup)]
    pub fn load_markup(&mut self, markup: &str) -> Result<(), JsError> {
        self.editor.load_markup(markup)?;
        Ok(())
    }

    /// Record the rendered height of a block (in CSS pixels) and refresh
    /// the overflow flags if anything changed
    #[wasm_bindgen(js_name = reportBlockHeight)]
    pub fn report_block_height(&mut self, block_id: u64, height: f32) {
        if self
            .editor
            .measurer_mut()
            .report(BlockId(block_id), height)
        {
            self.editor.request_check();
        }
        self.editor.end_render();
    }

    /// Record the heights of a whole render pass, then refresh the
    /// overflow flags once; returns the number of flags changed
    #[wasm_bindgen(js_name = reportBlockHeights)]
    pub fn report_block_heights(&mut self, block_ids: &[u64], heights: &[f32]) -> usize {
        let mut changed = false;
        for (id, height) in block_ids.iter().zip(heights) {
            changed |= self.editor.measurer_mut().report(BlockId(*id), *height);
        }
        if changed {
            self.editor.request_check();
        }
        self.end_render()
    }

    /// The host finished rendering the last edit; returns the number of
    /// flags changed by the postponed check
    #[wasm_bindgen(js_name = endRender)]
    pub fn end_render(&mut self) -> usize {
        self.editor
            .end_render()
            .map_or(0, |report| report.changed.len())
    }

    /// Insert text at current cursor position
    #[wasm_bindgen(js_name = insertText)]
    pub fn insert_text(&mut self, text: &str) -> bool {
        self.editor.insert_text(text).is_some()
    }

    /// Split the current block (Enter key)
    #[wasm_bindgen(js_name = insertParagraph)]
    pub fn insert_paragraph(&mut self) -> bool {
        self.editor.split_block().is_some()
    }

    /// Delete backward (backspace)
    #[wasm_bindgen(js_name = deleteBackward)]
    pub fn delete_backward(&mut self) -> bool {
        self.editor.delete_backward().is_some()
    }

    /// Turn the current block into a paragraph
    #[wasm_bindgen(js_name = setParagraph)]
    pub fn set_paragraph(&mut self) -> bool {
        self.editor.set_block_kind(BlockKind::Paragraph).is_some()
    }

    /// Turn the current block into a heading (level clamped to 1-6)
    #[wasm_bindgen(js_name = setHeading)]
    pub fn set_heading(&mut self, level: u8) -> bool {
        self.editor.set_block_kind(BlockKind::heading(level)).is_some()
    }

    /// Turn the current block into a list item; `ordinal` 0 means a bullet
    #[wasm_bindgen(js_name = setListItem)]
    pub fn set_list_item(&mut self, indent_level: u8, ordinal: u32) -> bool {
        let marker = match ordinal {
            0 => ListMarker::Bullet,
            ordinal => ListMarker::Numbered { ordinal },
        };
        self.editor
            .set_block_kind(BlockKind::ListItem {
                indent_level,
                marker,
            })
            .is_some()
    }

    /// Move cursor by graphemes
    #[wasm_bindgen(js_name = moveCursor)]
    pub fn move_cursor(&mut self, delta: i32) {
        self.editor.move_cursor(delta);
    }

    /// Place the cursor inside a block
    #[wasm_bindgen(js_name = setCursor)]
    pub fn set_cursor(&mut self, block_id: u64, offset: usize) -> bool {
        self.editor
            .move_cursor_to(DocPosition::new(BlockId(block_id), offset))
    }

    /// Refresh overflow flags; returns the number of flags changed
    #[wasm_bindgen(js_name = checkOverflow)]
    pub fn check_overflow(&mut self) -> usize {
        self.editor.check_overflow().changed.len()
    }

    /// Move overflowing content to the following pages; returns the number
    /// of pages whose content moved
    #[wasm_bindgen(js_name = fixOverflow)]
    pub fn fix_overflow(&mut self) -> usize {
        self.editor.fix_overflow().redistributions.len()
    }

    /// Append an empty page; returns its id
    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&mut self) -> Option<u64> {
        self.editor.add_page(Fragment::default()).map(|id| id.0)
    }

    /// Undo last operation
    pub fn undo(&mut self) -> bool {
        self.editor.undo()
    }

    /// Redo last undone operation
    pub fn redo(&mut self) -> bool {
        self.editor.redo()
    }

    /// Get full document text
    #[wasm_bindgen(js_name = getText)]
    pub fn get_text(&self) -> String {
        self.editor.text()
    }

    /// Get page count
    #[wasm_bindgen(js_name = getPageCount)]
    pub fn get_page_count(&self) -> usize {
        self.editor.page_count()
    }

    /// Get the document as page markup
    #[wasm_bindgen(js_name = getMarkup)]
    pub fn get_markup(&self) -> String {
        self.editor.to_markup()
    }

    /// Get pages, blocks and the cursor as JSON
    #[wasm_bindgen(js_name = getPagesJson)]
    pub fn get_pages_json(&self) -> String {
        let snapshot = Snapshot::new(self.editor.document(), self.editor.cursor().position);
        serde_json::to_string(&snapshot).unwrap_or_default()
    }
}

impl WasmEditor {
    pub fn with_config(config: EditorConfig) -> Self {
        let measurer = ReportedHeights::with_default_height(0.0);
        let mut editor = Editor::with_measurer(config, measurer);
        editor.set_render_driven(true);
        Self { editor }
    }

    pub fn editor(&self) -> &Editor<ReportedHeights> {
        &self.editor
    }
}

impl Default for WasmEditor {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable document snapshot for JS
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub version: u64,
    pub pages: Vec<PageData>,
    pub cursor: CursorData,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageData {
    pub id: u64,
    pub ordinal: u32,
    pub is_overflowing: bool,
    pub blocks: Vec<BlockData>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockData {
    pub id: u64,
    pub block_type: String,
    pub text: String,
    pub heading_level: Option<u8>,
    pub list_marker: Option<String>,
    pub indent_level: u8,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorData {
    pub block_id: u64,
    pub offset: usize,
}

impl Snapshot {
    fn new(document: &Document, cursor: DocPosition) -> Self {
        let pages = document
            .pages()
            .iter()
            .map(|page| PageData {
                id: page.id.0,
                ordinal: page.attrs.ordinal,
                is_overflowing: page.attrs.is_overflowing,
                blocks: page
                    .blocks
                    .iter()
                    .map(|block| {
                        let (block_type, heading_level, list_marker, indent_level) =
                            match &block.kind {
                                BlockKind::Paragraph => ("paragraph".to_string(), None, None, 0),
                                BlockKind::Heading { level } => {
                                    (format!("heading-{}", level), Some(*level), None, 0)
                                }
                                BlockKind::ListItem {
                                    indent_level,
                                    marker,
                                } => (
                                    "list-item".to_string(),
                                    None,
                                    Some(marker.display()),
                                    *indent_level,
                                ),
                            };
                        BlockData {
                            id: block.id.0,
                            block_type,
                            text: block.text.clone(),
                            heading_level,
                            list_marker,
                            indent_level,
                        }
                    })
                    .collect(),
            })
            .collect();

        Snapshot {
            version: document.version(),
            pages,
            cursor: CursorData {
                block_id: cursor.block.0,
                offset: cursor.offset,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reported_heights_drive_pagination() {
        let mut editor = WasmEditor::default();
        editor
            .load_markup("<p>A</p><p>B</p><p>C</p>")
            .map_err(|_| "markup")
            .unwrap();
        for (id, height) in [(0, 100.0), (1, 100.0), (2, 700.0)] {
            editor.report_block_height(id, height);
        }

        // the last report already refreshed the flag
        assert_eq!(editor.check_overflow(), 0);
        assert!(editor.get_markup().contains("data-overflow=\"true\""));

        assert_eq!(editor.fix_overflow(), 1);
        assert_eq!(editor.get_page_count(), 2);
        assert_eq!(editor.end_render(), 1);
        assert_eq!(
            editor.get_markup(),
            "<div class=\"page-node\" pagenumber=\"1\"><p>A</p><p>B</p></div>\
             <div class=\"page-node\" pagenumber=\"2\"><p>C</p></div>"
        );
    }

    #[test]
    fn test_flags_follow_heights_reported_after_an_edit() {
        let mut editor = WasmEditor::default();
        editor.load_markup("<p>A</p>").map_err(|_| "markup").unwrap();
        editor.report_block_height(0, 100.0);

        assert!(editor.insert_text("B"));
        assert!(editor.editor().check_pending());
        editor.report_block_height(0, 895.0);

        let json: serde_json::Value = serde_json::from_str(&editor.get_pages_json()).unwrap();
        assert_eq!(json["pages"][0]["isOverflowing"], true);
        assert!(!editor.editor().check_pending());
    }

    #[test]
    fn test_batch_report_checks_once() {
        let mut editor = WasmEditor::default();
        editor
            .load_markup("<p>A</p><p>B</p>")
            .map_err(|_| "markup")
            .unwrap();
        assert_eq!(editor.report_block_heights(&[0, 1], &[450.0, 450.0]), 1);
        // same heights again: nothing to refresh
        assert_eq!(editor.report_block_heights(&[0, 1], &[450.0, 450.0]), 0);
        assert_eq!(editor.report_block_heights(&[1], &[100.0]), 1);
    }

    #[test]
    fn test_end_render_after_unchanged_heights() {
        let mut editor = WasmEditor::default();
        editor.report_block_height(0, 895.0);
        assert!(editor.insert_text("x"));
        assert_eq!(editor.end_render(), 0);
        assert!(!editor.editor().check_pending());
    }

    #[test]
    fn test_pages_json() {
        let mut editor = WasmEditor::new();
        editor.insert_text("hi");
        editor.set_heading(2);

        let json: serde_json::Value = serde_json::from_str(&editor.get_pages_json()).unwrap();
        let block = &json["pages"][0]["blocks"][0];
        assert_eq!(block["text"], "hi");
        assert_eq!(block["blockType"], "heading-2");
        assert_eq!(block["headingLevel"], 2);
        assert_eq!(json["pages"][0]["ordinal"], 1);
        assert_eq!(json["cursor"]["offset"], 2);
    }

    #[test]
    fn test_add_page_and_undo() {
        let mut editor = WasmEditor::new();
        assert!(editor.add_page().is_some());
        assert_eq!(editor.get_page_count(), 2);
        assert!(editor.undo());
        assert_eq!(editor.get_page_count(), 1);
        assert!(editor.redo());
        assert_eq!(editor.get_page_count(), 2);
    }
}
