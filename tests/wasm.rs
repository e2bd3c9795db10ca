#![cfg(target_arch = "wasm32")]

use paged_editor::WasmEditor;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn test_editing_through_bindings() {
    let mut editor = WasmEditor::new();
    assert!(editor.insert_text("Hello"));
    assert!(editor.insert_paragraph());
    assert!(editor.insert_text("World"));
    assert_eq!(editor.get_text(), "Hello\nWorld");

    assert!(editor.undo());
    assert_eq!(editor.get_text(), "Hello\n");
}

#[wasm_bindgen_test]
fn test_reported_heights_split_page() {
    let mut editor = WasmEditor::new();
    assert!(editor.load_markup("<p>A</p><p>B</p><p>C</p>").is_ok());
    editor.report_block_height(0, 100.0);
    editor.report_block_height(1, 100.0);
    editor.report_block_height(2, 700.0);

    assert_eq!(editor.fix_overflow(), 1);
    assert_eq!(editor.get_page_count(), 2);
    assert_eq!(editor.end_render(), 1);
}

#[wasm_bindgen_test]
fn test_report_after_edit_refreshes_flag() {
    let mut editor = WasmEditor::new();
    assert!(editor.insert_text("A"));
    editor.report_block_height(0, 895.0);
    assert!(editor.get_markup().contains("data-overflow=\"true\""));
}

#[wasm_bindgen_test]
fn test_invalid_config_is_an_error() {
    assert!(WasmEditor::with_config_json("{\"undoDepth\": \"x\"}").is_err());
}
