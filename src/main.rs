//! Paged Editor CLI (for testing purposes only)
//! The main interface is through WASM bindings.

use paged_editor::{BlockId, Editor, EditorConfig, ReportedHeights};

fn main() {
    println!("Paged Editor Core");
    println!("=================");
    println!();

    // Three blocks reported 100, 100 and 700 pixels tall: the last one
    // crosses the 864px split line.
    let mut editor = Editor::with_measurer(
        EditorConfig::default(),
        ReportedHeights::with_default_height(100.0),
    );
    if let Err(err) = editor.load_markup("<p>A</p><p>B</p><p>C</p>") {
        eprintln!("invalid markup: {}", err);
        return;
    }
    editor.measurer_mut().report(BlockId(2), 700.0);

    let check = editor.check_overflow();
    println!("overflow flags changed on {} page(s)", check.changed.len());
    println!("before: {}", editor.to_markup());

    let sweep = editor.fix_overflow();
    println!(
        "sweep moved content off {} page(s), created {}",
        sweep.redistributions.len(),
        sweep.created_pages().count()
    );
    println!("after:  {}", editor.to_markup());
    println!();
    println!("To build the WASM package: wasm-pack build --target web");
}
