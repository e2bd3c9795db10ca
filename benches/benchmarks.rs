//! Benchmarks for the editor core

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use paged_editor::{Document, Editor, EditorConfig, FlowMeasurer, Paginator};

/// One page holding `blocks` paragraphs long enough to wrap
fn long_page(blocks: usize) -> Document {
    let texts: Vec<String> = (0..blocks)
        .map(|i| {
            format!(
                "Paragraph {} contains enough text to span multiple lines and test the line breaking algorithm. ",
                i
            )
            .repeat(3)
        })
        .collect();
    Document::from_page_texts([texts])
}

fn bench_insert_single_char(c: &mut Criterion) {
    c.bench_function("insert_single_char", |b| {
        let mut editor = Editor::new(EditorConfig::default());
        b.iter(|| {
            editor.insert_text(black_box("x"));
        });
    });
}

fn bench_insert_word(c: &mut Criterion) {
    c.bench_function("insert_word", |b| {
        let mut editor = Editor::new(EditorConfig::default());
        b.iter(|| {
            editor.insert_text(black_box("hello "));
        });
    });
}

fn bench_continuous_check(c: &mut Criterion) {
    c.bench_function("continuous_check_50_blocks", |b| {
        let mut doc = long_page(50);
        let mut measurer = FlowMeasurer::default();
        let mut paginator = Paginator::default();

        b.iter(|| {
            black_box(paginator.check_overflow(&mut doc, &mut measurer));
        });
    });
}

fn bench_sweep(c: &mut Criterion) {
    c.bench_function("sweep_50_blocks", |b| {
        let mut measurer = FlowMeasurer::default();
        let mut paginator = Paginator::default();

        b.iter_batched(
            || long_page(50),
            |mut doc| {
                // one sweep moves one page's worth; repeat until it settles
                while paginator.sweep(&mut doc, &mut measurer).moved_anything() {}
                black_box(doc.page_count())
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_markup(c: &mut Criterion) {
    c.bench_function("markup_round_trip", |b| {
        let markup = long_page(50).to_markup();
        b.iter(|| {
            let doc = Document::from_markup(black_box(&markup)).unwrap();
            black_box(doc.to_markup())
        });
    });
}

fn bench_undo_redo(c: &mut Criterion) {
    c.bench_function("undo_redo_cycle", |b| {
        let mut editor = Editor::new(EditorConfig::default());

        // Create some history
        for i in 0..10 {
            editor.insert_text(&format!("Text {} ", i));
        }

        b.iter(|| {
            if editor.undo() {
                editor.redo();
            }
        });
    });
}

criterion_group!(
    benches,
    bench_insert_single_char,
    bench_insert_word,
    bench_continuous_check,
    bench_sweep,
    bench_markup,
    bench_undo_redo,
);

criterion_main!(benches);
