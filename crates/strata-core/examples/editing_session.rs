use std::time::Instant;
use strata_core::{Direction, Document, EditPath};
use strata_viewport::{ViewportMetrics, Virtualizer2D, VirtualizerOptions};

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (strata example)\n"
        ));
    }
    out.pop();
    out
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let text = large_text(50_000);

    let start = Instant::now();
    let mut doc = Document::from_text(&text);
    let open_time = start.elapsed();

    doc.cursor_mut().set_from_click(25_000, 7, false);
    let start = Instant::now();
    let mut fast = 0;
    for ch in "hello,\nworld".chars() {
        if doc.type_text(&ch.to_string()).is_fast() {
            fast += 1;
        }
    }
    let typing_time = start.elapsed();

    doc.cursor_mut().move_by(Direction::Up, false, false);
    doc.cursor_mut().move_by(Direction::Right, true, true);
    let selection = doc.cursor().selected_range();
    let path = doc.type_text("HELLO");
    assert_eq!(path, EditPath::General);

    let metrics = ViewportMetrics::new(16.0, 8.0, 1280.0, 960.0);
    let mut virtualizer = Virtualizer2D::new(VirtualizerOptions::default(), metrics);
    virtualizer.set_scroll(16.0 * 24_990.0, 0.0);
    let start = Instant::now();
    let stats = virtualizer.frame(&doc, doc.revision());
    let frame_time = start.elapsed();

    println!("strata editing session");
    println!("  open 50k lines: {open_time:?}");
    println!("  typed 12 chars ({fast} fast-path): {typing_time:?}");
    println!("  replaced selection {selection:?}");
    println!("  viewport frame: {frame_time:?} ({} rows, {stats:?})", virtualizer.len());
    for item in virtualizer.items().skip(10).take(3) {
        let line = doc.line_text_untracked(item.index).unwrap_or_default();
        println!("    {:>6} | {line}", item.index);
    }
}
