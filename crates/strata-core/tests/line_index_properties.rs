use proptest::prelude::*;
use strata_core::{Document, LineId, LineIndex};

#[derive(Debug, Clone)]
enum Op {
    Insert(usize, String),
    Delete(usize, usize),
    Replace(usize, usize, String),
}

fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop_oneof![
            Just("a".to_string()),
            Just("é".to_string()),
            Just("字".to_string()),
            Just("\n".to_string()),
            Just(" ".to_string()),
        ],
        0..12,
    )
    .prop_map(|parts| parts.concat())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<usize>(), text_strategy()).prop_map(|(at, text)| Op::Insert(at, text)),
        (any::<usize>(), 0usize..20).prop_map(|(at, len)| Op::Delete(at, len)),
        (any::<usize>(), 0usize..20, text_strategy())
            .prop_map(|(at, len, text)| Op::Replace(at, len, text)),
    ]
}

fn apply(doc: &mut Document, op: &Op) {
    let len = doc.len_chars() + 1;
    match op {
        Op::Insert(at, text) => {
            doc.insert(at % len, text);
        }
        Op::Delete(at, count) => {
            doc.delete(at % len, *count);
        }
        Op::Replace(at, count, text) => {
            let start = at % len;
            doc.replace(start..start + count, text);
        }
    }
}

fn check_invariants(doc: &Document) -> Result<(), TestCaseError> {
    let text = doc.text();
    let starts = doc.line_index().starts();
    prop_assert_eq!(starts[0], 0);
    prop_assert!(starts.windows(2).all(|pair| pair[0] < pair[1]));
    prop_assert_eq!(starts.len(), 1 + text.matches('\n').count());
    prop_assert_eq!(doc.line_index().ids().len(), starts.len());
    prop_assert!(doc.line_index().matches_text(&text));
    Ok(())
}

proptest! {
    #[test]
    fn test_index_invariants_hold(initial in text_strategy(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut doc = Document::from_text(&initial);
        check_invariants(&doc)?;
        for op in &ops {
            apply(&mut doc, op);
            check_invariants(&doc)?;
        }
        prop_assert!(!doc.pending_reset());
    }

    #[test]
    fn test_ids_stay_unique(initial in text_strategy(), ops in prop::collection::vec(op_strategy(), 0..40)) {
        let mut doc = Document::from_text(&initial);
        for op in &ops {
            apply(&mut doc, op);
            let mut ids: Vec<LineId> = doc.line_index().ids().to_vec();
            ids.sort();
            ids.dedup();
            prop_assert_eq!(ids.len(), doc.line_count());
        }
    }

    #[test]
    fn test_offset_position_inverse(initial in text_strategy(), ops in prop::collection::vec(op_strategy(), 0..10)) {
        let mut doc = Document::from_text(&initial);
        for op in &ops {
            apply(&mut doc, op);
        }
        for offset in 0..=doc.len_chars() {
            let (line, column) = doc.offset_to_position(offset);
            prop_assert_eq!(doc.position_to_offset(line, column), offset);
        }
    }

    #[test]
    fn test_same_line_edit_keeps_every_id(
        lines in 5usize..60,
        pick in any::<usize>(),
        column in 0usize..8,
        text in "[a-z ]{1,6}",
        delete in 0usize..4,
    ) {
        let source: String = (0..lines).map(|i| format!("line {i:04}\n")).collect();
        let mut doc = Document::from_text(&source);
        let before = doc.line_index().ids().to_vec();

        let k = 1 + pick % (lines - 2);
        let offset = doc.position_to_offset(k, column);
        let line_len = doc.line_len(k).unwrap_or(0);
        let delete = delete.min(line_len - doc.offset_to_position(offset).1);
        doc.replace(offset..offset + delete, &text);

        prop_assert_eq!(doc.line_index().ids(), before.as_slice());
    }

    #[test]
    fn test_multiline_edit_preserves_ids_outside_touched_range(
        lines in 5usize..60,
        pick in any::<usize>(),
        added in 1usize..4,
    ) {
        let source: String = (0..lines).map(|i| format!("row {i}\n")).collect();
        let mut doc = Document::from_text(&source);
        let before = doc.line_index().ids().to_vec();

        let k = 1 + pick % (lines - 2);
        let offset = doc.position_to_offset(k, 2);
        doc.insert(offset, &"x\n".repeat(added));

        let after = doc.line_index().ids();
        prop_assert_eq!(&after[..=k], &before[..=k]);
        prop_assert_eq!(&after[k + 1 + added..], &before[k + 1..]);
    }
}

#[test]
fn test_deep_edit_in_large_file() {
    let source: String = (0..10_000).map(|i| format!("line number {i}\n")).collect();
    let mut doc = Document::from_text(&source);
    let before = doc.line_index().ids().to_vec();

    let offset = doc.position_to_offset(7_500, 5);
    doc.replace(offset..offset + 6, "NUMBER and more");
    assert_eq!(doc.line_index().ids(), before.as_slice());
    assert_eq!(doc.line_text(7_500), Some("line NUMBER and more 7500"));

    let fresh = LineIndex::from_text(&doc.text());
    assert_eq!(doc.line_index().starts(), fresh.starts());
}
