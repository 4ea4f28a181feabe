use pretty_assertions::assert_eq;
use strata_core::{
    BufferSnapshot, Document, EditDescriptor, EditorConfig, SnapshotError, SnapshotParts,
};

#[test]
fn test_snapshot_json_round_trip() {
    let mut doc = Document::from_text("héllo\nwörld");
    doc.insert(5, " there");
    doc.delete(0, 1);
    doc.insert(0, "👋 ");

    let json = serde_json::to_string(doc.snapshot()).unwrap();
    let restored: BufferSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.text(), doc.text());
    assert_eq!(restored.len(), doc.len_chars());
    assert_eq!(restored.pieces(), doc.snapshot().pieces());
}

#[test]
fn test_corrupted_snapshot_is_rejected() {
    let json = r#"{
        "original": "abc",
        "added": "",
        "pieces": [{ "source": "Original", "start": 1, "byte_len": 5, "len": 5 }]
    }"#;
    let err = serde_json::from_str::<BufferSnapshot>(json).unwrap_err();
    assert!(err.to_string().contains("piece 0"), "{err}");

    let parts: SnapshotParts = serde_json::from_str(json).unwrap();
    assert!(matches!(
        BufferSnapshot::try_from(parts),
        Err(SnapshotError::PieceOutOfBounds { index: 0 })
    ));
}

#[test]
fn test_edit_descriptors_serialize() {
    let mut doc = Document::from_text("a\nb");
    doc.replace(1..2, " ");
    let edits = doc.take_edits();

    let json = serde_json::to_value(&edits).unwrap();
    assert_eq!(json[0]["start_index"], 1);
    assert_eq!(json[0]["old_end_position"]["row"], 1);
    let back: Vec<EditDescriptor> = serde_json::from_value(json).unwrap();
    assert_eq!(back, edits);
}

#[test]
fn test_config_from_json() {
    let config: EditorConfig = serde_json::from_str(r#"{ "word_scan_chunk": 64 }"#).unwrap();
    let doc = Document::with_config("x", config);
    assert_eq!(doc.config().word_scan_chunk, 64);
    assert_eq!(doc.config().line_cache_capacity, 4096);
}
