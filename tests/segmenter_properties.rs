//! Property tests for the segmenter's size and reconstruction invariants.

use proptest::prelude::*;

use reqsmith::segmenter::{SourceBlob, segment};

/// Blob separators are the only characters segmentation may add, and the
/// newline dropped when an oversize line is cut is the only character it
/// may remove; stripping newlines from both sides makes the comparison
/// exact.
fn strip_newlines(text: &str) -> String {
    text.chars().filter(|c| *c != '\n').collect()
}

proptest! {
    #[test]
    fn chunks_respect_the_budget_with_separator_slack(
        texts in prop::collection::vec("[a-z ,.;(){}\\[\\]\n]{0,120}", 0..8),
        max in 5usize..48,
    ) {
        let blobs: Vec<SourceBlob> = texts.iter().map(|t| SourceBlob::new(t.as_str())).collect();
        let chunks = segment(&blobs, max);

        for chunk in &chunks {
            // Packing checks lengths before appending the two-character
            // blob separator, and a delimiter found exactly at the budget
            // is included in the piece it ends; both allow a small
            // overshoot but nothing beyond it.
            prop_assert!(
                chunk.char_len() <= max + 2,
                "chunk of {} chars exceeds budget {}",
                chunk.char_len(),
                max
            );
        }
    }

    #[test]
    fn concatenated_chunks_reproduce_the_input(
        texts in prop::collection::vec("[a-z ,.;(){}\\[\\]\n]{0,120}", 0..8),
        max in 5usize..48,
    ) {
        let blobs: Vec<SourceBlob> = texts.iter().map(|t| SourceBlob::new(t.as_str())).collect();
        let chunks = segment(&blobs, max);

        let rebuilt: String = chunks.iter().map(|c| strip_newlines(&c.text)).collect();
        let original: String = texts.iter().map(|t| strip_newlines(t)).collect();
        prop_assert_eq!(rebuilt, original);
    }

    #[test]
    fn ordinals_are_dense_and_increasing(
        texts in prop::collection::vec("[a-z \n]{0,200}", 0..6),
        max in 5usize..32,
    ) {
        let blobs: Vec<SourceBlob> = texts.iter().map(|t| SourceBlob::new(t.as_str())).collect();
        let chunks = segment(&blobs, max);

        for (index, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.ordinal, index);
        }
    }

    #[test]
    fn segmentation_is_deterministic(
        texts in prop::collection::vec("[a-z ,.\n]{0,150}", 0..6),
        max in 5usize..40,
    ) {
        let blobs: Vec<SourceBlob> = texts.iter().map(|t| SourceBlob::new(t.as_str())).collect();
        prop_assert_eq!(segment(&blobs, max), segment(&blobs, max));
    }
}
