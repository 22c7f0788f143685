//! Boundary-preserving text segmentation.
//!
//! Turns an ordered sequence of raw text blobs into an ordered sequence of
//! bounded-size [`Chunk`]s, each sized for one inference call. Splitting is
//! greedy and seeks the most structure-preserving boundary available:
//! blob boundary first, then line boundary, then a preferred delimiter,
//! and only as a last resort a hard character cut.
//!
//! Segmentation is pure: for a fixed input and chunk budget the output is
//! exactly reproducible. Lengths are measured in Unicode scalar values.

use std::fmt;

/// One unit of raw input text, semantically a file's contents.
///
/// The origin is carried for diagnostics only; correctness never depends
/// on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBlob {
    pub text: String,
    pub origin: Option<String>,
}

impl SourceBlob {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            origin: None,
        }
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// A contiguous text segment destined for one inference call.
///
/// Chunks are produced once by [`segment`], consumed once by the
/// dispatcher, and never mutated. The ordinal is the chunk's index in the
/// output sequence and establishes the ordering preserved end-to-end
/// through dispatch and aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub ordinal: usize,
}

impl Chunk {
    /// Length in Unicode scalar values, the unit the chunk budget is
    /// expressed in.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk #{} ({} chars)", self.ordinal, self.char_len())
    }
}

/// Separator inserted between blobs packed into the same chunk.
const BLOB_SEPARATOR: &str = "\n\n";

/// Delimiters tried, in priority order, when a single line must be cut.
/// The first delimiter found at or before the budget wins; the cut lands
/// immediately after it.
const SPLIT_DELIMITERS: [char; 10] = [' ', ',', '.', ';', '{', '}', '(', ')', '[', ']'];

/// Partition `blobs` into ordered chunks of at most `max_chunk_size`
/// characters.
///
/// Blobs are greedily packed together, separated by a blank line, until
/// adding the next blob would exceed the budget. A blob that alone exceeds
/// the budget is split on line boundaries (and, for pathological single
/// lines, on delimiters or raw character positions) and its pieces are
/// emitted directly, never merged with neighboring buffer content.
///
/// An empty blob sequence yields an empty chunk sequence; the caller is
/// responsible for treating that as "no content". Whitespace-only blobs
/// are not filtered here.
pub fn segment(blobs: &[SourceBlob], max_chunk_size: usize) -> Vec<Chunk> {
    debug_assert!(max_chunk_size > 0, "chunk budget must be validated upstream");

    let mut pieces: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for blob in blobs {
        let blob_len = blob.text.chars().count();
        if blob_len > max_chunk_size {
            if !buffer.is_empty() {
                pieces.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }
            pieces.extend(split_oversize_blob(&blob.text, max_chunk_size));
        } else if buffer_len + blob_len > max_chunk_size {
            pieces.push(std::mem::take(&mut buffer));
            buffer.push_str(&blob.text);
            buffer.push_str(BLOB_SEPARATOR);
            buffer_len = blob_len + BLOB_SEPARATOR.len();
        } else {
            buffer.push_str(&blob.text);
            buffer.push_str(BLOB_SEPARATOR);
            buffer_len += blob_len + BLOB_SEPARATOR.len();
        }
    }

    if !buffer.is_empty() {
        pieces.push(buffer);
    }

    pieces
        .into_iter()
        .enumerate()
        .map(|(ordinal, text)| Chunk { text, ordinal })
        .collect()
}

/// Split a blob larger than the budget on line boundaries, falling back to
/// [`split_oversize_line`] for any single line that exceeds the budget on
/// its own.
fn split_oversize_blob(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut pieces: Vec<String> = Vec::new();
    let mut buffer = String::new();
    let mut buffer_len = 0usize;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if line_len > max_chunk_size {
            if !buffer.is_empty() {
                pieces.push(std::mem::take(&mut buffer));
                buffer_len = 0;
            }
            pieces.extend(split_oversize_line(line, max_chunk_size));
        } else if buffer_len + line_len + 1 > max_chunk_size {
            pieces.push(std::mem::take(&mut buffer));
            buffer.push_str(line);
            buffer.push('\n');
            buffer_len = line_len + 1;
        } else {
            buffer.push_str(line);
            buffer.push('\n');
            buffer_len += line_len + 1;
        }
    }

    if !buffer.is_empty() {
        pieces.push(buffer);
    }

    pieces
}

/// Cut a single line that exceeds the budget into pieces, preferring to
/// cut just after a delimiter found at or before the budget position.
///
/// When none of the preferred delimiters occurs within the budget the cut
/// lands at exactly the budget position. This is the only place a chunk
/// boundary ignores structure.
fn split_oversize_line(line: &str, max_chunk_size: usize) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut remaining: &str = line;

    while !remaining.is_empty() {
        let split_at = delimiter_cut(remaining, max_chunk_size)
            .unwrap_or_else(|| char_position(remaining, max_chunk_size));
        let (piece, rest) = remaining.split_at(split_at);
        pieces.push(piece.to_string());
        remaining = rest;
    }

    pieces
}

/// Byte offset of the cut point just after the highest-priority delimiter
/// occurring at a character position in `1..=max`, or `None` when no
/// delimiter qualifies.
///
/// Delimiters are tried strictly in priority order: a space two characters
/// in beats a comma right at the budget. A delimiter at position zero is
/// ignored so every emitted piece is non-empty.
fn delimiter_cut(text: &str, max: usize) -> Option<usize> {
    for delimiter in SPLIT_DELIMITERS {
        let mut found: Option<usize> = None;
        for (char_pos, (byte_pos, ch)) in text.char_indices().enumerate() {
            if char_pos > max {
                break;
            }
            if char_pos > 0 && ch == delimiter {
                found = Some(byte_pos + ch.len_utf8());
            }
        }
        if found.is_some() {
            return found;
        }
    }
    None
}

/// Byte offset of character position `pos`, clamped to the end of `text`.
fn char_position(text: &str, pos: usize) -> usize {
    text.char_indices()
        .nth(pos)
        .map_or(text.len(), |(byte_pos, _)| byte_pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(text: &str) -> SourceBlob {
        SourceBlob::new(text)
    }

    fn strip_separators(text: &str) -> String {
        text.chars().filter(|c| *c != '\n').collect()
    }

    #[test]
    fn empty_input_yields_no_chunks() {
        assert!(segment(&[], 12_000).is_empty());
    }

    #[test]
    fn small_blob_with_two_lines_stays_one_chunk() {
        let chunks = segment(&[blob("line one,\nline two.")], 12_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[0].text, "line one,\nline two.\n\n");
    }

    #[test]
    fn two_blobs_that_would_overflow_are_reflushed() {
        let a = "A".repeat(5_000);
        let b = "B".repeat(8_000);
        let chunks = segment(&[blob(&a), blob(&b)], 12_000);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, format!("{a}\n\n"));
        assert_eq!(chunks[1].text, format!("{b}\n\n"));
        assert_eq!(chunks[0].ordinal, 0);
        assert_eq!(chunks[1].ordinal, 1);
    }

    #[test]
    fn several_small_blobs_pack_into_one_chunk() {
        let blobs = vec![blob("alpha"), blob("beta"), blob("gamma")];
        let chunks = segment(&blobs, 12_000);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "alpha\n\nbeta\n\ngamma\n\n");
    }

    #[test]
    fn undelimited_long_line_gets_hard_cuts() {
        let line = "x".repeat(30_000);
        let chunks = segment(&[blob(&line)], 12_000);
        let lengths: Vec<usize> = chunks.iter().map(Chunk::char_len).collect();
        assert_eq!(lengths, vec![12_000, 12_000, 6_000]);
    }

    #[test]
    fn oversize_blob_splits_on_line_boundaries() {
        // 100 lines of 200 chars each; 59 lines fit in a 12000 budget
        // (59 * 201 = 11859, adding a 60th would exceed it).
        let line = "y".repeat(200);
        let text = vec![line; 100].join("\n");
        let chunks = segment(&[blob(&text)], 12_000);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 12_000, "{chunk} exceeds budget");
            assert!(chunk.text.ends_with('\n'));
        }
    }

    #[test]
    fn delimiter_cut_prefers_space_over_later_comma() {
        let line = format!("ab cd{}", "z".repeat(20));
        let pieces = split_oversize_line(&line, 10);
        assert_eq!(pieces[0], "ab ");
    }

    #[test]
    fn delimiter_at_position_zero_is_ignored() {
        let line = format!(" {}", "z".repeat(15));
        let pieces = split_oversize_line(&line, 10);
        assert_eq!(pieces[0].chars().count(), 10);
    }

    #[test]
    fn long_line_with_delimiters_cuts_after_delimiter() {
        let head = "w".repeat(9_000);
        let tail = "v".repeat(9_000);
        let line = format!("{head},{tail}");
        let chunks = segment(&[blob(&line)], 12_000);
        assert_eq!(chunks[0].text, format!("{head},"));
        for chunk in &chunks {
            assert!(chunk.char_len() <= 12_000);
        }
    }

    #[test]
    fn oversize_blob_pieces_are_not_merged_with_neighbors() {
        let small = "before";
        let big = "q".repeat(25_000);
        let after = "after";
        let chunks = segment(&[blob(small), blob(&big), blob(after)], 12_000);
        // small is flushed alone, big becomes hard-cut pieces, after opens
        // a fresh buffer.
        assert_eq!(chunks[0].text, "before\n\n");
        assert_eq!(chunks.last().unwrap().text, "after\n\n");
        assert_eq!(chunks.len(), 5);
    }

    #[test]
    fn reconstruction_modulo_separator_whitespace() {
        let blobs = vec![
            blob("fn main() {}"),
            blob(&"k".repeat(13_000)),
            blob("tail content"),
        ];
        let chunks = segment(&blobs, 12_000);
        let rebuilt: String = chunks
            .iter()
            .map(|c| strip_separators(&c.text))
            .collect();
        let original: String = blobs.iter().map(|b| strip_separators(&b.text)).collect();
        assert_eq!(rebuilt, original);
    }

    #[test]
    fn ordinals_are_dense_and_ordered() {
        let blobs = vec![blob(&"a".repeat(11_000)), blob(&"b".repeat(11_000))];
        let chunks = segment(&blobs, 12_000);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.ordinal, i);
        }
    }

    #[test]
    fn multibyte_text_cuts_on_char_boundaries() {
        let line = "é".repeat(25);
        let chunks = segment(&[blob(&line)], 10);
        for chunk in &chunks {
            assert!(chunk.char_len() <= 10);
        }
        let rebuilt: String = chunks.iter().map(|c| strip_separators(&c.text)).collect();
        assert_eq!(rebuilt, line);
    }
}
