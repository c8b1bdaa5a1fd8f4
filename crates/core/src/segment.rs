//! Sentence-boundary segmentation of long text blocks.
//!
//! Text longer than the maximum chunk length is split after sentence-ending
//! punctuation and the sentences are greedily regrouped into chunks that fit.
//! A single sentence longer than the maximum is hard-cut into fixed-size
//! slices.

use crate::normalize::char_len;

/// Punctuation that always ends a sentence.
const SENTENCE_TERMINATORS: &[char] = &[
    '。', '．', '！', '？', '；', // Full-width
    '!', '?', ';', // Half-width
];

/// Default maximum chunk length, in characters.
pub const DEFAULT_MAX_CHUNK_LEN: usize = 180;

/// Splits over-length text into bounded chunks.
#[derive(Debug, Clone)]
pub struct TextSegmenter {
    /// Maximum chunk length in characters.
    max_len: usize,
}

impl Default for TextSegmenter {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_CHUNK_LEN,
        }
    }
}

impl TextSegmenter {
    /// Create a segmenter with the default maximum of 180 characters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum chunk length.
    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len.max(1);
        self
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Split `text` into chunks of at most `max_len` characters.
    ///
    /// Text that already fits is returned as a single chunk. Punctuation stays
    /// attached to the sentence it ends. Whitespace between sentences is kept
    /// inside a chunk and dropped at chunk edges.
    pub fn segment(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.max_len {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut buf = String::new();
        let mut buf_len = 0;

        for raw in split_sentences(text) {
            let piece = raw.trim();
            if piece.is_empty() {
                continue;
            }
            let piece_len = char_len(piece);
            let gap = if buf.is_empty() {
                ""
            } else {
                &raw[..raw.len() - raw.trim_start().len()]
            };
            let gap_len = char_len(gap);

            if buf_len + gap_len + piece_len <= self.max_len {
                buf.push_str(gap);
                buf.push_str(piece);
                buf_len += gap_len + piece_len;
                continue;
            }

            if !buf.is_empty() {
                chunks.push(std::mem::take(&mut buf));
                buf_len = 0;
            }

            if piece_len > self.max_len {
                chunks.extend(hard_cut(piece, self.max_len));
            } else {
                buf.push_str(piece);
                buf_len = piece_len;
            }
        }

        if !buf.is_empty() {
            chunks.push(buf);
        }

        chunks
    }
}

/// Whether `c` ends a sentence, given the character after it.
///
/// A half-width period only counts when followed by whitespace or the end of
/// the text, so decimals and URLs stay whole.
fn is_sentence_end(c: char, next: Option<char>) -> bool {
    if c == '.' {
        return next.map_or(true, char::is_whitespace);
    }
    SENTENCE_TERMINATORS.contains(&c)
}

/// Split `text` after each sentence terminator. Concatenating the result
/// yields `text` again.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        let next = chars.peek().map(|&(_, n)| n);
        if is_sentence_end(c, next) {
            let end = idx + c.len_utf8();
            sentences.push(&text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        sentences.push(&text[start..]);
    }

    sentences
}

/// Cut `piece` into slices of exactly `max_len` characters (the last may be shorter).
///
/// Slices that are nothing but whitespace are dropped.
fn hard_cut(piece: &str, max_len: usize) -> Vec<String> {
    let chars: Vec<char> = piece.chars().collect();
    chars
        .chunks(max_len)
        .filter(|slice| !slice.iter().all(|c| c.is_whitespace()))
        .map(|slice| slice.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sentence(len: usize) -> String {
        // `len - 1` letters plus a full-width terminator
        format!("{}。", "字".repeat(len - 1))
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let segmenter = TextSegmenter::new();
        assert_eq!(segmenter.segment("  短句。  "), vec!["短句。"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let segmenter = TextSegmenter::new();
        assert!(segmenter.segment("   ").is_empty());
    }

    #[test]
    fn test_split_sentences_keeps_punctuation() {
        assert_eq!(
            split_sentences("一。二！三？四；五"),
            vec!["一。", "二！", "三？", "四；", "五"]
        );
        assert_eq!(split_sentences("a; b! c?"), vec!["a;", " b!", " c?"]);
    }

    #[test]
    fn test_half_width_period_needs_following_space() {
        assert_eq!(
            split_sentences("Pi is 3.14 here. Next"),
            vec!["Pi is 3.14 here.", " Next"]
        );
        assert_eq!(split_sentences("end."), vec!["end."]);
    }

    #[test]
    fn test_greedy_grouping() {
        let segmenter = TextSegmenter::new().with_max_len(10);
        // Sentences of 4, 4, 4 characters
        let chunks = segmenter.segment("abc。def。ghi。");
        assert_eq!(chunks, vec!["abc。def。", "ghi。"]);
    }

    #[test]
    fn test_whitespace_between_sentences_is_kept_inside_chunks() {
        let segmenter = TextSegmenter::new().with_max_len(12);
        let chunks = segmenter.segment("One. Two. Three. Four.");
        assert_eq!(chunks, vec!["One. Two.", "Three. Four."]);
    }

    #[test]
    fn test_unsplittable_run_is_hard_cut() {
        let segmenter = TextSegmenter::new().with_max_len(4);
        let chunks = segmenter.segment("ab。abcdefghij");
        assert_eq!(chunks, vec!["ab。", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_long_text_scenario() {
        // 400 characters, five sentence ends
        let text = [sentence(70), sentence(70), sentence(70), sentence(70), sentence(120)].concat();
        assert_eq!(char_len(&text), 400);

        let chunks = TextSegmenter::new().segment(&text);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| char_len(c) <= 180));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn test_deterministic() {
        let text = "甲乙丙。".repeat(100);
        let segmenter = TextSegmenter::new();
        assert_eq!(segmenter.segment(&text), segmenter.segment(&text));
    }

    #[test]
    fn test_zero_max_len_is_clamped() {
        let segmenter = TextSegmenter::new().with_max_len(0);
        assert_eq!(segmenter.max_len(), 1);
        assert_eq!(segmenter.segment("ab"), vec!["a", "b"]);
    }

    fn without_whitespace(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    proptest! {
        #[test]
        fn prop_chunks_are_bounded_and_lossless(
            text in "[a-z 字。！？；;!?.]{0,600}",
            max_len in 1usize..200,
        ) {
            let chunks = TextSegmenter::new().with_max_len(max_len).segment(&text);

            for chunk in &chunks {
                prop_assert!(char_len(chunk) <= max_len);
                prop_assert!(!chunk.trim().is_empty());
            }
            prop_assert_eq!(without_whitespace(&chunks.concat()), without_whitespace(&text));
        }
    }
}
