//! Bounded-length text segmentation.
//!
//! A synthesis backend has a practical ceiling on how much text one
//! call should carry; over-long dialogue lines are split into chunks
//! at the most natural boundary available, in order of preference:
//! sentence-terminal punctuation, whitespace, internal hyphens, and as
//! a last resort a hard cut at the threshold.
//!
//! All lengths are measured in Unicode scalar values, never bytes, so
//! full-width text segments the same way half-width text does.

use crate::script::DialogueLine;

/// Sentence-terminal punctuation, full-width and half-width forms.
const TERMINATORS: [char; 7] = ['。', '！', '？', '．', '.', '!', '?'];

fn is_terminator(c: char) -> bool {
    TERMINATORS.contains(&c)
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Splits over-long dialogue lines into chunks of at most `max_chars`
/// characters, annotating every fragment with its provenance.
#[derive(Debug, Clone, Copy)]
pub struct Segmenter {
    max_chars: usize,
}

impl Segmenter {
    pub fn new(max_chars: usize) -> Self {
        Self {
            max_chars: max_chars.max(1),
        }
    }

    /// Segment a whole dialogue sequence, preserving order.
    ///
    /// Fragments of one original line are contiguous, share that line's
    /// position in the input as `original_line_idx`, and carry
    /// `segment_idx` ascending from 0. Lines under the threshold pass
    /// through untouched.
    pub fn process(&self, dialogues: Vec<DialogueLine>) -> Vec<DialogueLine> {
        let mut out = Vec::with_capacity(dialogues.len());
        for (idx, line) in dialogues.into_iter().enumerate() {
            if char_len(&line.text) <= self.max_chars {
                out.push(line);
                continue;
            }
            let chunks = self.split_text(&line.text);
            tracing::debug!(
                line = idx,
                role = %line.role,
                chunks = chunks.len(),
                "segmented over-long line"
            );
            for (segment_idx, chunk) in chunks.into_iter().enumerate() {
                let mut fragment = line.clone();
                fragment.text = chunk;
                fragment.is_segment = true;
                fragment.original_line_idx = Some(idx);
                fragment.segment_idx = Some(segment_idx);
                out.push(fragment);
            }
        }
        out
    }

    /// Split one text into chunks of at most `max_chars` characters.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if char_len(text) <= self.max_chars {
            return vec![text.to_string()];
        }

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for sentence in split_sentences(text) {
            let sentence_len = char_len(&sentence);
            if current_len + sentence_len <= self.max_chars {
                current.push_str(&sentence);
                current_len += sentence_len;
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if sentence_len > self.max_chars {
                // Sentence alone overflows: fall back to word packing.
                // All pieces but the last are final; the tail stays open
                // so a following short sentence can still pack with it.
                let mut pieces = self.split_oversize_sentence(&sentence);
                if let Some(tail) = pieces.pop() {
                    chunks.extend(pieces);
                    current_len = char_len(&tail);
                    current = tail;
                }
            } else {
                current = sentence;
                current_len = sentence_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// Pack whitespace-separated words greedily, single space between
    /// words inside a chunk.
    fn split_oversize_sentence(&self, sentence: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in sentence.split_whitespace() {
            let word_len = char_len(word);
            let extra = if current.is_empty() {
                word_len
            } else {
                word_len + 1
            };
            if current_len + extra <= self.max_chars {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_len += extra;
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if word_len > self.max_chars {
                let mut pieces = self.split_oversize_word(word);
                if let Some(tail) = pieces.pop() {
                    chunks.extend(pieces);
                    current_len = char_len(&tail);
                    current = tail;
                }
            } else {
                current = word.to_string();
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    /// A single word beyond the threshold: split at internal hyphens if
    /// it has any (hyphen stays with the preceding piece), hard-cut at
    /// the threshold otherwise. The hard cut is a deliberate last
    /// resort, not silent data loss: every character is emitted.
    fn split_oversize_word(&self, word: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for piece in word.split_inclusive('-') {
            let piece_len = char_len(piece);
            if current_len + piece_len <= self.max_chars {
                current.push_str(piece);
                current_len += piece_len;
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if piece_len > self.max_chars {
                chunks.extend(self.hard_cut(piece));
                if let Some(tail) = chunks.pop() {
                    current_len = char_len(&tail);
                    current = tail;
                }
            } else {
                current = piece.to_string();
                current_len = piece_len;
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    fn hard_cut(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        chars
            .chunks(self.max_chars)
            .map(|c| c.iter().collect())
            .collect()
    }
}

/// Split at sentence-terminal punctuation, keeping runs of terminators
/// attached to the preceding sentence. Whitespace-only pieces are
/// dropped.
fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut after_terminator = false;

    for c in text.chars() {
        if after_terminator && !is_terminator(c) {
            if !current.trim().is_empty() {
                sentences.push(std::mem::take(&mut current));
            } else {
                current.clear();
            }
            after_terminator = false;
        }
        current.push(c);
        if is_terminator(c) {
            after_terminator = true;
        }
    }
    if !current.trim().is_empty() {
        sentences.push(current);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_ws(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    #[test]
    fn short_text_passes_through_unmarked() {
        let segmenter = Segmenter::new(100);
        let out = segmenter.process(vec![DialogueLine::new("A", "Short line.")]);
        assert_eq!(out.len(), 1);
        assert!(!out[0].is_segment);
        assert!(out[0].original_line_idx.is_none());
        assert!(out[0].segment_idx.is_none());
    }

    #[test]
    fn splits_at_sentence_boundary_then_words() {
        let segmenter = Segmenter::new(30);
        let chunks = segmenter
            .split_text("Hello world. This is a test sentence that is quite long indeed.");
        assert_eq!(chunks[0], "Hello world.");
        assert!(chunks.len() >= 3);
        for chunk in &chunks {
            assert!(char_len(chunk) <= 30, "chunk too long: {chunk:?}");
        }
        let rebuilt: String = chunks.iter().map(|c| strip_ws(c)).collect();
        assert_eq!(
            rebuilt,
            strip_ws("Hello world. This is a test sentence that is quite long indeed.")
        );
    }

    #[test]
    fn fullwidth_terminators_split() {
        let segmenter = Segmenter::new(6);
        let chunks = segmenter.split_text("你好吗？我很好。那太好了！");
        assert_eq!(chunks, vec!["你好吗？", "我很好。", "那太好了！"]);
    }

    #[test]
    fn terminator_runs_stay_attached() {
        let segmenter = Segmenter::new(10);
        let chunks = segmenter.split_text("What?! No way!! Honestly...");
        assert_eq!(chunks[0], "What?!");
        for chunk in &chunks {
            assert!(char_len(chunk) <= 10);
        }
    }

    #[test]
    fn greedy_packing_fills_chunks() {
        let segmenter = Segmenter::new(12);
        // Two short sentences fit one chunk; the third starts a new one.
        let chunks = segmenter.split_text("Hi. Yes. Absolutely not.");
        assert_eq!(chunks[0], "Hi. Yes.");
    }

    #[test]
    fn oversize_word_splits_at_hyphens() {
        let segmenter = Segmenter::new(10);
        let chunks = segmenter.split_text("well inter-continental-ballistic stuff");
        for chunk in &chunks {
            assert!(char_len(chunk) <= 10, "chunk too long: {chunk:?}");
        }
        assert!(chunks.iter().any(|c| c.ends_with('-')));
    }

    #[test]
    fn unbreakable_word_hard_cuts_without_loss() {
        let segmenter = Segmenter::new(8);
        let chunks = segmenter.split_text("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(chunks, vec!["abcdefgh", "ijklmnop", "qrstuvwx", "yz"]);
    }

    #[test]
    fn no_characters_dropped_across_inputs() {
        let segmenter = Segmenter::new(15);
        let inputs = [
            "One two three four five six seven eight nine ten.",
            "句子一。句子二很长很长很长很长很长很长很长很长。短。",
            "word-with-many-hyphenated-pieces and trailing prose here",
        ];
        for input in inputs {
            let chunks = segmenter.split_text(input);
            for chunk in &chunks {
                assert!(char_len(chunk) <= 15, "chunk too long: {chunk:?}");
            }
            assert_eq!(
                chunks.iter().map(|c| strip_ws(c)).collect::<String>(),
                strip_ws(input),
                "characters dropped for {input:?}"
            );
        }
    }

    #[test]
    fn provenance_annotation_is_contiguous_and_ascending() {
        let segmenter = Segmenter::new(10);
        let out = segmenter.process(vec![
            DialogueLine::new("A", "Short."),
            DialogueLine::new("B", "This line is definitely longer than ten."),
            DialogueLine::new("C", "Tail."),
        ]);

        assert!(!out[0].is_segment);
        assert!(!out.last().unwrap().is_segment);

        let fragments: Vec<_> = out.iter().filter(|l| l.is_segment).collect();
        assert!(fragments.len() >= 2);
        for (k, fragment) in fragments.iter().enumerate() {
            assert_eq!(fragment.original_line_idx, Some(1));
            assert_eq!(fragment.segment_idx, Some(k));
            assert_eq!(fragment.role, "B");
        }
        // Fragments sit exactly where the original line did.
        assert_eq!(out[0].role, "A");
        assert_eq!(out.last().unwrap().role, "C");
    }
}
