const PUNCT: [char; 4] = ['.', '?', '!', '\n'];
const LENGTH_CAP: usize = 60;

/// A TTS-sized slice of text with its sequence number within the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub seq: u32,
    pub text: String,
}

/// Splits a token stream into TTS-ready fragments on punctuation or a
/// length threshold.
///
/// Tokens are pushed one at a time via `push`; a fragment is returned
/// once the buffer contains terminal punctuation or reaches 60
/// characters. `flush` emits any trailing partial buffer at stream end.
/// Sequence numbers start at 1 and increment monotonically.
#[derive(Debug, Default)]
pub struct Chunker {
    buf: String,
    next_seq: u32,
}

impl Chunker {
    pub fn new() -> Self {
        Self { buf: String::new(), next_seq: 1 }
    }

    /// Feed one token (may be any size, e.g. a single character or a
    /// whole model-emitted chunk). Returns a fragment if the buffer just
    /// crossed a punctuation or length trigger.
    pub fn push(&mut self, token: &str) -> Option<Fragment> {
        self.buf.push_str(token);

        let has_punct = self.buf.chars().any(|c| PUNCT.contains(&c));
        if has_punct || self.buf.chars().count() >= LENGTH_CAP {
            return self.take_fragment();
        }
        None
    }

    /// Emit any remaining buffered text as a final fragment. Returns
    /// `None` if the buffer is empty or whitespace-only.
    pub fn flush(&mut self) -> Option<Fragment> {
        self.take_fragment()
    }

    fn take_fragment(&mut self) -> Option<Fragment> {
        let text = std::mem::take(&mut self.buf);
        let trimmed = text.trim().to_string();
        if trimmed.is_empty() {
            return None;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        Some(Fragment { seq, text: trimmed })
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Spec §8 invariants 2 and 6: for any token stream, every fragment
        /// is trimmed/non-empty and sequence numbers strictly ascend from 1.
        #[test]
        fn fragments_are_trimmed_nonempty_and_strictly_ascending(tokens in proptest::collection::vec("[a-zA-Z0-9 .?!\n]{0,5}", 0..200)) {
            let mut chunker = Chunker::new();
            let mut fragments = Vec::new();
            for token in &tokens {
                if let Some(f) = chunker.push(token) {
                    fragments.push(f);
                }
            }
            if let Some(f) = chunker.flush() {
                fragments.push(f);
            }

            for f in &fragments {
                prop_assert_eq!(f.text.trim(), f.text.as_str());
                prop_assert!(!f.text.is_empty());
            }
            for (i, f) in fragments.iter().enumerate() {
                prop_assert_eq!(f.seq, (i + 1) as u32);
            }
        }

        /// No fragment's un-trimmed source ever exceeds the 60-char cap
        /// by more than the punctuation character that triggered it.
        #[test]
        fn fragments_never_wildly_exceed_the_length_cap(tokens in proptest::collection::vec("[a-zA-Z]{1,3}", 0..100)) {
            let mut chunker = Chunker::new();
            let mut fragments = Vec::new();
            for token in &tokens {
                if let Some(f) = chunker.push(token) {
                    fragments.push(f);
                }
            }
            for f in &fragments {
                prop_assert!(f.text.len() <= LENGTH_CAP + 3);
            }
        }
    }
}
