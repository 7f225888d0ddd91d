// ============================================================
// Layer 4 — Vocabulary Builder
// ============================================================
// Builds the token ↔ index mapping the decoder is trained on.
//
// Construction rules:
//   1. Count token frequency over the TRAINING captions only
//   2. Keep tokens whose count >= min_freq
//   3. Always include the four reserved tokens, regardless of
//      frequency: #PAD#, #START#, #END#, #UNK#
//   4. Sort the retained set before assigning indices, so the
//      same corpus always yields the same mapping — index
//      assignment must be reproducible for testability
//
// Lookup rules:
//   - token_to_index falls back to the #UNK# index for any
//     out-of-vocabulary token
//   - index_to_token(token_to_index(t)) == t for every retained t
//
// The pad index is reserved and constant across splits: the loss
// mask and the batcher both depend on it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::caption::Caption;

pub const PAD: &str = "#PAD#";
pub const START: &str = "#START#";
pub const END: &str = "#END#";
pub const UNK: &str = "#UNK#";

/// Bidirectional token ↔ index mapping, frozen after build.
/// Invariant: token_to_index is a bijection over index_to_token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    token_to_index: HashMap<String, u32>,
    index_to_token: Vec<String>,
}

impl Vocabulary {
    /// Build a vocabulary from tokenised training captions.
    ///
    /// `captions` is a flat list — one entry per (image, caption)
    /// pair. Tokens below `min_freq` are dropped and will map to
    /// the unknown index from then on.
    pub fn build(captions: &[Caption], min_freq: usize) -> Self {
        let mut freq: HashMap<&str, usize> = HashMap::new();
        for caption in captions {
            for token in &caption.tokens {
                *freq.entry(token.as_str()).or_insert(0) += 1;
            }
        }

        // Retained set: frequent tokens plus the reserved four.
        // Sorting makes index assignment order-independent and
        // reproducible given the same input.
        let mut retained: Vec<String> = freq
            .into_iter()
            .filter(|&(token, count)| count >= min_freq && !is_reserved(token))
            .map(|(token, _)| token.to_string())
            .collect();
        retained.extend([PAD, START, END, UNK].map(str::to_string));
        retained.sort();

        let token_to_index = retained
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i as u32))
            .collect();

        Self { token_to_index, index_to_token: retained }
    }

    pub fn len(&self) -> usize {
        self.index_to_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_to_token.is_empty()
    }

    pub fn pad_idx(&self) -> u32 {
        self.token_to_index[PAD]
    }

    pub fn start_idx(&self) -> u32 {
        self.token_to_index[START]
    }

    pub fn end_idx(&self) -> u32 {
        self.token_to_index[END]
    }

    pub fn unk_idx(&self) -> u32 {
        self.token_to_index[UNK]
    }

    /// Index for a token, falling back to #UNK# when unseen.
    pub fn token_to_index(&self, token: &str) -> u32 {
        self.token_to_index
            .get(token)
            .copied()
            .unwrap_or_else(|| self.unk_idx())
    }

    pub fn index_to_token(&self, index: u32) -> Option<&str> {
        self.index_to_token.get(index as usize).map(String::as_str)
    }

    /// Encode one caption as indices, wrapped with the start and
    /// end markers: [#START#, w1, ..., wn, #END#].
    pub fn encode(&self, caption: &Caption) -> Vec<u32> {
        let mut indices = Vec::with_capacity(caption.len() + 2);
        indices.push(self.start_idx());
        indices.extend(caption.tokens.iter().map(|t| self.token_to_index(t)));
        indices.push(self.end_idx());
        indices
    }

    /// Encode a whole corpus. Order of the output matches the
    /// order of the input — index i still refers to image i.
    pub fn encode_all(&self, captions: &[Caption]) -> Vec<Vec<u32>> {
        captions.iter().map(|c| self.encode(c)).collect()
    }

    /// Decode generated indices back into words, dropping the
    /// reserved markers.
    pub fn decode(&self, indices: &[u32]) -> String {
        indices
            .iter()
            .filter_map(|&i| self.index_to_token(i))
            .filter(|t| !is_reserved(t))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn is_reserved(token: &str) -> bool {
    matches!(token, PAD | START | END | UNK)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> Vec<Caption> {
        vec![
            Caption::from_text("a dog runs on grass"),
            Caption::from_text("a dog sleeps"),
            Caption::from_text("a cat sleeps on grass"),
        ]
    }

    #[test]
    fn test_reserved_tokens_present_and_distinct() {
        let v = Vocabulary::build(&corpus(), 2);
        let special = [v.pad_idx(), v.start_idx(), v.end_idx(), v.unk_idx()];
        for (i, a) in special.iter().enumerate() {
            for b in &special[i + 1..] {
                assert_ne!(a, b, "reserved indices must be pairwise distinct");
            }
        }
        assert_eq!(v.index_to_token(v.pad_idx()), Some(PAD));
        assert_eq!(v.index_to_token(v.unk_idx()), Some(UNK));
    }

    #[test]
    fn test_min_freq_filters_rare_tokens() {
        let v = Vocabulary::build(&corpus(), 2);
        // "a", "dog", "sleeps", "on", "grass" appear >= 2 times
        assert_ne!(v.token_to_index("dog"), v.unk_idx());
        assert_ne!(v.token_to_index("grass"), v.unk_idx());
        // "runs" and "cat" appear once → unknown
        assert_eq!(v.token_to_index("runs"), v.unk_idx());
        assert_eq!(v.token_to_index("cat"), v.unk_idx());
    }

    #[test]
    fn test_round_trip_for_retained_tokens() {
        let v = Vocabulary::build(&corpus(), 1);
        for token in ["a", "dog", "cat", "runs", "sleeps", "on", "grass"] {
            let idx = v.token_to_index(token);
            assert_eq!(v.index_to_token(idx), Some(token));
        }
    }

    #[test]
    fn test_unseen_token_maps_to_unknown() {
        let v = Vocabulary::build(&corpus(), 1);
        assert_eq!(v.token_to_index("zebra"), v.unk_idx());
    }

    #[test]
    fn test_deterministic_index_assignment() {
        // Same corpus in a different order must give the same mapping
        let a = Vocabulary::build(&corpus(), 1);
        let mut shuffled = corpus();
        shuffled.reverse();
        let b = Vocabulary::build(&shuffled, 1);
        assert_eq!(a.index_to_token, b.index_to_token);
    }

    #[test]
    fn test_encode_wraps_with_start_end() {
        let v = Vocabulary::build(&corpus(), 1);
        let encoded = v.encode(&Caption::from_text("a dog"));
        assert_eq!(encoded.first(), Some(&v.start_idx()));
        assert_eq!(encoded.last(), Some(&v.end_idx()));
        assert_eq!(encoded.len(), 4);
    }

    #[test]
    fn test_decode_drops_reserved_tokens() {
        let v = Vocabulary::build(&corpus(), 1);
        let encoded = v.encode(&Caption::from_text("a dog sleeps"));
        assert_eq!(v.decode(&encoded), "a dog sleeps");
    }
}
