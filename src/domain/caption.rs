// ============================================================
// Layer 3 — Caption Domain Type
// ============================================================
// An ordered sequence of lowercase word tokens describing one
// image. Start/end markers are NOT part of the stored tokens —
// they are added by the vocabulary when a caption is encoded
// to indices, so the raw caption stays human-readable.

use serde::{Deserialize, Serialize};

/// One tokenised caption for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caption {
    pub tokens: Vec<String>,
}

impl Caption {
    pub fn new(tokens: Vec<String>) -> Self {
        Self { tokens }
    }

    /// Tokenise raw caption text: lowercase, split on runs of
    /// non-alphanumeric characters, drop empties. This mirrors
    /// how the training corpus was tokenised, so the vocabulary
    /// built from it matches captions tokenised at inference time.
    pub fn from_text(text: &str) -> Self {
        let tokens = text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl std::fmt::Display for Caption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tokens.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenise_lowercases_and_splits() {
        let c = Caption::from_text("A man, riding a Horse!");
        assert_eq!(c.tokens, vec!["a", "man", "riding", "a", "horse"]);
    }

    #[test]
    fn test_tokenise_empty_text() {
        let c = Caption::from_text("  ...  ");
        assert!(c.is_empty());
    }
}
