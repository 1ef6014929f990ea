//! Recent-token memory used for novelty detection.
//!
//! The memory is a bounded set with a full-clear amnesia policy: once it holds
//! more than `capacity` tokens, the next observation wipes it before inserting.
//! Novelty therefore resets periodically instead of saturating.

use std::collections::HashSet;

pub const DEFAULT_TOKEN_CAPACITY: usize = 200;

/// Tokens shorter than this (in characters) are ignored everywhere.
pub const MIN_TOKEN_CHARS: usize = 4;

/// Strip every leading and trailing character that is not a letter or digit.
pub fn clean_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_alphanumeric())
}

/// Cleaned tokens of at least `MIN_TOKEN_CHARS`, in message order (duplicates kept).
/// Callers pass text that is already lower-cased.
pub fn significant_tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(clean_token)
        .filter(|tok| tok.chars().count() >= MIN_TOKEN_CHARS)
}

#[derive(Debug, Clone)]
pub struct TokenMemory {
    tokens: HashSet<String>,
    capacity: usize,
}

impl Default for TokenMemory {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_CAPACITY)
    }
}

impl TokenMemory {
    pub fn new(capacity: usize) -> Self {
        Self {
            tokens: HashSet::new(),
            capacity,
        }
    }

    /// Remember the significant tokens of a message.
    pub fn observe(&mut self, message: &str) {
        if self.tokens.len() > self.capacity {
            self.tokens.clear();
        }

        let lowered = message.to_lowercase();
        for tok in significant_tokens(&lowered) {
            self.tokens.insert(tok.to_string());
        }
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.tokens.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_token_strips_punctuation() {
        assert_eq!(clean_token("\"hello!\""), "hello");
        assert_eq!(clean_token("(it's)"), "it's");
        assert_eq!(clean_token("?!"), "");
    }

    #[test]
    fn test_clean_token_strips_symbols_and_unicode_punctuation() {
        assert_eq!(clean_token("*hiking*"), "hiking");
        assert_eq!(clean_token("mountains\u{2026}"), "mountains");
        assert_eq!(clean_token("\u{2014}pizza"), "pizza");
        assert_eq!(clean_token("pizza/"), "pizza");
        assert_eq!(clean_token("~pizza~"), "pizza");
        assert_eq!(clean_token("\u{00bf}caf\u{00e9}?"), "caf\u{00e9}");
        assert_eq!(clean_token("2019."), "2019");
    }

    #[test]
    fn test_observe_stores_cleaned_tokens() {
        let mut memory = TokenMemory::default();
        memory.observe("*Hiking* in the mountains\u{2026}");
        assert!(memory.contains("hiking"));
        assert!(memory.contains("mountains"));
        assert_eq!(memory.len(), 2);
    }

    #[test]
    fn test_observe_keeps_long_lowercased_tokens() {
        let mut memory = TokenMemory::default();
        memory.observe("I LOVE Pizza, and music!");

        assert!(memory.contains("love"));
        assert!(memory.contains("pizza"));
        assert!(memory.contains("music"));
        assert!(!memory.contains("and"));
        assert_eq!(memory.len(), 3);
    }

    #[test]
    fn test_overflow_clears_before_insert() {
        let mut memory = TokenMemory::new(3);
        memory.observe("alpha bravo charlie delta");
        assert_eq!(memory.len(), 4);

        memory.observe("echo foxtrot");
        assert_eq!(memory.len(), 2);
        assert!(!memory.contains("alpha"));
        assert!(memory.contains("foxtrot"));
    }

    #[test]
    fn test_at_capacity_is_not_cleared() {
        let mut memory = TokenMemory::new(3);
        memory.observe("alpha bravo charlie");
        memory.observe("delta");
        assert_eq!(memory.len(), 4);
        assert!(memory.contains("alpha"));
    }
}
