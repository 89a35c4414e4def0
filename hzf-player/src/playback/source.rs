//! Word index provider
//!
//! The scheduler only ever asks "which word is at position N". Decks, shuffled
//! views and test fixtures all plug in through [`WordSource`].

use hzf_common::{Deck, WordPair};
use std::sync::{PoisonError, RwLock};

/// Lookup of word pairs by presentation index
pub trait WordSource: Send + Sync {
    /// Word at `index`, or None when out of range
    fn word_at(&self, index: usize) -> Option<WordPair>;

    /// Number of words
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl WordSource for Vec<WordPair> {
    fn word_at(&self, index: usize) -> Option<WordPair> {
        self.get(index).cloned()
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }
}

impl WordSource for Deck {
    fn word_at(&self, index: usize) -> Option<WordPair> {
        Deck::word_at(self, index).map(|w| w.pair())
    }

    fn len(&self) -> usize {
        Deck::len(self)
    }
}

/// Shared deck that the session can reshuffle while playback reads it
impl WordSource for RwLock<Deck> {
    fn word_at(&self, index: usize) -> Option<WordPair> {
        let deck = self.read().unwrap_or_else(PoisonError::into_inner);
        Deck::word_at(&deck, index).map(|w| w.pair())
    }

    fn len(&self) -> usize {
        self.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
