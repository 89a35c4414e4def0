//! Vocabulary deck model
//!
//! Word pairs, decks, study marks and presentation order. Decks are plain
//! in-memory values; loading from JSON is provided for the console driver.

use crate::events::Language;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The two spoken sides of a flashcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordPair {
    pub chinese: String,
    pub english: String,
}

impl WordPair {
    pub fn new(chinese: impl Into<String>, english: impl Into<String>) -> Self {
        Self {
            chinese: chinese.into(),
            english: english.into(),
        }
    }

    /// Text for one side of the card
    pub fn text(&self, language: Language) -> &str {
        match language {
            Language::Chinese => &self.chinese,
            Language::English => &self.english,
        }
    }
}

/// One vocabulary entry with its study marks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabularyWord {
    pub id: String,
    pub chinese: String,
    #[serde(default)]
    pub pinyin: String,
    pub english: String,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub correct_count: u32,
    #[serde(default)]
    pub incorrect_count: u32,
}

impl VocabularyWord {
    pub fn new(
        id: impl Into<String>,
        chinese: impl Into<String>,
        pinyin: impl Into<String>,
        english: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            chinese: chinese.into(),
            pinyin: pinyin.into(),
            english: english.into(),
            favorite: false,
            correct_count: 0,
            incorrect_count: 0,
        }
    }

    /// Spoken sides of this word
    pub fn pair(&self) -> WordPair {
        WordPair::new(self.chinese.clone(), self.english.clone())
    }

    fn is_usable(&self) -> bool {
        !self.chinese.trim().is_empty() && !self.english.trim().is_empty()
    }
}

/// A named list of vocabulary words with an optional shuffled order
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub words: Vec<VocabularyWord>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    /// Presentation order as indices into `words` (None = deck order)
    #[serde(skip)]
    order: Option<Vec<usize>>,
}

impl Deck {
    /// Build a deck, dropping words that lack a Chinese or English side
    pub fn new(id: impl Into<String>, name: impl Into<String>, words: Vec<VocabularyWord>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            words: words.into_iter().filter(VocabularyWord::is_usable).collect(),
            created_at: Utc::now(),
            order: None,
        }
    }

    /// Built-in starter deck of twenty common words
    pub fn sample() -> Self {
        const WORDS: [(&str, &str, &str); 20] = [
            ("你好", "nǐ hǎo", "Hello"),
            ("谢谢", "xiè xiè", "Thank you"),
            ("再见", "zài jiàn", "Goodbye"),
            ("是", "shì", "Yes / To be"),
            ("不是", "bù shì", "No / Not"),
            ("请", "qǐng", "Please"),
            ("对不起", "duì bù qǐ", "Sorry"),
            ("没关系", "méi guān xì", "It's okay"),
            ("好", "hǎo", "Good"),
            ("不好", "bù hǎo", "Bad / Not good"),
            ("大", "dà", "Big"),
            ("小", "xiǎo", "Small"),
            ("多", "duō", "Many / Much"),
            ("少", "shǎo", "Few / Little"),
            ("我", "wǒ", "I / Me"),
            ("你", "nǐ", "You"),
            ("他", "tā", "He / Him"),
            ("她", "tā", "She / Her"),
            ("我们", "wǒ men", "We / Us"),
            ("他们", "tā men", "They / Them"),
        ];

        let words = WORDS
            .iter()
            .enumerate()
            .map(|(i, (chinese, pinyin, english))| {
                VocabularyWord::new((i + 1).to_string(), *chinese, *pinyin, *english)
            })
            .collect();

        Deck::new("sample_deck", "Sample Vocabulary", words)
    }

    /// Parse a deck from its JSON representation
    pub fn from_json_str(json: &str) -> Result<Self> {
        let parsed: Deck = serde_json::from_str(json)?;
        let deck = Deck::new(parsed.id, parsed.name, parsed.words);
        if deck.is_empty() {
            return Err(Error::InvalidInput(
                "No valid vocabulary found. Expected words with chinese and english".to_string(),
            ));
        }
        Ok(deck)
    }

    /// Load a deck from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Word at a presentation position (honours shuffle order)
    pub fn word_at(&self, index: usize) -> Option<&VocabularyWord> {
        let slot = match &self.order {
            Some(order) => *order.get(index)?,
            None => index,
        };
        self.words.get(slot)
    }

    pub fn is_shuffled(&self) -> bool {
        self.order.is_some()
    }

    /// Shuffle presentation order with the thread-local RNG
    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::thread_rng());
    }

    /// Shuffle presentation order with a caller-supplied RNG
    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.words.len()).collect();
        order.shuffle(rng);
        self.order = Some(order);
    }

    /// Restore deck order
    pub fn reset_order(&mut self) {
        self.order = None;
    }

    fn word_mut(&mut self, word_id: &str) -> Result<&mut VocabularyWord> {
        self.words
            .iter_mut()
            .find(|w| w.id == word_id)
            .ok_or_else(|| Error::NotFound(format!("word {}", word_id)))
    }

    /// Flip the favorite flag; returns the new value
    pub fn toggle_favorite(&mut self, word_id: &str) -> Result<bool> {
        let word = self.word_mut(word_id)?;
        word.favorite = !word.favorite;
        Ok(word.favorite)
    }

    /// Toggle the correct mark; correct and incorrect are mutually exclusive
    pub fn mark_correct(&mut self, word_id: &str) -> Result<()> {
        let word = self.word_mut(word_id)?;
        if word.correct_count > 0 {
            word.correct_count = 0;
        } else {
            word.correct_count = 1;
            word.incorrect_count = 0;
        }
        Ok(())
    }

    /// Toggle the incorrect mark; correct and incorrect are mutually exclusive
    pub fn mark_incorrect(&mut self, word_id: &str) -> Result<()> {
        let word = self.word_mut(word_id)?;
        if word.incorrect_count > 0 {
            word.incorrect_count = 0;
        } else {
            word.incorrect_count = 1;
            word.correct_count = 0;
        }
        Ok(())
    }

    /// Clear every correct/incorrect mark
    pub fn reset_progress(&mut self) {
        for word in &mut self.words {
            word.correct_count = 0;
            word.incorrect_count = 0;
        }
    }

    pub fn favorites(&self) -> impl Iterator<Item = &VocabularyWord> {
        self.words.iter().filter(|w| w.favorite)
    }

    /// Progress table as CSV (header plus one row per word, deck order)
    pub fn progress_csv(&self) -> String {
        let mut lines = vec!["Chinese,Pinyin,English,Favorite,Correct,Incorrect".to_string()];
        for w in &self.words {
            lines.push(format!(
                "{},{},{},{},{},{}",
                csv_field(&w.chinese),
                csv_field(&w.pinyin),
                csv_field(&w.english),
                if w.favorite { "Yes" } else { "No" },
                w.correct_count,
                w.incorrect_count
            ));
        }
        lines.join("\n")
    }
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
