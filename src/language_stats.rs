use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Punctuation that ends a word, in addition to any whitespace.
const PUNCTUATION_SEPARATORS: &[char] = &[
    ',', '.', ';', ':', '!', '?', '\'', '"', '[', ']', '{', '}', '/', '*', '+', '-', '=', '<',
    '>', '\\', '(', ')',
];

pub fn is_separator(c: char) -> bool {
    c.is_whitespace() || PUNCTUATION_SEPARATORS.contains(&c)
}

/// Words contributed by one inserted chunk of text.
///
/// A single keystroke counts as a finished word only when it is a separator
/// (space, enter, punctuation). Anything longer, such as a paste, counts every
/// non-empty fragment between separators.
pub fn count_words(inserted: &str) -> u64 {
    let mut chars = inserted.chars();
    match (chars.next(), chars.next()) {
        (None, _) => 0,
        (Some(c), None) => u64::from(is_separator(c)),
        _ => inserted
            .split(is_separator)
            .filter(|fragment| !fragment.is_empty())
            .count() as u64,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageStat {
    #[serde(default)]
    pub characters: u64,
    #[serde(default)]
    pub words: u64,
}

impl LanguageStat {
    pub fn add(&mut self, other: LanguageStat) {
        self.characters += other.characters;
        self.words += other.words;
    }
}

/// Where an edited document lives. Only addressable documents are counted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentScheme {
    #[default]
    File,
    Untitled,
    #[serde(untagged)]
    Other(String),
}

impl DocumentScheme {
    pub fn is_tracked(&self) -> bool {
        matches!(self, DocumentScheme::File | DocumentScheme::Untitled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    pub text: String,
}

impl TextChange {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditEvent {
    pub language: String,
    #[serde(default)]
    pub scheme: DocumentScheme,
    pub changes: Vec<TextChange>,
}

impl EditEvent {
    pub fn new(language: impl Into<String>, changes: Vec<TextChange>) -> Self {
        Self {
            language: language.into(),
            scheme: DocumentScheme::File,
            changes,
        }
    }

    pub fn typed(language: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(language, vec![TextChange::new(text)])
    }

    pub fn with_scheme(mut self, scheme: DocumentScheme) -> Self {
        self.scheme = scheme;
        self
    }
}

/// Per-language character and word counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LanguageStats {
    entries: BTreeMap<String, LanguageStat>,
}

impl LanguageStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: BTreeMap<String, LanguageStat>) -> Self {
        Self { entries }
    }

    /// Counts an edit. Returns false if the document is not tracked, in which
    /// case nothing was recorded.
    pub fn record_edit(&mut self, event: &EditEvent) -> bool {
        if !event.scheme.is_tracked() {
            return false;
        }

        let entry = self.entries.entry(event.language.clone()).or_default();
        for change in &event.changes {
            entry.add(LanguageStat {
                characters: change.text.chars().count() as u64,
                words: count_words(&change.text),
            });
        }
        true
    }

    pub fn totals(&self) -> LanguageStat {
        self.entries
            .values()
            .fold(LanguageStat::default(), |mut acc, stat| {
                acc.add(*stat);
                acc
            })
    }

    pub fn get(&self, language: &str) -> Option<&LanguageStat> {
        self.entries.get(language)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &LanguageStat)> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &BTreeMap<String, LanguageStat> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
