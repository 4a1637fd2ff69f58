use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Built-in table of disallowed words, checked in order
///
/// Plain words only; separator tolerance is added when the table is compiled.
pub static DEFAULT_WORDS: &[&str] = &[
    "fuck", "shit", "penis", "cunt", "dick", "pussy", "whore", "slut", "idiot",
    "arschloch", "asshole", "bastard", "wanker", "bitch", "moron", "retard",
    "douche", "fag", "puta", "putain", "merde", "merda", "scheiße", "scheisse",
    "fotze", "schlampe", "verdammt", "idiota", "imbecile", "imbecil", "salope",
    "connard", "enculé", "encule", "culo",
];

static DEFAULT_DENYLIST: Lazy<Denylist> = Lazy::new(|| {
    Denylist::from_words(DEFAULT_WORDS.iter().copied()).expect("built-in denylist must compile")
});

#[derive(Debug, Clone)]
struct Entry {
    word: String,
    pattern: Regex,
}

/// Ordered set of case-insensitive matchers
///
/// Every word matches with any run of non-word characters between its
/// letters, so "f.u.c.k" and "s h i t" are caught like the plain spelling.
#[derive(Debug, Clone)]
pub struct Denylist {
    entries: Vec<Entry>,
}

/// `fuck` -> `(?i)f\W*u\W*c\W*k`
fn separator_tolerant(word: &str) -> String {
    let letters: Vec<String> = word
        .chars()
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    format!("(?i){}", letters.join(r"\W*"))
}

impl Denylist {
    pub fn from_words<I, S>(words: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = words
            .into_iter()
            .map(|word| word.as_ref().trim().to_string())
            .filter(|word| !word.is_empty())
            .map(|word| {
                Regex::new(&separator_tolerant(&word)).map(|pattern| Entry { word, pattern })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Load a word list from disk: one word per line, blank lines and `#` comments ignored
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read denylist from {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("Invalid denylist in {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let words: Vec<&str> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .collect();

        if words.is_empty() {
            return Err(anyhow::anyhow!("denylist contains no words"));
        }
        Ok(Self::from_words(words)?)
    }

    /// First denylisted word found in `normalized`, if any
    pub fn first_match(&self, normalized: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.pattern.is_match(normalized))
            .map(|entry| entry.word.as_str())
    }

    #[cfg(test)]
    pub fn matches(&self, normalized: &str) -> bool {
        self.first_match(normalized).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl Default for Denylist {
    fn default() -> Self {
        DEFAULT_DENYLIST.clone()
    }
}
