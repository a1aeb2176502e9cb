//! Lexical preprocessor shared by indexing and querying.
//!
//! # Algorithm
//!
//! 1. Lowercase the input.
//! 2. Replace every character that is not a letter, digit, or whitespace
//!    with a single space.
//! 3. Split on whitespace.
//! 4. Drop stop words (common Spanish and English function words) and any
//!    token of two characters or fewer.
//!
//! Token order and duplicates are preserved: the scorer needs term
//! frequencies.
//!
//! ```rust
//! use aula_core::tokenize::tokenize;
//!
//! assert_eq!(tokenize("motor de búsqueda"), vec!["motor", "búsqueda"]);
//! ```

use std::collections::HashSet;
use std::sync::OnceLock;

/// Tokens at or below this many characters are discarded.
const MIN_TOKEN_CHARS: usize = 2;

const STOP_WORDS_ES: &[&str] = &[
    "el", "la", "de", "que", "y", "a", "en", "un", "es", "se", "no", "te", "lo", "le", "da", "su",
    "por", "son", "con", "para", "al", "del", "los", "las", "una", "como", "pero", "sus", "han",
    "había", "esto", "fue", "ser", "está", "hacer", "más", "muy", "sobre", "cada", "hasta",
    "tiene", "pueden", "todo", "también", "sin", "otro", "otros", "otras", "donde", "cuando",
    "cual", "desde", "entre", "estas", "estos", "durante", "parte", "porque", "después", "antes",
    "momento", "través", "tanto", "menos", "bien", "ejemplo", "general", "así", "ahora", "luego",
    "entonces", "medio", "forma", "manera", "mientras", "mayor", "mejor", "mismo", "nueva",
    "nuevo", "grandes", "gran", "diferentes", "muchos", "muchas", "varios", "varias", "cualquier",
    "algún", "alguna", "algunos", "algunas", "ningún", "ninguna", "ningunos", "ningunas",
];

const STOP_WORDS_EN: &[&str] = &[
    "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not", "on",
    "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from", "they", "we", "say",
    "her", "she", "or", "an", "will", "my", "one", "all", "would", "there", "their", "what", "so",
    "up", "out", "if", "about", "who", "get", "which", "go", "me", "when", "make", "can", "like",
    "time", "no", "just", "him", "know", "take", "people", "into", "year", "your", "good", "some",
    "could", "them", "see", "other", "than", "then", "now", "look", "only", "come", "its", "over",
    "think", "also", "back", "after", "use", "two", "how", "our", "work", "first", "well", "way",
    "even", "new", "want", "because", "any", "these", "give", "day", "most", "us",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        STOP_WORDS_ES
            .iter()
            .chain(STOP_WORDS_EN.iter())
            .copied()
            .collect()
    })
}

/// Returns true if `word` (already lowercased) is in the fixed stop-word set.
pub fn is_stop_word(word: &str) -> bool {
    stop_words().contains(word)
}

/// Normalize and tokenize `text`.
///
/// Pure and deterministic. Empty, whitespace-only, or all-stop-word input
/// yields an empty vector.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() > MIN_TOKEN_CHARS && !is_stop_word(word))
        .map(str::to_string)
        .collect()
}
